// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML-to-PDF rendering.
//
// Two renderers share one trait: a headless Chromium-family browser, which
// renders real layouts, and a built-in fallback that flattens the markup to
// text and lays it out with `PdfWriter`.  `Auto` picks the browser when one
// is installed.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use spoolward_core::config::{RendererKind, SpoolConfig};
use spoolward_core::error::{Result, SpoolError};

use crate::html::{document_title, html_to_text};
use crate::pdf::writer::PdfWriter;

/// Browser binaries looked up on `PATH`, in order of preference.
const BROWSER_CANDIDATES: [&str; 5] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "msedge",
];

/// Hard limit for one headless render.
const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns an HTML document into PDF bytes.
pub trait HtmlRenderer: Send + Sync {
    fn render_to_pdf(&self, html: &str) -> Result<Vec<u8>>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Build the renderer selected by the config.
pub fn renderer_for(config: &SpoolConfig) -> Result<Arc<dyn HtmlRenderer>> {
    let chromium = || {
        config
            .chromium_path
            .clone()
            .or_else(find_browser)
            .map(|binary| ChromiumRenderer::new(binary, config.temp_dir.clone()))
    };

    match config.renderer {
        RendererKind::Builtin => Ok(Arc::new(BuiltinRenderer::default())),
        RendererKind::Chromium => chromium().map(|r| Arc::new(r) as Arc<dyn HtmlRenderer>).ok_or_else(|| {
            SpoolError::Config("renderer is \"chromium\" but no headless browser was found".into())
        }),
        RendererKind::Auto => match chromium() {
            Some(renderer) => {
                info!(binary = %renderer.binary.display(), "using headless browser renderer");
                Ok(Arc::new(renderer))
            }
            None => {
                warn!("no headless browser found, using built-in text renderer");
                Ok(Arc::new(BuiltinRenderer::default()))
            }
        },
    }
}

/// Look for a Chromium-family browser on `PATH`.
pub fn find_browser() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    find_browser_in(&path_var)
}

fn find_browser_in(path_var: &OsString) -> Option<PathBuf> {
    for dir in std::env::split_paths(path_var) {
        for name in BROWSER_CANDIDATES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
            let exe = candidate.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Headless browser
// ---------------------------------------------------------------------------

/// Renders through `<browser> --headless --print-to-pdf`.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    binary: PathBuf,
    temp_dir: Option<PathBuf>,
}

impl ChromiumRenderer {
    pub fn new(binary: impl Into<PathBuf>, temp_dir: Option<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            temp_dir,
        }
    }

    fn temp_file(&self, suffix: &str) -> Result<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("spoolward-render-").suffix(suffix);
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        file.map_err(|e| SpoolError::Conversion(format!("create render temp file: {e}")))
    }
}

impl HtmlRenderer for ChromiumRenderer {
    #[instrument(skip(self, html), fields(html_len = html.len()))]
    fn render_to_pdf(&self, html: &str) -> Result<Vec<u8>> {
        let mut source = self.temp_file(".html")?;
        source
            .write_all(html.as_bytes())
            .and_then(|_| source.flush())
            .map_err(|e| SpoolError::Conversion(format!("write HTML source: {e}")))?;

        // Keep the output path but let the browser create the file.
        let output = self.temp_file(".pdf")?.into_temp_path();

        let mut print_arg = OsString::from("--print-to-pdf=");
        print_arg.push(output.as_os_str());

        let mut child = Command::new(&self.binary)
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-pdf-header-footer")
            .arg(print_arg)
            .arg(file_url(source.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                SpoolError::Conversion(format!("start {}: {e}", self.binary.display()))
            })?;

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= RENDER_TIMEOUT => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SpoolError::Conversion(format!(
                        "headless render timed out after {}s",
                        RENDER_TIMEOUT.as_secs()
                    )));
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(50)),
                Err(e) => {
                    return Err(SpoolError::Conversion(format!("wait for renderer: {e}")));
                }
            }
        };

        if !status.success() {
            return Err(SpoolError::Conversion(format!(
                "headless render exited with {status}"
            )));
        }

        let bytes = std::fs::read(&output)
            .map_err(|e| SpoolError::Conversion(format!("read rendered PDF: {e}")))?;
        if bytes.is_empty() {
            return Err(SpoolError::Conversion("headless render produced an empty PDF".into()));
        }

        debug!(
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "headless render complete"
        );
        Ok(bytes)
    }

    fn name(&self) -> &str {
        "chromium"
    }
}

/// `file://` URL for a local path.
fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    if raw.starts_with('/') {
        format!("file://{raw}")
    } else {
        format!("file:///{raw}")
    }
}

// ---------------------------------------------------------------------------
// Built-in fallback
// ---------------------------------------------------------------------------

/// Flattens markup to text and typesets it with `PdfWriter`.
#[derive(Debug, Default)]
pub struct BuiltinRenderer {
    writer: PdfWriter,
}

impl HtmlRenderer for BuiltinRenderer {
    fn render_to_pdf(&self, html: &str) -> Result<Vec<u8>> {
        let text = html_to_text(html);
        match document_title(html) {
            Some(title) => {
                let mut writer = self.writer.clone();
                writer.set_title(title);
                writer.create_from_text(&text)
            }
            None => self.writer.create_from_text(&text),
        }
    }

    fn name(&self) -> &str {
        "builtin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_renders_a_pdf() {
        let bytes = BuiltinRenderer::default()
            .render_to_pdf("<h1>Hello</h1><p>kiosk</p>")
            .expect("render");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn builtin_is_selected_when_forced() {
        let config = SpoolConfig {
            renderer: RendererKind::Builtin,
            ..Default::default()
        };
        assert_eq!(renderer_for(&config).unwrap().name(), "builtin");
    }

    #[test]
    fn explicit_chromium_path_is_honoured() {
        let config = SpoolConfig {
            renderer: RendererKind::Chromium,
            chromium_path: Some("/opt/chrome/chrome".into()),
            ..Default::default()
        };
        assert_eq!(renderer_for(&config).unwrap().name(), "chromium");
    }

    #[test]
    fn browser_lookup_on_empty_path() {
        assert_eq!(find_browser_in(&OsString::new()), None);
    }

    #[test]
    fn file_urls() {
        assert_eq!(file_url(Path::new("/tmp/a.html")), "file:///tmp/a.html");
        assert_eq!(
            file_url(Path::new(r"C:\Temp\a.html")),
            "file:///C:/Temp/a.html"
        );
    }

    #[test]
    fn missing_binary_is_a_conversion_error() {
        let renderer = ChromiumRenderer::new("/nonexistent/spoolward-browser", None);
        let err = renderer.render_to_pdf("<p>x</p>").unwrap_err();
        assert!(matches!(err, SpoolError::Conversion(_)));
    }
}
