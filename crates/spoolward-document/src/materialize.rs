// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content materialization: turn a job's payload into a PDF file on disk.
//
//   pdf         caller's path, used as-is and never deleted
//   pdf_base64  decoded into a temp file
//   text        escaped, wrapped in monospace HTML, then rendered as html
//   html        rendered to a temp file
//
// Temp files are owned by the returned `Artifact` and deleted when it is
// released or dropped, whichever comes first.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tempfile::TempPath;
use tracing::{debug, info, instrument, warn};

use spoolward_core::error::{Result, SpoolError};
use spoolward_core::types::{ContentType, PrintJob};

use crate::html::text_to_html;
use crate::render::HtmlRenderer;

/// Prefix of every temp artifact.
pub const TEMP_PREFIX: &str = "spoolward-";

/// A printable PDF on disk.
#[derive(Debug)]
pub enum Artifact {
    /// Caller-owned file, left in place.
    Borrowed(PathBuf),
    /// Temp file owned by the processing attempt; deleted on drop.
    Owned(TempPath),
}

impl Artifact {
    pub fn path(&self) -> &Path {
        match self {
            Self::Borrowed(path) => path.as_path(),
            Self::Owned(temp) => &**temp,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    /// Delete an owned temp file now and log the outcome.
    ///
    /// Dropping the artifact deletes it too; this variant reports failures.
    pub fn release(self) {
        match self {
            Self::Borrowed(path) => {
                debug!(path = %path.display(), "leaving caller-owned PDF in place");
            }
            Self::Owned(temp) => {
                let path = temp.to_path_buf();
                match temp.close() {
                    Ok(()) => debug!(path = %path.display(), "temp artifact deleted"),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to delete temp artifact")
                    }
                }
            }
        }
    }
}

/// Converts job content into a PDF artifact.
#[derive(Clone)]
pub struct Materializer {
    renderer: Arc<dyn HtmlRenderer>,
    temp_dir: Option<PathBuf>,
}

impl Materializer {
    pub fn new(renderer: Arc<dyn HtmlRenderer>, temp_dir: Option<PathBuf>) -> Self {
        Self { renderer, temp_dir }
    }

    /// Produce a PDF for `job`. Failures surface as `SpoolError::Conversion`.
    #[instrument(skip(self, job), fields(job_id = %job.id, content_type = %job.content_type))]
    pub fn materialize(&self, job: &PrintJob) -> Result<Artifact> {
        match job.content_type {
            ContentType::Pdf => {
                let path = PathBuf::from(&job.content);
                if !path.is_file() {
                    return Err(SpoolError::Conversion(format!(
                        "PDF file not found: {}",
                        path.display()
                    )));
                }
                Ok(Artifact::Borrowed(path))
            }
            ContentType::PdfBase64 => {
                let bytes = decode_pdf_base64(&job.content)?;
                self.write_temp(&bytes)
            }
            ContentType::Text => self.render_html(&text_to_html(&job.content)),
            ContentType::Html => self.render_html(&job.content),
        }
    }

    fn render_html(&self, html: &str) -> Result<Artifact> {
        let bytes = self.renderer.render_to_pdf(html).map_err(|e| match e {
            SpoolError::Conversion(_) => e,
            other => SpoolError::Conversion(other.to_string()),
        })?;
        info!(renderer = self.renderer.name(), bytes = bytes.len(), "HTML rendered to PDF");
        self.write_temp(&bytes)
    }

    fn write_temp(&self, bytes: &[u8]) -> Result<Artifact> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(".pdf");
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut file =
            file.map_err(|e| SpoolError::Conversion(format!("create temp PDF: {e}")))?;

        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| SpoolError::Conversion(format!("write temp PDF: {e}")))?;

        let path = file.into_temp_path();
        debug!(path = %path.display(), bytes = bytes.len(), "temp artifact written");
        Ok(Artifact::Owned(path))
    }
}

/// Decode a base64 PDF payload, with or without a `data:` URI prefix.
pub fn decode_pdf_base64(content: &str) -> Result<Vec<u8>> {
    let payload = match content.trim_start().strip_prefix("data:") {
        Some(uri) => uri
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| SpoolError::Conversion("data URI has no payload".into()))?,
        None => content,
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(SpoolError::Conversion("base64 PDF payload is empty".into()));
    }

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| SpoolError::Conversion(format!("invalid base64 PDF: {e}")))?;

    if !bytes.starts_with(b"%PDF") {
        warn!(bytes = bytes.len(), "decoded payload does not start with a PDF header");
    }
    Ok(bytes)
}
