// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Queue and spooler configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpoolError};

/// Which HTML-to-PDF renderer the materializer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// Headless browser when one is installed, built-in writer otherwise.
    #[default]
    Auto,
    Chromium,
    Builtin,
}

/// Persistent Spoolward settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoolConfig {
    /// Case-insensitive regex selecting the target printer by name.
    pub printer_pattern: Option<String>,
    /// Jobs admitted before `submit` rejects with `QueueFull`.
    pub max_queue_size: usize,
    /// Attempts before a job is reported as failed.
    pub max_retry_attempts: u32,
    /// Flat delay after a failed attempt.
    pub retry_delay_ms: u64,
    /// Per-copy deadline covering both confirmation phases.
    pub confirm_timeout_ms: u64,
    /// Poll interval while waiting for a new spooler job to appear.
    pub start_poll_interval_ms: u64,
    /// Poll interval while waiting for tracked jobs to leave the spooler.
    pub completion_poll_interval_ms: u64,
    /// Status records retained for polling after jobs leave the queue.
    pub history_limit: usize,
    /// Directory for temporary PDF artifacts (system temp dir when unset).
    pub temp_dir: Option<PathBuf>,
    pub renderer: RendererKind,
    /// Explicit headless browser binary for the Chromium renderer.
    pub chromium_path: Option<PathBuf>,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            printer_pattern: None,
            max_queue_size: 100,
            max_retry_attempts: 3,
            retry_delay_ms: 2_000,
            confirm_timeout_ms: 60_000,
            start_poll_interval_ms: 400,
            completion_poll_interval_ms: 600,
            history_limit: 500,
            temp_dir: None,
            renderer: RendererKind::Auto,
            chromium_path: None,
            log_level: "info".into(),
        }
    }
}

impl SpoolConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_queue_size == 0 {
            return Err(SpoolError::Config("max_queue_size must be at least 1".into()));
        }
        if self.max_retry_attempts == 0 {
            return Err(SpoolError::Config(
                "max_retry_attempts must be at least 1".into(),
            ));
        }
        if self.start_poll_interval_ms == 0 || self.completion_poll_interval_ms == 0 {
            return Err(SpoolError::Config("poll intervals must be non-zero".into()));
        }
        if let Some(pattern) = &self.printer_pattern {
            compile_printer_pattern(pattern)?;
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn start_poll_interval(&self) -> Duration {
        Duration::from_millis(self.start_poll_interval_ms)
    }

    pub fn completion_poll_interval(&self) -> Duration {
        Duration::from_millis(self.completion_poll_interval_ms)
    }
}

/// Compile a printer-name pattern the way the resolver applies it.
pub fn compile_printer_pattern(pattern: &str) -> Result<regex_lite::Regex> {
    regex_lite::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| SpoolError::Config(format!("printer_pattern {pattern:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SpoolConfig::default();
        assert_eq!(config.max_queue_size, 100);
        assert_eq!(config.max_retry_attempts, 3);
        assert_eq!(config.retry_delay(), Duration::from_secs(2));
        assert_eq!(config.confirm_timeout(), Duration::from_secs(60));
        assert_eq!(config.start_poll_interval(), Duration::from_millis(400));
        assert_eq!(config.completion_poll_interval(), Duration::from_millis(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SpoolConfig =
            serde_json::from_str(r#"{ "printer_pattern": "zebra", "max_queue_size": 5 }"#)
                .unwrap();
        assert_eq!(config.printer_pattern.as_deref(), Some("zebra"));
        assert_eq!(config.max_queue_size, 5);
        assert_eq!(config.max_retry_attempts, 3);
        assert_eq!(config.renderer, RendererKind::Auto);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let config = SpoolConfig {
            printer_pattern: Some("(unclosed".into()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SpoolError::Config(_))));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = SpoolConfig {
            max_queue_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = SpoolConfig {
            printer_pattern: Some("^HP".into()),
            renderer: RendererKind::Builtin,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(SpoolConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn pattern_is_case_insensitive() {
        let re = compile_printer_pattern("epson").unwrap();
        assert!(re.is_match("EPSON TM-T88"));
    }
}
