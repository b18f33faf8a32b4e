// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer resolution: pick the single target printer for a job.

use regex_lite::Regex;
use tracing::{debug, instrument};

use spoolward_bridge::PrinterEnumeration;
use spoolward_core::config::compile_printer_pattern;
use spoolward_core::error::Result;
use spoolward_core::types::PrinterDevice;

/// Selects a printer by configured name pattern, OS default, or first listed.
#[derive(Debug, Clone, Default)]
pub struct PrinterResolver {
    pattern: Option<Regex>,
}

impl PrinterResolver {
    /// Build a resolver; an invalid pattern is a `SpoolError::Config`.
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        let pattern = pattern
            .filter(|p| !p.trim().is_empty())
            .map(compile_printer_pattern)
            .transpose()?;
        Ok(Self { pattern })
    }

    /// List printers fresh from the OS and select one.
    ///
    /// `Ok(None)` means printers could be listed but none is usable.
    #[instrument(skip_all)]
    pub fn find_configured<S>(&self, spooler: &S) -> Result<Option<PrinterDevice>>
    where
        S: PrinterEnumeration + ?Sized,
    {
        let printers = spooler.list_printers()?;
        let selected = self.select(&printers);
        debug!(
            listed = printers.len(),
            selected = selected.as_ref().map(|p| p.name.as_str()).unwrap_or("<none>"),
            "printer resolved"
        );
        Ok(selected)
    }

    /// Preference order: first pattern match, OS default, first listed.
    pub fn select(&self, printers: &[PrinterDevice]) -> Option<PrinterDevice> {
        if let Some(pattern) = &self.pattern {
            if let Some(found) = printers.iter().find(|p| pattern.is_match(&p.name)) {
                return Some(found.clone());
            }
        }
        printers
            .iter()
            .find(|p| p.is_default)
            .or_else(|| printers.first())
            .cloned()
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }
}
