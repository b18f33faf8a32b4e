// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the OS print spooler.
//
// All methods are synchronous because every backend shells out to the
// platform's print tools.  In an async context, call them through
// `tokio::task::spawn_blocking`.

use std::path::Path;

use spoolward_core::error::Result;
use spoolward_core::types::PrinterDevice;

/// Everything the queue needs from the operating system.
pub trait PlatformSpooler: PrinterEnumeration + PrintSubmission + JobEnumeration + Send + Sync {
    /// Human-readable backend name (e.g. "CUPS", "Windows spooler").
    fn platform_name(&self) -> &str;
}

/// List installed printers.
pub trait PrinterEnumeration {
    /// Every printer the OS knows about, with the default flagged.
    fn list_printers(&self) -> Result<Vec<PrinterDevice>>;
}

/// Hand a file to the OS spooler.
pub trait PrintSubmission {
    /// Submit `path` to `printer`.
    ///
    /// Returning `Ok` only means the spooler accepted the file, not that
    /// anything was printed.
    fn print_file(&self, path: &Path, printer: &str) -> Result<()>;
}

/// Observe the spooler's outstanding jobs.
pub trait JobEnumeration {
    /// Identifiers of the jobs currently outstanding on `printer`.
    fn list_job_ids(&self, printer: &str) -> Result<Vec<String>>;

    /// Whether `list_job_ids` reflects real spooler state on this platform.
    fn can_enumerate_jobs(&self) -> bool {
        true
    }
}
