// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub spooler for platforms with neither CUPS nor the Windows spooler.
//
// Lists no printers and refuses submissions.  Job enumeration reports an
// empty queue and advertises that it cannot observe real spooler state, so
// the completion tracker trusts the submission call.

use std::path::Path;

use spoolward_core::error::{Result, SpoolError};
use spoolward_core::types::PrinterDevice;

use crate::traits::*;

/// No-op spooler returned on unsupported platforms.
pub struct StubSpooler;

impl PlatformSpooler for StubSpooler {
    fn platform_name(&self) -> &str {
        "Unsupported (stub)"
    }
}

impl PrinterEnumeration for StubSpooler {
    fn list_printers(&self) -> Result<Vec<PrinterDevice>> {
        tracing::warn!("PrinterEnumeration::list_printers called on stub spooler");
        Ok(Vec::new())
    }
}

impl PrintSubmission for StubSpooler {
    fn print_file(&self, _path: &Path, _printer: &str) -> Result<()> {
        tracing::warn!("PrintSubmission::print_file called on stub spooler");
        Err(SpoolError::PlatformUnavailable)
    }
}

impl JobEnumeration for StubSpooler {
    fn list_job_ids(&self, _printer: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn can_enumerate_jobs(&self) -> bool {
        false
    }
}
