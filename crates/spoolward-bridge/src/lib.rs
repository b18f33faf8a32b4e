// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolward Bridge: OS print spooler abstractions.
//
// Defines the traits the queue engine needs from the operating system and
// picks the backend for the target platform: CUPS on Unix, PowerShell on
// Windows, a stub elsewhere.  The parsers of every backend are compiled on
// all platforms so they can be unit-tested anywhere.

use std::sync::Arc;

mod command;
pub mod cups;
pub mod stub;
pub mod traits;
pub mod windows;

pub use traits::{JobEnumeration, PlatformSpooler, PrintSubmission, PrinterEnumeration};

/// Returns the spooler implementation for the target operating system.
pub fn platform_spooler() -> Arc<dyn PlatformSpooler> {
    #[cfg(unix)]
    {
        Arc::new(cups::CupsSpooler::new())
    }
    #[cfg(windows)]
    {
        Arc::new(windows::WindowsSpooler::new())
    }
    #[cfg(not(any(unix, windows)))]
    {
        Arc::new(stub::StubSpooler)
    }
}
