// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS backend (Linux, macOS, BSD).
//
// Drives the stock CUPS command-line tools:
//   lpstat -e        destination names, one per line (CUPS >= 2.0)
//   lpstat -p        fallback listing for older CUPS
//   lpstat -d        system default destination
//   lpstat -o <dest> outstanding jobs, one per line, id first
//   lp -d <dest>     submit a file
//
// Commands run under the C locale so the English output can be parsed.

use std::path::Path;

use tracing::{debug, info, warn};

use spoolward_core::error::{Result, SpoolError};
use spoolward_core::types::PrinterDevice;

use crate::command;
use crate::traits::{JobEnumeration, PlatformSpooler, PrintSubmission, PrinterEnumeration};

/// Spooler backed by the CUPS command-line tools.
#[derive(Debug, Clone)]
pub struct CupsSpooler {
    lpstat: String,
    lp: String,
}

impl Default for CupsSpooler {
    fn default() -> Self {
        Self::new()
    }
}

impl CupsSpooler {
    pub fn new() -> Self {
        Self {
            lpstat: "lpstat".into(),
            lp: "lp".into(),
        }
    }

    fn printer_names(&self) -> Result<Vec<String>> {
        let out = command::run(&self.lpstat, &["-e"])
            .map_err(|e| SpoolError::Spooler(format!("{} -e: {e}", self.lpstat)))?;
        if out.success {
            return Ok(parse_destination_names(&out.stdout));
        }
        if is_no_destinations(&out.stderr) {
            return Ok(Vec::new());
        }

        debug!(detail = %out.failure_detail(), "lpstat -e unsupported, falling back to -p");
        let out = command::run(&self.lpstat, &["-p"])
            .map_err(|e| SpoolError::Spooler(format!("{} -p: {e}", self.lpstat)))?;
        if out.success {
            Ok(parse_printer_lines(&out.stdout))
        } else if is_no_destinations(&out.stderr) {
            Ok(Vec::new())
        } else {
            Err(SpoolError::Spooler(format!("lpstat -p: {}", out.failure_detail())))
        }
    }

    fn default_printer(&self) -> Option<String> {
        match command::run(&self.lpstat, &["-d"]) {
            Ok(out) if out.success => parse_default_destination(&out.stdout),
            Ok(out) => {
                debug!(detail = %out.failure_detail(), "no default destination reported");
                None
            }
            Err(e) => {
                warn!(error = %e, "lpstat -d failed");
                None
            }
        }
    }
}

impl PlatformSpooler for CupsSpooler {
    fn platform_name(&self) -> &str {
        "CUPS"
    }
}

impl PrinterEnumeration for CupsSpooler {
    fn list_printers(&self) -> Result<Vec<PrinterDevice>> {
        let names = self.printer_names()?;
        let default = self.default_printer();
        Ok(names
            .into_iter()
            .map(|name| PrinterDevice {
                is_default: default.as_deref() == Some(name.as_str()),
                name,
            })
            .collect())
    }
}

impl PrintSubmission for CupsSpooler {
    fn print_file(&self, path: &Path, printer: &str) -> Result<()> {
        let path_str = path.to_string_lossy();
        let out = command::run(&self.lp, &["-d", printer, "--", &path_str])
            .map_err(|e| SpoolError::Dispatch(format!("{}: {e}", self.lp)))?;
        if !out.success {
            return Err(SpoolError::Dispatch(out.failure_detail()));
        }

        match parse_request_id(&out.stdout) {
            Some(request_id) => info!(printer, %request_id, "spooler accepted file"),
            None => info!(printer, "spooler accepted file"),
        }
        Ok(())
    }
}

impl JobEnumeration for CupsSpooler {
    fn list_job_ids(&self, printer: &str) -> Result<Vec<String>> {
        let out = command::run(&self.lpstat, &["-o", printer])
            .map_err(|e| SpoolError::Spooler(format!("{} -o: {e}", self.lpstat)))?;
        if !out.success {
            return Err(SpoolError::Spooler(format!(
                "lpstat -o {printer}: {}",
                out.failure_detail()
            )));
        }
        Ok(parse_job_ids(&out.stdout, printer))
    }
}

// ---------------------------------------------------------------------------
// Output parsing
// ---------------------------------------------------------------------------

fn is_no_destinations(stderr: &str) -> bool {
    stderr.contains("No destinations added")
}

/// Parse `lpstat -e`: one destination name per line.
pub fn parse_destination_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Parse `lpstat -p`: `printer <name> is idle.  enabled since ...`.
pub fn parse_printer_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix("printer "))
        .filter_map(|rest| rest.split_whitespace().next())
        .map(String::from)
        .collect()
}

/// Parse `lpstat -d`: `system default destination: <name>`.
pub fn parse_default_destination(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        line.split_once("default destination:")
            .map(|(_, name)| name.trim().to_string())
            .filter(|name| !name.is_empty())
    })
}

/// Parse `lpstat -o <dest>`: job id is the first column, `<dest>-<n>`.
pub fn parse_job_ids(stdout: &str, printer: &str) -> Vec<String> {
    let prefix = format!("{printer}-");
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|id| {
            id.strip_prefix(&prefix)
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        })
        .map(String::from)
        .collect()
}

/// Parse `lp`: `request id is <dest>-<n> (1 file(s))`.
pub fn parse_request_id(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        line.split_once("request id is ")
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .map(String::from)
    })
}
