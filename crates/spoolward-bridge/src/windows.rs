// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Windows spooler backend.
//
// Uses PowerShell's PrintManagement cmdlets for enumeration and the shell
// `PrintTo` verb for submission, so the registered PDF handler does the
// actual rasterisation.

use std::path::Path;

use tracing::info;

use spoolward_core::error::{Result, SpoolError};
use spoolward_core::types::PrinterDevice;

use crate::command;
use crate::traits::{JobEnumeration, PlatformSpooler, PrintSubmission, PrinterEnumeration};

const POWERSHELL: &str = "powershell.exe";

/// Spooler backed by PowerShell.
#[derive(Debug, Clone, Default)]
pub struct WindowsSpooler;

impl WindowsSpooler {
    pub fn new() -> Self {
        Self
    }

    fn powershell(&self, script: &str) -> std::io::Result<command::CommandOutput> {
        command::run(
            POWERSHELL,
            &["-NoProfile", "-NonInteractive", "-Command", script],
        )
    }
}

impl PlatformSpooler for WindowsSpooler {
    fn platform_name(&self) -> &str {
        "Windows spooler"
    }
}

impl PrinterEnumeration for WindowsSpooler {
    fn list_printers(&self) -> Result<Vec<PrinterDevice>> {
        let script = "Get-CimInstance Win32_Printer | ForEach-Object { \"$($_.Default)`t$($_.Name)\" }";
        let out = self
            .powershell(script)
            .map_err(|e| SpoolError::Spooler(format!("{POWERSHELL}: {e}")))?;
        if !out.success {
            return Err(SpoolError::Spooler(format!(
                "Win32_Printer query: {}",
                out.failure_detail()
            )));
        }
        Ok(parse_printer_table(&out.stdout))
    }
}

impl PrintSubmission for WindowsSpooler {
    fn print_file(&self, path: &Path, printer: &str) -> Result<()> {
        let script = format!(
            "Start-Process -FilePath {} -Verb PrintTo -ArgumentList {} -WindowStyle Hidden -ErrorAction Stop",
            ps_quote(&path.to_string_lossy()),
            ps_quote(&format!("\"{printer}\"")),
        );
        let out = self
            .powershell(&script)
            .map_err(|e| SpoolError::Dispatch(format!("{POWERSHELL}: {e}")))?;
        if !out.success {
            return Err(SpoolError::Dispatch(out.failure_detail()));
        }
        info!(printer, "spooler accepted file");
        Ok(())
    }
}

impl JobEnumeration for WindowsSpooler {
    fn list_job_ids(&self, printer: &str) -> Result<Vec<String>> {
        let script = format!(
            "Get-PrintJob -PrinterName {} -ErrorAction Stop | ForEach-Object {{ $_.Id }}",
            ps_quote(printer)
        );
        let out = self
            .powershell(&script)
            .map_err(|e| SpoolError::Spooler(format!("{POWERSHELL}: {e}")))?;
        if !out.success {
            return Err(SpoolError::Spooler(format!(
                "Get-PrintJob {printer}: {}",
                out.failure_detail()
            )));
        }
        Ok(parse_job_id_lines(&out.stdout))
    }
}

/// Single-quote a PowerShell string literal.
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Parse `<True|False>\t<name>` lines.
pub fn parse_printer_table(stdout: &str) -> Vec<PrinterDevice> {
    stdout
        .lines()
        .filter_map(|line| line.trim_end_matches('\r').split_once('\t'))
        .filter(|(_, name)| !name.trim().is_empty())
        .map(|(default, name)| PrinterDevice {
            name: name.trim().to_string(),
            is_default: default.trim().eq_ignore_ascii_case("true"),
        })
        .collect()
}

/// Parse one numeric job id per line.
pub fn parse_job_id_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit()))
        .map(String::from)
        .collect()
}
