// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for kiosk screens and operators.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the front end presents it.

use crate::error::SpoolError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Busy printer, slow spooler; the queue retries on its own.
    Transient,
    /// Someone has to do something (connect a printer, free up the queue).
    ActionRequired,
    /// Retrying will not help: bad configuration or unsupported platform.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the queue retries automatically.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `SpoolError` into a `HumanError` fit for a kiosk screen.
pub fn humanize_error(err: &SpoolError) -> HumanError {
    match err {
        SpoolError::QueueFull { capacity } => HumanError {
            message: "The printer is busy with other documents.".into(),
            suggestion: format!(
                "There are already {capacity} documents waiting. Please wait a moment and try again."
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SpoolError::PrinterNotFound(_) => HumanError {
            message: "No printer is connected.".into(),
            suggestion: "Make sure the printer is plugged in, switched on, and installed on this machine.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        SpoolError::Conversion(_) => HumanError {
            message: "We couldn't prepare this document for printing.".into(),
            suggestion: "The document may be damaged or empty. Try generating it again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SpoolError::Dispatch(detail) => humanize_dispatch_error(detail),

        SpoolError::ConfirmationTimeout { .. } => HumanError {
            message: "The printer is taking too long.".into(),
            suggestion: "Check the printer for paper jams or empty trays. We'll keep trying for a little while.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SpoolError::Spooler(_) => HumanError {
            message: "We couldn't check on the printer.".into(),
            suggestion: "The print service on this machine may be restarting. We'll try again automatically.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SpoolError::Config(detail) => HumanError {
            message: "The print settings are not valid.".into(),
            suggestion: format!("Ask an operator to fix the configuration. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        SpoolError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The document file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try sending it again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Spoolward doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions of the document or the temp directory.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        SpoolError::Serialization(_) => HumanError {
            message: "Spoolward had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        SpoolError::PlatformUnavailable => HumanError {
            message: "Printing isn't available on this machine.".into(),
            suggestion: "Spoolward can print through CUPS (Linux, macOS) or the Windows spooler.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Parse the print command's error output into a human-readable message.
fn humanize_dispatch_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("does not exist") || lower.contains("unknown printer") {
        HumanError {
            message: "The printer isn't installed anymore.".into(),
            suggestion: "Ask an operator to reinstall the printer, then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("not accepting") || lower.contains("disabled") || lower.contains("paused") {
        HumanError {
            message: "The printer is paused.".into(),
            suggestion: "Ask an operator to resume the printer queue.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("not found") || lower.contains("no such file") {
        HumanError {
            message: "The print command isn't available.".into(),
            suggestion: "The printing system on this machine may not be installed.".into(),
            retriable: false,
            severity: Severity::Permanent,
        }
    } else {
        HumanError {
            message: "The printer had a problem.".into(),
            suggestion: format!(
                "Try again. If this keeps happening, turn the printer off and on again. (Detail: {detail})"
            ),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
