// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Spoolward.

use thiserror::Error;

/// Top-level error type for all Spoolward operations.
#[derive(Debug, Error)]
pub enum SpoolError {
    // -- Admission --
    #[error("print queue is full ({capacity} jobs)")]
    QueueFull { capacity: usize },

    // -- Processing --
    #[error("no printer found: {0}")]
    PrinterNotFound(String),

    #[error("content conversion failed: {0}")]
    Conversion(String),

    #[error("print dispatch failed: {0}")]
    Dispatch(String),

    #[error(
        "printer {printer} did not clear jobs [{}] within {waited_ms} ms",
        pending.join(", ")
    )]
    ConfirmationTimeout {
        printer: String,
        pending: Vec<String>,
        waited_ms: u64,
    },

    #[error("spooler query failed: {0}")]
    Spooler(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl SpoolError {
    /// Whether the worker loop may schedule another attempt after this error.
    ///
    /// Admission and configuration errors are the caller's to fix; every
    /// failure that can happen while a job is being processed is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            SpoolError::PrinterNotFound(_)
            | SpoolError::Conversion(_)
            | SpoolError::Dispatch(_)
            | SpoolError::ConfirmationTimeout { .. }
            | SpoolError::Spooler(_)
            | SpoolError::Io(_) => true,
            SpoolError::QueueFull { .. }
            | SpoolError::Config(_)
            | SpoolError::Serialization(_)
            | SpoolError::PlatformUnavailable => false,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpoolError>;
