// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Spoolward print queue.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SpoolError;

/// Unique identifier for a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the `content` of a job is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Markup rendered to PDF by the HTML renderer.
    Html,
    /// Plain text, escaped and wrapped in a monospace HTML page.
    Text,
    /// Path to an existing PDF owned by the caller.
    Pdf,
    /// Base64 PDF bytes, optionally with a `data:` URI prefix.
    PdfBase64,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
            Self::Pdf => "pdf",
            Self::PdfBase64 => "pdf_base64",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = SpoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "text" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            "pdf_base64" => Ok(Self::PdfBase64),
            other => Err(SpoolError::Config(format!("unknown content type: {other}"))),
        }
    }
}

/// Scheduling priority of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    /// Ordering weight used by priority insertion (higher runs sooner).
    pub fn weight(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Normal => 2,
            Self::High => 3,
        }
    }
}

impl FromStr for Priority {
    type Err = SpoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            other => Err(SpoolError::Config(format!("unknown priority: {other}"))),
        }
    }
}

/// Lifecycle states of a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for the worker loop (fresh or after a failed attempt).
    Queued,
    /// Owned by the worker loop; at most one job is in this state.
    Printing,
    /// Left the spooler (or was accepted where the spooler can't be observed).
    Completed,
    /// Retries exhausted; see the job's `error` field.
    Failed,
    /// Removed by the caller before printing started.
    Cancelled,
}

impl JobStatus {
    /// Terminal statuses never transition again and are never in the queue.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Caller-supplied options for a print request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintOptions {
    pub copies: u32,
    pub priority: Priority,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            copies: 1,
            priority: Priority::Normal,
        }
    }
}

/// A print job as held by the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJob {
    pub id: JobId,
    pub content: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub copies: u32,
    pub priority: Priority,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    /// Number of processing attempts so far.
    pub attempts: u32,
    /// Message of the last failed attempt.
    pub error: Option<String>,
}

impl PrintJob {
    pub fn new(content: String, content_type: ContentType, options: PrintOptions) -> Self {
        Self {
            id: JobId::new(),
            content,
            content_type,
            copies: options.copies.max(1),
            priority: options.priority,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            attempts: 0,
            error: None,
        }
    }
}

/// Point-in-time projection of a job, kept after the job leaves the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: JobId,
    pub status: JobStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub attempts: u32,
    /// Set on completion: `Some(false)` when a copy could not be observed
    /// leaving the spooler and was accepted on the submission call alone.
    pub confirmed: Option<bool>,
}

impl StatusRecord {
    pub fn from_job(job: &PrintJob) -> Self {
        Self {
            id: job.id,
            status: job.status,
            error: job.error.clone(),
            created_at: job.created_at,
            updated_at: Utc::now(),
            attempts: job.attempts,
            confirmed: None,
        }
    }
}

/// A printer as reported by the OS. Re-derived on every listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterDevice {
    pub name: String,
    pub is_default: bool,
}

/// Counters exposed to health reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub completed: u64,
    pub failed: u64,
    pub queued: usize,
    pub processing: bool,
}

/// Notifications published by the queue.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    Queued(PrintJob),
    JobStatus(StatusRecord),
    Completed(PrintJob),
    Failed(PrintJob),
    Cancelled(PrintJob),
}

impl QueueEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Queued(_) => "queued",
            Self::JobStatus(_) => "job-status",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
            Self::Cancelled(_) => "cancelled",
        }
    }

    /// The job the event concerns.
    pub fn job_id(&self) -> JobId {
        match self {
            Self::Queued(job) | Self::Completed(job) | Self::Failed(job) | Self::Cancelled(job) => {
                job.id
            }
            Self::JobStatus(record) => record.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_weights_are_ordered() {
        assert!(Priority::High.weight() > Priority::Normal.weight());
        assert!(Priority::Normal.weight() > Priority::Low.weight());
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn content_type_parses_wire_names() {
        assert_eq!("pdf_base64".parse::<ContentType>().unwrap(), ContentType::PdfBase64);
        assert_eq!("HTML".parse::<ContentType>().unwrap(), ContentType::Html);
        assert!("docx".parse::<ContentType>().is_err());
    }

    #[test]
    fn content_type_serializes_snake_case() {
        let json = serde_json::to_string(&ContentType::PdfBase64).unwrap();
        assert_eq!(json, "\"pdf_base64\"");
    }

    #[test]
    fn new_job_starts_queued_with_zero_attempts() {
        let job = PrintJob::new("hello".into(), ContentType::Text, PrintOptions::default());
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.copies, 1);
        assert!(job.error.is_none());
    }

    #[test]
    fn zero_copies_is_normalised() {
        let job = PrintJob::new(
            "x".into(),
            ContentType::Text,
            PrintOptions {
                copies: 0,
                priority: Priority::Low,
            },
        );
        assert_eq!(job.copies, 1);
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Printing.is_terminal());
    }

    #[test]
    fn event_names_match_wire_protocol() {
        let job = PrintJob::new("x".into(), ContentType::Html, PrintOptions::default());
        assert_eq!(QueueEvent::Queued(job.clone()).name(), "queued");
        assert_eq!(
            QueueEvent::JobStatus(StatusRecord::from_job(&job)).name(),
            "job-status"
        );
        assert_eq!(QueueEvent::Cancelled(job.clone()).job_id(), job.id);
    }
}
