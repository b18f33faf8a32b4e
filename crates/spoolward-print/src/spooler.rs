// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spooler observer: async access to the blocking OS bridge.
//
// The bridge traits are synchronous (they shell out to lpstat/lp or
// PowerShell), so every call runs on tokio's blocking pool.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use spoolward_bridge::PlatformSpooler;
use spoolward_core::error::{Result, SpoolError};

/// Run a blocking bridge or filesystem call off the async worker.
pub(crate) async fn run_blocking<T, F>(what: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        SpoolError::Io(std::io::Error::other(format!("{what} task failed: {e}")))
    })?
}

/// Watches one platform spooler's outstanding jobs.
#[derive(Clone)]
pub struct SpoolerObserver {
    spooler: Arc<dyn PlatformSpooler>,
}

impl SpoolerObserver {
    pub fn new(spooler: Arc<dyn PlatformSpooler>) -> Self {
        Self { spooler }
    }

    /// Whether snapshots say anything about the spooler at all.
    pub fn can_observe(&self) -> bool {
        self.spooler.can_enumerate_jobs()
    }

    /// Outstanding job ids on `printer`.
    ///
    /// `None` means nothing is known: the platform cannot enumerate jobs or
    /// the enumeration failed.  It never stands for an empty queue.
    #[instrument(skip(self))]
    pub async fn snapshot_job_ids(&self, printer: &str) -> Option<HashSet<String>> {
        if !self.can_observe() {
            return None;
        }

        let spooler = Arc::clone(&self.spooler);
        let name = printer.to_string();
        match run_blocking("job enumeration", move || spooler.list_job_ids(&name)).await {
            Ok(ids) => {
                debug!(count = ids.len(), "spooler snapshot");
                Some(ids.into_iter().collect())
            }
            Err(e) => {
                warn!(error = %e, "spooler snapshot failed");
                None
            }
        }
    }

    /// Hand a file to the OS print command.
    ///
    /// Success only means the spooler accepted the file.  Every failure is
    /// reported as `SpoolError::Dispatch` so the worker retries it.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn submit(&self, path: PathBuf, printer: &str) -> Result<()> {
        let spooler = Arc::clone(&self.spooler);
        let name = printer.to_string();
        run_blocking("print submission", move || spooler.print_file(&path, &name))
            .await
            .map_err(|e| match e {
                SpoolError::Dispatch(_) => e,
                other => SpoolError::Dispatch(other.to_string()),
            })
    }
}
