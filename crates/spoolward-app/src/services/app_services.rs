// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: loads the configuration, builds the platform
// spooler, the HTML renderer and the print queue, and offers the
// submit-and-follow flow the CLI needs.

use std::path::{Path, PathBuf};

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use spoolward_bridge::platform_spooler;
use spoolward_core::SpoolConfig;
use spoolward_core::error::{Result, SpoolError};
use spoolward_core::types::{ContentType, JobId, PrintOptions, QueueEvent, StatusRecord};
use spoolward_document::{Materializer, renderer_for};
use spoolward_print::PrintQueue;

use super::data_dir;

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// Resolve and load the configuration.
///
/// An explicit path must exist.  Without one, the data-directory config is
/// used when present and the built-in defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<(SpoolConfig, ConfigSource)> {
    resolve_config(explicit, &data_dir::default_config_path())
}

fn resolve_config(explicit: Option<&Path>, fallback: &Path) -> Result<(SpoolConfig, ConfigSource)> {
    let path = match explicit {
        Some(path) => path,
        None if fallback.is_file() => fallback,
        None => {
            debug!(path = %fallback.display(), "no config file, using defaults");
            return Ok((SpoolConfig::default(), ConfigSource::Defaults));
        }
    };

    let config = SpoolConfig::load(path).map_err(|e| match e {
        SpoolError::Config(_) => e,
        other => SpoolError::Config(format!("{}: {other}", path.display())),
    })?;
    Ok((config, ConfigSource::File(path.to_path_buf())))
}

/// Shared application services.  Cheap to clone.
#[derive(Clone)]
pub struct AppServices {
    queue: PrintQueue,
}

impl AppServices {
    /// Build every backend service for this platform.
    pub fn init(config: SpoolConfig) -> Result<Self> {
        let spooler = platform_spooler();
        let renderer = renderer_for(&config)?;
        info!(
            platform = spooler.platform_name(),
            renderer = renderer.name(),
            "initialising services"
        );

        let materializer = Materializer::new(renderer, config.temp_dir.clone());
        let queue = PrintQueue::new(&config, spooler, materializer)?;
        Ok(Self { queue })
    }

    pub fn queue(&self) -> &PrintQueue {
        &self.queue
    }

    /// Submit one job and follow it to a terminal status, handing every
    /// event about it to `on_event`.
    pub async fn print_and_wait<F>(
        &self,
        content: String,
        content_type: ContentType,
        options: PrintOptions,
        mut on_event: F,
    ) -> Result<StatusRecord>
    where
        F: FnMut(&QueueEvent),
    {
        let mut events = self.queue.subscribe();
        let id = self.queue.submit(content, content_type, options)?;
        let mut last_seen: Option<StatusRecord> = None;

        loop {
            match events.recv().await {
                Ok(event) if event.job_id() == id => {
                    on_event(&event);
                    if let QueueEvent::JobStatus(record) = &event {
                        last_seen = Some(record.clone());
                    }
                    if matches!(
                        event,
                        QueueEvent::Completed(_) | QueueEvent::Failed(_) | QueueEvent::Cancelled(_)
                    ) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }

        self.queue.wait_idle().await;
        final_status(id, self.queue.get_job_status(id), last_seen)
    }
}

/// The job's settled status: the queue's history when it still has the
/// record, otherwise the last status update seen on the event stream.
fn final_status(
    id: JobId,
    recorded: Option<StatusRecord>,
    last_seen: Option<StatusRecord>,
) -> Result<StatusRecord> {
    recorded.or(last_seen).ok_or_else(|| {
        SpoolError::Io(std::io::Error::other(format!(
            "event stream closed before job {id} reported a status"
        )))
    })
}
