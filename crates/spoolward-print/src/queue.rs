// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory priority print queue with a single-flight worker.
//
// Jobs wait in one ordered list.  A single worker task walks it, always
// taking the earliest `Queued` job, so at most one job is ever `Printing`
// against the device.  Queue state lives behind a `std::sync::Mutex` that
// is never held across an `.await`; the worker only suspends while talking
// to the OS or the renderer.
//
// Every status change is written to the bounded history and broadcast as a
// `QueueEvent`, so callers can follow a job after it leaves the queue.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, instrument, warn};

use spoolward_bridge::PlatformSpooler;
use spoolward_core::SpoolConfig;
use spoolward_core::error::{Result, SpoolError};
use spoolward_core::types::{
    ContentType, JobId, JobStatus, PrintJob, PrintOptions, Priority, PrinterDevice, QueueEvent,
    QueueStats, StatusRecord,
};
use spoolward_document::{Artifact, Materializer};

use crate::history::StatusHistory;
use crate::resolver::PrinterResolver;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::spooler::{SpoolerObserver, run_blocking};
use crate::tracker::{CompletionTracker, Confirmation, TrackerSettings};

/// Buffered events per subscriber before slow receivers start lagging.
const EVENT_CAPACITY: usize = 256;

/// Position at which a job of `priority` enters `jobs`: before the first job
/// of strictly lower weight, otherwise at the end.
pub fn insertion_index(jobs: &[PrintJob], priority: Priority) -> usize {
    let weight = priority.weight();
    jobs.iter()
        .position(|job| job.priority.weight() < weight)
        .unwrap_or(jobs.len())
}

struct QueueState {
    jobs: Vec<PrintJob>,
    history: StatusHistory,
    completed: u64,
    failed: u64,
    /// Set while a worker traversal is running.
    processing: bool,
}

struct Inner {
    state: Mutex<QueueState>,
    events: broadcast::Sender<QueueEvent>,
    busy: watch::Sender<bool>,
    spooler: Arc<dyn PlatformSpooler>,
    resolver: PrinterResolver,
    materializer: Materializer,
    tracker: CompletionTracker,
    retry: RetryPolicy,
    capacity: usize,
}

/// Handle to the print queue.  Clones share the same queue.
#[derive(Clone)]
pub struct PrintQueue {
    inner: Arc<Inner>,
}

impl PrintQueue {
    /// Build a queue from the configuration.
    ///
    /// Fails with `SpoolError::Config` when the configuration is invalid.
    pub fn new(
        config: &SpoolConfig,
        spooler: Arc<dyn PlatformSpooler>,
        materializer: Materializer,
    ) -> Result<Self> {
        config.validate()?;
        let resolver = PrinterResolver::new(config.printer_pattern.as_deref())?;
        let tracker = CompletionTracker::new(
            SpoolerObserver::new(Arc::clone(&spooler)),
            TrackerSettings::from_config(config),
        );
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (busy, _) = watch::channel(false);

        info!(
            platform = spooler.platform_name(),
            capacity = config.max_queue_size,
            max_attempts = config.max_retry_attempts,
            "print queue ready"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState {
                    jobs: Vec::new(),
                    history: StatusHistory::new(config.history_limit),
                    completed: 0,
                    failed: 0,
                    processing: false,
                }),
                events,
                busy,
                spooler,
                resolver,
                materializer,
                tracker,
                retry: RetryPolicy::from_config(config),
                capacity: config.max_queue_size,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: QueueEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    /// Record a status change in history and broadcast it.
    fn publish(&self, state: &mut QueueState, record: StatusRecord) {
        state.history.record(record.clone());
        self.emit(QueueEvent::JobStatus(record));
    }

    // -- Operations ----------------------------------------------------------

    /// Admit a print request and return its id.
    ///
    /// Rejects with `SpoolError::QueueFull` when the queue is at capacity.
    /// Processing starts in the background; this must be called from within
    /// a tokio runtime.
    #[instrument(skip(self, content), fields(content_type = %content_type, copies = options.copies))]
    pub fn submit(
        &self,
        content: impl Into<String>,
        content_type: ContentType,
        options: PrintOptions,
    ) -> Result<JobId> {
        let job = PrintJob::new(content.into(), content_type, options);
        let id = job.id;

        {
            let mut state = self.lock();
            if state.jobs.len() >= self.inner.capacity {
                warn!(capacity = self.inner.capacity, "queue full, rejecting job");
                return Err(SpoolError::QueueFull {
                    capacity: self.inner.capacity,
                });
            }

            let index = insertion_index(&state.jobs, job.priority);
            state.jobs.insert(index, job.clone());
            self.publish(&mut state, StatusRecord::from_job(&job));
            info!(job_id = %id, priority = ?job.priority, position = index, "job queued");
            self.emit(QueueEvent::Queued(job));
        }

        self.kick();
        Ok(id)
    }

    /// Cancel a job that has not started printing.
    ///
    /// Returns `false` for printing, finished and unknown jobs.
    #[instrument(skip(self))]
    pub fn cancel(&self, id: JobId) -> bool {
        let mut state = self.lock();
        let Some(index) = state.jobs.iter().position(|job| job.id == id) else {
            debug!("cancel: job not in queue");
            return false;
        };
        if state.jobs[index].status == JobStatus::Printing {
            info!("cancel refused: job is printing");
            return false;
        }

        let mut job = state.jobs.remove(index);
        job.status = JobStatus::Cancelled;
        self.publish(&mut state, StatusRecord::from_job(&job));
        info!("job cancelled");
        self.emit(QueueEvent::Cancelled(job));
        true
    }

    /// Latest status of a job, including jobs that already left the queue.
    pub fn get_job_status(&self, id: JobId) -> Option<StatusRecord> {
        let state = self.lock();
        state.history.get(&id).cloned().or_else(|| {
            state
                .jobs
                .iter()
                .find(|job| job.id == id)
                .map(StatusRecord::from_job)
        })
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            completed: state.completed,
            failed: state.failed,
            queued: state.jobs.len(),
            processing: state.processing,
        }
    }

    /// Snapshot of the live queue in processing order.
    pub fn queue(&self) -> Vec<PrintJob> {
        self.lock().jobs.clone()
    }

    /// Advisory backpressure signal for health reporting.
    pub fn is_ready(&self) -> bool {
        let state = self.lock();
        !state.processing || state.jobs.len() < self.inner.capacity
    }

    /// Printers currently known to the OS.
    pub async fn list_printers(&self) -> Result<Vec<PrinterDevice>> {
        let spooler = Arc::clone(&self.inner.spooler);
        run_blocking("printer listing", move || spooler.list_printers()).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.events.subscribe()
    }

    /// Resolve once no worker traversal is running.
    pub async fn wait_idle(&self) {
        let mut busy = self.inner.busy.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = busy.wait_for(|busy| !*busy).await;
    }

    // -- Worker --------------------------------------------------------------

    /// Start a worker traversal unless one is already running.
    fn kick(&self) {
        {
            let mut state = self.lock();
            if state.processing {
                return;
            }
            state.processing = true;
            self.inner.busy.send_replace(true);
        }

        let queue = self.clone();
        tokio::spawn(async move { queue.run_worker().await });
    }

    async fn run_worker(self) {
        debug!("worker started");
        while let Some(job) = self.start_next() {
            self.process_job(job).await;
        }
        debug!("worker idle");
    }

    /// Move the earliest queued job to `Printing`, or end the traversal.
    ///
    /// The traversal flag is cleared under the same lock that found the
    /// queue empty, so a concurrent `submit` either sees the flag set and its
    /// job is picked up here, or sees it clear and starts a new worker.
    fn start_next(&self) -> Option<PrintJob> {
        let mut state = self.lock();
        let Some(job) = state
            .jobs
            .iter_mut()
            .find(|job| job.status == JobStatus::Queued)
        else {
            state.processing = false;
            self.inner.busy.send_replace(false);
            return None;
        };

        job.status = JobStatus::Printing;
        job.attempts += 1;
        let job = job.clone();
        self.publish(&mut state, StatusRecord::from_job(&job));
        info!(job_id = %job.id, attempt = job.attempts, "job printing");
        Some(job)
    }

    #[instrument(skip(self, job), fields(job_id = %job.id, attempt = job.attempts))]
    async fn process_job(&self, job: PrintJob) {
        match self.attempt(&job).await {
            Ok(confirmation) => self.finish_completed(job.id, confirmation),
            Err(err) => match self.inner.retry.decide(&err, job.attempts) {
                RetryDecision::RetryAfter(delay) => {
                    self.requeue(job.id, &err);
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp | RetryDecision::Exhausted => {
                    self.finish_failed(job.id, &err)
                }
            },
        }
    }

    /// One processing attempt: resolve, materialize, dispatch every copy.
    async fn attempt(&self, job: &PrintJob) -> Result<Confirmation> {
        let printer = self.resolve_printer().await?;
        let artifact = self.materialize(job).await?;
        let outcome = self
            .inner
            .tracker
            .dispatch_and_confirm(artifact.path(), &printer.name, job.copies)
            .await;
        artifact.release();
        outcome
    }

    async fn resolve_printer(&self) -> Result<PrinterDevice> {
        let spooler = Arc::clone(&self.inner.spooler);
        let resolver = self.inner.resolver.clone();
        let resolved = run_blocking("printer resolution", move || {
            resolver.find_configured(spooler.as_ref())
        })
        .await
        .map_err(|e| SpoolError::PrinterNotFound(format!("cannot list printers: {e}")))?;

        resolved.ok_or_else(|| {
            SpoolError::PrinterNotFound(match self.inner.resolver.pattern() {
                Some(pattern) => format!("no printer available (pattern {pattern:?})"),
                None => "no printer available".into(),
            })
        })
    }

    async fn materialize(&self, job: &PrintJob) -> Result<Artifact> {
        let materializer = self.inner.materializer.clone();
        let job = job.clone();
        run_blocking("materialization", move || materializer.materialize(&job))
            .await
            .map_err(|e| match e {
                SpoolError::Conversion(_) => e,
                other => SpoolError::Conversion(other.to_string()),
            })
    }

    fn finish_completed(&self, id: JobId, confirmation: Confirmation) {
        let mut state = self.lock();
        let Some(index) = state.jobs.iter().position(|job| job.id == id) else {
            return;
        };
        let mut job = state.jobs.remove(index);
        job.status = JobStatus::Completed;

        let mut record = StatusRecord::from_job(&job);
        record.confirmed = Some(confirmation == Confirmation::Confirmed);
        self.publish(&mut state, record);
        state.completed += 1;

        if confirmation == Confirmation::Unconfirmed {
            warn!(job_id = %id, attempts = job.attempts, "job completed without spooler confirmation");
        } else {
            info!(job_id = %id, attempts = job.attempts, "job completed");
        }
        self.emit(QueueEvent::Completed(job));
    }

    fn requeue(&self, id: JobId, err: &SpoolError) {
        let mut state = self.lock();
        let Some(job) = state.jobs.iter_mut().find(|job| job.id == id) else {
            return;
        };
        job.status = JobStatus::Queued;
        job.error = Some(err.to_string());
        let record = StatusRecord::from_job(job);
        warn!(job_id = %id, attempt = record.attempts, error = %err, "attempt failed, requeued");
        self.publish(&mut state, record);
    }

    fn finish_failed(&self, id: JobId, err: &SpoolError) {
        let mut state = self.lock();
        let Some(index) = state.jobs.iter().position(|job| job.id == id) else {
            return;
        };
        let mut job = state.jobs.remove(index);
        job.status = JobStatus::Failed;
        job.error = Some(err.to_string());
        self.publish(&mut state, StatusRecord::from_job(&job));
        state.failed += 1;

        error!(job_id = %id, attempts = job.attempts, error = %err, "job failed");
        self.emit(QueueEvent::Failed(job));
    }
}
