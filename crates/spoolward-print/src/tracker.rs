// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Completion tracker: dispatch a PDF and watch the spooler until it is gone.
//
// The OS spooler has no push notifications, only enumeration.  Each copy is
// therefore confirmed in two polling phases that share one deadline:
//
//   A  wait for a job id that was not in the pre-dispatch snapshot
//   B  wait for every such id to leave the spooler
//
// A deadline in phase A is accepted as an unconfirmed success: the job may
// have come and gone between two polls.  A deadline in phase B means the
// printer is holding the job and is reported as `ConfirmationTimeout`.
//
// A failed enumeration says nothing about the queue.  Before dispatch it
// leaves no baseline, so the copy is accepted as unconfirmed; during either
// phase the poll simply counts as not ready.

use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use spoolward_core::SpoolConfig;
use spoolward_core::error::{Result, SpoolError};

use crate::spooler::SpoolerObserver;

/// Outcome of a bounded poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready(T),
    TimedOut,
}

/// Run `check` now and then every `interval` until it yields a value or
/// `deadline` passes.  The check always gets one run at or after the deadline.
pub async fn poll_until<T, F, Fut>(interval: Duration, deadline: Instant, mut check: F) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    loop {
        if let Some(value) = check().await {
            return PollOutcome::Ready(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return PollOutcome::TimedOut;
        }
        sleep(interval.min(deadline - now)).await;
    }
}

/// Whether every copy of a job was seen leaving the spooler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    /// At least one copy was accepted on the strength of the submission call.
    Unconfirmed,
}

impl Confirmation {
    fn and(self, other: Confirmation) -> Confirmation {
        match (self, other) {
            (Confirmation::Confirmed, Confirmation::Confirmed) => Confirmation::Confirmed,
            _ => Confirmation::Unconfirmed,
        }
    }
}

/// Poll timings for both phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    pub start_interval: Duration,
    pub completion_interval: Duration,
    /// Per-copy deadline, measured from the moment the spooler accepted it.
    pub timeout: Duration,
}

impl TrackerSettings {
    pub fn from_config(config: &SpoolConfig) -> Self {
        Self {
            start_interval: config.start_poll_interval(),
            completion_interval: config.completion_poll_interval(),
            timeout: config.confirm_timeout(),
        }
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self::from_config(&SpoolConfig::default())
    }
}

#[derive(Clone)]
pub struct CompletionTracker {
    observer: SpoolerObserver,
    settings: TrackerSettings,
}

impl CompletionTracker {
    pub fn new(observer: SpoolerObserver, settings: TrackerSettings) -> Self {
        Self { observer, settings }
    }

    /// Print `copies` copies of `artifact` one after another, confirming each
    /// before the next is dispatched.
    #[instrument(skip(self, artifact), fields(path = %artifact.display()))]
    pub async fn dispatch_and_confirm(
        &self,
        artifact: &Path,
        printer: &str,
        copies: u32,
    ) -> Result<Confirmation> {
        let copies = copies.max(1);
        let mut overall = Confirmation::Confirmed;
        for copy in 1..=copies {
            let confirmation = self.print_copy(artifact, printer, copy).await?;
            overall = overall.and(confirmation);
        }
        Ok(overall)
    }

    async fn print_copy(&self, artifact: &Path, printer: &str, copy: u32) -> Result<Confirmation> {
        let observing = self.observer.can_observe();
        let before = self.observer.snapshot_job_ids(printer).await;

        self.observer.submit(artifact.to_path_buf(), printer).await?;
        info!(printer, copy, "copy accepted by spooler");

        if !observing {
            warn!(printer, copy, "spooler cannot list jobs, trusting the submission call");
            return Ok(Confirmation::Unconfirmed);
        }
        let Some(before) = before else {
            warn!(printer, copy, "no spooler snapshot before dispatch, trusting the submission call");
            return Ok(Confirmation::Unconfirmed);
        };

        let deadline = Instant::now() + self.settings.timeout;
        let observer = &self.observer;
        let before = &before;

        // Phase A: a new job id shows up.
        let started = poll_until(self.settings.start_interval, deadline, move || async move {
            let Some(current) = observer.snapshot_job_ids(printer).await else {
                return None;
            };
            let new: HashSet<String> = current.difference(before).cloned().collect();
            (!new.is_empty()).then_some(new)
        })
        .await;

        let tracked = match started {
            PollOutcome::Ready(tracked) => tracked,
            PollOutcome::TimedOut => {
                warn!(
                    printer,
                    copy,
                    waited_ms = self.settings.timeout.as_millis() as u64,
                    "no new spooler job observed, accepting as unconfirmed"
                );
                return Ok(Confirmation::Unconfirmed);
            }
        };
        debug!(printer, copy, jobs = ?tracked, "spooler job started");

        // Phase B: every tracked id is gone.
        let tracked_ref = &tracked;
        let finished = poll_until(self.settings.completion_interval, deadline, move || async move {
            let Some(current) = observer.snapshot_job_ids(printer).await else {
                return None;
            };
            tracked_ref.is_disjoint(&current).then_some(())
        })
        .await;

        match finished {
            PollOutcome::Ready(()) => {
                info!(printer, copy, "spooler job cleared");
                Ok(Confirmation::Confirmed)
            }
            PollOutcome::TimedOut => {
                let mut pending: Vec<String> = tracked.into_iter().collect();
                pending.sort();
                Err(SpoolError::ConfirmationTimeout {
                    printer: printer.to_string(),
                    pending,
                    waited_ms: self.settings.timeout.as_millis() as u64,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::testing::{FakeSpooler, SpoolerBehaviour};

    fn settings(timeout_ms: u64) -> TrackerSettings {
        TrackerSettings {
            start_interval: Duration::from_millis(5),
            completion_interval: Duration::from_millis(5),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    fn tracker(fake: Arc<FakeSpooler>, timeout_ms: u64) -> CompletionTracker {
        CompletionTracker::new(SpoolerObserver::new(fake), settings(timeout_ms))
    }

    #[tokio::test]
    async fn poll_ready_immediately() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let outcome = poll_until(Duration::from_secs(1), deadline, || async { Some(7) }).await;
        assert_eq!(outcome, PollOutcome::Ready(7));
    }

    #[tokio::test]
    async fn poll_ready_after_some_checks() {
        let calls = AtomicU32::new(0);
        let deadline = Instant::now() + Duration::from_secs(5);
        let outcome = poll_until(Duration::from_millis(1), deadline, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { (n == 3).then_some(n) }
        })
        .await;
        assert_eq!(outcome, PollOutcome::Ready(3));
    }

    #[tokio::test]
    async fn poll_times_out_after_a_final_check() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        let outcome: PollOutcome<()> = poll_until(
            Duration::from_millis(10),
            started + Duration::from_millis(35),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { None }
            },
        )
        .await;
        assert_eq!(outcome, PollOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(35));
        assert!(calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn job_that_clears_is_confirmed() {
        let fake = Arc::new(FakeSpooler::new(SpoolerBehaviour::Clears { polls: 2 }));
        let result = tracker(fake.clone(), 2_000)
            .dispatch_and_confirm(Path::new("/tmp/a.pdf"), "Kiosk", 2)
            .await
            .unwrap();
        assert_eq!(result, Confirmation::Confirmed);
        assert_eq!(fake.dispatched().len(), 2);
    }

    #[tokio::test]
    async fn pre_existing_jobs_are_not_tracked() {
        let fake = Arc::new(FakeSpooler::new(SpoolerBehaviour::Clears { polls: 1 }));
        fake.seed_job("Kiosk-old");
        let result = tracker(fake, 2_000)
            .dispatch_and_confirm(Path::new("/tmp/a.pdf"), "Kiosk", 1)
            .await
            .unwrap();
        assert_eq!(result, Confirmation::Confirmed);
    }

    #[tokio::test]
    async fn unobserved_start_is_ambiguous_success() {
        let fake = Arc::new(FakeSpooler::new(SpoolerBehaviour::Invisible));
        let result = tracker(fake, 40)
            .dispatch_and_confirm(Path::new("/tmp/a.pdf"), "Kiosk", 1)
            .await
            .unwrap();
        assert_eq!(result, Confirmation::Unconfirmed);
    }

    #[tokio::test]
    async fn unenumerable_platform_skips_polling() {
        let fake = Arc::new(FakeSpooler::new(SpoolerBehaviour::Untracked));
        let started = std::time::Instant::now();
        let result = tracker(fake.clone(), 60_000)
            .dispatch_and_confirm(Path::new("/tmp/a.pdf"), "Kiosk", 3)
            .await
            .unwrap();
        assert_eq!(result, Confirmation::Unconfirmed);
        assert_eq!(fake.dispatched().len(), 3);
        assert_eq!(fake.enumerations(), 0);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn stuck_job_times_out() {
        let fake = Arc::new(FakeSpooler::new(SpoolerBehaviour::Stuck));
        let err = tracker(fake, 40)
            .dispatch_and_confirm(Path::new("/tmp/a.pdf"), "Kiosk", 1)
            .await
            .unwrap_err();
        match err {
            SpoolError::ConfirmationTimeout { printer, pending, waited_ms } => {
                assert_eq!(printer, "Kiosk");
                assert_eq!(pending, vec!["Kiosk-1".to_string()]);
                assert_eq!(waited_ms, 40);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn failed_baseline_does_not_track_older_jobs() {
        let fake = Arc::new(
            FakeSpooler::new(SpoolerBehaviour::Clears { polls: 1 }).failing_enumeration_on(&[1]),
        );
        fake.seed_job("Kiosk-old");
        let result = tracker(fake.clone(), 50)
            .dispatch_and_confirm(Path::new("/tmp/a.pdf"), "Kiosk", 1)
            .await
            .unwrap();
        assert_eq!(result, Confirmation::Unconfirmed);
        assert_eq!(fake.dispatched().len(), 1);
        assert_eq!(fake.enumerations(), 1);
    }

    #[tokio::test]
    async fn failed_poll_does_not_confirm_a_stuck_job() {
        // Call 1 is the baseline, call 2 sees Kiosk-1 start, call 3 fails.
        let fake = Arc::new(FakeSpooler::new(SpoolerBehaviour::Stuck).failing_enumeration_on(&[3]));
        let err = tracker(fake.clone(), 40)
            .dispatch_and_confirm(Path::new("/tmp/a.pdf"), "Kiosk", 1)
            .await
            .unwrap_err();
        match err {
            SpoolError::ConfirmationTimeout { pending, .. } => {
                assert_eq!(pending, vec!["Kiosk-1".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fake.enumerations() > 3);
    }

    #[tokio::test]
    async fn failed_poll_while_waiting_for_start_keeps_polling() {
        let fake = Arc::new(
            FakeSpooler::new(SpoolerBehaviour::Clears { polls: 2 }).failing_enumeration_on(&[2]),
        );
        let result = tracker(fake, 2_000)
            .dispatch_and_confirm(Path::new("/tmp/a.pdf"), "Kiosk", 1)
            .await
            .unwrap();
        assert_eq!(result, Confirmation::Confirmed);
    }

    #[tokio::test]
    async fn dispatch_failure_stops_remaining_copies() {
        let fake = Arc::new(FakeSpooler::new(SpoolerBehaviour::Clears { polls: 1 }).failing_dispatch());
        let err = tracker(fake.clone(), 2_000)
            .dispatch_and_confirm(Path::new("/tmp/a.pdf"), "Kiosk", 3)
            .await
            .unwrap_err();
        assert!(matches!(err, SpoolError::Dispatch(_)));
        assert_eq!(fake.dispatched().len(), 1);
    }
}
