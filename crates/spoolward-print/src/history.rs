// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded status history.
//
// Keeps the latest `StatusRecord` of each job so callers can poll outcomes
// after the job has left the live queue.  Eviction is oldest-first by the
// time a job was first recorded; updating a record does not refresh it.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use spoolward_core::types::{JobId, StatusRecord};

#[derive(Debug)]
pub struct StatusHistory {
    limit: usize,
    records: HashMap<JobId, StatusRecord>,
    order: VecDeque<JobId>,
}

impl StatusHistory {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            records: HashMap::with_capacity(limit.min(1024)),
            order: VecDeque::with_capacity(limit.min(1024)),
        }
    }

    /// Store `record`, replacing any earlier record of the same job.
    pub fn record(&mut self, record: StatusRecord) {
        let id = record.id;
        if self.records.insert(id, record).is_none() {
            self.order.push_back(id);
        }

        while self.order.len() > self.limit {
            if let Some(evicted) = self.order.pop_front() {
                self.records.remove(&evicted);
                debug!(job_id = %evicted, "status record evicted");
            }
        }
    }

    pub fn get(&self, id: &JobId) -> Option<&StatusRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoolward_core::types::{ContentType, JobStatus, PrintJob, PrintOptions};

    fn record() -> StatusRecord {
        let job = PrintJob::new("x".into(), ContentType::Text, PrintOptions::default());
        StatusRecord::from_job(&job)
    }

    #[test]
    fn update_replaces_in_place() {
        let mut history = StatusHistory::new(4);
        let mut r = record();
        history.record(r.clone());
        r.status = JobStatus::Completed;
        history.record(r.clone());

        assert_eq!(history.len(), 1);
        assert_eq!(history.get(&r.id).unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut history = StatusHistory::new(2);
        let (a, b, c) = (record(), record(), record());
        history.record(a.clone());
        history.record(b.clone());
        history.record(c.clone());

        assert_eq!(history.len(), 2);
        assert!(history.get(&a.id).is_none());
        assert!(history.get(&b.id).is_some());
        assert!(history.get(&c.id).is_some());
    }

    #[test]
    fn finishing_does_not_refresh_age() {
        let mut history = StatusHistory::new(2);
        let (mut a, b, c) = (record(), record(), record());
        history.record(a.clone());
        history.record(b.clone());
        a.status = JobStatus::Completed;
        history.record(a.clone());
        history.record(c.clone());

        // `a` is still the oldest entry even though it was updated last.
        assert!(history.get(&a.id).is_none());
        assert!(history.get(&b.id).is_some());
    }

    #[test]
    fn zero_limit_keeps_one_record() {
        let mut history = StatusHistory::new(0);
        history.record(record());
        history.record(record());
        assert_eq!(history.len(), 1);
        assert!(!history.is_empty());
    }
}
