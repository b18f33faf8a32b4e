// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolward Print: the queue engine.  Admits print requests, serializes them
// against one printer, materializes their content, hands the PDF to the OS
// spooler and watches the spooler until the job has actually left it.

pub mod history;
pub mod queue;
pub mod resolver;
pub mod retry;
pub mod spooler;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use queue::PrintQueue;
pub use resolver::PrinterResolver;
pub use retry::{RetryDecision, RetryPolicy};
pub use tracker::{CompletionTracker, Confirmation, PollOutcome, poll_until};
