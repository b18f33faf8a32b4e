// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory spooler and renderer used by the engine's unit tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use spoolward_bridge::{JobEnumeration, PlatformSpooler, PrintSubmission, PrinterEnumeration};
use spoolward_core::error::{Result, SpoolError};
use spoolward_core::types::PrinterDevice;
use spoolward_document::{HtmlRenderer, Materializer};

/// What a submitted job does inside the fake spooler.
#[derive(Debug, Clone, Copy)]
pub enum SpoolerBehaviour {
    /// The platform cannot enumerate jobs at all.
    Untracked,
    /// Enumeration works but submitted jobs never show up.
    Invisible,
    /// Each job is listed by this many enumerations, then disappears.
    Clears { polls: u32 },
    /// Jobs show up and never leave.
    Stuck,
}

#[derive(Debug, Clone)]
pub struct Dispatched {
    pub path: PathBuf,
    pub printer: String,
    /// Whether the artifact existed when the spooler received it.
    pub existed: bool,
}

struct Outstanding {
    id: String,
    remaining: Option<u32>,
}

#[derive(Default)]
struct FakeState {
    next_id: u32,
    outstanding: Vec<Outstanding>,
    dispatched: Vec<Dispatched>,
}

pub struct FakeSpooler {
    behaviour: SpoolerBehaviour,
    printers: Vec<PrinterDevice>,
    fail_listing: bool,
    fail_enumeration: bool,
    /// 1-based enumeration calls that fail while the others succeed.
    failing_calls: Vec<usize>,
    dispatch_error: Option<fn() -> SpoolError>,
    /// How many dispatches, counted from the first, fail with `dispatch_error`.
    failing_dispatches: usize,
    dispatch_delay: Duration,
    enumerations: AtomicUsize,
    state: Mutex<FakeState>,
}

impl FakeSpooler {
    /// A spooler with a single default printer named `Kiosk`.
    pub fn new(behaviour: SpoolerBehaviour) -> Self {
        Self {
            behaviour,
            printers: vec![PrinterDevice {
                name: "Kiosk".into(),
                is_default: true,
            }],
            fail_listing: false,
            fail_enumeration: false,
            failing_calls: Vec::new(),
            dispatch_error: None,
            failing_dispatches: 0,
            dispatch_delay: Duration::ZERO,
            enumerations: AtomicUsize::new(0),
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_printers(mut self, printers: Vec<PrinterDevice>) -> Self {
        self.printers = printers;
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn failing_enumeration(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }

    pub fn failing_enumeration_on(mut self, calls: &[usize]) -> Self {
        self.failing_calls = calls.to_vec();
        self
    }

    pub fn failing_dispatch(self) -> Self {
        self.failing_dispatches(usize::MAX)
    }

    /// Only the first `count` dispatches fail.
    pub fn failing_dispatches(mut self, count: usize) -> Self {
        self.dispatch_error = Some(|| SpoolError::Dispatch("printer offline".into()));
        self.failing_dispatches = count;
        self
    }

    pub fn rejecting_with_platform_error(mut self) -> Self {
        self.dispatch_error = Some(|| SpoolError::PlatformUnavailable);
        self.failing_dispatches = usize::MAX;
        self
    }

    pub fn with_dispatch_delay(mut self, delay: Duration) -> Self {
        self.dispatch_delay = delay;
        self
    }

    /// Put a job that never leaves into the spooler before the test starts.
    pub fn seed_job(&self, id: &str) {
        self.state.lock().unwrap().outstanding.push(Outstanding {
            id: id.into(),
            remaining: None,
        });
    }

    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    pub fn dispatched(&self) -> Vec<Dispatched> {
        self.state.lock().unwrap().dispatched.clone()
    }
}

impl PrinterEnumeration for FakeSpooler {
    fn list_printers(&self) -> Result<Vec<PrinterDevice>> {
        if self.fail_listing {
            return Err(SpoolError::Spooler("lpstat: scheduler is not running".into()));
        }
        Ok(self.printers.clone())
    }
}

impl PrintSubmission for FakeSpooler {
    fn print_file(&self, path: &Path, printer: &str) -> Result<()> {
        std::thread::sleep(self.dispatch_delay);
        let mut state = self.state.lock().unwrap();
        state.dispatched.push(Dispatched {
            path: path.to_path_buf(),
            printer: printer.to_string(),
            existed: path.exists(),
        });
        if let Some(error) = self.dispatch_error {
            if state.dispatched.len() <= self.failing_dispatches {
                return Err(error());
            }
        }

        state.next_id += 1;
        let id = format!("{printer}-{}", state.next_id);
        match self.behaviour {
            SpoolerBehaviour::Untracked | SpoolerBehaviour::Invisible => {}
            SpoolerBehaviour::Clears { polls } => state.outstanding.push(Outstanding {
                id,
                remaining: Some(polls.max(1)),
            }),
            SpoolerBehaviour::Stuck => state.outstanding.push(Outstanding {
                id,
                remaining: None,
            }),
        }
        Ok(())
    }
}

impl JobEnumeration for FakeSpooler {
    fn list_job_ids(&self, _printer: &str) -> Result<Vec<String>> {
        let call = self.enumerations.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_enumeration || self.failing_calls.contains(&call) {
            return Err(SpoolError::Spooler("lpstat -o: connection refused".into()));
        }

        let mut state = self.state.lock().unwrap();
        let ids = state.outstanding.iter().map(|job| job.id.clone()).collect();
        for job in &mut state.outstanding {
            if let Some(remaining) = job.remaining.as_mut() {
                *remaining = remaining.saturating_sub(1);
            }
        }
        state.outstanding.retain(|job| job.remaining != Some(0));
        Ok(ids)
    }

    fn can_enumerate_jobs(&self) -> bool {
        !matches!(self.behaviour, SpoolerBehaviour::Untracked)
    }
}

impl PlatformSpooler for FakeSpooler {
    fn platform_name(&self) -> &str {
        "fake"
    }
}

/// Renderer that returns a tiny fixed PDF without touching a browser.
pub struct FakeRenderer;

impl HtmlRenderer for FakeRenderer {
    fn render_to_pdf(&self, _html: &str) -> Result<Vec<u8>> {
        Ok(b"%PDF-1.4\n%fake\n".to_vec())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub fn fake_materializer(temp_dir: &Path) -> Materializer {
    Materializer::new(std::sync::Arc::new(FakeRenderer), Some(temp_dir.to_path_buf()))
}
