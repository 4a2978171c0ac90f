//! Workbench runner
//!
//! Drives the registered test cases of one workbench:
//! - phased test cases get SEED for all, then EXECUTE for all, then CLEAN
//!   for all
//! - every other selected test case runs once in the EXECUTE pass
//! - test cases the filter rejects stay registered and report as skipped
//!
//! A failing test case never stops the loop; `ConformanceTestCase` absorbs
//! every failure into evidence.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::TestCaseFilter;
use crate::test_case::{ConformanceTestCase, TestCaseLifecycle, TestPhase};
use crate::work_pad::WorkPad;

/// Default completion poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Counts of one pass over a workbench.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTally {
    pub selected: usize,
    pub filtered_out: usize,
    pub passed: usize,
    pub failed: usize,
    /// Selected but recorded nothing, e.g. still waiting on an event
    pub pending: usize,
}

pub struct WorkbenchRunner {
    work_pad: Arc<WorkPad>,
    test_cases: Vec<Box<dyn ConformanceTestCase>>,
    filter: TestCaseFilter,
    poll_interval: Duration,
}

impl std::fmt::Debug for WorkbenchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkbenchRunner")
            .field("workbench_id", &self.work_pad.workbench_id())
            .field("test_cases", &self.test_cases.len())
            .field("filter", &self.filter)
            .finish()
    }
}

impl WorkbenchRunner {
    pub fn new(work_pad: Arc<WorkPad>, test_cases: Vec<Box<dyn ConformanceTestCase>>) -> Self {
        Self {
            work_pad,
            test_cases,
            filter: TestCaseFilter::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_filter(mut self, filter: TestCaseFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn work_pad(&self) -> &Arc<WorkPad> {
        &self.work_pad
    }

    pub fn test_cases(&self) -> &[Box<dyn ConformanceTestCase>] {
        &self.test_cases
    }

    fn selected(&self) -> Vec<&dyn ConformanceTestCase> {
        self.test_cases
            .iter()
            .map(|tc| tc.as_ref())
            .filter(|tc| self.filter.matches(tc.test_case().id()))
            .collect()
    }

    /// Run every selected test case and mark the work pad complete.
    pub fn run(&self) -> RunTally {
        let selected = self.selected();
        let workbench_id = self.work_pad.workbench_id();
        info!(
            workbench_id = %workbench_id,
            selected = selected.len(),
            registered = self.test_cases.len(),
            "workbench run started"
        );

        let phased: Vec<&dyn ConformanceTestCase> =
            selected.iter().copied().filter(|tc| tc.is_phased()).collect();

        for tc in &phased {
            tc.execute_test_phase(TestPhase::Seed);
        }
        for tc in &selected {
            if tc.is_phased() {
                tc.execute_test_phase(TestPhase::Execute);
            } else {
                tc.execute_test();
            }
        }
        for tc in &phased {
            tc.execute_test_phase(TestPhase::Clean);
        }

        self.work_pad.set_workbench_complete();

        let mut tally = RunTally {
            selected: selected.len(),
            filtered_out: self.test_cases.len() - selected.len(),
            ..RunTally::default()
        };
        for tc in &selected {
            match tc.test_case().lifecycle() {
                TestCaseLifecycle::RanPassed => tally.passed += 1,
                TestCaseLifecycle::RanFailed => tally.failed += 1,
                TestCaseLifecycle::Registered | TestCaseLifecycle::Running => tally.pending += 1,
            }
        }

        info!(
            workbench_id = %workbench_id,
            passed = tally.passed,
            failed = tally.failed,
            pending = tally.pending,
            filtered_out = tally.filtered_out,
            "workbench run finished"
        );
        tally
    }

    /// Block until the work pad reports complete or `timeout` passes.
    ///
    /// Returns whether the work pad completed.
    pub fn wait_for_completion(&self, timeout: Duration) -> bool {
        let started = Instant::now();
        loop {
            if self.work_pad.is_complete() {
                info!(
                    workbench_id = %self.work_pad.workbench_id(),
                    waited_ms = started.elapsed().as_millis() as u64,
                    "workbench complete"
                );
                return true;
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                warn!(
                    workbench_id = %self.work_pad.workbench_id(),
                    timeout_s = timeout.as_secs(),
                    last_active = %self.work_pad.last_active_at(),
                    "workbench did not go quiet before the timeout"
                );
                return false;
            }
            thread::sleep(self.poll_interval.min(timeout - elapsed));
        }
    }

    /// Best-effort cleanup of every selected test case.
    pub fn clean_up(&self) {
        for tc in self.selected() {
            tc.clean_test();
        }
    }
}
