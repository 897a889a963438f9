//! Task slot table (spec §4.1, §4.2): per-task state shared between the
//! command loop, the two stream-reader threads, and the reaper thread.
//!
//! Each slot holds the task's pid and its most recently captured stdout/
//! stderr line. `allocate`/`record_pid` are only ever called from the
//! single-threaded command loop, so they don't need interior mutability
//! beyond what lets the *other* threads observe the result: `started` and
//! `pid` are atomics a reader or the reaper can read without a lock, while
//! each captured line sits behind its own mutex so the out-reader and
//! err-reader never contend with each other.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;

use crate::sync_util::lock_recover;

struct TaskSlot {
    started: AtomicBool,
    pid: AtomicI32,
    out_line: Mutex<Vec<u8>>,
    err_line: Mutex<Vec<u8>>,
}

impl TaskSlot {
    fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            pid: AtomicI32::new(0),
            out_line: Mutex::new(Vec::new()),
            err_line: Mutex::new(Vec::new()),
        }
    }
}

/// Fixed-size table of task slots, indexed by task number.
pub struct SlotTable {
    slots: Vec<TaskSlot>,
}

impl SlotTable {
    pub fn new(max_tasks: usize) -> Self {
        Self {
            slots: (0..max_tasks).map(|_| TaskSlot::new()).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Record that `task` has been started, running as `pid`.
    ///
    /// Called once from the command loop immediately after a successful
    /// spawn; `started` is set last so a reader thread that already holds a
    /// reference to this slot never observes `started == true` with a stale
    /// pid.
    pub fn start(&self, task: usize, pid: i32) {
        let slot = &self.slots[task];
        slot.pid.store(pid, Ordering::SeqCst);
        slot.started.store(true, Ordering::SeqCst);
    }

    /// Whether `task` has ever been started.
    ///
    /// Out-of-range task numbers are treated as never started rather than
    /// panicking (spec §9: `out`/`err`/`kill` against a number that was
    /// never used for a task is unspecified-but-non-crashing).
    pub fn is_started(&self, task: usize) -> bool {
        self.slots
            .get(task)
            .is_some_and(|slot| slot.started.load(Ordering::SeqCst))
    }

    /// The pid recorded for `task`, or `0` if the task was never started or
    /// `task` is out of range.
    pub fn pid_of(&self, task: usize) -> i32 {
        self.slots
            .get(task)
            .map_or(0, |slot| slot.pid.load(Ordering::SeqCst))
    }

    /// Overwrite `task`'s captured stdout line.
    pub fn set_out_line(&self, task: usize, line: Vec<u8>) {
        if let Some(slot) = self.slots.get(task) {
            *lock_recover(&slot.out_line) = line;
        }
    }

    /// Overwrite `task`'s captured stderr line.
    pub fn set_err_line(&self, task: usize, line: Vec<u8>) {
        if let Some(slot) = self.slots.get(task) {
            *lock_recover(&slot.err_line) = line;
        }
    }

    /// `task`'s most recently captured stdout line, or empty if none yet.
    pub fn out_line(&self, task: usize) -> Vec<u8> {
        self.slots
            .get(task)
            .map_or_else(Vec::new, |slot| lock_recover(&slot.out_line).clone())
    }

    /// `task`'s most recently captured stderr line, or empty if none yet.
    pub fn err_line(&self, task: usize) -> Vec<u8> {
        self.slots
            .get(task)
            .map_or_else(Vec::new, |slot| lock_recover(&slot.err_line).clone())
    }

    /// Iterate over task numbers that have been started, in order.
    pub fn started_tasks(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.slots.len()).filter(move |&task| self.is_started(task))
    }
}
