//! Reaper (spec §4.3): a single background thread that waits for any child
//! to terminate and announces it, without interleaving with other writers.
//!
//! Ported from `process_information_task`: block on the map-not-empty
//! condition (or shut down if told to and the map is empty), then repeatedly
//! call a blocking "wait for any child" followed by a non-blocking drain of
//! whatever else is already reapable, all while holding the writing lock so
//! a termination announcement can't interleave with a `run`/`out`/`err`/
//! `kill` announcement from the command loop.

use std::sync::{Condvar, Mutex};

use anyhow::Result;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::line_map::LineMap;
use crate::pi_mutex::PiMutex;
use crate::sync_util::{lock_recover, wait_recover};

/// State shared between the command loop (which inserts pids as tasks
/// start) and the reaper (which removes them as tasks exit).
pub struct MapState {
    pub map: LineMap,
    pub shutdown: bool,
}

impl MapState {
    fn new() -> Self {
        Self {
            map: LineMap::new(),
            shutdown: false,
        }
    }
}

/// Everything the reaper and the command loop share: the pid map, the
/// condition variable signaled on every insert and on shutdown, and the
/// writing lock that serializes stdout output across both.
pub struct SharedContext {
    pub map_state: Mutex<MapState>,
    pub wait_for_process: Condvar,
    pub writing_lock: PiMutex,
}

impl SharedContext {
    pub fn new() -> Result<Self> {
        Ok(Self {
            map_state: Mutex::new(MapState::new()),
            wait_for_process: Condvar::new(),
            writing_lock: PiMutex::new()?,
        })
    }

    /// Record that `pid` belongs to `task` and wake the reaper.
    pub fn track(&self, pid: i32, task: u64) {
        let mut state = lock_recover(&self.map_state);
        state.map.insert(pid, task);
        self.wait_for_process.notify_one();
    }

    /// Tell the reaper there are no more tasks coming; it exits once the map
    /// drains (or immediately, if it's already empty).
    pub fn signal_shutdown(&self) {
        let mut state = lock_recover(&self.map_state);
        state.shutdown = true;
        self.wait_for_process.notify_one();
    }
}

/// One terminated child, ready to be announced.
enum Termination {
    Signaled { task: u64 },
    Exited { task: u64, status: i32 },
    /// A pid that reaped successfully but wasn't in the map (already
    /// removed, or reaped ahead of its `track` call). Silently dropped:
    /// there's no task number to announce.
    Untracked,
}

enum Outcome {
    Signaled,
    Exited(i32),
}

/// Log the diagnostic and terminate the whole process, matching the
/// original's `fprintf(stderr, ...); exit(1);` on a fatal reaper condition
/// (spec §7). A thread-local `Err` return wouldn't do: the command loop
/// would keep accepting commands with a dead reaper until the next `join`,
/// silently dropping every future `Task <n> ended:` announcement.
fn die(message: &str) -> ! {
    log::error!("{message}");
    eprintln!("{message}");
    std::process::exit(1);
}

fn classify(status: WaitStatus, ctx: &SharedContext) -> Option<Termination> {
    let (pid, outcome) = match status {
        WaitStatus::Exited(pid, code) => (pid, Outcome::Exited(code)),
        WaitStatus::Signaled(pid, _, _) => (pid, Outcome::Signaled),
        // Stopped/Continued/PtraceEvent/PtraceSyscall can't occur with the
        // default wait flags this reaper uses; spec §4.3 step 2 still
        // requires any such form to be treated as fatal rather than ignored.
        other => die(&format!("unknown type of process termination: {other:?}")),
    };

    let task = lock_recover(&ctx.map_state).map.remove(pid.as_raw());

    Some(match task {
        None => Termination::Untracked,
        Some(task) => match outcome {
            Outcome::Signaled => Termination::Signaled { task },
            Outcome::Exited(status) => Termination::Exited { task, status },
        },
    })
}

fn announce(termination: &Termination) {
    match termination {
        Termination::Signaled { task } => println!("Task {task} ended: signalled."),
        Termination::Exited { task, status } => println!("Task {task} ended: status {status}."),
        Termination::Untracked => {}
    }
}

/// Run the reaper loop until shutdown with an empty map. An unexpected
/// `waitpid` failure (spec §7) terminates the whole process via `die`
/// rather than returning an error: there is no safe way to keep the
/// command loop running with a dead reaper (it would accept `run`/`out`/
/// `err`/`kill` normally while silently dropping every future
/// `Task <n> ended:` announcement until the next join). `ECHILD` and a
/// child exiting before being reaped are expected and handled inline.
pub fn run(ctx: &SharedContext) {
    loop {
        {
            let mut state = lock_recover(&ctx.map_state);
            while state.map.is_empty() {
                if state.shutdown {
                    return;
                }
                state = wait_recover(&ctx.wait_for_process, state);
            }
        }

        loop {
            match waitpid(Pid::from_raw(-1), None) {
                Ok(status) => {
                    let _guard = ctx.writing_lock.lock();
                    if let Some(termination) = classify(status, ctx) {
                        announce(&termination);
                    }

                    loop {
                        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                            Ok(WaitStatus::StillAlive) => break,
                            Ok(status) => {
                                if let Some(termination) = classify(status, ctx) {
                                    announce(&termination);
                                }
                            }
                            Err(Errno::ECHILD) => break,
                            Err(e) => die(&format!("waitpid(WNOHANG) failed: {e}")),
                        }
                    }
                }
                Err(Errno::ECHILD) => break,
                Err(e) => die(&format!("waitpid failed: {e}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_and_signal_shutdown_do_not_panic() {
        let ctx = SharedContext::new().expect("context init");
        ctx.track(1234, 0);
        ctx.signal_shutdown();
        let state = lock_recover(&ctx.map_state);
        assert!(state.shutdown);
    }

    #[test]
    fn reaper_exits_immediately_on_shutdown_with_empty_map() {
        let ctx = SharedContext::new().expect("context init");
        ctx.signal_shutdown();
        run(&ctx);
    }
}
