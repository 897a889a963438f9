//! Command loop (spec §4.4): the single-threaded dispatcher that owns the
//! writing lock across each command, wires `run` to the process-spawn and
//! reader modules, and drives teardown to completion.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{bail, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::lexer::split_whitespace_owned;
use crate::line_reader::read_line_bounded;
use crate::process;
use crate::reader::{self, Stream};
use crate::reaper::{self, SharedContext};
use crate::slots::SlotTable;

/// Join handles for one task's two reader threads, stored so teardown can
/// reap them in task-number order.
struct TaskThreads {
    stdout: JoinHandle<()>,
    stderr: JoinHandle<()>,
}

pub struct Supervisor {
    slots: Arc<SlotTable>,
    ctx: Arc<SharedContext>,
    max_line: usize,
    max_command_line: usize,
    next_task: AtomicUsize,
    task_threads: Vec<Option<TaskThreads>>,
    reaper_handle: Option<JoinHandle<()>>,
}

enum Control {
    Continue,
    Quit,
}

impl Supervisor {
    pub fn new(max_tasks: usize, max_line: usize, max_command_line: usize) -> Result<Self> {
        let slots = Arc::new(SlotTable::new(max_tasks));
        let ctx = Arc::new(SharedContext::new()?);

        let reaper_ctx = Arc::clone(&ctx);
        let reaper_handle = std::thread::spawn(move || reaper::run(&reaper_ctx));

        let task_threads = (0..max_tasks).map(|_| None).collect();

        Ok(Self {
            slots,
            ctx,
            max_line,
            max_command_line,
            next_task: AtomicUsize::new(0),
            task_threads,
            reaper_handle: Some(reaper_handle),
        })
    }

    /// Drive the command loop to completion: read commands from `stdin`
    /// until `quit` or EOF, then tear down. Returns `Err` only for a fatal
    /// supervisor error (spec §7): an unknown command, a malformed `run`, or
    /// an unrecoverable system-call failure.
    pub fn run<R: io::Read>(&mut self, mut input: R) -> Result<()> {
        loop {
            let line = read_line_bounded(&mut input, self.max_command_line)?;
            let Some(line) = line else {
                // EOF on stdin is treated identically to `quit` (spec §6).
                break;
            };

            let line = String::from_utf8_lossy(&line).into_owned();
            let tokens = split_whitespace_owned(&line);

            let _guard = self.ctx.writing_lock.lock();
            match self.dispatch(&tokens)? {
                Control::Continue => {}
                Control::Quit => break,
            }
        }

        self.teardown()
    }

    fn dispatch(&mut self, tokens: &[String]) -> Result<Control> {
        let Some(command) = tokens.first() else {
            return Ok(Control::Continue);
        };

        match command.as_str() {
            "run" => self.cmd_run(tokens)?,
            "out" => self.cmd_out(tokens),
            "err" => self.cmd_err(tokens),
            "kill" => self.cmd_kill(tokens),
            "sleep" => self.cmd_sleep(tokens),
            "quit" => return Ok(Control::Quit),
            other => bail!("unexpected command was read: [{other}]"),
        }

        Ok(Control::Continue)
    }

    fn cmd_run(&mut self, tokens: &[String]) -> Result<()> {
        let Some(program) = tokens.get(1) else {
            bail!("run requires a program argument");
        };
        let args = tokens.get(2..).unwrap_or(&[]).to_vec();

        let task = self.next_task.fetch_add(1, Ordering::SeqCst);
        if task >= self.slots.capacity() {
            bail!("task ceiling of {} exceeded", self.slots.capacity());
        }

        let spawned = process::spawn(program, &args)?;
        self.slots.start(task, spawned.pid);

        let stdout = reader::spawn(
            spawned.stdout,
            task,
            Stream::Stdout,
            Arc::clone(&self.slots),
            self.max_line,
        );
        let stderr = reader::spawn(
            spawned.stderr,
            task,
            Stream::Stderr,
            Arc::clone(&self.slots),
            self.max_line,
        );
        self.task_threads[task] = Some(TaskThreads { stdout, stderr });

        self.ctx.track(spawned.pid, task as u64);

        println!("Task {task} started: pid {}.", spawned.pid);
        Ok(())
    }

    fn cmd_out(&self, tokens: &[String]) {
        let task = parse_task_number(tokens.get(1));
        let line = String::from_utf8_lossy(&self.slots.out_line(task)).into_owned();
        println!("Task {task} stdout: '{line}'.");
    }

    fn cmd_err(&self, tokens: &[String]) {
        let task = parse_task_number(tokens.get(1));
        let line = String::from_utf8_lossy(&self.slots.err_line(task)).into_owned();
        println!("Task {task} stderr: '{line}'.");
    }

    fn cmd_kill(&self, tokens: &[String]) {
        let task = parse_task_number(tokens.get(1));
        let pid = self.slots.pid_of(task);
        if pid > 0 {
            // A dead or unknown pid is harmless to signal (spec §8 idempotence).
            let _ = kill(Pid::from_raw(pid), Signal::SIGINT);
        }
    }

    fn cmd_sleep(&self, tokens: &[String]) {
        let millis = tokens.get(1).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);
        std::thread::sleep(std::time::Duration::from_millis(millis));
    }

    fn teardown(&mut self) -> Result<()> {
        self.ctx.signal_shutdown();

        for task in self.slots.started_tasks() {
            let pid = self.slots.pid_of(task);
            if pid > 0 {
                let _ = kill(Pid::from_raw(pid), Signal::SIGKILL);
            }
        }

        // Joins stop at the first never-started slot: started slots form a
        // prefix of the array (spec §9).
        for threads in self.task_threads.iter_mut() {
            let Some(threads) = threads.take() else {
                break;
            };
            let _ = threads.stdout.join();
            let _ = threads.stderr.join();
        }

        if let Some(handle) = self.reaper_handle.take() {
            if handle.join().is_err() {
                bail!("reaper thread panicked");
            }
        }

        io::stdout().flush().ok();
        Ok(())
    }
}

/// Non-validating numeric argument parse (spec §4.4): any syntactically
/// plausible unsigned integer is accepted; a missing or malformed argument
/// is treated as task `0` rather than failing the command, matching the
/// uninitialized-variable behavior of the original's unchecked `sscanf`
/// without inheriting its undefined behavior.
fn parse_task_number(token: Option<&String>) -> usize {
    token.and_then(|s| s.parse::<usize>().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn empty_and_blank_lines_are_ignored() {
        let mut sup = Supervisor::new(4, 64, 64).unwrap();
        let input = Cursor::new(b"\n   \nquit\n".to_vec());
        sup.run(input).unwrap();
    }

    #[test]
    fn unknown_command_is_fatal() {
        let mut sup = Supervisor::new(4, 64, 64).unwrap();
        let input = Cursor::new(b"bogus\n".to_vec());
        assert!(sup.run(input).is_err());
    }

    #[test]
    fn eof_behaves_like_quit() {
        let mut sup = Supervisor::new(4, 64, 64).unwrap();
        let input = Cursor::new(b"sleep 0".to_vec());
        sup.run(input).unwrap();
    }

    #[test]
    fn run_spawns_and_reports_pid() {
        let mut sup = Supervisor::new(4, 64, 64).unwrap();
        let input = Cursor::new(b"run /bin/true\nquit\n".to_vec());
        sup.run(input).unwrap();
    }

    #[test]
    fn run_without_program_is_fatal() {
        let mut sup = Supervisor::new(4, 64, 64).unwrap();
        let input = Cursor::new(b"run\n".to_vec());
        assert!(sup.run(input).is_err());
    }
}
