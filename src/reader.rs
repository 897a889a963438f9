//! Stream reader (spec §4.2): one background thread per (task, stream)
//! overwriting the task's captured line as new output arrives.
//!
//! Mirrors the original's `thread_task`: loop reading bounded lines until
//! EOF, storing only the most recent line rather than accumulating history.
//! The thread exits on EOF or a read error, same as the original's loop
//! ending when `fgets` returns NULL.

use std::io::Read;
use std::sync::Arc;

use crate::line_reader::read_line_bounded;
use crate::slots::SlotTable;

/// Which of a task's two output streams a reader thread is watching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Run a stream reader to completion: read bounded lines from `source` and
/// store each one as `task`'s latest line for `stream`, until EOF.
pub fn run<R: Read>(mut source: R, task: usize, stream: Stream, slots: &SlotTable, max_line: usize) {
    loop {
        match read_line_bounded(&mut source, max_line) {
            Ok(Some(line)) => match stream {
                Stream::Stdout => slots.set_out_line(task, line),
                Stream::Stderr => slots.set_err_line(task, line),
            },
            Ok(None) => return,
            Err(e) => {
                log::warn!("task {task} {stream:?} reader stopped: {e}");
                return;
            }
        }
    }
}

/// Spawn the background thread for one (task, stream) pair.
pub fn spawn<R: Read + Send + 'static>(
    source: R,
    task: usize,
    stream: Stream,
    slots: Arc<SlotTable>,
    max_line: usize,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || run(source, task, stream, &slots, max_line))
}
