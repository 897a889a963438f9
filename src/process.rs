//! Process spawn (spec §4.4's `run` command, factored into its own module).
//!
//! Owns the part of `run` that the original folds inline: building argv,
//! piping stdout/stderr, and spawning. Grounded on `csa-process`'s spawn
//! helpers for the `std::process::Command` piping shape, adapted to this
//! crate's narrower needs (no PTY, no idle timeout — just piped stdout and
//! stderr, same as the original's two `pipe()` calls per child).

use std::io::BufReader;
use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};

/// The pieces of a freshly spawned child that the caller needs to track it:
/// its pid, and buffered readers over its stdout and stderr pipes.
pub struct SpawnedProcess {
    pub pid: i32,
    pub stdout: BufReader<std::process::ChildStdout>,
    pub stderr: BufReader<std::process::ChildStderr>,
}

/// Spawn `program` with `args`, piping stdout and stderr and closing stdin.
///
/// The returned `Child` handle is deliberately not kept around by the
/// caller: this crate's reaper reaps independently via a raw
/// `waitpid(-1, ...)` loop (spec §4.3), mirroring the original's `wait()`
/// in its single dedicated reaper thread rather than each spawner waiting on
/// its own child.
pub fn spawn(program: &str, args: &[String]) -> Result<SpawnedProcess> {
    let mut child: Child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn '{program}'"))?;

    let pid = child.id() as i32;
    let stdout = child
        .stdout
        .take()
        .context("spawned child has no stdout pipe")?;
    let stderr = child
        .stderr
        .take()
        .context("spawned child has no stderr pipe")?;

    // The reaper reaps this pid independently; dropping `child` here only
    // releases the now-empty `Child` handle, not the OS process.
    drop(child);

    Ok(SpawnedProcess {
        pid,
        stdout: BufReader::new(stdout),
        stderr: BufReader::new(stderr),
    })
}
