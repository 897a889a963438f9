//! End-to-end scenarios driving the built `taskexec` binary over a piped
//! stdin/stdout, following the scenario shapes in spec.md §8.

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::time::Duration;

fn run_session(script: &str) -> String {
    let mut child = Command::new(env!("CARGO_BIN_EXE_taskexec"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to launch taskexec");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();

    let output = child.wait_with_output().expect("taskexec did not exit");
    assert!(output.status.success(), "taskexec exited non-zero: {:?}", output);

    String::from_utf8(output.stdout).expect("stdout was not valid utf-8")
}

#[test]
fn spawn_and_query() {
    let stdout = run_session("run /bin/echo hello\nsleep 100\nout 0\nquit\n");
    assert!(stdout.contains("Task 0 started: pid "));
    assert!(stdout.contains("Task 0 ended: status 0."));
    assert!(stdout.contains("Task 0 stdout: 'hello'."));
}

#[test]
fn stderr_capture() {
    let stdout = run_session(
        "run /bin/sh -c \"echo oops 1>&2\"\nsleep 100\nerr 0\nquit\n",
    );
    assert!(stdout.contains("Task 0 started: pid "));
    assert!(stdout.contains("Task 0 ended: status 0."));
    assert!(stdout.contains("Task 0 stderr: 'oops'."));
}

#[test]
fn kill_a_long_runner() {
    let stdout = run_session("run /bin/sleep 60\nkill 0\nsleep 200\nquit\n");
    assert!(stdout.contains("Task 0 started: pid "));
    assert!(stdout.contains("Task 0 ended: signalled."));
    assert!(!stdout.contains("Task 0 ended: status"));
}

#[test]
fn overlap_of_output_and_termination() {
    let stdout = run_session(
        "run /bin/sh -c \"for i in 1 2 3; do echo $i; done\"\nsleep 150\nout 0\nquit\n",
    );
    assert!(stdout.contains("Task 0 stdout: '3'."));
    assert_eq!(stdout.matches("Task 0 ended: status 0.").count(), 1);
}

#[test]
fn multiple_simultaneous_tasks() {
    let mut script = String::new();
    for _ in 0..10 {
        script.push_str("run /bin/true\n");
    }
    script.push_str("sleep 200\nquit\n");

    let stdout = run_session(&script);
    for task in 0..10 {
        assert!(stdout.contains(&format!("Task {task} started: pid ")));
        assert!(stdout.contains(&format!("Task {task} ended: status 0.")));
    }
}

#[test]
fn empty_and_blank_commands_are_ignored() {
    let stdout = run_session("\n   \nquit\n");
    assert!(!stdout.contains("started"));
}

#[test]
fn unknown_command_exits_nonzero() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_taskexec"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to launch taskexec");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"bogus-command\n")
        .unwrap();

    let output = child.wait_with_output().expect("taskexec did not exit");
    assert!(!output.status.success());
}

#[test]
fn eof_without_quit_shuts_down_cleanly() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_taskexec"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to launch taskexec");

    {
        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(b"run /bin/true\n").unwrap();
        std::thread::sleep(Duration::from_millis(100));
        // stdin dropped here, closing the pipe and producing EOF.
    }

    let mut stdout = String::new();
    child
        .stdout
        .take()
        .unwrap()
        .read_to_string(&mut stdout)
        .unwrap();
    let status = child.wait().unwrap();

    assert!(status.success());
    assert!(stdout.contains("Task 0 started: pid "));
}
