#[cfg(unix)]
use std::io::Write;
#[cfg(unix)]
use std::process::{Command, Stdio};
#[cfg(unix)]
use std::time::Duration;

#[cfg(unix)]
fn spawn_shell() -> std::process::Child {
    Command::new(env!("CARGO_BIN_EXE_myshell"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn myshell")
}

#[cfg(unix)]
fn send_line(child: &mut std::process::Child, line: &str) {
    let stdin = child.stdin.as_mut().expect("stdin");
    writeln!(stdin, "{line}").expect("write line");
}

// Sends SIGINT to the shell process itself, the same way a terminal delivers
// Ctrl-C to the foreground process group. The shell's signal layer forwards
// it on to whatever pipeline currently holds the foreground handle.
#[cfg(unix)]
fn send_sigint(child: &std::process::Child) {
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGINT);
    }
}

#[cfg(unix)]
#[test]
fn sigint_to_foreground_pipeline_terminates_it_and_returns_to_prompt() {
    let mut child = spawn_shell();
    send_line(&mut child, "sleep 30");
    std::thread::sleep(Duration::from_millis(300));
    send_sigint(&child);
    std::thread::sleep(Duration::from_millis(300));
    send_line(&mut child, "echo ALIVE");
    send_line(&mut child, "exit");

    let output = child.wait_with_output().expect("wait output");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
}

#[cfg(unix)]
#[test]
fn sigint_with_no_foreground_pipeline_leaves_job_table_unmodified() {
    let mut child = spawn_shell();
    std::thread::sleep(Duration::from_millis(200));
    send_sigint(&child);
    std::thread::sleep(Duration::from_millis(200));
    send_line(&mut child, "jobs");
    send_line(&mut child, "exit");

    let output = child.wait_with_output().expect("wait output");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("No active background jobs."),
        "stdout was: {stdout}"
    );
}

#[cfg(unix)]
#[test]
fn unreadable_input_file_reports_diagnostic_without_crashing_the_shell() {
    let mut child = spawn_shell();
    send_line(&mut child, "cat < /nonexistent/path/for/myshell/tests");
    send_line(&mut child, "echo ALIVE");
    send_line(&mut child, "exit");

    let output = child.wait_with_output().expect("wait output");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(!stderr.is_empty(), "expected a diagnostic on stderr");
}
