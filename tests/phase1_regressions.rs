use std::io::Write;
use std::process::{Command, Stdio};

fn run_shell(lines: &[&str]) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_myshell"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn myshell");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        for line in lines {
            writeln!(stdin, "{line}").expect("write line");
        }
        writeln!(stdin, "exit").expect("write exit");
    }

    child.wait_with_output().expect("wait output")
}

#[test]
fn pipeline_of_two_stages_executes_and_returns_to_prompt() {
    let output = run_shell(&["ls | wc -l", "echo ALIVE"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(output.status.success());
}

#[test]
fn output_redirection_then_input_redirection_round_trips() {
    let dir = std::env::temp_dir().join(format!("myshell_roundtrip_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("out.txt");

    let output = run_shell(&[
        &format!("echo hello > {}", path.display()),
        &format!("cat < {}", path.display()),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hello"), "stdout was: {stdout}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn double_quoted_argument_preserves_spaces_and_metacharacters() {
    let output = run_shell(&[r#"echo "a b > c""#]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("a b > c"), "stdout was: {stdout}");
}

#[test]
fn nonexistent_program_reports_diagnostic_and_shell_continues() {
    let output = run_shell(&["thisprogramdoesnotexist123", "echo ALIVE"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(!stderr.is_empty(), "expected a diagnostic on stderr");
}

#[test]
fn unterminated_quote_is_rejected_and_shell_continues() {
    let output = run_shell(&[r#"echo "unterminated"#, "echo ALIVE"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(stderr.contains("unterminated quote"), "stderr was: {stderr}");
}

#[test]
fn pipe_with_empty_stage_is_rejected_and_shell_continues() {
    let output = run_shell(&["echo hi ||cat", "echo ALIVE"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(stderr.contains("empty command"), "stderr was: {stderr}");
}

#[test]
fn blank_lines_are_a_no_op() {
    let output = run_shell(&["", "   ", "echo ALIVE"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
}

#[test]
fn downstream_stage_still_runs_when_an_earlier_stage_fails_to_exec() {
    // The first stage isn't a real program; it can't spawn. `cat` must
    // still launch, see EOF on its now-producer-less stdin, and exit
    // cleanly so the shell returns to the prompt.
    let output = run_shell(&[r#""hello world" | cat"#, "echo ALIVE"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(!stderr.is_empty(), "expected a diagnostic on stderr");
    assert!(output.status.success(), "shell did not exit cleanly");
}

#[cfg(unix)]
#[test]
fn pipe_eof_propagates_through_an_unbounded_producer() {
    // `yes` writes indefinitely; `head -n 3` exits after 3 lines, closing its
    // read end. `yes` then receives SIGPIPE and terminates. The shell must
    // still return to the prompt.
    let output = run_shell(&["yes | head -n 3", "echo ALIVE"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(output.status.success(), "shell did not exit cleanly");
}
