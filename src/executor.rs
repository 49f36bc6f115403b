//! Constructs the pipes, forks the children (via `std::process::Command`,
//! which forks+execs under the hood), wires up stdin/stdout/redirections,
//! and either waits on the pipeline (foreground) or hands it to the job
//! table (background).

use std::fs::{File, OpenOptions};
use std::process::{Command, Stdio};

use crate::plan::ExecPlan;
use crate::signals::SignalLayer;

/// Runs one pipeline to completion (if foreground) or registers it as a
/// background job and returns immediately.
pub fn execute_pipeline(plan: &ExecPlan, signals: &SignalLayer) {
    let stage_count = plan.stages.len();
    debug_assert!(stage_count >= 1, "plan builder rejects empty pipelines");

    // Step 1: allocate N-1 pipe pairs up front. If any allocation fails,
    // the already-allocated pairs are dropped (closing both ends) and the
    // pipeline is abandoned.
    let mut readers: Vec<Option<os_pipe::PipeReader>> = Vec::with_capacity(stage_count - 1);
    let mut writers: Vec<Option<os_pipe::PipeWriter>> = Vec::with_capacity(stage_count - 1);
    for _ in 0..stage_count.saturating_sub(1) {
        match os_pipe::pipe() {
            Ok((reader, writer)) => {
                readers.push(Some(reader));
                writers.push(Some(writer));
            }
            Err(e) => {
                eprintln!("myshell: failed to create pipe: {e}");
                return;
            }
        }
    }

    // Step 2-3: fork+exec each stage, wiring stdin/stdout from the previous
    // pipe, the next pipe, or a redirection file. `os_pipe`/`File` handles
    // are close-on-exec and are consumed (not cloned) by `Stdio::from`, so
    // every pipe-pair fd is closed in the parent as soon as it has been
    // handed to the child that needs it — no manual close loop required,
    // unlike a raw fork()+dup2() rendition of the same algorithm.
    //
    // A stage that fails to open its redirection file or fails to spawn
    // does not abort the rest of the pipeline: its neighbours still launch,
    // and the pipe end that stage would have held is simply dropped here,
    // which is enough for EOF/SIGPIPE to propagate to whichever neighbour
    // is still running (see spec scenario: `"hello world" | cat`).
    let mut pids: Vec<Option<i32>> = Vec::with_capacity(stage_count);

    for (i, stage) in plan.stages.iter().enumerate() {
        let is_first = i == 0;
        let is_last = i == stage_count - 1;

        let stdin_stdio = if is_first {
            match &plan.in_file {
                Some(path) => match File::open(path) {
                    Ok(file) => Some(Stdio::from(file)),
                    Err(e) => {
                        eprintln!("myshell: {path}: {e}");
                        None
                    }
                },
                None => Some(Stdio::inherit()),
            }
        } else {
            Some(Stdio::from(
                readers[i - 1].take().expect("reader consumed exactly once"),
            ))
        };

        let stdout_stdio = if is_last {
            match &plan.out_file {
                Some(path) => match open_output_file(path) {
                    Ok(file) => Some(Stdio::from(file)),
                    Err(e) => {
                        eprintln!("myshell: {path}: {e}");
                        None
                    }
                },
                None => Some(Stdio::inherit()),
            }
        } else {
            Some(Stdio::from(
                writers[i].take().expect("writer consumed exactly once"),
            ))
        };

        let (stdin_stdio, stdout_stdio) = match (stdin_stdio, stdout_stdio) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                // A redirection file failed to open; this stage never
                // launches. Its pipe halves (already taken above) are
                // dropped at the end of this iteration, closing them so
                // neighbouring stages still see EOF/SIGPIPE correctly.
                pids.push(None);
                continue;
            }
        };

        let mut command = Command::new(&stage.args[0]);
        command.args(&stage.args[1..]);
        command
            .stdin(stdin_stdio)
            .stdout(stdout_stdio)
            .stderr(Stdio::inherit());

        #[cfg(unix)]
        {
            let background = plan.background;
            unsafe {
                use std::os::unix::process::CommandExt;
                command.pre_exec(move || {
                    if background {
                        ignore_signal(libc::SIGINT)?;
                        ignore_signal(libc::SIGTSTP)?;
                    }
                    Ok(())
                });
            }
        }

        match command.spawn() {
            Ok(child) => pids.push(Some(child.id() as i32)),
            Err(e) => {
                report_spawn_error(&stage.args[0], &e);
                pids.push(None);
            }
        }
    }

    // Any pipe halves not consumed above (because a stage was skipped)
    // close here, which is what lets a still-running neighbour observe
    // EOF/SIGPIPE instead of hanging.
    drop(readers);
    drop(writers);

    let Some(representative_pid) = pids.iter().copied().flatten().next() else {
        // Every stage failed to launch; nothing to wait on or register.
        return;
    };

    if plan.background {
        match signals
            .job_table()
            .lock()
            .unwrap()
            .register(representative_pid, plan.original_command.clone())
        {
            Ok(job_id) => {
                println!("[{}] {}", job_id, representative_pid);
                return;
            }
            Err(_full) => {
                eprintln!("myshell: job table full; running in the foreground");
                // Fall through to the foreground wait below.
            }
        }
    }

    signals
        .foreground()
        .store(representative_pid, std::sync::atomic::Ordering::SeqCst);

    // Wait in launch order, per spec §4.3 step 6 ("the order of waits does
    // not affect correctness since SIGCHLD is caught"). Every reap happens
    // on the signal thread; this only blocks on the condition variable it
    // notifies, never calling `waitpid` itself.
    for pid in pids.into_iter().flatten() {
        signals.wait_for_child(pid);
    }

    signals
        .foreground()
        .store(0, std::sync::atomic::Ordering::SeqCst);
}

#[cfg(unix)]
fn ignore_signal(signal: libc::c_int) -> std::io::Result<()> {
    if unsafe { libc::signal(signal, libc::SIG_IGN) } == libc::SIG_ERR {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(unix)]
fn open_output_file(path: &str) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)
}

#[cfg(not(unix))]
fn open_output_file(path: &str) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

fn report_spawn_error(program: &str, e: &std::io::Error) {
    if e.kind() == std::io::ErrorKind::NotFound {
        eprintln!("myshell: command not found: {program}");
    } else {
        eprintln!("myshell: {program}: {e}");
    }
}
