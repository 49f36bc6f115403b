//! Signal layer: SIGINT, SIGTSTP, and SIGCHLD handling for the shell.
//!
//! `signal_hook::iterator::Signals` is itself a self-pipe under the hood —
//! the real OS signal handler it installs only writes a byte to a pipe; the
//! logic below runs on an ordinary joinable thread reading that pipe. That
//! means none of the functions called here need to be async-signal-safe,
//! and the shared [`JobTable`] can be a plain `Mutex` rather than something
//! lock-free: the mutating side is never a true reentrant signal frame.
//!
//! The foreground handle is a bare `AtomicI32` (`0` = no foreground
//! pipeline) so it can be read and written from either thread without a
//! lock.
//!
//! One consequence of reaping every child from a background thread is that
//! the executor can no longer safely call `std::process::Child::wait()` on
//! the main thread: both sides would race to `waitpid()` the same pid, and
//! whichever loses gets `ECHILD` for a child that, from its point of view,
//! never finished. Instead the SIGCHLD handler is the *only* caller of
//! `waitpid()` in the process; it hands matching exit statuses to the
//! executor through a condition variable, and the executor blocks on that
//! instead of calling `wait()`/`try_wait()` on the `Child` itself.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use signal_hook::consts::{SIGCHLD, SIGINT, SIGTSTP};
use signal_hook::iterator::Signals;

use crate::jobs::JobTable;

/// Hands exit statuses for pipeline children from the SIGCHLD thread back
/// to whichever main-thread call is blocked waiting on them. Entries are
/// inserted whenever the SIGCHLD handler reaps a pid that isn't a
/// background job's representative pid, regardless of whether a waiter has
/// shown up yet — a foreground child can exit (and be reaped) before the
/// executor gets around to calling `wait_for`, so there is no "register
/// before waiting" step to get wrong.
#[derive(Default)]
struct Reaper {
    statuses: Mutex<HashMap<i32, i32>>,
    cv: Condvar,
}

impl Reaper {
    /// Blocks until `pid` has been reaped, then removes and returns its
    /// raw wait status.
    fn wait_for(&self, pid: i32) -> i32 {
        let mut guard = self.statuses.lock().unwrap();
        loop {
            if let Some(status) = guard.remove(&pid) {
                return status;
            }
            guard = self.cv.wait(guard).unwrap();
        }
    }

    /// Called from the SIGCHLD thread once a pid has been reaped and found
    /// not to belong to an active background job.
    fn deliver(&self, pid: i32, status: i32) {
        let mut guard = self.statuses.lock().unwrap();
        guard.insert(pid, status);
        self.cv.notify_all();
    }
}

pub struct SignalLayer {
    job_table: Arc<Mutex<JobTable>>,
    foreground: Arc<AtomicI32>,
    reaper: Arc<Reaper>,
}

impl SignalLayer {
    /// Installs the SIGINT/SIGTSTP/SIGCHLD handling thread. Call once at
    /// startup, before the prompt loop begins.
    pub fn install() -> std::io::Result<Self> {
        let job_table = Arc::new(Mutex::new(JobTable::new()));
        let foreground = Arc::new(AtomicI32::new(0));
        let reaper = Arc::new(Reaper::default());

        let mut signals = Signals::new([SIGINT, SIGTSTP, SIGCHLD])?;

        let thread_job_table = Arc::clone(&job_table);
        let thread_foreground = Arc::clone(&foreground);
        let thread_reaper = Arc::clone(&reaper);

        std::thread::spawn(move || {
            for signal in signals.forever() {
                match signal {
                    SIGINT => handle_sigint(&thread_foreground),
                    SIGTSTP => handle_sigtstp(&thread_foreground),
                    SIGCHLD => handle_sigchld(&thread_job_table, &thread_reaper),
                    _ => unreachable!("only SIGINT/SIGTSTP/SIGCHLD were registered"),
                }
            }
        });

        Ok(Self {
            job_table,
            foreground,
            reaper,
        })
    }

    pub fn job_table(&self) -> &Arc<Mutex<JobTable>> {
        &self.job_table
    }

    pub fn foreground(&self) -> &Arc<AtomicI32> {
        &self.foreground
    }

    /// Blocks until `pid` has exited and been reaped by the signal thread,
    /// returning its raw `wait()` status. Never calls `waitpid` itself —
    /// the signal thread is the sole reaper in the process.
    pub fn wait_for_child(&self, pid: i32) -> i32 {
        self.reaper.wait_for(pid)
    }
}

/// If a foreground pipeline is set, forward SIGINT to its representative
/// pid. Otherwise just print a newline; re-emitting the prompt is left to
/// the main loop's next iteration rather than done from here.
fn handle_sigint(foreground: &AtomicI32) {
    let pid = foreground.load(Ordering::SeqCst);
    if pid > 0 {
        unsafe { libc::kill(pid, libc::SIGINT) };
    }
    println!();
    use std::io::Write;
    let _ = std::io::stdout().flush();
}

/// If a foreground pipeline is set, forward SIGTSTP to it. With no
/// foreground, do nothing (there is nothing to stop).
fn handle_sigtstp(foreground: &AtomicI32) {
    let pid = foreground.load(Ordering::SeqCst);
    if pid > 0 {
        unsafe { libc::kill(pid, libc::SIGTSTP) };
        println!("\n[Process suspended]");
        use std::io::Write;
        let _ = std::io::stdout().flush();
    }
}

/// Reaps every currently-exited child, non-blockingly. A pid that matches
/// an active background job is deactivated and announced; a pid that
/// matches a foreground wait in progress has its status handed back via
/// the condition variable; anything else (a non-representative background
/// pipeline child) is silently discarded, per spec.
fn handle_sigchld(job_table: &Mutex<JobTable>, reaper: &Reaper) {
    loop {
        let mut status: libc::c_int = 0;
        let pid = unsafe { libc::waitpid(-1, &mut status, libc::WNOHANG) };
        if pid <= 0 {
            break;
        }
        if job_table.lock().unwrap().deactivate(pid).is_some() {
            continue;
        }
        reaper.deliver(pid, status);
    }
}
