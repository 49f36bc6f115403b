//! Built-ins run inside the shell process itself, on the main thread, so
//! they can mutate shell state (currently just the working directory).
//! Only recognised for a single-stage, non-background pipeline — see
//! [`crate::plan`].

use std::sync::{Arc, Mutex};

use crate::jobs::JobTable;

pub enum Outcome {
    Continue,
    Exit,
}

pub fn execute(name: &str, args: &[String], job_table: &Arc<Mutex<JobTable>>) -> Outcome {
    match name {
        "cd" => {
            builtin_cd(args);
            Outcome::Continue
        }
        "jobs" => {
            builtin_jobs(job_table);
            Outcome::Continue
        }
        "exit" => Outcome::Exit,
        other => {
            eprintln!("myshell: unknown builtin: {other}");
            Outcome::Continue
        }
    }
}

fn builtin_cd(args: &[String]) {
    let Some(target) = args.first() else {
        eprintln!("myshell: cd: expected argument");
        return;
    };

    if let Err(e) = std::env::set_current_dir(target) {
        eprintln!("myshell: cd: {target}: {e}");
    }
}

fn builtin_jobs(job_table: &Arc<Mutex<JobTable>>) {
    let table = job_table.lock().unwrap();
    print!("{}", table.listing());
}
