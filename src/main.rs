mod builtins;
mod executor;
mod jobs;
mod plan;
mod signals;
mod tokenizer;

use std::io::{self, Write};

use plan::Dispatch;
use signals::SignalLayer;

fn main() {
    let signals = match SignalLayer::install() {
        Ok(layer) => layer,
        Err(e) => {
            eprintln!("myshell: failed to install signal handlers: {e}");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        let cwd = match std::env::current_dir() {
            Ok(path) => path.display().to_string(),
            Err(e) => {
                eprintln!("myshell: getcwd: {e}");
                std::process::exit(1);
            }
        };
        print!("@LaxmanGupta(Myshell):{cwd} >> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                eprintln!("myshell: error reading input: {e}");
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "exit" {
            break;
        }

        let pipeline = match tokenizer::tokenize(trimmed) {
            Ok(Some(pipeline)) => pipeline,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("myshell: {e}");
                continue;
            }
        };

        match plan::build(pipeline) {
            Dispatch::NoOp => continue,
            Dispatch::Builtin(call) => {
                if let builtins::Outcome::Exit =
                    builtins::execute(&call.name, &call.args, signals.job_table())
                {
                    break;
                }
            }
            Dispatch::Execute(exec_plan) => {
                executor::execute_pipeline(&exec_plan, &signals);
            }
        }
    }

    std::process::exit(0);
}
