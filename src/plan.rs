//! Validates a tokenized [`Pipeline`](crate::tokenizer::Pipeline), promotes
//! stage 0's input file and the last stage's output file to pipeline-level
//! redirections, and recognises built-ins.

use crate::tokenizer::{Pipeline, Stage};

/// The three built-in command names. Built-ins only run from a single-stage,
/// non-background pipeline; everywhere else the name is just a program.
const BUILTINS: &[&str] = &["cd", "jobs", "exit"];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

pub struct BuiltinCall {
    pub name: String,
    pub args: Vec<String>,
}

/// A pipeline ready for the executor: per-stage argv unchanged, but with
/// `in_file`/`out_file` promoted from stage 0 / the last stage respectively.
pub struct ExecPlan {
    pub stages: Vec<Stage>,
    pub in_file: Option<String>,
    pub out_file: Option<String>,
    pub background: bool,
    pub original_command: String,
}

pub enum Dispatch {
    /// Nothing to do — an empty pipeline.
    NoOp,
    Builtin(BuiltinCall),
    Execute(ExecPlan),
}

pub fn build(pipeline: Pipeline) -> Dispatch {
    if pipeline.stages.is_empty() {
        return Dispatch::NoOp;
    }

    let last = pipeline.stages.len() - 1;
    let in_file = pipeline.stages[0].in_file.clone();
    let out_file = pipeline.stages[last].out_file.clone();

    if pipeline.stages.len() == 1 && !pipeline.background {
        let first_arg = &pipeline.stages[0].args[0];
        if is_builtin(first_arg) {
            return Dispatch::Builtin(BuiltinCall {
                name: first_arg.clone(),
                args: pipeline.stages[0].args[1..].to_vec(),
            });
        }
    }

    Dispatch::Execute(ExecPlan {
        stages: pipeline.stages,
        in_file,
        out_file,
        background: pipeline.background,
        original_command: pipeline.original_command,
    })
}
