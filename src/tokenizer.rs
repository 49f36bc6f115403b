//! Turns one line of input into a [`Pipeline`]: an ordered list of [`Stage`]s,
//! each with its own argv and optional redirection file references, plus a
//! trailing background marker. Purely functional — no I/O, no process calls.

use std::fmt;

/// Upper bound on the number of arguments (including the program name) in a
/// single stage.
pub const MAX_ARGS: usize = 64;

/// Upper bound on the number of stages in one pipeline.
pub const MAX_STAGES: usize = 64;

/// One process slot in a pipeline: its argv, plus the file it would read
/// stdin from / write stdout to if it turns out to be the first / last
/// stage once the plan builder promotes these to the pipeline level.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub args: Vec<String>,
    pub in_file: Option<String>,
    pub out_file: Option<String>,
}

/// A non-empty ordered sequence of stages, the background flag, and the
/// pre-tokenisation command text (trimmed of a trailing `&`) used for job
/// table display.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
    pub background: bool,
    pub original_command: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnterminatedQuote,
    MissingFilename { operator: char },
    EmptyStage,
    TooManyArgs { max: usize },
    TooManyStages { max: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnterminatedQuote => {
                write!(f, "myshell: syntax error: unterminated quote")
            }
            ParseError::MissingFilename { operator } => write!(
                f,
                "myshell: syntax error: expected filename after '{operator}'"
            ),
            ParseError::EmptyStage => write!(f, "myshell: syntax error: empty command"),
            ParseError::TooManyArgs { max } => {
                write!(f, "myshell: syntax error: too many arguments (max {max})")
            }
            ParseError::TooManyStages { max } => write!(
                f,
                "myshell: syntax error: too many pipeline stages (max {max})"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Tokenize one line of input (no trailing newline) into a pipeline.
/// `Ok(None)` means the line was empty (or blank) — a no-op.
pub fn tokenize(line: &str) -> Result<Option<Pipeline>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (without_amp, background) = strip_background_marker(trimmed);
    let original_command = without_amp.to_string();

    let stage_strings = split_top_level_pipes(without_amp);
    let mut stages = Vec::with_capacity(stage_strings.len());
    for raw in &stage_strings {
        stages.push(parse_stage(raw.trim())?);
    }

    if stages.len() > MAX_STAGES {
        return Err(ParseError::TooManyStages { max: MAX_STAGES });
    }

    Ok(Some(Pipeline {
        stages,
        background,
        original_command,
    }))
}

/// Strips a trailing `&` (after trailing spaces) and returns the remaining
/// text plus whether a background marker was found.
fn strip_background_marker(line: &str) -> (&str, bool) {
    let trimmed = line.trim_end();
    match trimmed.strip_suffix('&') {
        Some(rest) => (rest.trim_end(), true),
        None => (trimmed, false),
    }
}

/// Splits on `|` at top level — i.e. not inside a double-quoted region.
/// Quote characters are left in place; `parse_stage` strips them per stage.
fn split_top_level_pipes(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in text.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '|' if !in_quotes => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// Tokenizer states for one stage string, per the state-machine design in
/// spec §9: `{ normal, in_quotes, after_redir, reading_filename,
/// reading_quoted_filename }`.
enum State {
    Normal,
    InQuotes,
    AfterRedirect,
    ReadingFilename,
    ReadingQuotedFilename,
}

fn parse_stage(text: &str) -> Result<Stage, ParseError> {
    let mut args: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut has_current = false;

    let mut in_file: Option<String> = None;
    let mut out_file: Option<String> = None;

    let mut state = State::Normal;
    let mut redir_op: char = ' ';
    let mut filename = String::new();

    macro_rules! flush_arg {
        () => {
            if has_current {
                args.push(std::mem::take(&mut current));
                has_current = false;
            }
        };
    }

    macro_rules! finish_filename {
        () => {
            if redir_op == '<' {
                in_file = Some(std::mem::take(&mut filename));
            } else {
                out_file = Some(std::mem::take(&mut filename));
            }
        };
    }

    for c in text.chars() {
        match state {
            State::Normal => match c {
                ' ' | '\t' => flush_arg!(),
                '"' => {
                    state = State::InQuotes;
                    has_current = true;
                }
                '<' | '>' => {
                    flush_arg!();
                    redir_op = c;
                    state = State::AfterRedirect;
                }
                other => {
                    current.push(other);
                    has_current = true;
                }
            },
            State::InQuotes => match c {
                '"' => state = State::Normal,
                other => {
                    current.push(other);
                    has_current = true;
                }
            },
            State::AfterRedirect => match c {
                ' ' | '\t' => {}
                '"' => {
                    filename.clear();
                    state = State::ReadingQuotedFilename;
                }
                other => {
                    filename.clear();
                    filename.push(other);
                    state = State::ReadingFilename;
                }
            },
            State::ReadingFilename => match c {
                ' ' | '\t' => {
                    finish_filename!();
                    state = State::Normal;
                }
                other => filename.push(other),
            },
            State::ReadingQuotedFilename => match c {
                '"' => {
                    finish_filename!();
                    state = State::Normal;
                }
                other => filename.push(other),
            },
        }
    }

    match state {
        State::Normal => flush_arg!(),
        State::InQuotes | State::ReadingQuotedFilename => {
            return Err(ParseError::UnterminatedQuote);
        }
        State::AfterRedirect => {
            return Err(ParseError::MissingFilename { operator: redir_op });
        }
        State::ReadingFilename => finish_filename!(),
    }

    if args.is_empty() {
        return Err(ParseError::EmptyStage);
    }
    if args.len() > MAX_ARGS {
        return Err(ParseError::TooManyArgs { max: MAX_ARGS });
    }

    Ok(Stage {
        args,
        in_file,
        out_file,
    })
}
