//! Shared output formatting for tdl CLI commands.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::Scope;

pub const SCHEMA_VERSION: &str = "tdl.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Text rendering of a command result: a header line followed by optional
/// summary, details, warnings and next-step sections.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header)?;
        if !self.summary.is_empty() {
            f.write_str("\n\nSummary:")?;
            for (key, value) in &self.summary {
                if value.is_empty() {
                    write!(f, "\n- {key}")?;
                } else {
                    write!(f, "\n- {key}: {value}")?;
                }
            }
        }
        for (title, lines) in [
            ("Details", &self.details),
            ("Warnings", &self.warnings),
            ("Next steps", &self.next_steps),
        ] {
            if lines.is_empty() {
                continue;
            }
            write!(f, "\n\n{title}:")?;
            for line in lines {
                write!(f, "\n- {line}")?;
            }
        }
        Ok(())
    }
}

/// Machine-readable error body.
#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Outcome<'a, T: Serialize> {
    Success { data: &'a T },
    Error { error: ErrorBody },
}

/// `tdl.v1` envelope shared by success and error output.
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    #[serde(flatten)]
    outcome: Outcome<'a, T>,
    #[serde(skip_serializing_if = "no_lines")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "no_lines")]
    next_steps: &'a [String],
}

fn no_lines(lines: &&[String]) -> bool {
    lines.is_empty()
}

fn print_envelope<T: Serialize>(envelope: &Envelope<'_, T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        return print_envelope(&Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            outcome: Outcome::Success { data },
            warnings: human.map(|h| h.warnings.as_slice()).unwrap_or_default(),
            next_steps: human.map(|h| h.next_steps.as_slice()).unwrap_or_default(),
        });
    }

    if let (false, Some(human)) = (options.quiet, human) {
        println!("{human}");
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        return print_envelope::<()>(&Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            outcome: Outcome::Error {
                error: ErrorBody {
                    message: err.to_string(),
                    code: err.exit_code(),
                    kind: err.kind().as_str(),
                    details: err.details(),
                },
            },
            warnings: &[],
            next_steps: &next_steps,
        });
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// `item move`, `universe new`, ... from argv, for error envelopes emitted
/// before or without a parsed command.
pub fn infer_command_name_from_args() -> String {
    command_name_from(std::env::args().skip(1))
}

fn command_name_from(args: impl IntoIterator<Item = String>) -> String {
    let mut positional = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--root" || arg == "--events" {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        positional.push(arg);
        if positional.len() == 2 {
            break;
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next() {
        Some(cmd) => cmd,
        None => return "tdl".to_string(),
    };

    if matches!(command.as_str(), "universe" | "category" | "item") {
        if let Some(sub) = positional.next() {
            return format!("{command} {sub}");
        }
    }
    command
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::InvalidMove {
            item,
            direction,
            scope,
            ..
        } => vec![format!(
            "tdl item move {item} {} {}",
            direction.inverse(),
            scope.move_flags()
        )],
        Error::NoRoomToMove { item, scope, .. } => match scope {
            Scope::Category { .. } => vec![format!("tdl item edit {item} --position <n>")],
            Scope::Today { .. } => vec![format!("tdl item edit {item} --today-position <n>")],
        },
        Error::NonEmptyDependent { kind, id, .. } => match *kind {
            "universe" => vec![format!("tdl category list --universe {id}")],
            _ => vec![format!("tdl item list --category {id}")],
        },
        Error::NoFieldsProvided => vec!["tdl item edit <id> --content \"...\"".to_string()],
        Error::NotInScope { .. } => vec!["tdl item show <id>".to_string()],
        Error::InvalidConfig(_) => vec!["fix tdl.toml then retry".to_string()],
        Error::LockFailed(_) => vec!["retry once the other tdl process finishes".to_string()],
        _ => Vec::new(),
    }
}
