//! Command output for the kanban CLI
//!
//! With `--json` every command prints exactly one envelope on stdout, either
//! `{schema_version, command, status: "success", data}` or the error form
//! carrying `{message, code, kind, details}`. Without it, a [`Report`] is
//! rendered for people and errors go to stderr with a hint.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "kanban.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Human-readable result of one command
///
/// Warnings and hints are also copied into the JSON envelope.
#[derive(Debug, Clone, Default)]
pub struct Report {
    title: String,
    fields: Vec<(String, String)>,
    lines: Vec<String>,
    warnings: Vec<String>,
    hints: Vec<String>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// `- key: value` line under "Summary"; an empty value prints the key alone
    pub fn field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    pub fn line(&mut self, value: impl Into<String>) {
        self.lines.push(value.into());
    }

    pub fn warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn hint(&mut self, value: impl Into<String>) {
        self.hints.push(value.into());
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)?;
        if !self.fields.is_empty() {
            f.write_str("\n\nSummary:")?;
            for (key, value) in &self.fields {
                if value.is_empty() {
                    write!(f, "\n- {key}")?;
                } else {
                    write!(f, "\n- {key}: {value}")?;
                }
            }
        }
        for (heading, items) in [
            ("Details", &self.lines),
            ("Warnings", &self.warnings),
            ("Next steps", &self.hints),
        ] {
            if items.is_empty() {
                continue;
            }
            write!(f, "\n\n{heading}:")?;
            for item in items {
                write!(f, "\n- {item}")?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    next_steps: &'a [String],
}

fn is_empty(items: &&[String]) -> bool {
    items.is_empty()
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// Print the result of a successful command
pub fn emit<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    report: &Report,
) -> Result<()> {
    if options.json {
        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data: Some(data),
            error: None,
            warnings: &report.warnings,
            next_steps: &report.hints,
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else if !options.quiet {
        println!("{report}");
    }
    Ok(())
}

/// Print a failed command; JSON goes to stdout, text to stderr
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let hints = error_hints(err);
    if !json {
        eprintln!("error: {err}");
        if let Some(hint) = hints.first() {
            eprintln!("hint: {hint}");
        }
        return Ok(());
    }

    let envelope: Envelope<'_, ()> = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: "error",
        data: None,
        error: Some(ErrorBody {
            message: err.to_string(),
            code: err.exit_code(),
            kind: error_kind(err),
            details: err.details(),
        }),
        warnings: &[],
        next_steps: &hints,
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        2 => "user_error",
        3 => "schedule_blocked",
        _ => "operation_failed",
    }
}

fn error_hints(err: &Error) -> Vec<String> {
    match err {
        Error::TimeConflict { .. } => vec![
            "kanban slot free --duration <minutes> --after \"<yyyy-MM-dd HH:mm:ss>\"".to_string(),
        ],
        Error::NotFound { kind, .. } => {
            vec![format!("kanban {} list", kind.label().to_lowercase())]
        }
        Error::LockFailed(_) => vec!["another kanban process holds the file; retry".to_string()],
        Error::InvalidConfig(_) => vec!["fix kanban.toml then retry".to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskType;

    #[test]
    fn report_renders_sections_in_order() {
        let mut report = Report::new("Task created");
        report.field("ID", "1");
        report.field("scheduled", "");
        report.warning("no start time");
        report.hint("kanban show 1");
        assert_eq!(
            report.to_string(),
            "Task created\n\nSummary:\n- ID: 1\n- scheduled\n\nWarnings:\n- no start time\n\nNext steps:\n- kanban show 1"
        );
    }

    #[test]
    fn bare_report_is_just_the_title() {
        assert_eq!(Report::new("Tasks: 0").to_string(), "Tasks: 0");
    }

    #[test]
    fn error_kinds_follow_exit_codes() {
        assert_eq!(error_kind(&Error::Validation("x".into())), "user_error");
        assert_eq!(error_kind(&Error::TimeConflict { id: 3 }), "schedule_blocked");
        assert_eq!(error_kind(&Error::IdSpaceExhausted), "operation_failed");
    }

    #[test]
    fn not_found_points_at_listing() {
        let err = Error::NotFound {
            kind: TaskType::Epic,
            id: 9,
        };
        assert_eq!(error_hints(&err), vec!["kanban epic list".to_string()]);
    }
}
