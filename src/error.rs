//! Error types for engine invocation and diagnostic normalisation.
//!
//! `EngineError` is fatal to a single `run`/`report`/`version` call.
//! `NormalizeError` only ever drops one diagnostic; callers log it and move on.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("location must have either lines or positions")]
    Missing,
    #[error("location cannot have both lines and positions")]
    Both,
    #[error("position range mixes line/column and offset ends")]
    MixedRange,
    #[error("line must be >= 1, got {0}")]
    Line(i64),
    #[error("column must be >= 1, got {0}")]
    Column(i64),
    #[error("offset must be >= 0, got {0}")]
    Offset(i64),
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("diagnostic has no file path")]
    MissingPath,
    #[error("cannot resolve path '{path}': {reason}")]
    UnresolvablePath { path: String, reason: String },
    #[error("diagnostic has no range")]
    MissingRange,
    #[error(transparent)]
    Location(#[from] LocationError),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to run '{}' {}: {reason}", .program.display(), .args.join(" "))]
    ProcessFailure {
        program: PathBuf,
        args: Vec<String>,
        reason: String,
    },
    #[error(
        "failed to parse {engine} output ({reason})\n  command: {}\n  stdout: {stdout:?}\n  stderr: {stderr:?}",
        .args.join(" ")
    )]
    ParseFailure {
        engine: &'static str,
        args: Vec<String>,
        stdout: String,
        stderr: String,
        reason: String,
    },
    #[error("engine '{name}' not found. Available engines: {}", .available.join(", "))]
    UnknownEngine {
        name: String,
        available: Vec<&'static str>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_engine_message_lists_all() {
        let e = EngineError::UnknownEngine {
            name: "flake8".into(),
            available: vec!["ty", "pyright"],
        };
        assert_eq!(
            e.to_string(),
            "engine 'flake8' not found. Available engines: ty, pyright"
        );
    }

    #[test]
    fn test_parse_failure_carries_command_and_output() {
        let e = EngineError::ParseFailure {
            engine: "mypy",
            args: vec!["mypy".into(), "--output=json".into()],
            stdout: "garbage".into(),
            stderr: "boom".into(),
            reason: "expected value".into(),
        };
        let s = e.to_string();
        assert!(s.contains("mypy --output=json"));
        assert!(s.contains("garbage"));
        assert!(s.contains("boom"));
    }
}
