//! pyrefly adapter.
//!
//! `pyrefly check --output-format=json` prints `{"errors": [...]}` with
//! 1-based lines and columns. The binary ships inside the `pyrefly` Python
//! package, whose launcher knows where it lives.

use super::process::{python_launcher, BinarySlot};
use super::reveal::{capture, RevealType};
use super::{location_path, normalize_all, Adapter, CheckOptions, CommandLine, EngineKind, Normalized};
use crate::error::{EngineError, NormalizeError};
use crate::fingerprint::fingerprint_of;
use crate::models::{Issue, LineColumnPosition, Location, PositionRange, Severity, SeverityTable};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::debug;

pub const SEVERITY: SeverityTable = SeverityTable::new(
    "pyrefly",
    &[
        ("info", Severity::Info),
        ("warn", Severity::Minor),
        ("error", Severity::Major),
    ],
);

const LAUNCHER: &str = "from pyrefly.__main__ import get_pyrefly_bin; print(get_pyrefly_bin())";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Error {
    pub line: i64,
    pub column: i64,
    pub stop_line: i64,
    pub stop_column: i64,
    pub path: String,
    pub code: i64,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub concise_description: Option<String>,
    pub severity: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Analysis {
    pub errors: Vec<Error>,
}

pub struct Pyrefly {
    binary: BinarySlot,
}

impl Pyrefly {
    pub const fn new() -> Self {
        Self {
            binary: BinarySlot::new("pyrefly", "TYPY_PYREFLY_BIN"),
        }
    }

    pub fn with_binary(program: impl Into<PathBuf>) -> Self {
        Self {
            binary: BinarySlot::preset("pyrefly", "TYPY_PYREFLY_BIN", program.into()),
        }
    }

    fn base(&self) -> Result<CommandLine, EngineError> {
        self.binary.command(|| python_launcher(LAUNCHER))
    }

    fn to_issue(error: &Error) -> Result<Issue, NormalizeError> {
        let begin = LineColumnPosition::new(error.line, error.column)?;
        // A point range when pyrefly reports no usable end.
        let end = match LineColumnPosition::new(error.stop_line, error.stop_column) {
            Ok(end) => end,
            Err(e) => {
                debug!(engine = "pyrefly", code = %error.name, "end position unusable ({}); using start", e);
                begin
            }
        };
        Ok(Issue {
            check_name: error.name.clone(),
            description: error.description.clone(),
            location: Location::with_positions(
                location_path(Some(&error.path))?,
                PositionRange::lines_columns(begin, end),
            ),
            severity: SEVERITY.map(&error.severity),
            fingerprint: fingerprint_of(error),
        })
    }
}

impl Default for Pyrefly {
    fn default() -> Self {
        Self::new()
    }
}

fn reveal_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"revealed type: (?P<typ>.*)").expect("valid regex"))
}

impl Adapter for Pyrefly {
    type Analysis = Analysis;
    const KIND: EngineKind = EngineKind::Pyrefly;
    const SEVERITY: &'static SeverityTable = &SEVERITY;

    fn check_command(&self, options: &CheckOptions) -> Result<CommandLine, EngineError> {
        options.ignore_unsupported(Self::KIND, &["verify_types", "level"]);
        Ok(self
            .base()?
            .arg("check")
            .opt("--threads", options.threads)
            .opt_eq("--output-format", Some("json"))
            .opt_eq("--python-version", options.python_version.as_deref())
            .opt_eq("--python-platform", options.python_platform.as_deref())
            .opt("--config", options.project.as_ref().map(|p| p.display()))
            .flag("--verbose", options.verbose)
            .paths(&options.resolved_files()))
    }

    fn version_command(&self) -> Result<CommandLine, EngineError> {
        Ok(self.base()?.arg("--version"))
    }

    fn parse(&self, stdout: &str) -> Result<Analysis, String> {
        serde_json::from_str(stdout).map_err(|e| e.to_string())
    }

    fn normalize(&self, analysis: &Analysis) -> Normalized {
        normalize_all(Self::KIND, &analysis.errors, Self::to_issue)
    }

    fn reveal_type(&self, text: &str) -> Option<RevealType> {
        capture(reveal_pattern(), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    const SAMPLE: &str = r#"{"errors": [
  {"line": 9, "column": 10, "stop_line": 9, "stop_column": 11, "path": "/work/a.py", "code": -2,
   "name": "bad-assignment", "description": "`Literal[1]` is not assignable to `Foo`",
   "concise_description": "`Literal[1]` is not assignable to `Foo`", "severity": "error"},
  {"line": 3, "column": 13, "stop_line": 3, "stop_column": 14, "path": "/work/a.py", "code": -2,
   "name": "reveal-type", "description": "revealed type: Literal[1]",
   "concise_description": "revealed type: Literal[1]", "severity": "info"},
  {"line": 0, "column": 0, "stop_line": 0, "stop_column": 0, "path": "/work/a.py", "code": -2,
   "name": "parse-error", "description": "?", "concise_description": "?", "severity": "error"}
]}"#;

    #[test]
    fn test_positions_pass_through() {
        let analysis = Pyrefly::new().parse(SAMPLE).unwrap();
        let out = Pyrefly::new().normalize(&analysis);
        assert_eq!(out.issues.len(), 2);
        assert_eq!(out.dropped, 1);
        let range = out.issues[0].location.positions().unwrap();
        match (range.begin(), range.end()) {
            (Position::LineColumn(b), Position::LineColumn(e)) => {
                assert_eq!((b.line(), b.column()), (9, 10));
                assert_eq!((e.line(), e.column()), (9, 11));
            }
            _ => panic!("expected line/column range"),
        }
        assert_eq!(out.issues[0].check_name, "bad-assignment");
        assert_eq!(out.issues[1].severity, Some(Severity::Info));
    }

    #[test]
    fn test_bad_end_collapses_to_start() {
        let stdout = r#"{"errors": [
  {"line": 4, "column": 2, "stop_line": 0, "stop_column": 0, "path": "/work/a.py", "code": -2,
   "name": "bad-return", "description": "bad", "severity": "error"}
]}"#;
        let out = Pyrefly::new().normalize(&Pyrefly::new().parse(stdout).unwrap());
        assert_eq!(out.dropped, 0);
        let range = out.issues[0].location.positions().unwrap();
        assert_eq!(range.begin(), range.end());
        assert_eq!(out.issues[0].location.start(), Some((4, Some(2))));
    }

    #[test]
    fn test_reveal_type() {
        let analysis = Pyrefly::new().parse(SAMPLE).unwrap();
        let rt = Pyrefly::new()
            .reveal_type(&analysis.errors[1].description)
            .unwrap();
        assert_eq!(rt.typ, "Literal[1]");
        assert!(rt.sym.is_none());
    }

    #[test]
    fn test_command_line_places_subcommand_first() {
        let mut opts = CheckOptions::new(["/tmp/a.py"]);
        opts.threads = Some(4);
        opts.verify_types = Some("pkg".into());
        let cmd = Pyrefly::with_binary("/opt/pyrefly").check_command(&opts).unwrap();
        assert_eq!(
            cmd.args(),
            &["check", "--threads", "4", "--output-format=json", "/tmp/a.py"]
        );
    }

    #[test]
    fn test_schema_mismatch_is_error() {
        assert!(Pyrefly::new().parse(r#"[{"line": 1}]"#).is_err());
    }
}
