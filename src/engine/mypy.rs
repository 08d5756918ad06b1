//! mypy adapter.
//!
//! `mypy --output=json` prints one JSON object per line. Lines are 1-based,
//! columns 0-based.

use super::process::{python_module, BinarySlot};
use super::reveal::{capture, RevealType};
use super::{location_path, normalize_all, Adapter, CheckOptions, CommandLine, EngineKind, Normalized};
use crate::error::EngineError;
use crate::fingerprint::fingerprint_of;
use crate::models::{Issue, LineColumnPosition, Location, PositionRange, Severity, SeverityTable, MISC_CHECK};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

pub const SEVERITY: SeverityTable = SeverityTable::new(
    "mypy",
    &[("note", Severity::Info), ("error", Severity::Major)],
);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub file: String,
    pub line: i64,
    pub column: i64,
    pub message: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    pub severity: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Analysis {
    pub messages: Vec<Message>,
}

pub struct Mypy {
    binary: BinarySlot,
}

impl Mypy {
    pub const fn new() -> Self {
        Self {
            binary: BinarySlot::new("mypy", "TYPY_MYPY_BIN"),
        }
    }

    pub fn with_binary(program: impl Into<PathBuf>) -> Self {
        Self {
            binary: BinarySlot::preset("mypy", "TYPY_MYPY_BIN", program.into()),
        }
    }

    fn base(&self) -> Result<CommandLine, EngineError> {
        self.binary.command(|| python_module("mypy"))
    }

    fn to_issue(message: &Message) -> Result<Issue, crate::error::NormalizeError> {
        let at = LineColumnPosition::new(message.line, message.column.saturating_add(1))?;
        Ok(Issue {
            check_name: message.code.clone().unwrap_or_else(|| MISC_CHECK.to_string()),
            description: message.message.clone(),
            location: Location::with_positions(location_path(Some(&message.file))?, PositionRange::point(at)),
            severity: SEVERITY.map(&message.severity),
            fingerprint: fingerprint_of(message),
        })
    }
}

impl Default for Mypy {
    fn default() -> Self {
        Self::new()
    }
}

fn reveal_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"Revealed type is "(?P<typ>[^"]*)""#).expect("valid regex"))
}

impl Adapter for Mypy {
    type Analysis = Analysis;
    const KIND: EngineKind = EngineKind::Mypy;
    const SEVERITY: &'static SeverityTable = &SEVERITY;

    fn check_command(&self, options: &CheckOptions) -> Result<CommandLine, EngineError> {
        options.ignore_unsupported(Self::KIND, &["threads", "verify_types", "level"]);
        Ok(self
            .base()?
            .opt_eq("--output", Some("json"))
            .opt_eq("--python-version", options.python_version.as_deref())
            .opt_eq("--platform", options.python_platform.as_deref())
            .opt_eq("--config-file", options.project.as_ref().map(|p| p.display()))
            .flag("--verbose", options.verbose)
            .paths(&options.resolved_files()))
    }

    fn version_command(&self) -> Result<CommandLine, EngineError> {
        Ok(self.base()?.arg("--version"))
    }

    fn parse(&self, stdout: &str) -> Result<Analysis, String> {
        let messages = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .enumerate()
            .map(|(n, l)| {
                serde_json::from_str::<Message>(l).map_err(|e| format!("line {}: {}", n + 1, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Analysis { messages })
    }

    fn normalize(&self, analysis: &Analysis) -> Normalized {
        normalize_all(Self::KIND, &analysis.messages, Self::to_issue)
    }

    fn reveal_type(&self, text: &str) -> Option<RevealType> {
        capture(reveal_pattern(), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    const SAMPLE: &str = r#"{"file": "a.py", "line": 5, "column": 2, "message": "Incompatible types in assignment", "hint": null, "code": "assignment", "severity": "error"}

{"file": "a.py", "line": 6, "column": 0, "message": "Revealed type is \"builtins.int\"", "hint": null, "code": null, "severity": "note"}
"#;

    #[test]
    fn test_parse_skips_blank_lines() {
        let analysis = Mypy::new().parse(SAMPLE).unwrap();
        assert_eq!(analysis.messages.len(), 2);
        assert!(Mypy::new().parse("").unwrap().messages.is_empty());
        assert!(Mypy::new().parse("a.py:1: error: nope").unwrap_err().starts_with("line 1"));
    }

    #[test]
    fn test_column_becomes_one_based() {
        let analysis = Mypy::new().parse(SAMPLE).unwrap();
        let out = Mypy::new().normalize(&analysis);
        assert_eq!(out.dropped, 0);
        let first = &out.issues[0];
        match first.location.positions().unwrap().begin() {
            Position::LineColumn(p) => assert_eq!((p.line(), p.column()), (5, 3)),
            Position::Offset(_) => panic!("expected line/column"),
        }
        assert_eq!(first.check_name, "assignment");
        assert_eq!(first.severity, Some(Severity::Major));
        assert_eq!(out.issues[1].check_name, MISC_CHECK);
        assert_eq!(out.issues[1].severity, Some(Severity::Info));
        assert_ne!(first.fingerprint, out.issues[1].fingerprint);
    }

    #[test]
    fn test_unresolvable_location_is_dropped() {
        let stdout = r#"{"file": "a.py", "line": 1, "column": 0, "message": "x", "hint": null, "code": "misc", "severity": "error"}
{"file": "", "line": -1, "column": -1, "message": "bad config", "hint": null, "code": null, "severity": "error"}
{"file": "b.py", "line": 2, "column": 4, "message": "y", "hint": null, "code": "misc", "severity": "error"}"#;
        let analysis = Mypy::new().parse(stdout).unwrap();
        let out = Mypy::new().normalize(&analysis);
        assert_eq!(out.issues.len(), 2);
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn test_reveal_type() {
        let m = Mypy::new();
        assert_eq!(
            m.reveal_type("Revealed type is \"builtins.int\"").unwrap().typ,
            "builtins.int"
        );
        assert_eq!(
            m.reveal_type("Revealed type is \"Literal[1]?\"").unwrap().typ,
            "Literal[1]?"
        );
        assert!(m.reveal_type("Name \"x\" is not defined").is_none());
    }

    #[test]
    fn test_command_line() {
        let mut opts = CheckOptions::new(["/tmp/a.py"]);
        opts.python_version = Some("3.12".into());
        opts.threads = Some(8);
        let cmd = Mypy::with_binary("/usr/bin/mypy").check_command(&opts).unwrap();
        assert_eq!(
            cmd.args(),
            &["--output=json", "--python-version=3.12", "/tmp/a.py"]
        );
    }
}
