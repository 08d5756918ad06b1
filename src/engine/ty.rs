//! ty adapter.
//!
//! `ty check --output-format=gitlab` already emits Code Quality issues, so
//! this adapter mostly validates: locations are re-checked, severities are
//! matched against the canonical names and a missing fingerprint is filled in.

use super::process::{python_launcher, BinarySlot};
use super::reveal::{capture, RevealType};
use super::{location_path, normalize_all, Adapter, CheckOptions, CommandLine, EngineKind, Normalized};
use crate::error::{EngineError, NormalizeError};
use crate::fingerprint::fingerprint_of;
use crate::models::{
    Issue, LineColumnPosition, LineRange, Location, OffsetPosition, Position, PositionRange,
    Severity, SeverityTable, MISC_CHECK,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

pub const SEVERITY: SeverityTable = SeverityTable::new(
    "ty",
    &[
        ("info", Severity::Info),
        ("minor", Severity::Minor),
        ("major", Severity::Major),
        ("critical", Severity::Critical),
        ("blocker", Severity::Blocker),
    ],
);

const LAUNCHER: &str =
    "import os; from ty.__main__ import find_ty_bin; print(os.fsdecode(find_ty_bin()))";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRange {
    pub begin: RawPosition,
    pub end: RawPosition,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RawLines {
    pub begin: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLocation {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<RawLines>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<RawRange>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub check_name: Option<String>,
    pub description: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    pub location: RawLocation,
}

pub type Analysis = Vec<Diagnostic>;

fn position(raw: &RawPosition) -> Result<Position, NormalizeError> {
    match (raw.line, raw.offset) {
        (Some(line), _) => Ok(LineColumnPosition::new(line, raw.column.unwrap_or(1))?.into()),
        (None, Some(offset)) => Ok(OffsetPosition::new(offset)?.into()),
        (None, None) => Err(NormalizeError::MissingRange),
    }
}

pub struct Ty {
    binary: BinarySlot,
}

impl Ty {
    pub const fn new() -> Self {
        Self {
            binary: BinarySlot::new("ty", "TYPY_TY_BIN"),
        }
    }

    pub fn with_binary(program: impl Into<PathBuf>) -> Self {
        Self {
            binary: BinarySlot::preset("ty", "TYPY_TY_BIN", program.into()),
        }
    }

    fn base(&self) -> Result<CommandLine, EngineError> {
        self.binary.command(|| python_launcher(LAUNCHER))
    }

    fn to_issue(diag: &Diagnostic) -> Result<Issue, NormalizeError> {
        let raw = &diag.location;
        let lines = raw
            .lines
            .map(|l| LineRange::new(l.begin, l.end))
            .transpose()?;
        let positions = raw
            .positions
            .as_ref()
            .map(|r| -> Result<PositionRange, NormalizeError> {
                Ok(PositionRange::new(position(&r.begin)?, position(&r.end)?)?)
            })
            .transpose()?;
        let location = Location::new(location_path(raw.path.as_deref())?, lines, positions)?;
        Ok(Issue {
            check_name: diag.check_name.clone().unwrap_or_else(|| MISC_CHECK.to_string()),
            description: diag.description.clone(),
            location,
            severity: diag.severity.as_deref().and_then(|s| SEVERITY.map(s)),
            fingerprint: diag.fingerprint.clone().or_else(|| fingerprint_of(diag)),
        })
    }
}

impl Default for Ty {
    fn default() -> Self {
        Self::new()
    }
}

fn reveal_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[Rr]evealed type:? `(?P<typ>.*)`").expect("valid regex"))
}

impl Adapter for Ty {
    type Analysis = Analysis;
    const KIND: EngineKind = EngineKind::Ty;
    const SEVERITY: &'static SeverityTable = &SEVERITY;

    fn check_command(&self, options: &CheckOptions) -> Result<CommandLine, EngineError> {
        options.ignore_unsupported(Self::KIND, &["threads", "verify_types", "level"]);
        Ok(self
            .base()?
            .arg("check")
            .opt_eq("--output-format", Some("gitlab"))
            .opt("--python-version", options.python_version.as_deref())
            .opt("--python-platform", options.python_platform.as_deref())
            .opt("--project", options.project.as_ref().map(|p| p.display()))
            .flag("-v", options.verbose)
            .paths(&options.resolved_files()))
    }

    fn version_command(&self) -> Result<CommandLine, EngineError> {
        Ok(self.base()?.arg("version"))
    }

    fn parse(&self, stdout: &str) -> Result<Analysis, String> {
        let text = stdout.replace('\u{a0}', " ");
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    fn normalize(&self, analysis: &Analysis) -> Normalized {
        normalize_all(Self::KIND, analysis, Self::to_issue)
    }

    fn reveal_type(&self, text: &str) -> Option<RevealType> {
        capture(reveal_pattern(), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "[
  {\"check_name\": \"invalid-assignment\", \"description\": \"invalid-assignment: Object of type\u{a0}`Literal[1]` is not assignable to `Foo`\",
   \"severity\": \"major\", \"fingerprint\": \"4f3b2a\",
   \"location\": {\"path\": \"/work/a.py\", \"positions\": {\"begin\": {\"line\": 9, \"column\": 10}, \"end\": {\"line\": 9, \"column\": 11}}}},
  {\"check_name\": \"revealed-type\", \"description\": \"revealed-type: Revealed type: `Literal[1]`\",
   \"severity\": \"info\",
   \"location\": {\"path\": \"/work/a.py\", \"positions\": {\"begin\": {\"line\": 3, \"column\": 13}, \"end\": {\"line\": 3, \"column\": 14}}}},
  {\"check_name\": \"broken\", \"description\": \"no range\", \"severity\": \"major\",
   \"location\": {\"path\": \"/work/a.py\"}}
]";

    #[test]
    fn test_pass_through_with_validation() {
        let analysis = Ty::new().parse(SAMPLE).unwrap();
        assert_eq!(analysis.len(), 3);
        assert!(analysis[0].description.contains("type `Literal[1]`"));
        let out = Ty::new().normalize(&analysis);
        assert_eq!(out.issues.len(), 2);
        assert_eq!(out.dropped, 1);
        assert_eq!(out.issues[0].fingerprint.as_deref(), Some("4f3b2a"));
        assert!(out.issues[1].fingerprint.is_some());
        assert_eq!(out.issues[0].severity, Some(Severity::Major));
    }

    #[test]
    fn test_unknown_severity_is_unset() {
        let stdout = r#"[{"check_name": "x", "description": "d", "severity": "fatal",
            "location": {"path": "a.py", "lines": {"begin": 1, "end": 1}}}]"#;
        let out = Ty::new().normalize(&Ty::new().parse(stdout).unwrap());
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].severity, None);
        assert!(out.issues[0].location.lines().is_some());
    }

    #[test]
    fn test_empty_output_is_no_issues() {
        assert!(Ty::new().parse("  \n").unwrap().is_empty());
        assert!(Ty::new().parse("[]").unwrap().is_empty());
        assert!(Ty::new().parse("error[x]: not json").is_err());
    }

    #[test]
    fn test_reveal_type() {
        let rt = Ty::new()
            .reveal_type("revealed-type: Revealed type: `Literal[1]`")
            .unwrap();
        assert_eq!(rt.typ, "Literal[1]");
        assert!(Ty::new().reveal_type("unresolved-reference: Name `x` used when not defined").is_none());
    }

    #[test]
    fn test_command_line() {
        let mut opts = CheckOptions::new(["/tmp/a.py"]);
        opts.python_version = Some("3.12".into());
        let cmd = Ty::with_binary("/opt/ty").check_command(&opts).unwrap();
        assert_eq!(
            cmd.args(),
            &["check", "--output-format=gitlab", "--python-version", "3.12", "/tmp/a.py"]
        );
    }
}
