//! pyright adapter.
//!
//! `pyright --outputjson` prints a single document. Ranges use 0-based lines
//! and characters, both shifted by one here.

use super::process::BinarySlot;
use super::reveal::{capture, RevealType};
use super::{location_path, normalize_all, Adapter, CheckOptions, CommandLine, EngineKind, Normalized};
use crate::error::{EngineError, NormalizeError};
use crate::fingerprint::fingerprint_of;
use crate::models::{Issue, LineColumnPosition, Location, PositionRange, Severity, SeverityTable, MISC_CHECK};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

pub const SEVERITY: SeverityTable = SeverityTable::new(
    "pyright",
    &[
        ("information", Severity::Info),
        ("warning", Severity::Minor),
        ("error", Severity::Major),
    ],
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// `major.minor.patch` as reported in pyright's JSON.
pub struct PyrightVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FromStr for PyrightVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(format!("invalid version: {}", s));
        }
        let num = |p: &str| p.parse::<u32>().map_err(|_| format!("invalid version: {}", s));
        Ok(Self {
            major: num(parts[0])?,
            minor: num(parts[1])?,
            patch: num(parts[2])?,
        })
    }
}

impl fmt::Display for PyrightVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl<'de> Deserialize<'de> for PyrightVersion {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for PyrightVersion {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub files_analyzed: u64,
    pub error_count: u64,
    pub warning_count: u64,
    pub information_count: u64,
    pub time_in_sec: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct FilePosition {
    pub line: i64,
    pub character: i64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Range {
    pub start: FilePosition,
    pub end: FilePosition,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralDiagnostic {
    #[serde(default)]
    pub file: Option<String>,
    pub severity: String,
    pub message: String,
    #[serde(default)]
    pub range: Option<Range>,
    #[serde(default)]
    pub rule: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub version: PyrightVersion,
    pub time: String,
    pub general_diagnostics: Vec<GeneralDiagnostic>,
    pub summary: Summary,
}

pub struct Pyright {
    binary: BinarySlot,
}

impl Pyright {
    pub const fn new() -> Self {
        Self {
            binary: BinarySlot::new("pyright", "TYPY_PYRIGHT_BIN"),
        }
    }

    pub fn with_binary(program: impl Into<PathBuf>) -> Self {
        Self {
            binary: BinarySlot::preset("pyright", "TYPY_PYRIGHT_BIN", program.into()),
        }
    }

    fn base(&self) -> Result<CommandLine, EngineError> {
        self.binary.command(|| None)
    }

    fn to_issue(diag: &GeneralDiagnostic) -> Result<Issue, NormalizeError> {
        let range = diag.range.ok_or(NormalizeError::MissingRange)?;
        let begin = LineColumnPosition::from_zero_based(range.start.line, range.start.character)?;
        let end = LineColumnPosition::from_zero_based(range.end.line, range.end.character)?;
        Ok(Issue {
            check_name: diag.rule.clone().unwrap_or_else(|| MISC_CHECK.to_string()),
            description: diag.message.clone(),
            location: Location::with_positions(
                location_path(diag.file.as_deref())?,
                PositionRange::lines_columns(begin, end),
            ),
            severity: SEVERITY.map(&diag.severity),
            fingerprint: fingerprint_of(diag),
        })
    }
}

impl Default for Pyright {
    fn default() -> Self {
        Self::new()
    }
}

fn reveal_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^Type of "(?P<sym>.*?)" is "(?P<typ>.*)"$"#).expect("valid regex")
    })
}

impl Adapter for Pyright {
    type Analysis = Analysis;
    const KIND: EngineKind = EngineKind::Pyright;
    const SEVERITY: &'static SeverityTable = &SEVERITY;

    fn check_command(&self, options: &CheckOptions) -> Result<CommandLine, EngineError> {
        Ok(self
            .base()?
            .flag("--outputjson", true)
            .opt("--project", options.project.as_ref().map(|p| p.display()))
            .opt("--pythonplatform", options.python_platform.as_deref())
            .opt("--pythonversion", options.python_version.as_deref())
            .opt("--threads", options.threads)
            .opt("--level", options.level.as_deref())
            .flag("--verbose", options.verbose)
            .opt("--verifytypes", options.verify_types.as_deref())
            .paths(&options.resolved_files()))
    }

    fn version_command(&self) -> Result<CommandLine, EngineError> {
        Ok(self.base()?.arg("--version"))
    }

    fn parse(&self, stdout: &str) -> Result<Analysis, String> {
        serde_json::from_str(&stdout.replace('\u{a0}', " ")).map_err(|e| e.to_string())
    }

    fn normalize(&self, analysis: &Analysis) -> Normalized {
        normalize_all(Self::KIND, &analysis.general_diagnostics, Self::to_issue)
    }

    /// pyright's own `summary.timeInSec`; the measured time when that is unusable.
    fn elapsed(&self, analysis: &Analysis, measured: Duration) -> Duration {
        Duration::try_from_secs_f64(analysis.summary.time_in_sec).unwrap_or(measured)
    }

    fn reveal_type(&self, text: &str) -> Option<RevealType> {
        capture(reveal_pattern(), text)
    }
}
