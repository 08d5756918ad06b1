//! Engine adapters and the registry that selects them by name.
//!
//! Every adapter implements [`Adapter`], which fixes how its command line is
//! built, how native output is parsed and how native diagnostics become
//! canonical [`Issue`]s. The blanket [`Engine`] impl turns any adapter into
//! the object-safe interface the registry hands out.

pub mod command;
pub mod mypy;
pub mod process;
pub mod pyrefly;
pub mod pyright;
pub mod reveal;
pub mod ty;

pub use command::CommandLine;
pub use mypy::Mypy;
pub use pyrefly::Pyrefly;
pub use pyright::Pyright;
pub use reveal::RevealType;
pub use ty::Ty;

use crate::error::{EngineError, NormalizeError};
use crate::models::{Emitter, Issue, Report, SeverityTable};
use chrono::Local;
use process::{run_timed, Captured};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Ty,
    Pyright,
    Pyrefly,
    Mypy,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::Ty,
        EngineKind::Pyright,
        EngineKind::Pyrefly,
        EngineKind::Mypy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Ty => "ty",
            EngineKind::Pyright => "pyright",
            EngineKind::Pyrefly => "pyrefly",
            EngineKind::Mypy => "mypy",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(EngineKind::as_str).collect()
    }

    /// The process-wide adapter for this engine.
    pub fn engine(self) -> &'static dyn Engine {
        static TY: Ty = Ty::new();
        static PYRIGHT: Pyright = Pyright::new();
        static PYREFLY: Pyrefly = Pyrefly::new();
        static MYPY: Mypy = Mypy::new();
        match self {
            EngineKind::Ty => &TY,
            EngineKind::Pyright => &PYRIGHT,
            EngineKind::Pyrefly => &PYREFLY,
            EngineKind::Mypy => &MYPY,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EngineError::UnknownEngine {
                name: s.to_string(),
                available: EngineKind::names(),
            })
    }
}

/// Look up an engine adapter by name.
pub fn get(name: &str) -> Result<&'static dyn Engine, EngineError> {
    Ok(name.parse::<EngineKind>()?.engine())
}

#[derive(Debug, Clone, Default)]
/// Options shared by all adapters. Each adapter emits only the flags its tool
/// understands.
pub struct CheckOptions {
    pub files: Vec<PathBuf>,
    pub threads: Option<usize>,
    pub project: Option<PathBuf>,
    pub python_version: Option<String>,
    pub python_platform: Option<String>,
    pub verbose: bool,
    pub verify_types: Option<String>,
    /// Minimum diagnostic level (pyright only).
    pub level: Option<String>,
}

impl CheckOptions {
    pub fn new(files: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Input files as absolute paths.
    pub fn resolved_files(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .map(|f| crate::utils::resolve_path(f).unwrap_or_else(|_| f.clone()))
            .collect()
    }

    /// Log options `kind` has no flag for.
    fn ignore_unsupported(&self, kind: EngineKind, unsupported: &[&str]) {
        for name in unsupported {
            let set = match *name {
                "threads" => self.threads.is_some(),
                "project" => self.project.is_some(),
                "python_version" => self.python_version.is_some(),
                "python_platform" => self.python_platform.is_some(),
                "verbose" => self.verbose,
                "verify_types" => self.verify_types.is_some(),
                "level" => self.level.is_some(),
                _ => false,
            };
            if set {
                debug!(engine = kind.as_str(), option = name, "option not supported; omitted");
            }
        }
    }
}

/// Canonical issues from one analysis plus the count of dropped diagnostics.
#[derive(Debug, Default)]
pub struct Normalized {
    pub issues: Vec<Issue>,
    pub dropped: usize,
}

/// Convert each native diagnostic; failures drop that diagnostic with a warning.
pub fn normalize_all<'a, D: 'a>(
    kind: EngineKind,
    diagnostics: impl IntoIterator<Item = &'a D>,
    convert: impl Fn(&D) -> Result<Issue, NormalizeError>,
) -> Normalized {
    let mut out = Normalized::default();
    for (idx, diag) in diagnostics.into_iter().enumerate() {
        match convert(diag) {
            Ok(issue) => out.issues.push(issue),
            Err(e) => {
                warn!(engine = kind.as_str(), index = idx, "dropping diagnostic: {}", e);
                out.dropped += 1;
            }
        }
    }
    out
}

/// Resolve a native path into the absolute string stored in `Location`.
pub fn location_path(path: Option<&str>) -> Result<String, NormalizeError> {
    let p = path.filter(|p| !p.trim().is_empty()).ok_or(NormalizeError::MissingPath)?;
    crate::utils::resolve_path(p)
        .map(|abs| abs.to_string_lossy().into_owned())
        .map_err(|e| NormalizeError::UnresolvablePath {
            path: p.to_string(),
            reason: e.to_string(),
        })
}

/// Typed adapter contract implemented once per engine.
pub trait Adapter: Send + Sync {
    type Analysis: Serialize;
    const KIND: EngineKind;
    const SEVERITY: &'static SeverityTable;

    fn check_command(&self, options: &CheckOptions) -> Result<CommandLine, EngineError>;
    fn version_command(&self) -> Result<CommandLine, EngineError>;
    /// Parse stdout into the native schema; `Err` holds the parser's reason.
    fn parse(&self, stdout: &str) -> Result<Self::Analysis, String>;
    fn normalize(&self, analysis: &Self::Analysis) -> Normalized;
    fn reveal_type(&self, text: &str) -> Option<RevealType>;

    /// Elapsed time to report; defaults to the measured wall-clock time.
    fn elapsed(&self, _analysis: &Self::Analysis, measured: Duration) -> Duration {
        measured
    }

    fn execute(&self, options: &CheckOptions) -> Result<(Self::Analysis, Captured), EngineError> {
        let cmd = self.check_command(options)?;
        let captured = run_timed(&cmd)?;
        let stdout = captured.stdout_text();
        match self.parse(&stdout) {
            Ok(analysis) => Ok((analysis, captured)),
            Err(reason) => Err(EngineError::ParseFailure {
                engine: Self::KIND.as_str(),
                args: cmd.argv(),
                stdout,
                stderr: captured.stderr_text(),
                reason,
            }),
        }
    }

    fn run(&self, options: &CheckOptions) -> Result<Self::Analysis, EngineError> {
        self.execute(options).map(|(analysis, _)| analysis)
    }
}

/// Object-safe engine interface handed out by the registry.
pub trait Engine: Send + Sync {
    fn kind(&self) -> EngineKind;
    fn severity_table(&self) -> &'static SeverityTable;
    /// Trimmed output of the tool's version query.
    fn version(&self) -> Result<String, EngineError>;
    /// Native analysis as JSON.
    fn run_json(&self, options: &CheckOptions) -> Result<serde_json::Value, EngineError>;
    fn report(&self, options: &CheckOptions) -> Result<Report, EngineError>;
    fn parse_reveal_type(&self, text: &str) -> Option<RevealType>;
}

impl<A: Adapter> Engine for A {
    fn kind(&self) -> EngineKind {
        A::KIND
    }

    fn severity_table(&self) -> &'static SeverityTable {
        A::SEVERITY
    }

    fn version(&self) -> Result<String, EngineError> {
        let cmd = self.version_command()?;
        let out = run_timed(&cmd)?;
        Ok(out.stdout_text().trim().to_string())
    }

    fn run_json(&self, options: &CheckOptions) -> Result<serde_json::Value, EngineError> {
        let (analysis, captured) = self.execute(options)?;
        serde_json::to_value(&analysis).map_err(|e| EngineError::ParseFailure {
            engine: A::KIND.as_str(),
            args: captured.argv.clone(),
            stdout: captured.stdout_text(),
            stderr: captured.stderr_text(),
            reason: e.to_string(),
        })
    }

    fn report(&self, options: &CheckOptions) -> Result<Report, EngineError> {
        let time = Local::now();
        let (analysis, captured) = self.execute(options)?;
        let normalized = self.normalize(&analysis);
        if normalized.dropped > 0 {
            debug!(
                engine = A::KIND.as_str(),
                dropped = normalized.dropped,
                "some diagnostics could not be normalized"
            );
        }
        let version = match Engine::version(self) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(engine = A::KIND.as_str(), "version query failed: {}", e);
                None
            }
        };
        Ok(Report::new(
            normalized.issues,
            self.elapsed(&analysis, captured.elapsed),
            time,
            Emitter {
                name: A::KIND.as_str().to_string(),
                version,
            },
        ))
    }

    fn parse_reveal_type(&self, text: &str) -> Option<RevealType> {
        self.reveal_type(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineColumnPosition, Location, PositionRange, MISC_CHECK};

    #[test]
    fn test_registry_resolves_every_engine() {
        for kind in EngineKind::ALL {
            let engine = get(kind.as_str()).unwrap();
            assert_eq!(engine.kind(), kind);
        }
    }

    #[test]
    fn test_unknown_engine_lists_valid_names() {
        match get("flake8") {
            Err(EngineError::UnknownEngine { name, available }) => {
                assert_eq!(name, "flake8");
                assert_eq!(available, vec!["ty", "pyright", "pyrefly", "mypy"]);
            }
            _ => panic!("expected UnknownEngine"),
        }
    }

    #[test]
    fn test_severity_tables_cover_emitted_tokens() {
        let baseline: [(EngineKind, &[&str]); 4] = [
            (EngineKind::Mypy, &["note", "error"]),
            (EngineKind::Pyright, &["information", "warning", "error"]),
            (EngineKind::Pyrefly, &["info", "warn", "error"]),
            (EngineKind::Ty, &["info", "minor", "major"]),
        ];
        for (kind, tokens) in baseline {
            let table = kind.engine().severity_table();
            for token in tokens {
                assert!(table.lookup(token).is_some(), "{} lacks '{}'", kind, token);
            }
        }
    }

    #[test]
    fn test_reveal_patterns_compile_and_reject_plain_text() {
        for kind in EngineKind::ALL {
            assert!(kind.engine().parse_reveal_type("").is_none(), "{}", kind);
            assert!(kind.engine().parse_reveal_type("Name `x` is not defined").is_none());
        }
    }

    #[test]
    fn test_normalize_all_drops_only_failing_items() {
        let items = vec![Some(1i64), None, Some(3)];
        let out = normalize_all(EngineKind::Mypy, &items, |item| {
            let line = item.ok_or(NormalizeError::MissingRange)?;
            let at = LineColumnPosition::new(line, 1)?;
            Ok(Issue {
                check_name: MISC_CHECK.into(),
                description: String::new(),
                location: Location::with_positions("a.py", PositionRange::point(at)),
                severity: None,
                fingerprint: None,
            })
        });
        assert_eq!(out.issues.len(), 2);
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn test_location_path_rejects_empty() {
        assert!(matches!(location_path(None), Err(NormalizeError::MissingPath)));
        assert!(matches!(location_path(Some("  ")), Err(NormalizeError::MissingPath)));
        assert!(location_path(Some("a.py")).unwrap().ends_with("a.py"));
    }
}
