//! Canonical issue and report models shared by every engine.

pub mod location;
pub mod severity;

pub use location::{LineColumnPosition, LineRange, Location, OffsetPosition, Position, PositionRange};
pub use severity::{Severity, SeverityTable};

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Check name used when an engine reports no rule code.
pub const MISC_CHECK: &str = "misc";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A single normalized diagnostic (GitLab Code Quality shape).
pub struct Issue {
    pub check_name: String,
    pub description: String,
    pub location: Location,
    pub severity: Option<Severity>,
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Which engine and binary version produced a report.
pub struct Emitter {
    pub name: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
/// Issues produced by one engine invocation.
pub struct Report {
    issues: Vec<Issue>,
    #[serde(serialize_with = "serialize_duration")]
    elapsed: Duration,
    time: DateTime<Local>,
    emitter: Emitter,
}

impl Report {
    pub fn new(issues: Vec<Issue>, elapsed: Duration, time: DateTime<Local>, emitter: Emitter) -> Self {
        Self {
            issues,
            elapsed,
            time,
            emitter,
        }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn time(&self) -> DateTime<Local> {
        self.time
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    /// Highest severity among the issues, if any carries one.
    pub fn max_severity(&self) -> Option<Severity> {
        self.issues.iter().filter_map(|i| i.severity).max()
    }
}

/// ISO-8601 duration, e.g. `PT1.250000S`.
fn serialize_duration<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("PT{}.{:06}S", d.as_secs(), d.subsec_micros()))
}
