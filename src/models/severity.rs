//! Canonical severities and per-engine token tables.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Minor,
    Major,
    Critical,
    Blocker,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Info,
        Severity::Minor,
        Severity::Major,
        Severity::Critical,
        Severity::Blocker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Critical => "critical",
            Severity::Blocker => "blocker",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| format!("unknown severity '{}'", s))
    }
}

/// Native severity token -> canonical severity, owned by one engine.
pub struct SeverityTable {
    engine: &'static str,
    entries: &'static [(&'static str, Severity)],
}

impl SeverityTable {
    pub const fn new(engine: &'static str, entries: &'static [(&'static str, Severity)]) -> Self {
        Self { engine, entries }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(tok, _)| *tok)
    }

    pub fn lookup(&self, native: &str) -> Option<Severity> {
        self.entries
            .iter()
            .find(|(tok, _)| *tok == native)
            .map(|(_, sev)| *sev)
    }

    /// Map a native token; a miss logs one warning per (engine, token) and yields `None`.
    pub fn map(&self, native: &str) -> Option<Severity> {
        let found = self.lookup(native);
        if found.is_none() && first_miss(self.engine, native) {
            warn!(engine = self.engine, token = native, "unmapped severity {}", native);
        }
        found
    }
}

fn first_miss(engine: &str, token: &str) -> bool {
    static SEEN: OnceLock<Mutex<HashSet<(String, String)>>> = OnceLock::new();
    let seen = SEEN.get_or_init(|| Mutex::new(HashSet::new()));
    match seen.lock() {
        Ok(mut set) => set.insert((engine.to_string(), token.to_string())),
        Err(_) => true,
    }
}
