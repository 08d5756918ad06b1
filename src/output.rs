//! Output rendering for check, reveal, and engines commands.
//!
//! Supports `human` (default), `json` (full reports) and `gitlab` (flat
//! Code Quality issue array) outputs.

use crate::engine::{EngineKind, RevealType};
use crate::models::{Issue, Report, Severity};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

fn use_colors(output: &str) -> bool {
    output == "human" && std::env::var_os("NO_COLOR").is_none()
}

/// Per-file source lines for display, shared across renderings.
#[derive(Default)]
pub struct SourceCache {
    files: Mutex<HashMap<String, Option<Arc<Vec<String>>>>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1-based `line` of `path`, if the file is readable.
    pub fn line(&self, path: &str, line: u32) -> Option<String> {
        let lines = {
            let mut files = self.files.lock().ok()?;
            files
                .entry(path.to_string())
                .or_insert_with(|| {
                    fs::read_to_string(path)
                        .ok()
                        .map(|s| Arc::new(s.lines().map(String::from).collect()))
                })
                .clone()?
        };
        let idx = usize::try_from(line).ok()?.checked_sub(1)?;
        lines.get(idx).cloned()
    }
}

fn display_path(path: &str) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(Path::new(path), cwd))
        .filter(|rel| !rel.starts_with(".."))
        .map(|rel| rel.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

fn severity_tag(sev: Option<Severity>, color: bool) -> (String, String) {
    let label = format!("⟦{}⟧", sev.map(|s| s.as_str()).unwrap_or("unknown"));
    if !color {
        let icon = match sev {
            Some(Severity::Info) | None => "◆",
            Some(Severity::Minor) => "▲",
            _ => "✖",
        };
        return (icon.to_string(), label);
    }
    match sev {
        Some(Severity::Info) | None => ("◆".blue().to_string(), label.blue().bold().to_string()),
        Some(Severity::Minor) => ("▲".yellow().to_string(), label.yellow().bold().to_string()),
        _ => ("✖".red().to_string(), label.red().bold().to_string()),
    }
}

fn render_issue(is: &Issue, color: bool, cache: &SourceCache) -> String {
    let (icon, sev) = severity_tag(is.severity, color);
    let start = is.location.start();
    let mut place = display_path(is.location.path());
    if let Some((line, col)) = start {
        place.push_str(&format!(":{}", line));
        if let Some(c) = col {
            place.push_str(&format!(":{}", c));
        }
    }
    let place = if color { place.bold().to_string() } else { place };
    let mut out = format!("{} {} {} ❲{}❳ — {}", icon, sev, place, is.check_name, is.description);
    if let Some(src) = start.and_then(|(line, _)| cache.line(is.location.path(), line).map(|s| (line, s))) {
        let gutter = format!("{:>5} |", src.0);
        let gutter = if color { gutter.bright_black().to_string() } else { gutter };
        out.push_str(&format!("\n{} {}", gutter, src.1));
    }
    out
}

fn render_summary(report: &Report, color: bool) -> String {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for sev in Severity::ALL {
        let n = report.issues().iter().filter(|i| i.severity == Some(sev)).count();
        if n > 0 {
            counts.push((sev.as_str().to_string(), n));
        }
    }
    let unset = report.issues().iter().filter(|i| i.severity.is_none()).count();
    if unset > 0 {
        counts.push(("unknown".to_string(), unset));
    }
    let emitter = report.emitter();
    let summary = format!(
        "— {}{} — issues={}{} elapsed={}ms",
        emitter.name,
        emitter.version.as_deref().map(|v| format!(" ({})", v)).unwrap_or_default(),
        report.issues().len(),
        counts
            .iter()
            .map(|(k, n)| format!(" {}={}", k, n))
            .collect::<String>(),
        report.elapsed().as_millis()
    );
    if color {
        summary.bold().to_string()
    } else {
        summary
    }
}

/// Print reports in the requested format.
pub fn print_reports(reports: &[Report], output: &str, cache: &SourceCache) {
    match output {
        "json" => println!("{}", to_pretty(&compose_reports_json(reports))),
        "gitlab" => println!("{}", to_pretty(&compose_gitlab_json(reports))),
        _ => {
            let color = use_colors(output);
            for report in reports {
                for is in report.issues() {
                    println!("{}", render_issue(is, color, cache));
                }
                println!("{}", render_summary(report, color));
            }
        }
    }
}

/// One reveal_type result found in an engine's report.
#[derive(Debug, Clone, Serialize)]
pub struct RevealRow {
    pub engine: EngineKind,
    pub path: String,
    pub line: Option<u32>,
    #[serde(flatten)]
    pub reveal: RevealType,
}

/// Print reveal_type results, one row per engine and diagnostic.
pub fn print_reveals(rows: &[RevealRow], output: &str) {
    match output {
        "json" | "gitlab" => println!("{}", to_pretty(&json!(rows))),
        _ => {
            let color = use_colors(output);
            for r in rows {
                let engine = format!("{:<8}", r.engine.as_str());
                let engine = if color { engine.cyan().bold().to_string() } else { engine };
                let place = match r.line {
                    Some(l) => format!("{}:{}", display_path(&r.path), l),
                    None => display_path(&r.path),
                };
                let sym = r.reveal.sym.as_deref().map(|s| format!(" ({})", s)).unwrap_or_default();
                println!("{} {} {}{}", engine, place, r.reveal.typ, sym);
            }
        }
    }
}

/// Print registered engines with their version or resolution error.
pub fn print_engines(rows: &[(EngineKind, Result<String, String>)], output: &str) {
    match output {
        "json" | "gitlab" => {
            let items: Vec<_> = rows
                .iter()
                .map(|(k, v)| match v {
                    Ok(ver) => json!({"name": k.as_str(), "version": ver}),
                    Err(e) => json!({"name": k.as_str(), "version": null, "error": e}),
                })
                .collect();
            println!("{}", to_pretty(&json!(items)));
        }
        _ => {
            let color = use_colors(output);
            for (k, v) in rows {
                match v {
                    Ok(ver) if color => println!("{:<8} {}", k.as_str().green().bold(), ver),
                    Ok(ver) => println!("{:<8} {}", k.as_str(), ver),
                    Err(e) if color => println!("{:<8} {}", k.as_str().red().bold(), e),
                    Err(e) => println!("{:<8} {}", k.as_str(), e),
                }
            }
        }
    }
}

fn to_pretty(v: &JsonVal) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

/// Compose reports JSON array (pure) for testing/snapshot purposes.
pub fn compose_reports_json(reports: &[Report]) -> JsonVal {
    JsonVal::Array(
        reports
            .iter()
            .map(|r| serde_json::to_value(r).unwrap_or(JsonVal::Null))
            .collect(),
    )
}

/// Compose the flat Code Quality issue array across all reports.
pub fn compose_gitlab_json(reports: &[Report]) -> JsonVal {
    JsonVal::Array(
        reports
            .iter()
            .flat_map(|r| r.issues())
            .map(|i| serde_json::to_value(i).unwrap_or(JsonVal::Null))
            .collect(),
    )
}
