//! typy CLI binary entry point.
//! Resolves configuration, runs the selected engines and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::debug;
use typy::cli::{Cli, Commands, RunArgs};
use typy::config::{self, Effective, Overrides};
use typy::engine::EngineKind;
use typy::error::EngineError;
use typy::models::{Report, Severity};
use typy::output::{self, RevealRow, SourceCache};
use typy::utils;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);
    let code = match run(cli.cmd) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", utils::error_prefix(), e);
            2
        }
    };
    std::process::exit(code);
}

/// Initialize tracing/logging based on CLI flags.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}

fn run(cmd: Commands) -> Result<i32> {
    match cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Commands::Engines => {
            let rows: Vec<_> = EngineKind::ALL
                .par_iter()
                .map(|k| (*k, k.engine().version().map_err(|e| e.to_string())))
                .collect();
            output::print_engines(&rows, "human");
            Ok(0)
        }
        Commands::Check(args) => {
            let (eff, files) = prepare(args)?;
            let (reports, failed) = run_engines(&eff, &files);
            output::print_reports(&reports, &eff.output, &SourceCache::new());
            if failed {
                return Ok(2);
            }
            let gate = reports
                .iter()
                .filter_map(Report::max_severity)
                .any(|s| s >= Severity::Major);
            Ok(if gate { 1 } else { 0 })
        }
        Commands::Reveal(args) => {
            let (eff, files) = prepare(args)?;
            let (reports, failed) = run_engines(&eff, &files);
            let rows = reveal_rows(&reports);
            output::print_reveals(&rows, &eff.output);
            Ok(if failed { 2 } else { 0 })
        }
    }
}

fn prepare(args: RunArgs) -> Result<(Effective, Vec<PathBuf>)> {
    let eff = config::resolve_effective(Overrides {
        repo_root: args.repo_root,
        engines: args.engines,
        output: args.output,
        threads: args.threads,
        python_version: args.python_version,
        python_platform: args.python_platform,
        project: args.project,
        tool_verbose: args.tool_verbose.then_some(true),
        verify_types: args.verify_types,
        level: args.level,
    })?;
    if !eff.config_found && eff.output == "human" {
        eprintln!("{} No typy.toml found; using defaults.", utils::note_prefix());
    }
    let files = expand_files(&args.files)?;
    if files.is_empty() {
        anyhow::bail!("no files matched {:?}", args.files);
    }
    Ok((eff, files))
}

/// Expand glob patterns; plain paths are kept as given.
fn expand_files(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pat in patterns {
        if !pat.contains(['*', '?', '[']) {
            files.push(PathBuf::from(pat));
            continue;
        }
        for entry in glob::glob(pat).with_context(|| format!("bad glob pattern '{}'", pat))? {
            files.push(entry.with_context(|| format!("cannot read match of '{}'", pat))?);
        }
    }
    Ok(files)
}

/// Run every selected engine in parallel. Failed engines are reported on
/// stderr and flagged; the rest still produce reports.
fn run_engines(eff: &Effective, files: &[PathBuf]) -> (Vec<Report>, bool) {
    let opts = eff.check_options(files.to_vec());
    let results: Vec<(EngineKind, Result<Report, EngineError>)> = eff
        .engines
        .par_iter()
        .map(|k| (*k, k.engine().report(&opts)))
        .collect();
    let mut reports = Vec::new();
    let mut failed = false;
    for (kind, res) in results {
        match res {
            Ok(r) => reports.push(r),
            Err(e) => {
                failed = true;
                eprintln!("{} [{}] {}", utils::error_prefix(), kind, e);
            }
        }
    }
    (reports, failed)
}

fn reveal_rows(reports: &[Report]) -> Vec<RevealRow> {
    let mut rows = Vec::new();
    for report in reports {
        let Ok(kind) = report.emitter().name.parse::<EngineKind>() else {
            continue;
        };
        let engine = kind.engine();
        for issue in report.issues() {
            let Some(reveal) = engine.parse_reveal_type(&issue.description) else {
                continue;
            };
            rows.push(RevealRow {
                engine: kind,
                path: issue.location.path().to_string(),
                line: issue.location.start().map(|(l, _)| l),
                reveal,
            });
        }
    }
    if rows.is_empty() {
        eprintln!("{} no reveal_type diagnostics found", utils::warn_prefix());
    }
    rows
}
