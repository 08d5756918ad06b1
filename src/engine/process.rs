//! Process execution and engine binary discovery.

use super::command::CommandLine;
use crate::error::EngineError;
use crate::utils::find_on_path;
use std::env;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Raw result of one engine invocation.
pub struct Captured {
    /// Program and arguments as run.
    pub argv: Vec<String>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: ExitStatus,
    pub elapsed: Duration,
}

impl Captured {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run `cmd` to completion, capturing both streams and the wall-clock time.
///
/// A non-zero exit code is not a failure: checkers exit 1 when they find errors.
pub fn run_timed(cmd: &CommandLine) -> Result<Captured, EngineError> {
    debug!(command = %cmd, "running engine");
    let start = Instant::now();
    let output = Command::new(cmd.program())
        .args(cmd.os_args())
        .stdin(Stdio::null())
        .output()
        .map_err(|e| EngineError::ProcessFailure {
            program: cmd.program().to_path_buf(),
            args: cmd.args().to_vec(),
            reason: e.to_string(),
        })?;
    let elapsed = start.elapsed();
    debug!(command = %cmd, status = ?output.status, elapsed_ms = elapsed.as_millis() as u64, "engine finished");

    if output.status.code().is_none() && output.stdout.is_empty() {
        return Err(EngineError::ProcessFailure {
            program: cmd.program().to_path_buf(),
            args: cmd.args().to_vec(),
            reason: format!("terminated abnormally ({})", output.status),
        });
    }

    Ok(Captured {
        argv: cmd.argv(),
        stdout: output.stdout,
        stderr: output.stderr,
        status: output.status,
        elapsed,
    })
}

/// Lazily resolved launcher for one engine: the program plus any leading
/// arguments (e.g. `python3 -m mypy`).
pub struct BinarySlot {
    tool: &'static str,
    env_var: &'static str,
    cell: OnceLock<Vec<String>>,
}

impl BinarySlot {
    pub const fn new(tool: &'static str, env_var: &'static str) -> Self {
        Self {
            tool,
            env_var,
            cell: OnceLock::new(),
        }
    }

    /// Slot already pointing at `program`; discovery never runs.
    pub fn preset(tool: &'static str, env_var: &'static str, program: PathBuf) -> Self {
        Self {
            tool,
            env_var,
            cell: OnceLock::from(vec![program.to_string_lossy().into_owned()]),
        }
    }

    /// Resolve on first use: env override, then `PATH`, then `fallback`.
    /// Failures are not cached so a later call can succeed.
    pub fn command(
        &self,
        fallback: impl FnOnce() -> Option<Vec<String>>,
    ) -> Result<CommandLine, EngineError> {
        if let Some(launcher) = self.cell.get() {
            return Ok(CommandLine::from_launcher(launcher));
        }
        let found = env::var_os(self.env_var)
            .map(|v| vec![v.to_string_lossy().into_owned()])
            .or_else(|| find_on_path(self.tool).map(|p| vec![p.to_string_lossy().into_owned()]))
            .or_else(fallback)
            .ok_or_else(|| EngineError::ProcessFailure {
                program: PathBuf::from(self.tool),
                args: Vec::new(),
                reason: format!(
                    "executable not found (set {} or install {} on PATH)",
                    self.env_var, self.tool
                ),
            })?;
        debug!(tool = self.tool, launcher = ?found, "resolved engine binary");
        Ok(CommandLine::from_launcher(self.cell.get_or_init(|| found)))
    }
}

fn python() -> Option<String> {
    env::var("TYPY_PYTHON")
        .ok()
        .or_else(|| find_on_path("python3").map(|p| p.to_string_lossy().into_owned()))
        .or_else(|| find_on_path("python").map(|p| p.to_string_lossy().into_owned()))
}

/// Ask a Python companion package where its bundled binary lives.
/// `snippet` must print the path on stdout.
pub fn python_launcher(snippet: &str) -> Option<Vec<String>> {
    let py = python()?;
    let out = Command::new(&py)
        .args(["-c", snippet])
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let path = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!path.is_empty()).then(|| vec![path])
}

/// `python -m <module>` when the module is importable.
pub fn python_module(module: &str) -> Option<Vec<String>> {
    let py = python()?;
    let ok = Command::new(&py)
        .args(["-c", &format!("import {}", module)])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    ok.then(|| vec![py, "-m".to_string(), module.to_string()])
}
