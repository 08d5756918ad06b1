//! Configuration discovery and effective settings resolution.
//!
//! typy reads `typy.toml|yaml|yml` from the repository root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `engines`: all registered engines (`ty`, `pyright`, `pyrefly`, `mypy`)
//! - `output`: `human`
//! - `threads`, `python_version`, `python_platform`, `project`, `level`: unset
//! - `tool_verbose`: false
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::engine::{CheckOptions, EngineKind};
use crate::error::EngineError;
use crate::utils::resolve_path;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML in {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid output mode '{0}' (expected human|json|gitlab)")]
    Output(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `typy.toml|yaml`.
pub struct TypyConfig {
    pub engines: Option<Vec<String>>,
    pub output: Option<String>,
    pub threads: Option<usize>,
    pub python_version: Option<String>,
    pub python_platform: Option<String>,
    /// Engine config/project path, relative to the repository root.
    pub project: Option<String>,
    pub tool_verbose: Option<bool>,
    pub level: Option<String>,
}

#[derive(Debug, Default, Clone)]
/// Values supplied on the command line; `None` defers to the config file.
pub struct Overrides {
    pub repo_root: Option<String>,
    pub engines: Vec<String>,
    pub output: Option<String>,
    pub threads: Option<usize>,
    pub python_version: Option<String>,
    pub python_platform: Option<String>,
    pub project: Option<String>,
    pub tool_verbose: Option<bool>,
    pub verify_types: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_found: bool,
    pub engines: Vec<EngineKind>,
    pub output: String,
    pub threads: Option<usize>,
    pub python_version: Option<String>,
    pub python_platform: Option<String>,
    pub project: Option<PathBuf>,
    pub tool_verbose: bool,
    pub verify_types: Option<String>,
    pub level: Option<String>,
}

impl Effective {
    /// Adapter options for `files` under this configuration.
    pub fn check_options(&self, files: Vec<PathBuf>) -> CheckOptions {
        CheckOptions {
            files,
            threads: self.threads,
            project: self.project.clone(),
            python_version: self.python_version.clone(),
            python_platform: self.python_platform.clone(),
            verbose: self.tool_verbose,
            verify_types: self.verify_types.clone(),
            level: self.level.clone(),
        }
    }
}

const CONFIG_NAMES: [&str; 3] = ["typy.toml", "typy.yaml", "typy.yml"];

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `typy.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `TypyConfig` from `typy.toml` or `typy.yaml|yml` if present.
pub fn load_config(root: &Path) -> Result<Option<TypyConfig>, ConfigError> {
    for name in CONFIG_NAMES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        debug!(path = %path.display(), "loading config");
        let s = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let cfg = if name.ends_with(".toml") {
            toml::from_str(&s).map_err(|source| ConfigError::Toml { path, source })?
        } else {
            serde_yaml::from_str(&s).map_err(|source| ConfigError::Yaml { path, source })?
        };
        return Ok(Some(cfg));
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: Overrides) -> Result<Effective, ConfigError> {
    // Absolute first: the parent of "." is "" and the walk would stop there.
    let start = PathBuf::from(cli.repo_root.as_deref().unwrap_or("."));
    let start = resolve_path(&start).map_err(|source| ConfigError::Read {
        path: start.clone(),
        source,
    })?;
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let engine_names = if !cli.engines.is_empty() {
        cli.engines
    } else {
        cfg.engines.unwrap_or_default()
    };
    let mut engines: Vec<EngineKind> = Vec::new();
    for name in &engine_names {
        let kind = name.parse::<EngineKind>()?;
        if !engines.contains(&kind) {
            engines.push(kind);
        }
    }
    if engines.is_empty() {
        engines = EngineKind::ALL.to_vec();
    }

    let output = cli
        .output
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if !matches!(output.as_str(), "human" | "json" | "gitlab") {
        return Err(ConfigError::Output(output));
    }

    // CLI project paths are taken as given; config ones are relative to the root.
    let project = cli
        .project
        .map(PathBuf::from)
        .or_else(|| cfg.project.map(|p| repo_root.join(p)));

    Ok(Effective {
        repo_root,
        config_found,
        engines,
        output,
        threads: cli.threads.or(cfg.threads),
        python_version: cli.python_version.or(cfg.python_version),
        python_platform: cli.python_platform.or(cfg.python_platform),
        project,
        tool_verbose: cli.tool_verbose.or(cfg.tool_verbose).unwrap_or(false),
        verify_types: cli.verify_types,
        level: cli.level.or(cfg.level),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn at(root: &Path) -> Overrides {
        Overrides {
            repo_root: root.to_str().map(String::from),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let eff = resolve_effective(at(dir.path())).unwrap();
        assert!(!eff.config_found);
        assert_eq!(eff.engines, EngineKind::ALL.to_vec());
        assert_eq!(eff.output, "human");
        assert!(!eff.tool_verbose);
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("typy.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
engines = ["mypy", "pyright"]
output = "json"
threads = 4
python_version = "3.12"
project = "pyproject.toml"
    "#
        )
        .unwrap();

        let nested = root.join("pkg/sub");
        fs::create_dir_all(&nested).unwrap();
        let eff = resolve_effective(at(&nested)).unwrap();
        assert_eq!(eff.repo_root, resolve_path(root).unwrap());
        assert_eq!(eff.engines, vec![EngineKind::Mypy, EngineKind::Pyright]);
        assert_eq!(eff.output, "json");
        assert_eq!(eff.threads, Some(4));
        assert_eq!(eff.project, Some(eff.repo_root.join("pyproject.toml")));
    }

    #[test]
    fn test_load_yaml_and_cli_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("typy.yaml"),
            "engines: [ty]\noutput: gitlab\ntool_verbose: true\npython_platform: Linux\n",
        )
        .unwrap();

        let mut cli = at(root);
        cli.engines = vec!["pyrefly".into(), "mypy".into(), "pyrefly".into()];
        cli.output = Some("human".into());
        let eff = resolve_effective(cli).unwrap();
        assert_eq!(eff.engines, vec![EngineKind::Pyrefly, EngineKind::Mypy]);
        assert_eq!(eff.output, "human");
        assert!(eff.tool_verbose);
        let opts = eff.check_options(vec![PathBuf::from("a.py")]);
        assert_eq!(opts.python_platform.as_deref(), Some("Linux"));
        assert!(opts.verbose);
    }

    #[test]
    fn test_unknown_engine_in_config_fails() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("typy.toml"), "engines = [\"flake8\"]\n").unwrap();
        let err = resolve_effective(at(dir.path())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Engine(EngineError::UnknownEngine { .. })
        ));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("typy.toml"), "engines = [\n").unwrap();
        assert!(matches!(
            load_config(dir.path()),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn test_invalid_output_mode() {
        let dir = tempdir().unwrap();
        let mut cli = at(dir.path());
        cli.output = Some("sarif".into());
        assert!(matches!(resolve_effective(cli), Err(ConfigError::Output(_))));
    }
}
