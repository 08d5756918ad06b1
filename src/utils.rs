//! Small helpers: path resolution, executable lookup, colored CLI prefixes.

use owo_colors::OwoColorize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Absolute, symlink-resolved form of `p` when it exists; absolute otherwise.
pub fn resolve_path(p: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    let p = p.as_ref();
    fs::canonicalize(p).or_else(|_| std::path::absolute(p))
}

/// Look up an executable named `name` on `PATH`.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .flat_map(|dir| candidates(&dir, name))
        .find(|cand| is_executable(cand))
}

fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    if cfg!(windows) {
        ["exe", "cmd", "bat"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", name, ext)))
            .collect()
    } else {
        vec![dir.join(name)]
    }
}

#[cfg(unix)]
fn is_executable(p: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(p)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(p: &Path) -> bool {
    p.is_file()
}

fn colors() -> bool {
    env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn warn_prefix() -> String {
    if colors() {
        "warning:".yellow().bold().to_string()
    } else {
        "warning:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_path_absolute_for_missing_file() {
        let p = resolve_path("definitely/not/here.py").unwrap();
        assert!(p.is_absolute());
        assert!(p.ends_with("definitely/not/here.py"));
    }

    #[test]
    fn test_resolve_path_canonicalizes_existing() {
        let dir = tempdir().unwrap();
        let f = dir.path().join("a.py");
        fs::write(&f, "x = 1\n").unwrap();
        let p = resolve_path(dir.path().join(".").join("a.py")).unwrap();
        assert_eq!(p, fs::canonicalize(&f).unwrap());
    }
}
