//! Config discovery from the working directory.
//!
//! Kept in its own test binary: it changes the process working directory.

use std::env;
use std::fs;
use tempfile::tempdir;
use typy::config::{resolve_effective, Overrides};
use typy::engine::EngineKind;

#[test]
fn discovers_config_in_parent_of_working_dir() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::write(root.join("typy.toml"), "engines = [\"mypy\"]\noutput = \"json\"\n").unwrap();
    let nested = root.join("pkg/sub");
    fs::create_dir_all(&nested).unwrap();

    let previous = env::current_dir().unwrap();
    env::set_current_dir(&nested).unwrap();
    let eff = resolve_effective(Overrides::default());
    env::set_current_dir(previous).unwrap();

    let eff = eff.unwrap();
    assert!(eff.config_found);
    assert_eq!(eff.repo_root, root);
    assert_eq!(eff.engines, vec![EngineKind::Mypy]);
    assert_eq!(eff.output, "json");
}
