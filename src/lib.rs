//! typy core library.
//!
//! This crate runs external Python type checkers and normalizes their
//! diagnostics into one canonical report (GitLab Code Quality shape).
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `engine`: Engine adapters (ty, pyright, pyrefly, mypy) and the registry.
//! - `error`: Error types for process, parse, and normalization failures.
//! - `fingerprint`: Deterministic issue fingerprints.
//! - `models`: Canonical issue, location, severity, and report structs.
//! - `output`: Human/JSON/GitLab printers.
//! - `utils`: Supporting helpers.
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod models;
pub mod output;
pub mod utils;
