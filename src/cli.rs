//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "typy",
    version,
    about = "Run Python type checkers and normalize their diagnostics",
    long_about = "typy runs ty, pyright, pyrefly and mypy against the same files and reports every diagnostic in one canonical (GitLab Code Quality) shape.\n\nConfiguration precedence: CLI > typy.toml > defaults.",
    after_help = "Examples:\n  typy check src/app.py\n  typy check -e mypy -e pyright 'src/**/*.py' --output gitlab\n  typy reveal tests/files/reveal_type_var.py --output json\n  typy engines",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    /// Enable info-level logging to stderr
    #[arg(long, global = true)]
    pub verbose: bool,
    /// Enable debug-level logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Clone, Debug, Default)]
/// Options shared by commands that run engines.
pub struct RunArgs {
    #[arg(required = true, help = "Files or glob patterns to check")]
    pub files: Vec<String>,
    #[arg(short, long = "engine", help = "Engine to run (repeatable): ty|pyright|pyrefly|mypy (default: all)")]
    pub engines: Vec<String>,
    #[arg(long, help = "Repository root used for typy.toml discovery (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, help = "Output mode: human|json|gitlab (default: human)")]
    pub output: Option<String>,
    #[arg(long, help = "Worker threads passed to engines that support it")]
    pub threads: Option<usize>,
    #[arg(long, help = "Target Python version, e.g. 3.12")]
    pub python_version: Option<String>,
    #[arg(long, help = "Target platform, e.g. Linux|Darwin|Windows")]
    pub python_platform: Option<String>,
    #[arg(long, help = "Engine project/config file")]
    pub project: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Ask engines for verbose output")]
    pub tool_verbose: bool,
    #[arg(long, help = "Verify type completeness of a package (pyright)")]
    pub verify_types: Option<String>,
    #[arg(long, help = "Minimum diagnostic level: error|warning (pyright)")]
    pub level: Option<String>,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current typy version.")]
    Version,
    /// Run engines and print normalized reports
    #[command(
        about = "Run type checkers",
        long_about = "Run each selected engine on the given files and print one normalized report per engine. Exits 1 when any issue of severity major or higher is found.",
        after_help = "Examples:\n  typy check a.py\n  typy check -e pyright a.py --output json"
    )]
    Check(RunArgs),
    /// Extract reveal_type results for cross-engine comparison
    #[command(
        about = "Compare reveal_type results",
        long_about = "Run each selected engine and print the inferred types reported by reveal_type() calls, one line per engine and diagnostic."
    )]
    Reveal(RunArgs),
    /// List engines and the versions of their binaries
    #[command(about = "List engines", long_about = "List registered engines and query each binary's version.")]
    Engines,
}
