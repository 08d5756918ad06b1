//! Ordered argument builder for engine command lines.
//!
//! Unset or default-valued options emit nothing; only meaningful flags land
//! on the command line.

use std::ffi::OsString;
use std::fmt::Display;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A program plus its ordered arguments.
pub struct CommandLine {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Start from a launcher prefix such as `python3 -m mypy`.
    pub fn from_launcher(launcher: &[String]) -> Self {
        let mut it = launcher.iter();
        let mut cmd = Self::new(it.next().map(String::as_str).unwrap_or_default());
        cmd.args.extend(it.cloned());
        cmd
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(mut self, a: impl Into<String>) -> Self {
        self.args.push(a.into());
        self
    }

    /// `--flag` when `on`.
    pub fn flag(mut self, name: &str, on: bool) -> Self {
        if on {
            self.args.push(name.to_string());
        }
        self
    }

    /// `--name value` as two arguments.
    pub fn opt<T: Display>(mut self, name: &str, value: Option<T>) -> Self {
        if let Some(v) = value {
            self.args.push(name.to_string());
            self.args.push(v.to_string());
        }
        self
    }

    /// `--name=value` as one argument.
    pub fn opt_eq<T: Display>(mut self, name: &str, value: Option<T>) -> Self {
        if let Some(v) = value {
            self.args.push(format!("{}={}", name, v));
        }
        self
    }

    pub fn paths<'a>(mut self, paths: impl IntoIterator<Item = &'a PathBuf>) -> Self {
        self.args
            .extend(paths.into_iter().map(|p| p.to_string_lossy().to_string()));
        self
    }

    pub fn os_args(&self) -> Vec<OsString> {
        self.args.iter().map(OsString::from).collect()
    }

    /// Program followed by every argument, for error reports.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().to_string())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_options_are_omitted() {
        let cmd = CommandLine::new("pyright")
            .flag("--outputjson", true)
            .flag("--verbose", false)
            .opt("--threads", Some(4))
            .opt::<String>("--project", None)
            .opt_eq("--output-format", Some("json"))
            .opt_eq::<&str>("--python-version", None)
            .paths(&[PathBuf::from("/a.py")]);
        assert_eq!(
            cmd.args(),
            &["--outputjson", "--threads", "4", "--output-format=json", "/a.py"]
        );
        assert_eq!(cmd.to_string(), "pyright --outputjson --threads 4 --output-format=json /a.py");
    }

    #[test]
    fn test_launcher_prefix() {
        let cmd = CommandLine::from_launcher(&["python3".into(), "-m".into(), "mypy".into()])
            .arg("--version");
        assert_eq!(cmd.program(), Path::new("python3"));
        assert_eq!(cmd.args(), &["-m", "mypy", "--version"]);
    }
}
