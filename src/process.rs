//! External command plumbing
//!
//! Every external tool call is described by an [`Invocation`]: a program, a
//! list of discrete argument tokens, an optional working directory and an
//! optional fully derived [`Environment`]. Invocations are handed to a
//! [`CommandRunner`], never to a shell, so argument values (paths with spaces,
//! quoted version strings) reach the tool exactly as built.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Snapshot of process environment variables
///
/// Derived copies are produced with [`Environment::with_appended`]; the
/// snapshot they came from and the real process environment are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<OsString, OsString>,
}

impl Environment {
    /// Capture the current process environment.
    #[must_use]
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars_os())
    }

    /// Build an environment from explicit key/value pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Look up a variable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    /// Number of variables in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// True if the snapshot holds no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterate over all variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars
            .iter()
            .map(|(key, value)| (key.as_os_str(), value.as_os_str()))
    }

    /// Return a copy with `flag` appended to the space-separated variable `key`.
    ///
    /// An existing value is kept and extended, never replaced.
    #[must_use]
    pub fn with_appended(&self, key: &str, flag: &str) -> Self {
        let mut derived = self.clone();
        let value = match self.get(key) {
            Some(existing) if !existing.is_empty() => {
                let mut value = existing.to_os_string();
                value.push(" ");
                value.push(flag);
                value
            }
            _ => OsString::from(flag),
        };
        derived.vars.insert(OsString::from(key), value);
        derived
    }
}

/// Exit status of a finished tool process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolExit(Option<i32>);

impl ToolExit {
    /// Exit status from a numeric code (`None` when killed by a signal).
    #[must_use]
    pub const fn new(code: Option<i32>) -> Self {
        Self(code)
    }

    /// Numeric exit code, if the process exited normally.
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        self.0
    }

    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self.0, Some(0))
    }
}

impl fmt::Display for ToolExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "no exit code (terminated by signal)"),
        }
    }
}

/// Captured result of a finished tool process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub status: ToolExit,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Output with the given exit code.
    pub fn new(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status: ToolExit::new(Some(code)),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.status.success()
    }

    /// Stdout followed by stderr.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len());
        text.push_str(&self.stdout);
        text.push_str(&self.stderr);
        text
    }
}

/// One external command, ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: Option<Environment>,
}

impl Invocation {
    /// Start describing a call to `program`.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
            env: None,
        }
    }

    /// Add a single argument token.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several argument tokens, in order.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run inside `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Run with exactly this environment instead of inheriting the parent's.
    #[must_use]
    pub fn env(mut self, env: Environment) -> Self {
        self.env = Some(env);
        self
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    #[must_use]
    pub const fn environment(&self) -> Option<&Environment> {
        self.env.as_ref()
    }
}

/// Renders the command line so it can be pasted into a shell.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_word(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", shell_word(arg))?;
        }
        Ok(())
    }
}

fn shell_word(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=./:,+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Executes invocations
///
/// The orchestrator only talks to external tools through this trait, so a
/// scripted runner can stand in for CMake and the interpreter in tests.
pub trait CommandRunner {
    /// Run to completion and capture output.
    ///
    /// Blocks until the process exits. Returns `Err` only when the process
    /// could not be started at all.
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        (**self).run(invocation)
    }
}

/// Runs invocations as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        let mut cmd = Command::new(invocation.program());
        cmd.args(invocation.get_args());

        if let Some(dir) = invocation.cwd() {
            cmd.current_dir(dir);
        }
        if let Some(env) = invocation.environment() {
            cmd.env_clear().envs(env.iter());
        }

        let output = cmd.output()?;

        Ok(ToolOutput {
            status: ToolExit::new(output.status.code()),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appended_flag_extends_existing_value() {
        let base = Environment::from_vars([("CXXFLAGS", "-O2 -Wall")]);
        let derived = base.with_appended("CXXFLAGS", "-DX=1");

        assert_eq!(derived.get("CXXFLAGS"), Some(OsStr::new("-O2 -Wall -DX=1")));
        assert_eq!(base.get("CXXFLAGS"), Some(OsStr::new("-O2 -Wall")));
    }

    #[test]
    fn appended_flag_without_existing_value() {
        let base = Environment::from_vars([("PATH", "/usr/bin")]);
        let derived = base.with_appended("CXXFLAGS", "-DX=1");

        assert_eq!(derived.get("CXXFLAGS"), Some(OsStr::new("-DX=1")));
        assert_eq!(derived.get("PATH"), Some(OsStr::new("/usr/bin")));
        assert!(base.get("CXXFLAGS").is_none());
        assert_eq!(derived.len(), 2);
    }

    #[test]
    fn display_quotes_only_when_needed() {
        let invocation = Invocation::new("cmake")
            .arg("/src/my project")
            .arg("-DCMAKE_BUILD_TYPE=Release")
            .arg("it's");

        assert_eq!(
            invocation.to_string(),
            r"cmake '/src/my project' -DCMAKE_BUILD_TYPE=Release 'it'\''s'"
        );
    }

    #[test]
    fn tool_exit_reports_code() {
        assert!(ToolExit::new(Some(0)).success());
        assert!(!ToolExit::new(Some(1)).success());
        assert!(!ToolExit::new(None).success());
        assert_eq!(ToolExit::new(Some(2)).to_string(), "exit code 2");
    }

    #[test]
    fn combined_output_keeps_order() {
        let output = ToolOutput::new(0, "out\n", "err\n");
        assert_eq!(output.combined(), "out\nerr\n");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_missing_program() {
        let result = SystemRunner.run(&Invocation::new("/nonexistent/cmext-missing-tool"));
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_uses_given_environment() {
        let env = Environment::from_vars([("CMEXT_PROBE", "value")]);
        let invocation = Invocation::new("/bin/sh")
            .args(["-c", "printf %s \"$CMEXT_PROBE\"; exit 3"])
            .env(env);

        let output = SystemRunner.run(&invocation).unwrap();

        assert_eq!(output.stdout, "value");
        assert_eq!(output.status.code(), Some(3));
    }
}
