//! Interpreter runtime detection
//!
//! Asks the hosting interpreter where it lives and where its headers and
//! shared library are, so the `CMake` project can find them. There is no
//! fallback: if the interpreter cannot answer, the build cannot proceed.

use crate::extensions::error::BuildError;
use crate::platform::OsFamily;
use crate::process::{CommandRunner, Invocation};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prints the interpreter's own configuration as one JSON object.
const PROBE_SCRIPT: &str = r"import json, sys, sysconfig
print(json.dumps({
    'executable': sys.executable,
    'include_dir': sysconfig.get_path('include'),
    'lib_dir': sysconfig.get_config_var('LIBDIR'),
    'ext_suffix': sysconfig.get_config_var('EXT_SUFFIX'),
}))";

/// What the build needs to know about the interpreter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeInfo {
    pub executable: PathBuf,
    pub include_dir: PathBuf,
    pub lib_dir: PathBuf,
    /// Extension module suffix (`.cpython-312-x86_64-linux-gnu.so`, `.pyd`)
    pub ext_suffix: String,
}

/// Source of [`RuntimeInfo`]
pub trait RuntimeProbe {
    /// Query the interpreter.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeProbe` if the interpreter cannot be queried.
    fn probe(&self) -> Result<RuntimeInfo, BuildError>;
}

/// Already-known runtime information probes as itself.
impl RuntimeProbe for RuntimeInfo {
    fn probe(&self) -> Result<RuntimeInfo, BuildError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Deserialize)]
struct RawRuntimeInfo {
    executable: Option<String>,
    include_dir: Option<String>,
    lib_dir: Option<String>,
    ext_suffix: Option<String>,
}

/// Probes a real interpreter by running a short script in it
#[derive(Debug, Clone)]
pub struct InterpreterProbe<R> {
    interpreter: PathBuf,
    os: OsFamily,
    runner: R,
}

impl<R: CommandRunner> InterpreterProbe<R> {
    pub fn new(interpreter: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            interpreter: interpreter.into(),
            os: OsFamily::current(),
            runner,
        }
    }

    /// Pick the interpreter: `flag`, then `PYTHON`, then `configured`, then
    /// the platform default.
    pub fn resolve(flag: Option<PathBuf>, configured: Option<PathBuf>, runner: R) -> Self {
        Self::new(
            resolve_interpreter(flag, crate::env_vars::python().map(PathBuf::from), configured),
            runner,
        )
    }

    /// Use `os` to pick the fallback extension suffix.
    #[must_use]
    pub fn with_os(mut self, os: OsFamily) -> Self {
        self.os = os;
        self
    }

    #[must_use]
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    fn error(&self, message: impl Into<String>) -> BuildError {
        BuildError::RuntimeProbe {
            interpreter: self.interpreter.clone(),
            message: message.into(),
        }
    }

    fn parse(&self, stdout: &str) -> Result<RuntimeInfo, BuildError> {
        let raw: RawRuntimeInfo = serde_json::from_str(stdout.trim())
            .map_err(|e| self.error(format!("unexpected probe output ({e}): {}", stdout.trim())))?;

        let required = |value: Option<String>, what: &str| {
            value
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| self.error(format!("interpreter did not report its {what}")))
        };

        Ok(RuntimeInfo {
            executable: required(raw.executable, "executable path")?,
            include_dir: required(raw.include_dir, "include directory")?,
            lib_dir: required(raw.lib_dir, "library directory")?,
            ext_suffix: raw
                .ext_suffix
                .filter(|suffix| !suffix.is_empty())
                .unwrap_or_else(|| self.os.default_ext_suffix().to_string()),
        })
    }
}

impl<R: CommandRunner> RuntimeProbe for InterpreterProbe<R> {
    fn probe(&self) -> Result<RuntimeInfo, BuildError> {
        let invocation = Invocation::new(&self.interpreter).args(["-c", PROBE_SCRIPT]);
        crate::debug!("Probing interpreter: {}", self.interpreter.display());

        let output = self
            .runner
            .run(&invocation)
            .map_err(|e| self.error(e.to_string()))?;

        if !output.success() {
            return Err(self.error(format!(
                "probe script failed with {}: {}",
                output.status,
                output.stderr.trim()
            )));
        }

        let info = self.parse(&output.stdout)?;
        crate::debug!(
            "Interpreter: {} (include {}, lib {})",
            info.executable.display(),
            info.include_dir.display(),
            info.lib_dir.display()
        );
        Ok(info)
    }
}

fn resolve_interpreter(
    flag: Option<PathBuf>,
    env: Option<PathBuf>,
    configured: Option<PathBuf>,
) -> PathBuf {
    flag.or(env)
        .or(configured)
        .unwrap_or_else(|| PathBuf::from(default_interpreter()))
}

/// Interpreter name tried when `PYTHON` is not set
#[must_use]
pub const fn default_interpreter() -> &'static str {
    match OsFamily::current() {
        OsFamily::Windows => "python",
        OsFamily::Unix => "python3",
    }
}
