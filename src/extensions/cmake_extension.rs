//! `CMake` tool handling
//!
//! Locates the `cmake` executable, checks it can run, reads its version and
//! describes the two calls every extension build makes:
//! ```bash
//! cd <scratch dir>
//! cmake <source dir> -D...        # configure
//! cmake --build . --config <P> -- <native flags>
//! ```

use super::error::BuildError;
use super::types::ExtensionTarget;
use crate::process::{CommandRunner, Environment, Invocation};
use regex::Regex;
use semver::Version;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// `CMake` executable used for every step of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CMakeTool {
    /// Path or bare name (resolved through `PATH` when spawned)
    path: PathBuf,
}

impl Default for CMakeTool {
    fn default() -> Self {
        Self::new("cmake")
    }
}

impl CMakeTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Pick the tool: `flag`, then `CMAKE`, then `configured`, then `cmake` from `PATH`.
    #[must_use]
    pub fn resolve(flag: Option<PathBuf>, configured: Option<PathBuf>) -> Self {
        Self::resolve_from(flag, crate::env_vars::cmake().map(PathBuf::from), configured)
    }

    fn resolve_from(
        flag: Option<PathBuf>,
        env: Option<PathBuf>,
        configured: Option<PathBuf>,
    ) -> Self {
        flag.or(env)
            .or(configured)
            .map_or_else(Self::default, Self::new)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `cmake --version`
    #[must_use]
    pub fn version_invocation(&self) -> Invocation {
        Invocation::new(&self.path).arg("--version")
    }

    /// `cmake <source_dir> <args...>` run inside `scratch_dir`
    #[must_use]
    pub fn configure_invocation(
        &self,
        source_dir: &Path,
        args: &[String],
        scratch_dir: &Path,
        env: Environment,
    ) -> Invocation {
        Invocation::new(&self.path)
            .arg(source_dir.display().to_string())
            .args(args.iter().cloned())
            .current_dir(scratch_dir)
            .env(env)
    }

    /// `cmake --build . <args...>` run inside `scratch_dir`
    #[must_use]
    pub fn build_invocation(
        &self,
        args: &[String],
        scratch_dir: &Path,
        env: Environment,
    ) -> Invocation {
        Invocation::new(&self.path)
            .args(["--build", "."])
            .args(args.iter().cloned())
            .current_dir(scratch_dir)
            .env(env)
    }

    /// Check the tool runs and read its version.
    ///
    /// When `require_version` is false an unparsable version is tolerated and
    /// recorded as unknown.
    ///
    /// # Errors
    ///
    /// - `ToolMissing` if the tool cannot be started or exits non-zero
    /// - `VersionParse` if no version is found and one is required
    pub fn verify_available<R: CommandRunner>(
        &self,
        runner: &R,
        require_version: bool,
        targets: &[ExtensionTarget],
    ) -> Result<ToolVersion, BuildError> {
        let invocation = self.version_invocation();
        crate::debug!("Probing CMake: {invocation}");

        let missing = |source: io::Error| BuildError::ToolMissing {
            tool: self.path.clone(),
            extensions: targets
                .iter()
                .map(ExtensionTarget::name)
                .collect::<Vec<_>>()
                .join(", "),
            source,
        };

        let output = runner.run(&invocation).map_err(missing)?;
        if !output.success() {
            return Err(missing(io::Error::other(format!(
                "`{invocation}` failed with {}",
                output.status
            ))));
        }

        let text = output.combined();
        let version = parse_version(&text);
        if version.is_none() && require_version {
            return Err(BuildError::VersionParse {
                command: invocation.to_string(),
                output: text,
            });
        }

        crate::debug!(
            "CMake version: {}",
            version
                .as_ref()
                .map_or_else(|| "unknown".to_string(), ToString::to_string)
        );

        Ok(ToolVersion {
            command: invocation.to_string(),
            version,
            raw: text.trim().to_string(),
        })
    }
}

/// Version reported by `cmake --version`, probed once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVersion {
    command: String,
    version: Option<Version>,
    raw: String,
}

impl ToolVersion {
    /// Version parsed from `raw` tool output.
    #[must_use]
    pub fn from_output(raw: &str) -> Self {
        Self {
            command: "cmake --version".to_string(),
            version: parse_version(raw),
            raw: raw.trim().to_string(),
        }
    }

    #[must_use]
    pub const fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Unparsed tool output
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed version, or a `VersionParse` error naming the probe command.
    ///
    /// # Errors
    ///
    /// Returns `VersionParse` if no version was found in the tool output.
    pub fn require(&self) -> Result<&Version, BuildError> {
        self.version.as_ref().ok_or_else(|| BuildError::VersionParse {
            command: self.command.clone(),
            output: self.raw.clone(),
        })
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{version}"),
            None => f.write_str("unknown"),
        }
    }
}

/// Extract the `version X.Y.Z` token from tool output
///
/// Missing components count as zero (`3.1` → `3.1.0`); anything after the
/// dotted number (`-rc1`, vendor suffixes) is ignored.
#[must_use]
pub fn parse_version(output: &str) -> Option<Version> {
    let pattern = Regex::new(r"version\s*([\d.]+)").ok()?;
    let token = pattern.captures(output)?.get(1)?.as_str();

    let mut parts = token
        .split('.')
        .filter(|part| !part.is_empty())
        .map(str::parse::<u64>);

    let major = parts.next()?.ok()?;
    let minor = parts.next().transpose().ok()?.unwrap_or(0);
    let patch = parts.next().transpose().ok()?.unwrap_or(0);

    Some(Version::new(major, minor, patch))
}
