//! Extension build type definitions
//!
//! A native extension is a shared library built from a `CMake` project and
//! dropped where the packaging step expects to find it. This module defines
//! what gets built ([`ExtensionTarget`]), how ([`BuildProfile`],
//! [`BuildConfiguration`], [`Define`]) and what happened ([`BuildState`],
//! [`TargetReport`]).

use super::error::BuildError;
use crate::process::ToolExit;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// One buildable extension
///
/// `name` is the dotted module name (`pkg.sub.module`); `source_dir` is the
/// absolute path of the `CMake` project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionTarget {
    name: String,
    source_dir: PathBuf,
}

impl ExtensionTarget {
    /// Create a target, resolving `source_dir` against the working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the current directory
    /// cannot be determined.
    pub fn new(name: impl Into<String>, source_dir: impl AsRef<Path>) -> io::Result<Self> {
        let name = name.into();
        if name.split('.').any(str::is_empty) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid extension name: {name:?}"),
            ));
        }

        Ok(Self {
            name,
            source_dir: std::path::absolute(source_dir)?,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Directory the compiled library must land in
    ///
    /// Package components of the dotted name become subdirectories of
    /// `build_lib`: `pkg.sub.module` → `<build_lib>/pkg/sub`.
    #[must_use]
    pub fn artifact_dir(&self, build_lib: &Path) -> PathBuf {
        let mut parts: Vec<&str> = self.name.split('.').collect();
        parts.pop();
        parts
            .into_iter()
            .fold(build_lib.to_path_buf(), |dir, part| dir.join(part))
    }

    /// Full path of the compiled library
    #[must_use]
    pub fn artifact_path(&self, build_lib: &Path, ext_suffix: &str) -> PathBuf {
        let leaf = self.name.rsplit('.').next().unwrap_or(&self.name);
        self.artifact_dir(build_lib)
            .join(format!("{leaf}{ext_suffix}"))
    }

    /// Private working directory for this target's intermediate files
    #[must_use]
    pub fn scratch_dir(&self, build_temp: &Path) -> PathBuf {
        build_temp.join(&self.name)
    }
}

/// Build profile, selected once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    Debug,
    #[default]
    Release,
}

impl BuildProfile {
    /// Profile for a debug switch, as in `setup.py build_ext --debug`.
    #[must_use]
    pub const fn from_debug(debug: bool) -> Self {
        if debug { Self::Debug } else { Self::Release }
    }

    /// Name understood by `CMake` (`Debug` / `Release`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }

    /// Upper-cased name, used to key per-configuration `CMake` variables.
    #[must_use]
    pub const fn upper(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Release => "RELEASE",
        }
    }
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            other => Err(format!("unknown build profile: {other} (expected debug or release)")),
        }
    }
}

/// A `-D<KEY>=<VALUE>` cache entry passed through to the project's own build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Define {
    pub key: String,
    pub value: String,
}

impl Define {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Single argument token for the configure step.
    #[must_use]
    pub fn to_arg(&self) -> String {
        format!("-D{}={}", self.key, self.value)
    }
}

/// Parses `KEY=VALUE` (the value may itself contain `=`).
impl FromStr for Define {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got {s:?}"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("empty define name in {s:?}"));
        }
        Ok(Self::new(key, value))
    }
}

/// Fully assembled arguments for one target
///
/// Both argument lists are derived from the same `profile`, so the configure
/// and build steps always agree on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    pub(crate) profile: BuildProfile,
    pub(crate) configure_args: Vec<String>,
    pub(crate) build_args: Vec<String>,
}

impl BuildConfiguration {
    #[must_use]
    pub const fn profile(&self) -> BuildProfile {
        self.profile
    }

    /// Arguments following the source directory in the configure call
    #[must_use]
    pub fn configure_args(&self) -> &[String] {
        &self.configure_args
    }

    /// Arguments following `--build .` in the build call
    #[must_use]
    pub fn build_args(&self) -> &[String] {
        &self.build_args
    }
}

/// Why a target failed, without the diagnostic payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ToolMissing,
    VersionParse,
    UnsupportedToolVersion,
    RuntimeProbe,
    ScratchDirUnwritable,
    Configure(ToolExit),
    Build(ToolExit),
}

/// Progress of a single target through the build
///
/// `Init → Probed → Configured → Built → Done`, or `Failed` from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Init,
    Probed,
    Configured,
    Built,
    Done,
    Failed(FailureKind),
}

impl BuildState {
    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Result of building one target
#[derive(Debug)]
pub struct TargetReport {
    /// Extension name
    pub name: String,

    /// Final state (`Done` or `Failed`)
    pub state: BuildState,

    /// Last state reached before finishing or failing
    pub reached: BuildState,

    /// Where the library is expected (not verified)
    pub artifact: Option<PathBuf>,

    /// Build duration
    pub duration: Duration,

    /// Captured tool output (stdout + stderr of every step)
    pub output: String,

    /// The failure, if any
    pub error: Option<BuildError>,
}

impl TargetReport {
    /// Report for a target that reached `Done`
    #[must_use]
    pub const fn done(name: String, artifact: PathBuf, duration: Duration, output: String) -> Self {
        Self {
            name,
            state: BuildState::Done,
            reached: BuildState::Done,
            artifact: Some(artifact),
            duration,
            output,
            error: None,
        }
    }

    /// Report for a target that failed after reaching `reached`
    #[must_use]
    pub fn failed(
        name: String,
        reached: BuildState,
        error: BuildError,
        duration: Duration,
        output: String,
    ) -> Self {
        Self {
            name,
            state: BuildState::Failed(error.kind()),
            reached,
            artifact: None,
            duration,
            output,
            error: Some(error),
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.state.is_done()
    }

    /// Turn a failed report into its error.
    ///
    /// # Errors
    ///
    /// Returns the recorded failure.
    pub fn into_result(mut self) -> Result<Self, BuildError> {
        match self.error.take() {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_dir_is_absolute() {
        let target = ExtensionTarget::new("demo", "relative/src").unwrap();
        assert!(target.source_dir().is_absolute());
        assert!(target.source_dir().ends_with("relative/src"));
    }

    #[test]
    fn rejects_empty_name_components() {
        assert!(ExtensionTarget::new("", "/src").is_err());
        assert!(ExtensionTarget::new("pkg..mod", "/src").is_err());
    }

    #[test]
    fn flat_name_lands_in_build_lib() {
        let target = ExtensionTarget::new("pyelsed", "/src").unwrap();
        let build_lib = Path::new("/out/lib");

        assert_eq!(target.artifact_dir(build_lib), PathBuf::from("/out/lib"));
        assert_eq!(
            target.artifact_path(build_lib, ".so"),
            PathBuf::from("/out/lib/pyelsed.so")
        );
    }

    #[test]
    fn dotted_name_lands_in_package_dir() {
        let target = ExtensionTarget::new("pkg.sub.native", "/src").unwrap();
        let build_lib = Path::new("/out/lib");

        assert_eq!(
            target.artifact_dir(build_lib),
            PathBuf::from("/out/lib/pkg/sub")
        );
        assert_eq!(
            target.artifact_path(build_lib, ".cpython-312-x86_64-linux-gnu.so"),
            PathBuf::from("/out/lib/pkg/sub/native.cpython-312-x86_64-linux-gnu.so")
        );
    }

    #[test]
    fn scratch_dir_is_per_target() {
        let first = ExtensionTarget::new("a", "/src").unwrap();
        let second = ExtensionTarget::new("b", "/src").unwrap();
        let temp = Path::new("/tmp/build");

        assert_ne!(first.scratch_dir(temp), second.scratch_dir(temp));
    }

    #[test]
    fn profile_names() {
        assert_eq!(BuildProfile::from_debug(true), BuildProfile::Debug);
        assert_eq!(BuildProfile::from_debug(false), BuildProfile::Release);
        assert_eq!(BuildProfile::Release.as_str(), "Release");
        assert_eq!(BuildProfile::Debug.upper(), "DEBUG");
        assert_eq!("Debug".parse::<BuildProfile>(), Ok(BuildProfile::Debug));
        assert!("fast".parse::<BuildProfile>().is_err());
    }

    #[test]
    fn define_parsing() {
        let define: Define = "OpenCV_DIR=/opt/opencv=4".parse().unwrap();
        assert_eq!(define.key, "OpenCV_DIR");
        assert_eq!(define.value, "/opt/opencv=4");
        assert_eq!(define.to_arg(), "-DOpenCV_DIR=/opt/opencv=4");

        assert!("NOVALUE".parse::<Define>().is_err());
        assert!("=1".parse::<Define>().is_err());
    }

    #[test]
    fn failed_report_converts_to_error() {
        let report = TargetReport::failed(
            "demo".to_string(),
            BuildState::Probed,
            BuildError::RuntimeProbe {
                interpreter: PathBuf::from("python3"),
                message: "boom".to_string(),
            },
            Duration::from_secs(0),
            String::new(),
        );

        assert_eq!(report.state, BuildState::Failed(FailureKind::RuntimeProbe));
        assert!(!report.success());
        assert!(report.into_result().is_err());
    }
}
