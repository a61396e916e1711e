//! Extension build orchestration
//!
//! Probes `CMake` once, then walks every target through
//! `Init → Probed → Configured → Built → Done`. Targets are built one after
//! another; the run stops at the first failure and reports it. Targets that
//! already finished are left as they are.

use super::assembler::ConfigAssembler;
use super::cmake_extension::{CMakeTool, ToolVersion};
use super::error::BuildError;
use super::types::{BuildProfile, BuildState, Define, ExtensionTarget, TargetReport};
use crate::platform::PlatformPolicy;
use crate::process::{CommandRunner, Environment, Invocation, ToolOutput};
use crate::runtime::RuntimeProbe;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Compile definition carrying the package version into the native code
pub const VERSION_DEFINE: &str = "VERSION_INFO";

/// Environment variable the version define is appended to
pub const DEFAULT_FLAGS_VAR: &str = "CXXFLAGS";

/// Settings shared by every target of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Debug or release, for every target
    pub profile: BuildProfile,
    /// Package version embedded as `VERSION_INFO`
    pub version: String,
    /// Root the packaging step collects libraries from
    pub build_lib: PathBuf,
    /// Root of per-target scratch directories
    pub build_temp: PathBuf,
    /// Compiler flags variable that receives the version define
    pub flags_var: String,
    /// Extra `-D` entries for the project's own build
    pub defines: Vec<Define>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            profile: BuildProfile::Release,
            version: "0.0.0".to_string(),
            build_lib: PathBuf::from("build").join("lib"),
            build_temp: PathBuf::from("build").join("temp"),
            flags_var: DEFAULT_FLAGS_VAR.to_string(),
            defines: Vec::new(),
        }
    }
}

/// Compiler flag embedding `version` as a quoted string literal
///
/// `0.1.0` → `-DVERSION_INFO=\"0.1.0\"`. Quotes and backslashes inside the
/// version are escaped so the literal stays intact.
#[must_use]
pub fn version_flag(version: &str) -> String {
    let escaped = version.replace('\\', r"\\").replace('"', "\\\"");
    format!("-D{VERSION_DEFINE}=\\\"{escaped}\\\"")
}

/// Drives `CMake` for a list of extension targets
///
/// All external calls go through `runner`; interpreter details come from
/// `runtime`. The tool version is probed by [`BuildInvoker::probe_tool`] and
/// handed to each target build explicitly.
#[derive(Debug)]
pub struct BuildInvoker<R, P> {
    runner: R,
    runtime: P,
    tool: CMakeTool,
    policy: PlatformPolicy,
    assembler: ConfigAssembler,
    options: BuildOptions,
    base_env: Environment,
    verbose: bool,
}

impl<R: CommandRunner, P: RuntimeProbe> BuildInvoker<R, P> {
    /// Create an invoker for the running host and current process environment.
    ///
    /// A relative `build_lib` is resolved against the working directory here,
    /// since `CMake` would otherwise resolve it against the scratch directory.
    pub fn new(runner: R, runtime: P, tool: CMakeTool, mut options: BuildOptions) -> Self {
        if let Ok(build_lib) = std::path::absolute(&options.build_lib) {
            options.build_lib = build_lib;
        }
        Self {
            runner,
            runtime,
            tool,
            policy: PlatformPolicy::current(),
            assembler: ConfigAssembler::new(options.build_lib.clone()),
            options,
            base_env: Environment::from_process(),
            verbose: false,
        }
    }

    /// Use `policy` instead of the host's.
    #[must_use]
    pub fn with_policy(mut self, policy: PlatformPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Derive tool environments from `env` instead of the process environment.
    #[must_use]
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.base_env = env;
        self
    }

    /// Print each command and its output.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Build every target, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error: a probe failure before any target is
    /// touched, or the failure of the first target that did not reach `Done`.
    pub fn run(&self, targets: &[ExtensionTarget]) -> Result<Vec<TargetReport>, BuildError> {
        let tool = self.probe_tool(targets)?;

        let mut reports = Vec::with_capacity(targets.len());
        for target in targets {
            let report = self.build_target(target, &tool).into_result()?;
            reports.push(report);
        }
        Ok(reports)
    }

    /// Check `CMake` is usable on this platform and read its version.
    ///
    /// # Errors
    ///
    /// `ToolMissing`, `VersionParse` or `UnsupportedToolVersion`.
    pub fn probe_tool(&self, targets: &[ExtensionTarget]) -> Result<ToolVersion, BuildError> {
        let tool =
            self.tool
                .verify_available(&self.runner, self.policy.requires_tool_version(), targets)?;
        self.policy.check_tool(&tool)?;
        Ok(tool)
    }

    /// Configure and build one target with an already probed tool.
    #[must_use]
    pub fn build_target(&self, target: &ExtensionTarget, tool: &ToolVersion) -> TargetReport {
        let start_time = Instant::now();
        let mut output = String::new();
        let mut reached = BuildState::Probed;

        if self.verbose {
            println!("Building CMake extension for {}...", target.name());
        }

        match self.drive(target, tool, &mut output, &mut reached) {
            Ok(artifact) => {
                crate::debug!("{} done, expecting {}", target.name(), artifact.display());
                TargetReport::done(
                    target.name().to_string(),
                    artifact,
                    start_time.elapsed(),
                    output,
                )
            }
            Err(error) => {
                crate::debug!("{} failed after {reached:?}: {error}", target.name());
                TargetReport::failed(
                    target.name().to_string(),
                    reached,
                    error,
                    start_time.elapsed(),
                    output,
                )
            }
        }
    }

    fn drive(
        &self,
        target: &ExtensionTarget,
        tool: &ToolVersion,
        output: &mut String,
        reached: &mut BuildState,
    ) -> Result<PathBuf, BuildError> {
        let profile = self.options.profile;
        let flags = self.policy.flags_for(tool, profile)?;
        let runtime = self.runtime.probe()?;
        let config =
            self.assembler
                .assemble(target, profile, &runtime, &flags, &self.options.defines);

        let scratch_dir = target.scratch_dir(&self.options.build_temp);
        ensure_scratch_dir(&scratch_dir)?;

        let configure = self.tool.configure_invocation(
            target.source_dir(),
            config.configure_args(),
            &scratch_dir,
            self.derived_env(),
        );
        let result = self.execute(&configure, target, output)?;
        if !result.success() {
            return Err(BuildError::Configure {
                target: target.name().to_string(),
                command: configure.to_string(),
                status: result.status,
                output: result.combined(),
            });
        }
        *reached = BuildState::Configured;

        let build =
            self.tool
                .build_invocation(config.build_args(), &scratch_dir, self.derived_env());
        let result = self.execute(&build, target, output)?;
        if !result.success() {
            return Err(BuildError::Build {
                target: target.name().to_string(),
                command: build.to_string(),
                status: result.status,
                output: result.combined(),
            });
        }
        *reached = BuildState::Built;

        Ok(target.artifact_path(self.assembler.build_lib(), &runtime.ext_suffix))
    }

    /// Fresh environment copy for one tool call.
    fn derived_env(&self) -> Environment {
        self.base_env
            .with_appended(&self.options.flags_var, &version_flag(&self.options.version))
    }

    fn execute(
        &self,
        invocation: &Invocation,
        target: &ExtensionTarget,
        output: &mut String,
    ) -> Result<ToolOutput, BuildError> {
        if self.verbose {
            println!("  Running: {invocation}");
        }
        crate::debug!("Running in {:?}: {invocation}", invocation.cwd());

        let result = self
            .runner
            .run(invocation)
            .map_err(|source| BuildError::ToolMissing {
                tool: invocation.program().to_path_buf(),
                extensions: target.name().to_string(),
                source,
            })?;

        let captured = result.combined();
        if self.verbose {
            print!("{captured}");
        }
        output.push_str(&captured);
        Ok(result)
    }
}

fn ensure_scratch_dir(path: &Path) -> Result<(), BuildError> {
    std::fs::create_dir_all(path).map_err(|source| BuildError::ScratchDirUnwritable {
        path: path.to_path_buf(),
        source,
    })
}
