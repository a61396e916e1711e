//! cmext internal library code
//!
//! Builds `CMake`-based native extensions for an interpreter: probes
//! `CMake` and the interpreter, assembles platform-specific arguments and
//! runs the configure and build steps for each extension.

pub mod config;
pub mod debug;
pub mod env_vars;
pub mod extensions;
pub mod platform;
pub mod process;
pub mod runtime;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export common types for convenience
pub use config::{Config, ExtensionEntry};
pub use debug::{debug_log, init_debug, is_debug_enabled};
pub use extensions::{
    BuildConfiguration, BuildError, BuildInvoker, BuildOptions, BuildProfile, BuildState,
    CMakeTool, ConfigAssembler, Define, ExtensionTarget, FailureKind, TargetReport,
    ToolVersion, parse_version, version_flag,
};
pub use platform::{ConfigureFlag, OsFamily, PlatformFlags, PlatformPolicy, PointerWidth};
pub use process::{CommandRunner, Environment, Invocation, SystemRunner, ToolExit, ToolOutput};
pub use runtime::{InterpreterProbe, RuntimeInfo, RuntimeProbe};
