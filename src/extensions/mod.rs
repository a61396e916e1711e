//! Native extension building
//!
//! Builds `CMake`-based native extensions for an interpreter and leaves the
//! shared library where the packaging step collects it (similar to what a
//! `build_ext` step does for projects with a `CMakeLists.txt`).
//!
//! Pieces, leaf first:
//! - [`cmake_extension`]: locate `CMake` and read its version
//! - [`crate::platform`]: per-platform flags
//! - [`crate::runtime`]: interpreter paths
//! - [`assembler`]: ordered configure/build arguments
//! - [`builder`]: the configure + build run per target

pub mod assembler;
pub mod builder;
pub mod cmake_extension;
pub mod error;
pub mod types;

pub use assembler::ConfigAssembler;
pub use builder::{BuildInvoker, BuildOptions, version_flag};
pub use cmake_extension::{CMakeTool, ToolVersion, parse_version};
pub use error::BuildError;
pub use types::{
    BuildConfiguration, BuildProfile, BuildState, Define, ExtensionTarget, FailureKind,
    TargetReport,
};
