//! Build failure taxonomy
//!
//! Every variant is fatal for the run: nothing here is retried. Tool
//! failures carry the exact command line and captured output so the
//! operator can reproduce them by hand.

use super::types::FailureKind;
use crate::process::ToolExit;
use semver::Version;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(
        "CMake must be installed{} (could not run {}: {source})",
        required_by(.extensions),
        .tool.display()
    )]
    ToolMissing {
        tool: PathBuf,
        extensions: String,
        #[source]
        source: io::Error,
    },

    #[error("Could not find a version number in the output of `{command}`:\n{output}")]
    VersionParse { command: String, output: String },

    #[error("CMake >= {required} is required on Windows (found {found})")]
    UnsupportedToolVersion { found: Version, required: Version },

    #[error("Failed to query interpreter {}: {message}", .interpreter.display())]
    RuntimeProbe {
        interpreter: PathBuf,
        message: String,
    },

    #[error("Failed to create scratch directory {}: {source}", .path.display())]
    ScratchDirUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CMake configure failed for {target} with {status}\n  command: {command}\n{output}")]
    Configure {
        target: String,
        command: String,
        status: ToolExit,
        output: String,
    },

    #[error("CMake build failed for {target} with {status}\n  command: {command}\n{output}")]
    Build {
        target: String,
        command: String,
        status: ToolExit,
        output: String,
    },
}

impl BuildError {
    /// Payload-free classification of this error
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::ToolMissing { .. } => FailureKind::ToolMissing,
            Self::VersionParse { .. } => FailureKind::VersionParse,
            Self::UnsupportedToolVersion { .. } => FailureKind::UnsupportedToolVersion,
            Self::RuntimeProbe { .. } => FailureKind::RuntimeProbe,
            Self::ScratchDirUnwritable { .. } => FailureKind::ScratchDirUnwritable,
            Self::Configure { status, .. } => FailureKind::Configure(*status),
            Self::Build { status, .. } => FailureKind::Build(*status),
        }
    }

    /// Exit code of the failing tool, for configure and build failures
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Configure { status, .. } | Self::Build { status, .. } => status.code(),
            _ => None,
        }
    }
}

fn required_by(extensions: &str) -> String {
    if extensions.is_empty() {
        String::new()
    } else {
        format!(" to build the following extensions: {extensions}")
    }
}
