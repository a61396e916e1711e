//! Platform detection and per-platform build flags
//!
//! The host is classified once into an [`OsFamily`] and a [`PointerWidth`];
//! [`PlatformPolicy`] turns that pair into the configure and native build
//! flags for a profile. Windows and Unix-like hosts get disjoint rule sets.

use crate::extensions::cmake_extension::ToolVersion;
use crate::extensions::error::BuildError;
use crate::extensions::types::BuildProfile;
use semver::Version;
use std::fmt;
use std::path::Path;

/// Oldest `CMake` that can build extensions on Windows
pub const MIN_WINDOWS_CMAKE: Version = Version::new(3, 1, 0);

/// Operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Windows,
    Unix,
}

impl OsFamily {
    /// Family of the running host.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Unix }
    }

    /// Default suffix for interpreter extension modules.
    #[must_use]
    pub const fn default_ext_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".pyd",
            Self::Unix => ".so",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Windows => "windows",
            Self::Unix => "unix",
        })
    }
}

/// Word size of the running process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerWidth {
    Bits32,
    Bits64,
}

impl PointerWidth {
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_pointer_width = "64") {
            Self::Bits64
        } else {
            Self::Bits32
        }
    }
}

impl fmt::Display for PointerWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bits32 => "32-bit",
            Self::Bits64 => "64-bit",
        })
    }
}

/// A platform-specific configure flag, rendered once the artifact directory is known
#[allow(variant_size_differences)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureFlag {
    /// `-DCMAKE_LIBRARY_OUTPUT_DIRECTORY_<PROFILE>=<dir>` (multi-config generators)
    ProfileOutputDirectory(BuildProfile),
    /// `-A <arch>`
    Architecture(&'static str),
    /// `-DCMAKE_BUILD_TYPE=<Profile>` (single-config generators)
    BuildType(BuildProfile),
}

impl ConfigureFlag {
    /// Argument tokens for this flag.
    #[must_use]
    pub fn render(self, artifact_dir: &Path) -> Vec<String> {
        match self {
            Self::ProfileOutputDirectory(profile) => vec![format!(
                "-DCMAKE_LIBRARY_OUTPUT_DIRECTORY_{}={}",
                profile.upper(),
                artifact_dir.display()
            )],
            Self::Architecture(arch) => vec!["-A".to_string(), arch.to_string()],
            Self::BuildType(profile) => vec![format!("-DCMAKE_BUILD_TYPE={profile}")],
        }
    }
}

/// Flags decided by [`PlatformPolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformFlags {
    /// Configure flags, in order
    pub configure: Vec<ConfigureFlag>,
    /// Flags for the native build tool, passed after `--`
    pub native_build: Vec<&'static str>,
}

/// Per-platform build rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformPolicy {
    os: OsFamily,
    pointer_width: PointerWidth,
}

impl Default for PlatformPolicy {
    fn default() -> Self {
        Self::current()
    }
}

impl PlatformPolicy {
    #[must_use]
    pub const fn new(os: OsFamily, pointer_width: PointerWidth) -> Self {
        Self { os, pointer_width }
    }

    /// Policy for the running host.
    #[must_use]
    pub const fn current() -> Self {
        Self::new(OsFamily::current(), PointerWidth::current())
    }

    #[must_use]
    pub const fn os(self) -> OsFamily {
        self.os
    }

    /// Whether the tool version must be known to pick flags.
    #[must_use]
    pub const fn requires_tool_version(self) -> bool {
        matches!(self.os, OsFamily::Windows)
    }

    /// Check the tool version against this platform's minimum.
    ///
    /// # Errors
    ///
    /// On Windows: `VersionParse` if the version is unknown,
    /// `UnsupportedToolVersion` if it is older than [`MIN_WINDOWS_CMAKE`].
    pub fn check_tool(self, tool: &ToolVersion) -> Result<(), BuildError> {
        if !self.requires_tool_version() {
            return Ok(());
        }

        let found = tool.require()?;
        if *found < MIN_WINDOWS_CMAKE {
            return Err(BuildError::UnsupportedToolVersion {
                found: found.clone(),
                required: MIN_WINDOWS_CMAKE,
            });
        }
        Ok(())
    }

    /// Configure and native build flags for `profile`.
    ///
    /// # Errors
    ///
    /// Same as [`PlatformPolicy::check_tool`].
    pub fn flags_for(
        self,
        tool: &ToolVersion,
        profile: BuildProfile,
    ) -> Result<PlatformFlags, BuildError> {
        self.check_tool(tool)?;

        Ok(match self.os {
            OsFamily::Windows => {
                let mut configure = vec![ConfigureFlag::ProfileOutputDirectory(profile)];
                if self.pointer_width == PointerWidth::Bits64 {
                    configure.push(ConfigureFlag::Architecture("x64"));
                }
                PlatformFlags {
                    configure,
                    native_build: vec!["/m"],
                }
            }
            OsFamily::Unix => PlatformFlags {
                configure: vec![ConfigureFlag::BuildType(profile)],
                native_build: vec!["-j2"],
            },
        })
    }
}

impl fmt::Display for PlatformPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.os, self.pointer_width)
    }
}
