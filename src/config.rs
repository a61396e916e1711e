//! Configuration file management
//!
//! Reads cmext's TOML configuration from the project or the user's config
//! directory. A project file typically declares the extensions and any
//! defines their `CMake` projects need:
//!
//! ```toml
//! version = "0.1.0"
//!
//! [[extension]]
//! name = "pyelsed"
//! source_dir = "."
//!
//! [[define]]
//! key = "OpenCV_DIR"
//! value = "/opt/opencv/lib/cmake/opencv4"
//! ```

use crate::extensions::types::{BuildProfile, Define, ExtensionTarget};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Project config file name, looked up in the working directory
pub const PROJECT_CONFIG: &str = ".cmext.toml";

/// Application configuration loaded from TOML files
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Package version embedded in the compiled library
    #[serde(default)]
    pub version: Option<String>,

    /// `debug` or `release`
    #[serde(default)]
    pub profile: Option<BuildProfile>,

    /// Directory built libraries are collected from
    #[serde(default)]
    pub build_lib: Option<PathBuf>,

    /// Root of per-extension scratch directories
    #[serde(default)]
    pub build_temp: Option<PathBuf>,

    /// `CMake` executable
    #[serde(default)]
    pub cmake: Option<PathBuf>,

    /// Interpreter to probe for headers and libraries
    #[serde(default)]
    pub interpreter: Option<PathBuf>,

    /// Compiler flags variable receiving the version define
    #[serde(default)]
    pub flags_var: Option<String>,

    /// Extensions to build
    #[serde(default, rename = "extension")]
    pub extensions: Vec<ExtensionEntry>,

    /// Extra `-D` entries, passed in order
    #[serde(default, rename = "define")]
    pub defines: Vec<Define>,
}

/// One `[[extension]]` table
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExtensionEntry {
    pub name: String,
    /// `CMake` project root (defaults to the working directory)
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
}

impl ExtensionEntry {
    /// Resolve into a build target.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the working directory is
    /// unavailable.
    pub fn to_target(&self) -> Result<ExtensionTarget> {
        let source_dir = self.source_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        ExtensionTarget::new(&self.name, &source_dir)
            .with_context(|| format!("Invalid extension {}", self.name))
    }
}

impl Config {
    /// Load configuration from TOML files.
    /// Priority: `custom_path` -> `CMEXT_CONFIG` -> ./.cmext.toml -> ~/.config/cmext/config.toml
    ///
    /// # Arguments
    /// * `custom_path` - Optional custom path to config file (overrides defaults)
    /// * `skip_files` - If true, skip loading config files (return default config)
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be read, or if any
    /// config file that exists fails to parse.
    pub fn load_with_options(custom_path: Option<&Path>, skip_files: bool) -> Result<Self> {
        if skip_files {
            return Ok(Self::default());
        }

        if let Some(path) = custom_path {
            return Self::load_from(path);
        }

        if let Some(path) = crate::env_vars::config_path() {
            return Self::load_from(path);
        }

        let local = Path::new(PROJECT_CONFIG);
        if local.exists() {
            return Self::load_from(local);
        }

        if let Some(config_dir) = Self::user_config_dir() {
            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                return Self::load_from(&config_path);
            }
        }

        Ok(Self::default())
    }

    /// Parse one config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid config.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid config.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Build targets for every `[[extension]]` entry.
    ///
    /// # Errors
    ///
    /// Returns an error for the first entry that cannot be resolved.
    pub fn targets(&self) -> Result<Vec<ExtensionTarget>> {
        self.extensions
            .iter()
            .map(ExtensionEntry::to_target)
            .collect()
    }

    fn user_config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME")
            && !xdg_config.is_empty()
        {
            return Some(PathBuf::from(xdg_config).join("cmext"));
        }

        dirs::home_dir().map(|home| home.join(".config").join("cmext"))
    }
}
