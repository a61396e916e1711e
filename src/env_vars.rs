//! Environment variable handling.
//!
//! Every variable cmext reads from its own process environment goes through
//! here. Tool subprocesses get their environment from
//! [`crate::process::Environment`], never from these helpers.

use std::env;

/// True for "1", "true", "yes", "on" (case-insensitive).
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn is_enabled(var: &str) -> bool {
    env::var(var).ok().is_some_and(|s| is_truthy(&s))
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|s| !s.trim().is_empty())
}

// Tools

/// Get `CMake` executable override.
pub fn cmake() -> Option<String> {
    non_empty("CMAKE")
}

/// Get interpreter executable override.
pub fn python() -> Option<String> {
    non_empty("PYTHON")
}

// Build layout

/// Get directory built libraries are collected from.
pub fn build_lib() -> Option<String> {
    non_empty("CMEXT_BUILD_LIB")
}

/// Get root of per-extension scratch directories.
pub fn build_temp() -> Option<String> {
    non_empty("CMEXT_BUILD_TEMP")
}

/// Check if a debug build was requested (`DEBUG`, as honoured by `build_ext`).
pub fn debug_build() -> bool {
    is_enabled("DEBUG")
}

// cmext itself

/// Check if debug logging is enabled.
pub fn debug_log() -> bool {
    is_enabled("CMEXT_DEBUG")
}

/// Get config file path override.
pub fn config_path() -> Option<String> {
    non_empty("CMEXT_CONFIG")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        for value in ["1", "true", "TRUE", "yes", "Yes", "on", " 1 "] {
            assert!(is_truthy(value), "{value:?} should be truthy");
        }
    }

    #[test]
    fn falsy_values() {
        for value in ["", "0", "false", "no", "off", "debug"] {
            assert!(!is_truthy(value), "{value:?} should be falsy");
        }
    }
}
