//! Debug logging
//!
//! Debug output is switched on once at startup (`--debug-log` or
//! `CMEXT_DEBUG=1`) and goes to stderr with a `[DEBUG]` prefix, so it never
//! mixes with tool output echoed on stdout. Disabled logging costs one
//! atomic load.

use std::sync::OnceLock;

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Enable debug logging if `flag` is set or `CMEXT_DEBUG` is truthy.
///
/// Only the first call has any effect.
pub fn init_debug(flag: bool) {
    let _ = DEBUG_ENABLED.set(flag || crate::env_vars::debug_log());
}

/// Check if debug mode is enabled
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.get().copied().unwrap_or(false)
}

/// Print a debug message if debug mode is enabled
pub fn debug_log(message: &str) {
    if is_debug_enabled() {
        eprintln!("[DEBUG] {message}");
    }
}

/// Log a formatted message when debug mode is enabled
///
/// Usage: `debug!("configuring {}", target.name())`
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            eprintln!("[DEBUG] {}", format_args!($($arg)*));
        }
    };
}
