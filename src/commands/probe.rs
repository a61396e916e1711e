//! Probe command
//!
//! Report what a build would see: the `CMake` version, the platform policy
//! and the interpreter's headers and library, without building anything.

use anyhow::{Result, bail};
use cmext::{
    CMakeTool, Config, InterpreterProbe, PlatformPolicy, RuntimeInfo, RuntimeProbe, SystemRunner,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct ProbeReport {
    cmake: PathBuf,
    cmake_version: Option<String>,
    cmake_error: Option<String>,
    platform: String,
    native_build_flags: Vec<String>,
    interpreter: PathBuf,
    runtime: Option<RuntimeInfo>,
    runtime_error: Option<String>,
}

impl ProbeReport {
    fn failed(&self) -> bool {
        self.cmake_error.is_some() || self.runtime_error.is_some()
    }
}

/// Probe the tool, platform and interpreter.
pub(crate) fn run(
    cmake: Option<PathBuf>,
    interpreter: Option<PathBuf>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let tool = CMakeTool::resolve(cmake, config.cmake.clone());
    let runtime = InterpreterProbe::resolve(interpreter, config.interpreter.clone(), SystemRunner);
    let policy = PlatformPolicy::current();
    // Name the configured extensions if CMake turns out to be missing
    let targets = config.targets().unwrap_or_default();

    let mut report = ProbeReport {
        cmake: tool.path().to_path_buf(),
        cmake_version: None,
        cmake_error: None,
        platform: policy.to_string(),
        native_build_flags: Vec::new(),
        interpreter: runtime.interpreter().to_path_buf(),
        runtime: None,
        runtime_error: None,
    };

    match tool
        .verify_available(&SystemRunner, policy.requires_tool_version(), &targets)
        .and_then(|version| {
            policy.check_tool(&version)?;
            Ok(version)
        }) {
        Ok(version) => {
            report.cmake_version = version.version().map(ToString::to_string);
            if let Ok(flags) = policy.flags_for(&version, config.profile.unwrap_or_default()) {
                report.native_build_flags = flags
                    .native_build
                    .iter()
                    .map(ToString::to_string)
                    .collect();
            }
        }
        Err(e) => report.cmake_error = Some(e.to_string()),
    }

    match runtime.probe() {
        Ok(info) => report.runtime = Some(info),
        Err(e) => report.runtime_error = Some(e.to_string()),
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.failed() {
        bail!("Probe failed; a build would not succeed on this machine");
    }
    Ok(())
}

fn print_report(report: &ProbeReport) {
    println!("CMake:        {}", report.cmake.display());
    match (&report.cmake_version, &report.cmake_error) {
        (_, Some(error)) => println!("  error:      {error}"),
        (Some(version), None) => println!("  version:    {version}"),
        (None, None) => println!("  version:    unknown"),
    }

    println!("Platform:     {}", report.platform);
    if !report.native_build_flags.is_empty() {
        println!("  build:      {}", report.native_build_flags.join(" "));
    }

    println!("Interpreter:  {}", report.interpreter.display());
    if let Some(error) = &report.runtime_error {
        println!("  error:      {error}");
    }
    if let Some(info) = &report.runtime {
        println!("  executable: {}", info.executable.display());
        println!("  include:    {}", info.include_dir.display());
        println!("  library:    {}", info.lib_dir.display());
        println!("  suffix:     {}", info.ext_suffix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ProbeReport {
        ProbeReport {
            cmake: PathBuf::from("cmake"),
            cmake_version: Some("3.20.0".to_string()),
            cmake_error: None,
            platform: "unix (64-bit)".to_string(),
            native_build_flags: vec!["-j2".to_string()],
            interpreter: PathBuf::from("python3"),
            runtime: None,
            runtime_error: None,
        }
    }

    #[test]
    fn report_without_errors_succeeds() {
        assert!(!report().failed());
    }

    #[test]
    fn any_error_fails_the_report() {
        let mut with_tool_error = report();
        with_tool_error.cmake_error = Some("not found".to_string());
        assert!(with_tool_error.failed());

        let mut with_runtime_error = report();
        with_runtime_error.runtime_error = Some("no interpreter".to_string());
        assert!(with_runtime_error.failed());
    }

    #[test]
    fn report_serializes_to_json() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(
            json.get("cmake_version").and_then(serde_json::Value::as_str),
            Some("3.20.0")
        );
        assert_eq!(
            json.pointer("/native_build_flags/0").and_then(serde_json::Value::as_str),
            Some("-j2")
        );
        assert!(json.get("runtime").is_some_and(serde_json::Value::is_null));
    }
}
