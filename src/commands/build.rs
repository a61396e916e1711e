//! Build command
//!
//! Resolves targets and options from flags, environment and config, then
//! hands them to the orchestrator. Precedence for every setting:
//! command line > environment variable > config file > built-in default.

use anyhow::{Context, Result, bail};
use cmext::extensions::builder::DEFAULT_FLAGS_VAR;
use cmext::{
    BuildInvoker, BuildOptions, BuildProfile, CMakeTool, Config, Define, ExtensionTarget,
    InterpreterProbe, SystemRunner, env_vars,
};
use std::path::PathBuf;

/// Settings given on the command line
#[derive(Debug, Default)]
pub(crate) struct BuildArgs {
    pub(crate) extensions: Vec<String>,
    pub(crate) profile: Option<BuildProfile>,
    pub(crate) build_lib: Option<PathBuf>,
    pub(crate) build_temp: Option<PathBuf>,
    pub(crate) defines: Vec<Define>,
    pub(crate) version: Option<String>,
    pub(crate) cmake: Option<PathBuf>,
    pub(crate) interpreter: Option<PathBuf>,
    pub(crate) flags_var: Option<String>,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

/// Build every requested extension.
pub(crate) fn run(args: &BuildArgs, config: &Config) -> Result<()> {
    let targets = resolve_targets(&args.extensions, config)?;
    if targets.is_empty() {
        bail!(
            "No extensions to build. Pass --extension NAME[=DIR] or add an [[extension]] table to {}",
            cmext::config::PROJECT_CONFIG
        );
    }

    let options = resolve_options(args, config, env_vars::debug_build());
    let tool = CMakeTool::resolve(args.cmake.clone(), config.cmake.clone());
    let probe = InterpreterProbe::resolve(
        args.interpreter.clone(),
        config.interpreter.clone(),
        SystemRunner,
    );

    if !args.quiet {
        println!(
            "Building {} extension(s) ({}, version {})",
            targets.len(),
            options.profile,
            options.version
        );
    }

    let invoker = BuildInvoker::new(SystemRunner, probe, tool, options).verbose(args.verbose);
    let reports = invoker.run(&targets)?;

    if !args.quiet {
        for report in &reports {
            let artifact = report
                .artifact
                .as_ref()
                .map_or_else(String::new, |path| format!(" -> {}", path.display()));
            println!(
                "Built {} in {:.2}s{artifact}",
                report.name,
                report.duration.as_secs_f64()
            );
        }
    }

    Ok(())
}

/// Targets from `--extension` flags, or from config when none are given.
fn resolve_targets(specs: &[String], config: &Config) -> Result<Vec<ExtensionTarget>> {
    if specs.is_empty() {
        return config.targets();
    }
    specs.iter().map(|spec| parse_extension_arg(spec)).collect()
}

/// Parse `NAME` or `NAME=SOURCE_DIR`.
fn parse_extension_arg(spec: &str) -> Result<ExtensionTarget> {
    let (name, source_dir) = spec.split_once('=').unwrap_or((spec, "."));
    ExtensionTarget::new(name.trim(), source_dir)
        .with_context(|| format!("Invalid --extension value {spec:?}"))
}

fn resolve_profile(
    flag: Option<BuildProfile>,
    debug_env: bool,
    config: Option<BuildProfile>,
) -> BuildProfile {
    flag.or_else(|| debug_env.then_some(BuildProfile::Debug))
        .or(config)
        .unwrap_or_default()
}

fn resolve_options(args: &BuildArgs, config: &Config, debug_env: bool) -> BuildOptions {
    let defaults = BuildOptions::default();

    // Config defines first, then command-line ones, so flags can extend them
    let mut defines = config.defines.clone();
    defines.extend(args.defines.iter().cloned());

    BuildOptions {
        profile: resolve_profile(args.profile, debug_env, config.profile),
        version: args
            .version
            .clone()
            .or_else(|| config.version.clone())
            .unwrap_or(defaults.version),
        build_lib: args
            .build_lib
            .clone()
            .or_else(|| env_vars::build_lib().map(PathBuf::from))
            .or_else(|| config.build_lib.clone())
            .unwrap_or(defaults.build_lib),
        build_temp: args
            .build_temp
            .clone()
            .or_else(|| env_vars::build_temp().map(PathBuf::from))
            .or_else(|| config.build_temp.clone())
            .unwrap_or(defaults.build_temp),
        flags_var: args
            .flags_var
            .clone()
            .or_else(|| config.flags_var.clone())
            .unwrap_or_else(|| DEFAULT_FLAGS_VAR.to_string()),
        defines,
    }
}
