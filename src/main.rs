//! cmext command-line interface
//!
//! Builds `CMake`-based native extensions for an interpreter

use clap::{Parser, Subcommand};
use cmext::{BuildProfile, Config, Define};
use std::path::PathBuf;
use std::process;

/// Display an error and its chain of causes
fn display_error(err: &anyhow::Error) {
    eprintln!("error: {err}");

    let mut source = err.source();
    while let Some(err) = source {
        eprintln!("caused by: {err}");
        source = err.source();
    }
}

#[derive(Parser)]
#[command(name = "cmext")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build CMake-based native extensions", long_about = None)]
pub(crate) struct Cli {
    /// Config file to use instead of .cmext.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not load any config file
    #[arg(long, global = true, conflicts_with = "config")]
    no_config: bool,

    /// Print debug logging to stderr
    #[arg(long, global = true)]
    debug_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure and build extensions with CMake
    Build {
        /// Extension to build, as NAME or NAME=SOURCE_DIR (repeatable)
        #[arg(long = "extension", short = 'e', value_name = "NAME[=DIR]")]
        extensions: Vec<String>,

        /// Build with debug information
        #[arg(long, short = 'g', conflicts_with = "release")]
        debug: bool,

        /// Build optimized (default)
        #[arg(long)]
        release: bool,

        /// Directory the built libraries are placed in
        #[arg(long, value_name = "DIR")]
        build_lib: Option<PathBuf>,

        /// Directory for intermediate build files
        #[arg(long, short = 't', value_name = "DIR")]
        build_temp: Option<PathBuf>,

        /// Extra CMake cache entry, as KEY=VALUE (repeatable)
        #[arg(long = "define", short = 'D', value_name = "KEY=VALUE")]
        defines: Vec<Define>,

        /// Package version embedded as VERSION_INFO
        #[arg(long, value_name = "VERSION")]
        pkg_version: Option<String>,

        /// CMake executable
        #[arg(long, value_name = "PATH")]
        cmake: Option<PathBuf>,

        /// Interpreter to build against
        #[arg(long, value_name = "PATH")]
        interpreter: Option<PathBuf>,

        /// Compiler flags variable that receives the version define
        #[arg(long, value_name = "NAME")]
        flags_var: Option<String>,

        /// Print commands and tool output
        #[arg(long, short)]
        verbose: bool,

        /// Suppress all output except errors
        #[arg(long, short, conflicts_with = "verbose")]
        quiet: bool,
    },

    /// Show the CMake, platform and interpreter details a build would use
    Probe {
        /// CMake executable
        #[arg(long, value_name = "PATH")]
        cmake: Option<PathBuf>,

        /// Interpreter to query
        #[arg(long, value_name = "PATH")]
        interpreter: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    cmext::init_debug(cli.debug_log);

    let result = Config::load_with_options(cli.config.as_deref(), cli.no_config).and_then(
        |config| match cli.command {
            Commands::Build {
                extensions,
                debug,
                release,
                build_lib,
                build_temp,
                defines,
                pkg_version,
                cmake,
                interpreter,
                flags_var,
                verbose,
                quiet,
            } => {
                let profile = if debug {
                    Some(BuildProfile::Debug)
                } else if release {
                    Some(BuildProfile::Release)
                } else {
                    None
                };
                let args = commands::build::BuildArgs {
                    extensions,
                    profile,
                    build_lib,
                    build_temp,
                    defines,
                    version: pkg_version,
                    cmake,
                    interpreter,
                    flags_var,
                    verbose,
                    quiet,
                };
                commands::build::run(&args, &config)
            }
            Commands::Probe {
                cmake,
                interpreter,
                json,
            } => commands::probe::run(cmake, interpreter, json, &config),
            Commands::Completion { shell } => commands::completion::run(shell),
        },
    );

    if let Err(e) = result {
        display_error(&e);
        process::exit(1);
    }
}

mod commands;
