//! OBS cargo vendor source service entrypoint.
//!
//! Runs in the package directory OBS prepares, vendors the crate's
//! dependencies and leaves `vendor.tar.<codec>` and `cargo_config` in the
//! requested output directory.

use clap::Parser;
use log::error;
use obs_service_cargo_vendor::cli::Cli;
use obs_service_cargo_vendor::config::ServiceConfig;
use obs_service_cargo_vendor::error::Result;
use obs_service_cargo_vendor::logging;
use obs_service_cargo_vendor::pipeline::{self, PipelineReport};
use obs_service_cargo_vendor::vendor::SystemCommandExecutor;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    if !logging::init() {
        write_stderr_line(&mut stderr, "log subscriber already installed");
    }

    let exit_code = exit_code_for_run_result(run(&cli));
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli) -> Result<PipelineReport> {
    let workdir = std::env::current_dir()?;
    let config = ServiceConfig::from_cli(cli, &workdir)?;
    pipeline::run(&config, &SystemCommandExecutor)
}

fn exit_code_for_run_result<T>(result: Result<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            error!("{:?} failure: {err}", err.kind());
            err.exit_code()
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Nothing left to report to.
    }
}
