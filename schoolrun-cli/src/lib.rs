//! Command-line interface for the school-bus engine.
//!
//! `schoolrun stops|routes|full <params.json>` reads a JSON parameter file,
//! runs the matching optimisation and writes the JSON result to stdout or to
//! `--output`. Paths and the OSRM base URL layer CLI flags over `SCHOOLRUN_`
//! environment variables and configuration files.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};

mod config;
mod error;
mod optimise;

pub use error::CliError;

use config::{FullArgs, RoutesArgs, StopsArgs};
use optimise::Operation;

const ARG_PARAMS: &str = "params";
const ARG_STUDENTS: &str = "students";
const ARG_OSRM_BASE_URL: &str = "osrm-base-url";
const ARG_OUTPUT: &str = "output";
const ENV_STOPS_PARAMS: &str = "SCHOOLRUN_CMDS_STOPS_PARAMS_PATH";
const ENV_ROUTES_PARAMS: &str = "SCHOOLRUN_CMDS_ROUTES_PARAMS_PATH";
const ENV_FULL_PARAMS: &str = "SCHOOLRUN_CMDS_FULL_PARAMS_PATH";

/// Run the schoolrun CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns a [`CliError`] when arguments, configuration, inputs, the
/// optimisation or the output write fail.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    dispatch(cli, &mut stdout)
}

fn dispatch(cli: Cli, writer: &mut dyn Write) -> Result<(), CliError> {
    match cli.command {
        Command::Stops(args) => {
            optimise::run_operation(Operation::Stops, &args.into_config()?, writer)
        }
        Command::Routes(args) => {
            optimise::run_operation(Operation::Routes, &args.into_config()?, writer)
        }
        Command::Full(args) => {
            optimise::run_operation(Operation::Full, &args.into_config()?, writer)
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "schoolrun",
    about = "Place school-bus stops and build capacity-feasible routes",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Place stops so students walk at most the walking radius.
    Stops(StopsArgs),
    /// Build capacity-feasible routes over existing stops.
    Routes(RoutesArgs),
    /// Place stops, cluster them and route every cluster.
    Full(FullArgs),
}

#[cfg(test)]
mod tests;
