//! Proxy e2e scenario driver
//!
//! Runs YAML-described test scenarios (render configs, start proxies, send
//! traffic, assert) with guaranteed reverse-order cleanup.

use clap::Parser;
use e2e::{cli, commands::Commands, common::logging};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "e2e-driver", about = "Proxy end-to-end scenario driver")]
#[command(version, long_about = None)]
struct Cli {
    /// Show cleanup progress and debug logs
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    match &cli.log_file {
        Some(path) => logging::init_with_file(cli.verbose, path),
        None => logging::init_cli(cli.verbose),
    }

    if let Err(e) = cli::dispatch(cli.command, cli.verbose) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
