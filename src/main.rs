//! # dataset-tool command line
//!
//! ```bash
//! dataset-tool process --file sales.csv --options clean.json --report report.json
//! dataset-tool check --file sales.xlsx --options clean.json
//! ```
//!
//! Settings are read from `config.json` in the platform config directory;
//! `RUST_LOG` controls log verbosity. Exit code 2 means the input file or the
//! options were rejected, 1 means an internal failure.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, clippy::print_stderr)] // Command output goes to the terminal

mod cli;

use clap::Parser as _;
use dataset_tool::{config, logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let mut settings = config::load_settings();
    cli.decode.apply(&mut settings);

    if let Err(e) = logging::init(&settings) {
        eprintln!("Failed to initialize logging: {e:#}");
    }

    match cli::run_command(cli.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::from(cli::exit_code(&err))
        }
    }
}
