//! `npn` binary entrypoint.

use std::process::ExitCode;

use clap::Parser;
use node_points_notifier::cli_app::{self, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli_app::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("npn: {err}");
            ExitCode::FAILURE
        }
    }
}
