//! Top-level CLI definition and dispatch.

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::{error, info};

use crate::core::config::Config;
use crate::core::errors::NpnError;
use crate::daemon::loop_main::LivePipeline;
use crate::daemon::scheduler::ShutdownFlag;
use crate::daemon::signals;
use crate::logger;

/// Node points notifier — polls wallet node status and reports it to Telegram.
#[derive(Parser)]
#[command(name = "npn", version, about)]
pub struct Cli {
    /// Path to a TOML config file (default: ./npn.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log level used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = logger::DEFAULT_LEVEL)]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Run the polling loop in the foreground until SIGINT/SIGTERM.
    Daemon {
        /// Stop after this many cycles.
        #[arg(long)]
        cycles: Option<u64>,
    },
    /// Run a single fetch → notify cycle and exit.
    Once,
    /// Fetch and print the report without sending it.
    Preview,
    /// Show the resolved configuration with secrets masked.
    Config,
    /// Generate a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Dispatch CLI commands.
///
/// # Errors
/// Returns an error if configuration is unusable or the command fails.
pub fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Command::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "npn", &mut io::stdout());
        return Ok(());
    }

    logger::init(&cli.log_level)?;

    match &cli.command {
        Command::Config => {
            let config = Config::resolve(cli.config.as_deref())?;
            print!("{}", config.to_redacted_toml()?);
            config.validate()?;
        }
        Command::Daemon { cycles } => {
            let config = Config::load(cli.config.as_deref())?;
            let shutdown = ShutdownFlag::new();
            signals::install(&shutdown)?;
            let pipeline = LivePipeline::from_config(&config, &shutdown)?;
            let summary = pipeline.run(*cycles);
            info!(?summary, "daemon stopped");
        }
        Command::Once => {
            let config = Config::load(cli.config.as_deref())?;
            let pipeline = LivePipeline::from_config(&config, &ShutdownFlag::new())?;
            let outcome = pipeline.run_cycle();
            if !outcome.delivered {
                error!(?outcome, "cycle finished without delivering a notification");
                return Err(Box::new(NpnError::Runtime {
                    details: "notification was not delivered".to_string(),
                }));
            }
        }
        Command::Preview => {
            let config = Config::load(cli.config.as_deref())?;
            let pipeline = LivePipeline::from_config(&config, &ShutdownFlag::new())?;
            let message = pipeline.preview()?;
            print!("{message}");
            println!();
        }
        Command::Completions { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Command};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn daemon_accepts_cycle_limit_and_global_flags() {
        let cli = Cli::try_parse_from([
            "npn",
            "daemon",
            "--cycles",
            "2",
            "--config",
            "/etc/npn.toml",
            "--log-level",
            "debug",
        ])
        .expect("parse");
        assert!(matches!(cli.command, Command::Daemon { cycles: Some(2) }));
        assert_eq!(cli.log_level, "debug");
        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("/etc/npn.toml"))
        );
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["npn"]).is_err());
    }
}
