//! Structured logging via `tracing`.
//!
//! `RUST_LOG` takes precedence; otherwise the level passed on the command line
//! applies to the whole process.

use tracing_subscriber::EnvFilter;

use crate::core::errors::{NpnError, Result};

pub const DEFAULT_LEVEL: &str = "info";

/// Install the global fmt subscriber. Calling it again is a no-op.
pub fn init(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|err| NpnError::ConfigParse {
            context: "log level",
            details: err.to_string(),
        })?,
    };
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::init;

    #[test]
    fn repeated_init_is_harmless() {
        init("debug").expect("first init");
        init("info").expect("second init");
    }
}
