//! SIGINT/SIGTERM handling: flip the shared shutdown flag so the loop exits
//! at its next sleep slice.

use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::debug;

use crate::core::errors::{NpnError, Result};
use crate::daemon::scheduler::ShutdownFlag;

/// Register termination signals against `shutdown`.
pub fn install(shutdown: &ShutdownFlag) -> Result<()> {
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, shutdown.handle()).map_err(|err| {
            NpnError::Runtime {
                details: format!("failed to register handler for signal {signal}: {err}"),
            }
        })?;
        debug!(signal, "shutdown handler registered");
    }
    Ok(())
}
