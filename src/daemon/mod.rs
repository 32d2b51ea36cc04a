//! Daemon subsystem: polling loop, interval scheduling, signal handling.

pub mod loop_main;
pub mod scheduler;
#[cfg(feature = "daemon")]
pub mod signals;
