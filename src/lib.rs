//! Node points notifier: polls an orchestrator for a wallet's node status,
//! keeps CLI nodes that earned points, and posts a summary to Telegram.
//!
//! The pipeline is `Fetcher → Transformer → Notifier`, repeated on a fixed
//! interval by [`daemon::loop_main::Pipeline`].

#[cfg(feature = "cli")]
pub mod cli_app;
pub mod core;
pub mod daemon;
pub mod logger;
pub mod notify;
pub mod status;
