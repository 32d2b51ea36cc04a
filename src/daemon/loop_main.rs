//! Main polling loop: fetch, transform, notify, wait, repeat.

use tracing::{debug, error, info, warn};

use crate::core::config::Config;
use crate::core::errors::{NpnError, Result};
use crate::daemon::scheduler::{InterruptibleSleeper, ShutdownFlag, Sleeper, Ticker};
use crate::notify::telegram::{Notifier, TelegramNotifier};
use crate::status::fetcher::{Fetcher, StatusSource};
use crate::status::transform::{DisplayMessage, Transformer};
use crate::status::transport::ReqwestTransport;

/// What the fetch stage produced in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    /// Status fetched; `selected` nodes were listed (0 = "no matching nodes").
    Report { selected: usize },
    /// All retries used up without a usable response.
    FetchFailed,
    /// The endpoint answered with data of the wrong shape.
    MalformedUpstream,
    /// Shutdown was requested mid-fetch; nothing was sent.
    Interrupted,
}

/// Result of one [`Pipeline::run_cycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// What the fetch stage produced.
    pub kind: CycleKind,
    /// Whether the notifier accepted a message this cycle.
    pub delivered: bool,
}

/// Counters across all cycles of one [`Pipeline::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles started, an interrupted one included.
    pub cycles: u64,
    /// Messages the notifier accepted.
    pub notifications_sent: u64,
    /// Messages the notifier rejected or could not deliver.
    pub notification_failures: u64,
    /// Cycles that reported a fetch failure or malformed payload.
    pub fetch_failures: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: CycleOutcome) {
        self.cycles += 1;
        if outcome.kind == CycleKind::Interrupted {
            return;
        }
        if outcome.delivered {
            self.notifications_sent += 1;
        } else {
            self.notification_failures += 1;
        }
        if !matches!(outcome.kind, CycleKind::Report { .. }) {
            self.fetch_failures += 1;
        }
    }
}

/// Fetcher → Transformer → Notifier, driven by a [`Ticker`].
pub struct Pipeline<F, N, S> {
    source: F,
    transformer: Transformer,
    notifier: N,
    ticker: Ticker<S>,
}

/// Pipeline wired to real HTTP and wall-clock sleeping.
pub type LivePipeline = Pipeline<
    Fetcher<ReqwestTransport, InterruptibleSleeper>,
    TelegramNotifier<ReqwestTransport>,
    InterruptibleSleeper,
>;

impl LivePipeline {
    /// Build the production pipeline from a validated [`Config`].
    pub fn from_config(config: &Config, shutdown: &ShutdownFlag) -> Result<Self> {
        let transport = ReqwestTransport::new()?;
        let sleeper = InterruptibleSleeper::new(shutdown.clone());
        let fetcher = Fetcher::new(
            config.status_endpoint()?,
            config.retry_policy(),
            transport.clone(),
            sleeper.clone(),
        );
        let notifier = TelegramNotifier::new(&config.notify, transport);
        Ok(Pipeline::new(
            fetcher,
            Transformer::new(config.display_offset()?),
            notifier,
            Ticker::new(config.interval(), sleeper),
        ))
    }
}

impl<F: StatusSource, N: Notifier, S: Sleeper> Pipeline<F, N, S> {
    /// Wire the stages together.
    #[must_use]
    pub fn new(source: F, transformer: Transformer, notifier: N, ticker: Ticker<S>) -> Self {
        Self {
            source,
            transformer,
            notifier,
            ticker,
        }
    }

    /// Fetch and transform without delivering anything.
    pub fn preview(&self) -> Result<DisplayMessage> {
        let record = self.source.fetch()?;
        Ok(self.transformer.filter_and_format(&record))
    }

    /// One full pass. Fetch failures are reported through the notifier with a
    /// fixed text and never reach the transformer. A fetch cut short by
    /// shutdown sends nothing.
    pub fn run_cycle(&self) -> CycleOutcome {
        let (kind, message) = match self.source.fetch() {
            Ok(record) => {
                let message = self.transformer.filter_and_format(&record);
                let selected = match &message {
                    DisplayMessage::Listing { lines, .. } => lines.len(),
                    _ => 0,
                };
                if selected == 0 {
                    warn!(
                        wallet = %record.wallet_address,
                        "no nodeType 2 nodes with points > 0"
                    );
                } else {
                    info!(wallet = %record.wallet_address, selected, "sending node report");
                }
                (CycleKind::Report { selected }, message)
            }
            Err(NpnError::Cancelled { attempts }) => {
                info!(attempts, "fetch cancelled by shutdown; skipping notification");
                return CycleOutcome {
                    kind: CycleKind::Interrupted,
                    delivered: false,
                };
            }
            Err(err @ NpnError::MalformedUpstreamSchema { .. }) => {
                error!(code = err.code(), error = %err, "status payload unusable; sending fallback");
                (CycleKind::MalformedUpstream, DisplayMessage::MalformedUpstream)
            }
            Err(err) => {
                error!(code = err.code(), error = %err, "could not fetch status; sending fallback");
                (CycleKind::FetchFailed, DisplayMessage::FetchFailed)
            }
        };

        let text = message.text();
        debug!(%text, "notification body");
        let delivered = self.notifier.notify(&text).is_ok();
        CycleOutcome { kind, delivered }
    }

    /// Run cycles until `max_cycles` is reached or shutdown is requested.
    /// `None` runs until shutdown.
    pub fn run(&self, max_cycles: Option<u64>) -> RunSummary {
        let mut summary = RunSummary::default();
        info!(
            interval_secs = self.ticker.interval().as_secs(),
            max_cycles, "starting polling loop"
        );
        loop {
            let outcome = self.run_cycle();
            summary.record(outcome);
            if outcome.kind == CycleKind::Interrupted {
                info!("shutdown requested; leaving polling loop");
                break;
            }
            if max_cycles.is_some_and(|limit| summary.cycles >= limit) {
                break;
            }
            info!(
                interval_secs = self.ticker.interval().as_secs(),
                "waiting before the next cycle"
            );
            if !self.ticker.wait() {
                info!("shutdown requested; leaving polling loop");
                break;
            }
        }
        info!(
            cycles = summary.cycles,
            sent = summary.notifications_sent,
            failed = summary.notification_failures,
            "polling loop finished"
        );
        summary
    }
}
