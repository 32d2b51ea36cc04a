//! Cancellable waiting: shutdown flag, sliced sleeper, fixed-interval ticker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Upper bound on how long a sleep goes without checking for shutdown.
pub const DEFAULT_SLEEP_SLICE: Duration = Duration::from_millis(250);

/// Process-wide cooperative cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this flag to stop.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been asked for.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Shared handle for signal handlers that store `true` on delivery.
    #[must_use]
    pub fn handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

/// Something that can wait.
pub trait Sleeper {
    /// Wait for `duration`. Returns `false` when the wait was cut short by a
    /// shutdown request, `true` when it ran to completion.
    fn sleep(&self, duration: Duration) -> bool;
}

/// Real-time sleeper that wakes every `slice` to observe the shutdown flag.
#[derive(Debug, Clone)]
pub struct InterruptibleSleeper {
    shutdown: ShutdownFlag,
    slice: Duration,
}

impl InterruptibleSleeper {
    #[must_use]
    pub fn new(shutdown: ShutdownFlag) -> Self {
        Self::with_slice(shutdown, DEFAULT_SLEEP_SLICE)
    }

    /// Custom wake-up granularity; clamped to at least 1 ms.
    #[must_use]
    pub fn with_slice(shutdown: ShutdownFlag, slice: Duration) -> Self {
        Self {
            shutdown,
            slice: slice.max(Duration::from_millis(1)),
        }
    }
}

impl Sleeper for InterruptibleSleeper {
    fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.shutdown.is_requested() {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            thread::sleep(remaining.min(self.slice));
        }
    }
}

/// Fixed-interval trigger between pipeline cycles.
///
/// The interval is measured from the end of one cycle to the start of the
/// next, so cycle duration adds to the period.
#[derive(Debug, Clone)]
pub struct Ticker<S> {
    interval: Duration,
    sleeper: S,
}

impl<S: Sleeper> Ticker<S> {
    #[must_use]
    pub fn new(interval: Duration, sleeper: S) -> Self {
        Self { interval, sleeper }
    }

    /// Configured pause.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until the next cycle is due. `false` means stop.
    pub fn wait(&self) -> bool {
        self.sleeper.sleep(self.interval)
    }
}
