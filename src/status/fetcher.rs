//! Status fetcher with a fixed-delay bounded retry policy.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::core::errors::{NpnError, Result};
use crate::daemon::scheduler::Sleeper;
use crate::status::model::StatusRecord;
use crate::status::transport::HttpTransport;

/// Attempt budget for one fetch. The delay applies between attempts only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts; 0 is treated as 1.
    pub max_attempts: u32,
    pub delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Source of status records for the pipeline.
pub trait StatusSource {
    /// Produce a validated record or the reason none could be obtained.
    fn fetch(&self) -> Result<StatusRecord>;
}

/// Polls one status endpoint over an [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct Fetcher<T, S> {
    endpoint: String,
    policy: RetryPolicy,
    transport: T,
    sleeper: S,
}

impl<T: HttpTransport, S: Sleeper> Fetcher<T, S> {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, policy: RetryPolicy, transport: T, sleeper: S) -> Self {
        Self {
            endpoint: endpoint.into(),
            policy,
            transport,
            sleeper,
        }
    }

    fn attempt(&self) -> Result<StatusRecord> {
        let response = self.transport.get(&self.endpoint, self.policy.timeout)?;
        if !response.is_success() {
            return Err(NpnError::UpstreamStatus {
                status: response.status,
            });
        }
        StatusRecord::from_body(&response.body)
    }
}

impl<T: HttpTransport, S: Sleeper> StatusSource for Fetcher<T, S> {
    fn fetch(&self) -> Result<StatusRecord> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            info!(attempt, max_attempts, endpoint = %self.endpoint, "fetching node status");
            match self.attempt() {
                Ok(record) => {
                    info!(
                        attempt,
                        wallet = %record.wallet_address,
                        nodes = record.nodes.len(),
                        "node status fetched"
                    );
                    return Ok(record);
                }
                Err(err) if !err.is_retryable() => {
                    error!(attempt, code = err.code(), error = %err, "status payload rejected");
                    return Err(err);
                }
                Err(err) => {
                    error!(attempt, code = err.code(), error = %err, "fetch attempt failed");
                    last_error = err.to_string();
                }
            }

            if attempt < max_attempts && !self.sleeper.sleep(self.policy.delay) {
                warn!(attempt, "shutdown requested; abandoning remaining fetch attempts");
                return Err(NpnError::Cancelled { attempts: attempt });
            }
        }

        error!(attempts = max_attempts, "all fetch attempts failed");
        Err(NpnError::FetchExhausted {
            attempts: max_attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::time::Duration;

    use super::{Fetcher, RetryPolicy, StatusSource};
    use crate::core::errors::{NpnError, Result};
    use crate::daemon::scheduler::Sleeper;
    use crate::status::transport::{HttpResponse, HttpTransport};

    const GOOD_BODY: &str = r#"{"data":{"walletAddress":"0xABC","nodes":[]}}"#;

    struct ScriptedTransport {
        replies: RefCell<VecDeque<Result<HttpResponse>>>,
        calls: Cell<u32>,
        timeouts: RefCell<Vec<Duration>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<HttpResponse>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: Cell::new(0),
                timeouts: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpTransport for &ScriptedTransport {
        fn get(&self, _url: &str, timeout: Duration) -> Result<HttpResponse> {
            self.calls.set(self.calls.get() + 1);
            self.timeouts.borrow_mut().push(timeout);
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(connect_refused()))
        }

        fn post_form(&self, _: &str, _: &[(&str, &str)], _: Duration) -> Result<HttpResponse> {
            unreachable!("fetcher never posts")
        }
    }

    #[derive(Default)]
    struct CountingSleeper {
        naps: RefCell<Vec<Duration>>,
        interrupt_after: Option<usize>,
    }

    impl Sleeper for &CountingSleeper {
        fn sleep(&self, duration: Duration) -> bool {
            self.naps.borrow_mut().push(duration);
            self.interrupt_after
                .is_none_or(|limit| self.naps.borrow().len() < limit)
        }
    }

    fn connect_refused() -> NpnError {
        NpnError::Http {
            context: "connect",
            details: "connection refused".to_string(),
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::default()
    }

    #[test]
    fn first_success_returns_without_sleeping() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, GOOD_BODY))]);
        let sleeper = CountingSleeper::default();
        let fetcher = Fetcher::new("http://status", policy(), &transport, &sleeper);

        let record = fetcher.fetch().expect("fetch");
        assert_eq!(record.wallet_address, "0xABC");
        assert_eq!(transport.calls.get(), 1);
        assert!(sleeper.naps.borrow().is_empty());
        assert_eq!(*transport.timeouts.borrow(), vec![Duration::from_secs(10)]);
    }

    #[test]
    fn recovers_after_transient_failures() {
        let transport = ScriptedTransport::new(vec![
            Err(connect_refused()),
            Ok(HttpResponse::new(502, "bad gateway")),
            Ok(HttpResponse::new(200, "{truncated")),
            Ok(HttpResponse::new(200, GOOD_BODY)),
        ]);
        let sleeper = CountingSleeper::default();
        let fetcher = Fetcher::new("http://status", policy(), &transport, &sleeper);

        assert!(fetcher.fetch().is_ok());
        assert_eq!(transport.calls.get(), 4);
        assert_eq!(*sleeper.naps.borrow(), vec![Duration::from_secs(5); 3]);
    }

    #[test]
    fn always_failing_endpoint_uses_exactly_max_attempts() {
        let transport = ScriptedTransport::new(Vec::new());
        let sleeper = CountingSleeper::default();
        let fetcher = Fetcher::new("http://status", policy(), &transport, &sleeper);

        let err = fetcher.fetch().expect_err("must exhaust");
        match err {
            NpnError::FetchExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 5);
                assert!(last_error.contains("connection refused"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(transport.calls.get(), 5);
        assert_eq!(sleeper.naps.borrow().len(), 4);
    }

    #[test]
    fn schema_violation_is_not_retried() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(
            200,
            r#"{"data":{"nodes":[]}}"#,
        ))]);
        let sleeper = CountingSleeper::default();
        let fetcher = Fetcher::new("http://status", policy(), &transport, &sleeper);

        let err = fetcher.fetch().expect_err("schema");
        assert!(matches!(err, NpnError::MalformedUpstreamSchema { .. }));
        assert_eq!(transport.calls.get(), 1);
        assert!(sleeper.naps.borrow().is_empty());
    }

    #[test]
    fn shutdown_during_retry_delay_stops_early() {
        let transport = ScriptedTransport::new(Vec::new());
        let sleeper = CountingSleeper {
            interrupt_after: Some(2),
            ..CountingSleeper::default()
        };
        let fetcher = Fetcher::new("http://status", policy(), &transport, &sleeper);

        let err = fetcher.fetch().expect_err("interrupted");
        assert!(matches!(err, NpnError::Cancelled { attempts: 2 }));
        assert_eq!(transport.calls.get(), 2);
    }

    #[test]
    fn zero_attempt_policy_still_tries_once() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, GOOD_BODY))]);
        let sleeper = CountingSleeper::default();
        let fetcher = Fetcher::new(
            "http://status",
            RetryPolicy {
                max_attempts: 0,
                ..policy()
            },
            &transport,
            &sleeper,
        );
        assert!(fetcher.fetch().is_ok());
        assert_eq!(transport.calls.get(), 1);
    }
}
