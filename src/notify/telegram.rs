//! Telegram Bot API `sendMessage` delivery.
//!
//! Delivery is attempted once per message. A rejected or failed post is
//! logged and returned to the caller; the next cycle sends a fresh report.

use std::time::Duration;

use tracing::{error, info};

use crate::core::config::NotifyConfig;
use crate::core::errors::{NpnError, Result};
use crate::status::transport::HttpTransport;

/// Delivers message text to a fixed destination.
pub trait Notifier {
    /// Deliver `text` once. `Ok` only when the destination accepted it.
    fn notify(&self, text: &str) -> Result<()>;
}

/// Posts to `{api_base}/bot{token}/sendMessage` with `chat_id` and `text`
/// form fields. Only HTTP 200 counts as delivered.
pub struct TelegramNotifier<T> {
    send_url: String,
    chat_id: String,
    timeout: Duration,
    transport: T,
}

impl<T: HttpTransport> TelegramNotifier<T> {
    #[must_use]
    pub fn new(config: &NotifyConfig, transport: T) -> Self {
        Self {
            send_url: config.send_message_url(),
            chat_id: config.chat_id.clone(),
            timeout: config.timeout(),
            transport,
        }
    }
}

impl<T: HttpTransport> Notifier for TelegramNotifier<T> {
    fn notify(&self, text: &str) -> Result<()> {
        let fields = [("chat_id", self.chat_id.as_str()), ("text", text)];
        let response = self
            .transport
            .post_form(&self.send_url, &fields, self.timeout)
            .inspect_err(|err| {
                error!(code = err.code(), error = %err, "failed to reach messaging endpoint");
            })?;

        if response.status == 200 {
            info!(chat_id = %self.chat_id, chars = text.chars().count(), "notification delivered");
            Ok(())
        } else {
            error!(status = response.status, "messaging endpoint rejected notification");
            Err(NpnError::NotifyRejected {
                status: response.status,
            })
        }
    }
}
