//! Runtime configuration: defaults, TOML file, environment overrides, validation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::core::errors::{NpnError, Result};
use crate::status::fetcher::RetryPolicy;

/// Config file looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "npn.toml";

/// Placeholder written in place of secrets when the config is displayed.
pub const REDACTED: &str = "<redacted>";

const ENV_STATUS_ENDPOINT: &str = "NPN_STATUS_ENDPOINT";
const ENV_WALLET_ADDRESS: &str = "NPN_WALLET_ADDRESS";
const ENV_TELEGRAM_TOKEN: &str = "NPN_TELEGRAM_TOKEN";
const ENV_TELEGRAM_CHAT_ID: &str = "NPN_TELEGRAM_CHAT_ID";
const ENV_INTERVAL_SECS: &str = "NPN_INTERVAL_SECS";
const ENV_MAX_ATTEMPTS: &str = "NPN_MAX_ATTEMPTS";

/// Full service configuration, loaded once at process start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[status]` section.
    pub status: StatusConfig,
    /// `[notify]` section.
    pub notify: NotifyConfig,
    /// `[schedule]` section.
    pub schedule: ScheduleConfig,
    /// `[display]` section.
    pub display: DisplayConfig,
}

/// Upstream status endpoint and fetch retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Orchestrator base URL; the endpoint becomes `{base_url}/users/{wallet_address}`.
    pub base_url: String,
    /// Wallet whose nodes are reported.
    pub wallet_address: String,
    /// Full endpoint URL. Takes precedence over `base_url` + `wallet_address`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Per-attempt request timeout.
    pub timeout_secs: u64,
    /// Attempts per cycle, first one included.
    pub max_attempts: u32,
    /// Fixed pause between failed attempts.
    pub retry_delay_secs: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            base_url: "https://beta.orchestrator.nexus.xyz".to_string(),
            wallet_address: String::new(),
            endpoint: None,
            timeout_secs: 10,
            max_attempts: 5,
            retry_delay_secs: 5,
        }
    }
}

/// Telegram Bot API destination.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Bot API root, normally `https://api.telegram.org`.
    pub api_base: String,
    /// Bot token. Secret; redacted in `Debug` and `npn config`.
    pub bot_token: String,
    /// Destination chat, user or channel id.
    pub chat_id: String,
    /// Per-request timeout for `sendMessage`.
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            bot_token: String::new(),
            chat_id: String::new(),
            timeout_secs: 10,
        }
    }
}

impl fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("api_base", &self.api_base)
            .field("bot_token", &REDACTED)
            .field("chat_id", &self.chat_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl NotifyConfig {
    /// Per-request timeout for `sendMessage`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `sendMessage` URL for the configured bot. Contains the token: never log it.
    #[must_use]
    pub fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Pause between the end of one cycle and the start of the next.
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Fixed display offset east of UTC. 420 is WIB (UTC+7).
    pub utc_offset_minutes: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 420,
        }
    }
}

impl Config {
    /// Load configuration: defaults, then file, then process environment.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read when present and silently skipped otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::resolve(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`] but without the final validation step.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(NpnError::MissingConfig {
                        path: path.to_path_buf(),
                    });
                }
                Self::from_file(path)?
            }
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(&fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML file without env overrides or validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| NpnError::io(path, source))?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML text; absent keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `NPN_*` overrides through `lookup`, which maps a variable name to
    /// its value.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_STATUS_ENDPOINT) {
            self.status.endpoint = Some(endpoint);
        }
        if let Some(wallet) = lookup(ENV_WALLET_ADDRESS) {
            self.status.wallet_address = wallet;
        }
        if let Some(token) = lookup(ENV_TELEGRAM_TOKEN) {
            self.notify.bot_token = token;
        }
        if let Some(chat_id) = lookup(ENV_TELEGRAM_CHAT_ID) {
            self.notify.chat_id = chat_id;
        }
        if let Some(raw) = lookup(ENV_INTERVAL_SECS) {
            self.schedule.interval_secs = parse_env(ENV_INTERVAL_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_ATTEMPTS) {
            self.status.max_attempts = parse_env(ENV_MAX_ATTEMPTS, &raw)?;
        }
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.status_endpoint()?;
        self.display_offset()?;
        if self.notify.bot_token.trim().is_empty() {
            return invalid("notify.bot_token must be set (or NPN_TELEGRAM_TOKEN)");
        }
        if self.notify.chat_id.trim().is_empty() {
            return invalid("notify.chat_id must be set (or NPN_TELEGRAM_CHAT_ID)");
        }
        if self.status.max_attempts == 0 {
            return invalid("status.max_attempts must be at least 1");
        }
        if self.status.timeout_secs == 0 || self.notify.timeout_secs == 0 {
            return invalid("timeouts must be greater than zero");
        }
        if self.schedule.interval_secs == 0 {
            return invalid("schedule.interval_secs must be greater than zero");
        }
        Ok(())
    }

    /// Resolved status endpoint URL.
    pub fn status_endpoint(&self) -> Result<String> {
        if let Some(endpoint) = self.status.endpoint.as_deref() {
            if endpoint.trim().is_empty() {
                return invalid("status.endpoint is empty");
            }
            return Ok(endpoint.to_string());
        }
        let wallet = self.status.wallet_address.trim();
        if wallet.is_empty() {
            return invalid("either status.endpoint or status.wallet_address must be set");
        }
        Ok(format!(
            "{}/users/{wallet}",
            self.status.base_url.trim_end_matches('/')
        ))
    }

    /// Fixed civil offset used when rendering node timestamps.
    pub fn display_offset(&self) -> Result<FixedOffset> {
        self.display
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| NpnError::InvalidConfig {
                details: format!(
                    "display.utc_offset_minutes {} is outside ±1440",
                    self.display.utc_offset_minutes
                ),
            })
    }

    /// Fetch budget from `[status]`.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.status.max_attempts,
            delay: Duration::from_secs(self.status.retry_delay_secs),
            timeout: Duration::from_secs(self.status.timeout_secs),
        }
    }

    /// Pause between cycles.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs)
    }

    /// TOML rendering with the bot token masked.
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if !shown.notify.bot_token.is_empty() {
            shown.notify.bot_token = REDACTED.to_string();
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|err: T::Err| NpnError::ConfigParse {
        context: key,
        details: format!("{raw:?}: {err}"),
    })
}

fn invalid<T>(details: &str) -> Result<T> {
    Err(NpnError::InvalidConfig {
        details: details.to_string(),
    })
}
