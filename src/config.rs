//! # config — settings from environment variables
//!
//! | Variable                | Default                          |
//! |-------------------------|----------------------------------|
//! | `BIND_ADDR`             | `0.0.0.0:3000`                   |
//! | `REFRESH_INTERVAL_SECS` | `300`                            |
//! | `HTTP_TIMEOUT_SECS`     | `10`                             |
//! | `QUOTE_API_URL`         | `https://api.marketdata.app/v1/` |
//! | `MARKET_DATA_TOKEN`     | required                         |
//! | `TELEGRAM_BOT_TOKEN`    | unset → log-only notifier        |
//! | `TELEGRAM_CHAT_ID`      | unset → log-only notifier        |
//! | `TELEGRAM_API_URL`      | `https://api.telegram.org`       |
//! | `STORE_BACKEND`         | `file`                           |
//! | `POSITIONS_FILE`        | `positions.json`                 |
//! | `DATABASE_URL`          | required for `postgres`          |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};

/// Where positions are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Memory,
    File(PathBuf),
    Postgres { database_url: String },
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::File(path) => write!(f, "file ({})", path.display()),
            StoreBackend::Postgres { .. } => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_url:   String,
    pub bot_token: String,
    pub chat_id:   String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr:         SocketAddr,
    /// Cycle cadence; also the quote cache TTL.
    pub refresh_interval:  Duration,
    /// Bound on every outbound HTTP call.
    pub http_timeout:      Duration,
    pub quote_api_url:     String,
    pub market_data_token: String,
    /// `None` → notifications are only logged.
    pub telegram:          Option<TelegramConfig>,
    pub store:             StoreBackend,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let bind_addr: SocketAddr = var_or("BIND_ADDR", "0.0.0.0:3000")
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:3000")?;

        let refresh_secs: u64 = var_or("REFRESH_INTERVAL_SECS", "300") // default: 5 minutes
            .parse()
            .context("REFRESH_INTERVAL_SECS must be a number")?;
        if refresh_secs == 0 {
            bail!("REFRESH_INTERVAL_SECS must be greater than zero");
        }

        let timeout_secs: u64 = var_or("HTTP_TIMEOUT_SECS", "10")
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a number")?;
        if timeout_secs == 0 {
            bail!("HTTP_TIMEOUT_SECS must be greater than zero");
        }

        let market_data_token = get("MARKET_DATA_TOKEN")
            .filter(|t| !t.is_empty())
            .context("MARKET_DATA_TOKEN environment variable is required")?;

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) if !bot_token.is_empty() && !chat_id.is_empty() => {
                Some(TelegramConfig {
                    api_url: var_or("TELEGRAM_API_URL", "https://api.telegram.org"),
                    bot_token,
                    chat_id,
                })
            }
            _ => None,
        };

        let store = match var_or("STORE_BACKEND", "file").to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "file" => StoreBackend::File(PathBuf::from(var_or("POSITIONS_FILE", "positions.json"))),
            "postgres" => StoreBackend::Postgres {
                database_url: get("DATABASE_URL")
                    .context("DATABASE_URL is required when STORE_BACKEND=postgres")?,
            },
            other => bail!("Unknown STORE_BACKEND: '{other}'. Use 'memory', 'file' or 'postgres'"),
        };

        Ok(Self {
            bind_addr,
            refresh_interval: Duration::from_secs(refresh_secs),
            http_timeout: Duration::from_secs(timeout_secs),
            quote_api_url: var_or("QUOTE_API_URL", "https://api.marketdata.app/v1/"),
            market_data_token,
            telegram,
            store,
        })
    }
}
