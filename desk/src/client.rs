//! Exchange client factory.
//!
//! Resolves the REST base URL and builds a ready-to-use [`Exchange`].

use std::time::Duration;

use exchange::config::DEFAULT_BASE_URL;
use exchange::{Exchange, ExchangeConfig};
use tracing::info;

use crate::error::DeskError;

/// Environment variable holding the REST base URL.
pub const BASE_URL_ENV: &str = "EXCHANGE_API_URL";

/// Pick the base URL: explicit flag first, then the environment, then the
/// local default.
pub fn resolve_base_url(flag: Option<&str>, env: Option<String>) -> String {
    flag.map(str::to_string)
        .or(env)
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Optional overrides of the default poll cadence and compact depth.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub book_poll_interval: Option<Duration>,
    pub leaderboard_poll_interval: Option<Duration>,
    pub compact_depth: Option<usize>,
}

/// Build the exchange client.
///
/// # Errors
///
/// Returns [`DeskError::Config`] if the base URL is unusable.
pub fn connect(base_url: Option<&str>, overrides: Overrides) -> Result<Exchange, DeskError> {
    let base_url = resolve_base_url(base_url, std::env::var(BASE_URL_ENV).ok());

    let mut config = ExchangeConfig::with_base_url(&base_url)
        .map_err(|e| DeskError::Config(format!("{base_url}: {e}")))?;
    if let Some(interval) = overrides.book_poll_interval {
        config.book_poll_interval = interval;
    }
    if let Some(interval) = overrides.leaderboard_poll_interval {
        config.leaderboard_poll_interval = interval;
    }
    if let Some(depth) = overrides.compact_depth {
        config.compact_depth = depth;
    }

    info!(base_url = %config.base_url, "exchange client ready");
    Ok(Exchange::new(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_env() {
        assert_eq!(
            resolve_base_url(Some("http://a/api"), Some("http://b/api".into())),
            "http://a/api"
        );
    }

    #[test]
    fn env_then_default() {
        assert_eq!(resolve_base_url(None, Some("http://b/api".into())), "http://b/api");
        assert_eq!(resolve_base_url(None, None), DEFAULT_BASE_URL);
        assert_eq!(resolve_base_url(None, Some("  ".into())), DEFAULT_BASE_URL);
    }

    #[test]
    fn overrides_apply() {
        let exchange = connect(
            Some("http://localhost:9000/api/exchange"),
            Overrides {
                book_poll_interval: Some(Duration::from_secs(1)),
                compact_depth: Some(5),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(exchange.config().book_poll_interval, Duration::from_secs(1));
        assert_eq!(exchange.config().leaderboard_poll_interval, Duration::from_secs(10));
        assert_eq!(exchange.config().compact_depth, 5);
    }

    #[test]
    fn bad_url_is_a_config_error() {
        assert!(matches!(
            connect(Some("not a url"), Overrides::default()),
            Err(DeskError::Config(_))
        ));
    }
}
