use exchange::ExchangeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}
