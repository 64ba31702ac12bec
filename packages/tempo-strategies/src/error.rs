use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("strategy `{0}` is already registered")]
    AlreadyRegistered(String),

    #[error("primary strategy `{0}` is not registered")]
    UnknownPrimary(String),

    #[error("custom strategy `{0}` is configured but was not supplied")]
    MissingCustom(String),

    #[error("invalid strategy configuration: {0}")]
    Config(#[from] serde_json::Error),
}
