use crate::builtin;
use crate::concurrent::concurrent_strategies;
use crate::context::StrategyContext;
use crate::credentials::StrategyCredentials;
use crate::error::StrategyError;
use crate::registry::StrategyRegistry;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIMARY_STRATEGY: &str = "normal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrategyConfig {
    /// Strategy used when a requested name is unknown or absent.
    pub primary_strategy: String,
    /// Names of the custom strategies the embedder must supply.
    pub custom_strategies: Vec<String>,
    pub patch_zone: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            primary_strategy: DEFAULT_PRIMARY_STRATEGY.to_string(),
            custom_strategies: Vec::new(),
            patch_zone: true,
        }
    }
}

impl StrategyConfig {
    pub fn from_json(json: &str) -> Result<Self, StrategyError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The built-in strategies keyed by name.
pub fn get_strategies<T: Clone + 'static>(
    ctx: &StrategyContext,
) -> FxHashMap<String, StrategyCredentials<T>> {
    let mut strategies = FxHashMap::default();
    let builtins = [
        builtin::local(ctx),
        builtin::global(ctx),
        builtin::native(),
        builtin::noop(),
    ];
    for credentials in builtins.into_iter().chain(concurrent_strategies(ctx)) {
        strategies.insert(credentials.name().to_string(), credentials);
    }
    strategies
}

/// Builds a registry from the built-ins plus `custom`. A custom strategy
/// replaces a built-in of the same name.
pub fn merge_config<T: Clone + 'static>(
    ctx: &StrategyContext,
    config: &StrategyConfig,
    custom: impl IntoIterator<Item = StrategyCredentials<T>>,
) -> Result<StrategyRegistry<T>, StrategyError> {
    let mut strategies = get_strategies(ctx);
    let mut supplied = Vec::new();
    for credentials in custom {
        let name = credentials.name().to_string();
        if strategies.insert(name.clone(), credentials).is_some() {
            tracing::debug!(strategy = %name, "custom strategy overrides built-in");
        }
        supplied.push(name);
    }

    if let Some(missing) = config
        .custom_strategies
        .iter()
        .find(|name| !supplied.contains(*name))
    {
        return Err(StrategyError::MissingCustom(missing.clone()));
    }

    StrategyRegistry::from_map(strategies, &config.primary_strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StrategyConfig::default();
        assert_eq!(config.primary_strategy, "normal");
        assert!(config.custom_strategies.is_empty());
        assert!(config.patch_zone);
    }

    #[test]
    fn parses_camel_case_json() {
        let config = StrategyConfig::from_json(
            r#"{ "primaryStrategy": "local", "customStrategies": ["chunked"] }"#,
        )
        .unwrap();
        assert_eq!(config.primary_strategy, "local");
        assert_eq!(config.custom_strategies, vec!["chunked".to_string()]);
        assert!(config.patch_zone);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            StrategyConfig::from_json("{ primaryStrategy"),
            Err(StrategyError::Config(_))
        ));
    }
}
