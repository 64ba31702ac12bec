use crate::config::{DEFAULT_PRIMARY_STRATEGY, get_strategies};
use crate::context::StrategyContext;
use crate::credentials::StrategyCredentials;
use crate::error::StrategyError;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Named strategies with a primary used as the fallback.
pub struct StrategyRegistry<T> {
    strategies: FxHashMap<String, StrategyCredentials<T>>,
    primary: StrategyCredentials<T>,
}

impl<T: Clone + 'static> StrategyRegistry<T> {
    /// The built-in strategies with `"normal"` as primary.
    pub fn new(ctx: &StrategyContext) -> Result<Self, StrategyError> {
        Self::from_map(get_strategies(ctx), DEFAULT_PRIMARY_STRATEGY)
    }

    pub fn from_map(
        strategies: FxHashMap<String, StrategyCredentials<T>>,
        primary: &str,
    ) -> Result<Self, StrategyError> {
        let primary = strategies
            .get(primary)
            .cloned()
            .ok_or_else(|| StrategyError::UnknownPrimary(primary.to_string()))?;
        Ok(Self {
            strategies,
            primary,
        })
    }
}

impl<T: 'static> StrategyRegistry<T> {
    /// The strategy called `name`, or the primary one if there is none.
    pub fn get(&self, name: &str) -> &StrategyCredentials<T> {
        match self.strategies.get(name) {
            Some(credentials) => credentials,
            None => {
                debug!(
                    requested = name,
                    primary = self.primary.name(),
                    "unknown strategy, using primary"
                );
                &self.primary
            }
        }
    }

    pub fn resolve(&self, name: Option<&str>) -> &StrategyCredentials<T> {
        match name {
            Some(name) => self.get(name),
            None => &self.primary,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Adds a strategy under a new name.
    pub fn register(&mut self, credentials: StrategyCredentials<T>) -> Result<(), StrategyError> {
        let name = credentials.name();
        if self.strategies.contains_key(name) {
            return Err(StrategyError::AlreadyRegistered(name.to_string()));
        }
        debug!(strategy = name, "registering strategy");
        self.strategies.insert(name.to_string(), credentials);
        Ok(())
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn primary(&self) -> &StrategyCredentials<T> {
        &self.primary
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl<T> std::fmt::Debug for StrategyRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.strategies.len())
            .field("primary", &self.primary)
            .finish()
    }
}
