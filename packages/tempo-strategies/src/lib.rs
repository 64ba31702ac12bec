//! Render strategies.
//!
//! A strategy pairs render work with a behavior deciding when that work runs
//! relative to incoming trigger signals: synchronously, on the next
//! animation frame with per-scope coalescing, or through the priority
//! scheduler. Strategies are looked up by name in a [`StrategyRegistry`]
//! and can be switched live through [`RenderAware`].

pub mod builtin;
pub mod concurrent;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod handle;
pub mod registry;
pub mod render_aware;
pub mod schedule;
pub mod ticks;

pub use config::{DEFAULT_PRIMARY_STRATEGY, StrategyConfig, get_strategies, merge_config};
pub use context::StrategyContext;
pub use credentials::{Behavior, RenderWork, StrategyCredentials, Work};
pub use error::StrategyError;
pub use handle::RenderHandle;
pub use registry::StrategyRegistry;
pub use render_aware::RenderAware;
pub use schedule::coalesce_and_schedule;
