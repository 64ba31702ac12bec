//! Trigger sources and coalescing.
//!
//! A small single-threaded push-stream toolkit ([`Source`], [`Subject`],
//! operators) plus the per-scope [`CoalescingManager`] and the
//! [`coalesce_with`] operator built on it.

pub mod coalesce;
pub mod coalescing;
pub mod error;
pub mod operators;
pub mod scope;
pub mod source;
pub mod subject;
pub mod subscription;

pub use coalesce::coalesce_with;
pub use coalescing::{CoalescingManager, ScopedCoalescing};
pub use error::SignalError;
pub use operators::Operator;
pub use scope::Scope;
pub use source::{FnObserver, Observer, Source, Subscriber};
pub use subject::Subject;
pub use subscription::Subscription;
