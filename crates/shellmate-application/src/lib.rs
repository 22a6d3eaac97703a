//! Application layer for Shellmate.
//!
//! Coordinates terminal events with the domain types from `shellmate-core`:
//! the context aggregation state machine, the background service feeding it,
//! and query building from the resulting context.

pub mod context_aggregator;
pub mod context_service;
pub mod query;

pub use context_aggregator::ContextAggregator;
pub use context_service::{ContextService, ContextStatus};
pub use query::{ContextSnapshot, QueryBuilder};
