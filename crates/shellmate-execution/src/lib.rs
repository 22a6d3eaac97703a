//! Execution layer for Shellmate.
//!
//! Dispatches approved commands to terminals and streams assistant events to
//! a frontend.

pub mod gateway;
pub mod tracing_layer;

pub use gateway::{ExecutionGateway, ExecutionOutcome};
pub use tracing_layer::{AssistantEvent, AssistantEventLayer};
