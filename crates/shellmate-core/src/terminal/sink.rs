//! Terminal sink contract used to dispatch approved commands.

use crate::selection::SessionId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::Display;
use thiserror::Error;

/// One of the equivalent entry points a terminal may offer for writing input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SinkCapability {
    /// Input through the terminal frontend (as if typed)
    FrontendInput,
    /// Input handed directly to the session
    SessionInput,
    /// Raw write to the underlying pty
    RawWrite,
}

impl SinkCapability {
    /// Order in which the gateway tries the capabilities.
    pub const DISPATCH_ORDER: [SinkCapability; 3] = [
        SinkCapability::FrontendInput,
        SinkCapability::SessionInput,
        SinkCapability::RawWrite,
    ];
}

/// Failure of a single write attempt.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("capability '{0}' is not supported by this terminal")]
    Unsupported(SinkCapability),

    #[error("write failed: {0}")]
    Write(String),

    #[error("terminal session is closed")]
    Closed,
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        Self::Write(err.to_string())
    }
}

/// A terminal that can receive written input.
///
/// Hosts implement this once per terminal kind instead of the gateway probing
/// objects for methods at runtime.
pub trait TerminalSink: Send + Sync {
    fn session_id(&self) -> SessionId;

    fn title(&self) -> String;

    /// Whether `capability` is available on this terminal.
    fn supports(&self, capability: SinkCapability) -> bool;

    /// Writes `data` through `capability` in a single attempt.
    fn send(&self, capability: SinkCapability, data: &str) -> Result<(), SinkError>;
}

/// Finds the terminal that should receive commands for the current UI focus.
///
/// When focus is on a split container, implementations should return the
/// focused capturable pane, falling back to the first capturable pane.
pub trait ActiveTerminalResolver: Send + Sync {
    fn resolve(&self) -> Option<Arc<dyn TerminalSink>>;
}
