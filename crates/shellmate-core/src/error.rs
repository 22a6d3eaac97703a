//! Error types for Shellmate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Shellmate workspace.
///
/// Variants are typed and serializable so they can be handed to a frontend
/// over IPC unchanged. A user declining a confirmation is deliberately absent:
/// that is a normal outcome, not a failure.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShellmateError {
    /// No terminal could be resolved from the current UI focus.
    #[error("No active terminal found")]
    NoActiveTerminal,

    /// Every write capability of the resolved terminal was absent or failed.
    #[error("Failed to send command to terminal: {reason}")]
    SendFailed { reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Query template could not be compiled or rendered
    #[error("Template error: {0}")]
    Template(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShellmateError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a SendFailed error
    pub fn send_failed(reason: impl Into<String>) -> Self {
        Self::SendFailed {
            reason: reason.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NoActiveTerminal error
    pub fn is_no_active_terminal(&self) -> bool {
        matches!(self, Self::NoActiveTerminal)
    }

    /// Check if this is a SendFailed error
    pub fn is_send_failed(&self) -> bool {
        matches!(self, Self::SendFailed { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Short, user-facing text for a single notification.
    ///
    /// Dispatch failures get their own wording; everything else falls back to
    /// the `Display` output.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoActiveTerminal => "No active terminal found".to_string(),
            Self::SendFailed { .. } => {
                "Unable to send the command to the terminal".to_string()
            }
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ShellmateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ShellmateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ShellmateError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ShellmateError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (for host adapters that use anyhow)
impl From<anyhow::Error> for ShellmateError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Conversion from String (for error messages)
impl From<String> for ShellmateError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, ShellmateError>`.
pub type Result<T> = std::result::Result<T, ShellmateError>;
