//! User-facing collaborators: confirmation dialogs and notifications.

use crate::command::SafetyTier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Content of a confirmation dialog shown before a risky command runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    pub tier: SafetyTier,
    pub command: String,
    pub title: String,
    pub message: String,
}

impl ConfirmationRequest {
    /// Builds the dialog for `command`, or `None` when `tier` needs no confirmation.
    pub fn for_command(command: &str, tier: SafetyTier) -> Option<Self> {
        let (title, message) = match tier {
            SafetyTier::Safe => return None,
            SafetyTier::Caution => (
                "Confirm command",
                format!(
                    "This command changes your system. Please review it.\n\nCommand: {}\n\nRun it?",
                    command
                ),
            ),
            SafetyTier::Danger => (
                "Dangerous command",
                format!(
                    "This is a dangerous command!\n\nCommand: {}\n\nIt may cause data loss or damage the system. Run it anyway?",
                    command
                ),
            ),
        };

        Some(Self {
            tier,
            command: command.to_string(),
            title: title.to_string(),
            message,
        })
    }
}

/// Asks the user to approve a command.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// Returns `true` only on explicit approval.
    async fn confirm(&self, request: &ConfirmationRequest) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Shows short toast-style notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotificationLevel, message: &str);

    fn info(&self, message: &str) {
        self.notify(NotificationLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.notify(NotificationLevel::Error, message);
    }
}
