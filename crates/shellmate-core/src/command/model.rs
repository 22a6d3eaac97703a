//! Command candidate domain models.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Risk tier of a candidate shell command.
///
/// Ordered from least to most risky, so `max` picks the stricter tier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SafetyTier {
    /// Read-only or otherwise harmless
    #[serde(alias = "safe")]
    Safe,
    /// Changes configuration, installs software, overwrites files
    #[serde(alias = "caution")]
    Caution,
    /// Destroys data or takes the system down
    #[serde(alias = "danger")]
    Danger,
}

impl SafetyTier {
    /// Whether execution must be confirmed by the user first.
    pub fn requires_confirmation(&self) -> bool {
        !matches!(self, Self::Safe)
    }

    /// Human-readable label for badges.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe => "Safe command",
            Self::Caution => "Use caution",
            Self::Danger => "Dangerous command",
        }
    }

    /// Badge color as a hex string.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Safe => "#28a745",
            Self::Caution => "#ffc107",
            Self::Danger => "#dc3545",
        }
    }
}

/// A shell command extracted from one assistant reply.
///
/// Candidates are created fresh on every parse and never mutated; a chat
/// layer may cache them next to the message they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandCandidate {
    /// Risk tier, from an explicit `[TIER]` tag or the classifier
    pub safety: SafetyTier,
    /// The command line, with any tier tag stripped
    pub command: String,
    /// The whole fenced region the command came from
    pub source_block: String,
    /// Language tag of the fenced region (`bash` when absent)
    pub language: String,
    /// True when the tier came from an explicit tag in the reply
    #[serde(default)]
    pub tagged: bool,
}
