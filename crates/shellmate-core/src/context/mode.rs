//! Aggregation mode types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Policy deciding which sessions' selections are exposed as context.
///
/// There is one process-wide value; it only changes through an explicit call
/// and never expires.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AggregationMode {
    /// Only the selection of the focused session.
    #[default]
    Current,
    /// One entry per session with a selection.
    Multiple,
    /// No context at all.
    None,
}

impl AggregationMode {
    /// Whether the current record follows the focused session in this mode.
    pub fn follows_focus(&self) -> bool {
        matches!(self, Self::Current)
    }
}
