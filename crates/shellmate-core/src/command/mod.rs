//! Command extraction and safety classification.
//!
//! Assistant replies are scanned for fenced shell blocks; every command line
//! becomes a [`CommandCandidate`] whose [`SafetyTier`] comes from an explicit
//! `[TIER]` tag or from the [`SafetyClassifier`] rule table.

pub mod model;
pub mod parser;
pub mod safety;

pub use model::{CommandCandidate, SafetyTier};
pub use parser::{CommandParser, DEFAULT_LANGUAGE, DEFAULT_SHELL_LANGUAGES, parse};
pub use safety::{
    DEFAULT_NULL_DEVICE_TIER, NULL_DEVICE_RULE_ID, RULE_TABLE_VERSION, RuleTable, SafetyClassifier,
    SafetyRule, classify,
};
