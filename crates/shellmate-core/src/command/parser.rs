//! Extraction of command candidates from assistant replies.

use super::model::{CommandCandidate, SafetyTier};
use super::safety::{RuleTable, SafetyClassifier};
use crate::config::SafetyConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

/// Languages whose fenced blocks are scanned for commands.
pub const DEFAULT_SHELL_LANGUAGES: &[&str] = &["bash", "sh", "shell", "cmd", "powershell", "zsh"];

/// Language assumed for a fence without a tag.
pub const DEFAULT_LANGUAGE: &str = "bash";

/// A triple-backtick fence with an optional language tag. The body is matched
/// lazily, so the first closing marker ends the region and a fence without a
/// closing marker never matches.
static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```([A-Za-z0-9_+#.\-]+)?[ \t]*\r?\n?(.*?)```")
        .expect("fence pattern must be a valid regex")
});

/// A leading `[TIER]` tag followed by the command.
static TIER_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\w+)\]\s*(.+)$").expect("tier tag pattern must be a valid regex"));

/// Turns free text into an ordered list of [`CommandCandidate`]s.
///
/// Parsing never fails; malformed input yields fewer (or zero) candidates.
#[derive(Debug, Clone)]
pub struct CommandParser {
    languages: Vec<String>,
    classifier: SafetyClassifier,
}

impl CommandParser {
    /// Creates a parser using `classifier` for untagged lines and the default
    /// shell language allow-list.
    pub fn new(classifier: SafetyClassifier) -> Self {
        Self {
            languages: DEFAULT_SHELL_LANGUAGES
                .iter()
                .map(|lang| lang.to_string())
                .collect(),
            classifier,
        }
    }

    /// Builds a parser from the `[safety]` configuration section.
    pub fn from_config(config: &SafetyConfig) -> Self {
        let table = RuleTable::builtin_with_null_device_tier(config.null_device_redirect_tier);
        Self::new(SafetyClassifier::new(table)).with_languages(config.shell_languages.iter().cloned())
    }

    /// Replaces the language allow-list. Entries are compared case-insensitively.
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages
            .into_iter()
            .map(|lang| lang.into().to_lowercase())
            .collect();
        self
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn classifier(&self) -> &SafetyClassifier {
        &self.classifier
    }

    /// Extracts every command candidate from `text`, in order of appearance.
    pub fn parse(&self, text: &str) -> Vec<CommandCandidate> {
        let mut candidates = Vec::new();

        for captures in FENCE_RE.captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let language = captures
                .get(1)
                .map(|m| m.as_str().to_lowercase())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

            if !self.is_shell_language(&language) {
                tracing::debug!("[CommandParser] Skipping '{}' block", language);
                continue;
            }

            let body = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
            for line in body.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                    continue;
                }
                candidates.push(self.parse_line(line, whole.as_str(), &language));
            }
        }

        tracing::debug!("[CommandParser] Found {} command(s)", candidates.len());
        candidates
    }

    fn is_shell_language(&self, language: &str) -> bool {
        self.languages.iter().any(|allowed| allowed == language)
    }

    fn parse_line(&self, line: &str, block: &str, language: &str) -> CommandCandidate {
        let mut classified = line;
        if let Some(captures) = TIER_TAG_RE.captures(line) {
            if let Ok(tier) = SafetyTier::from_str(&captures[1]) {
                return CommandCandidate {
                    safety: tier,
                    command: captures[2].trim().to_string(),
                    source_block: block.to_string(),
                    language: language.to_string(),
                    tagged: true,
                };
            }
            // Unknown tags stay in the command but must not hide it from the rules.
            if let Some(rest) = captures.get(2) {
                classified = rest.as_str();
            }
        }

        CommandCandidate {
            safety: self.classifier.classify(classified),
            command: line.to_string(),
            source_block: block.to_string(),
            language: language.to_string(),
            tagged: false,
        }
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(SafetyClassifier::default())
    }
}

/// Parses `text` with the default parser.
pub fn parse(text: &str) -> Vec<CommandCandidate> {
    static DEFAULT_PARSER: Lazy<CommandParser> = Lazy::new(CommandParser::default);
    DEFAULT_PARSER.parse(text)
}
