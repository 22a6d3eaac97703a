//! Pattern-based risk classification of shell commands.
//!
//! The rules live in a versioned table instead of inline logic so they can be
//! listed, explained, and tested one by one. Classification is a heuristic
//! feeding the confirmation policy; it is not a security boundary.

use super::model::SafetyTier;
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;

/// Version of the built-in rule table. Bump on any rule change.
pub const RULE_TABLE_VERSION: Version = Version::new(1, 1, 1);

/// Id of the rule matching a redirect into `/dev/null` or `/dev/zero`.
pub const NULL_DEVICE_RULE_ID: &str = "null-device-redirect";

/// Static description of one rule, before its pattern is compiled.
struct RuleSpec {
    id: &'static str,
    pattern: &'static str,
    description: &'static str,
}

/// Checked first. Patterns run against the trimmed, lowercased command, so
/// flags like `-R` appear as `-r`.
const DANGER_RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "rm-force-recursive",
        pattern: r"^rm\s+(.*\s)?(-[a-z]*[rf][a-z]*|--recursive|--force)\b",
        description: "recursive or forced file deletion",
    },
    RuleSpec {
        id: "sudo-rm",
        pattern: r"^sudo\s+rm\s",
        description: "privileged file deletion",
    },
    RuleSpec {
        id: "rmdir",
        pattern: r"^rmdir\s+",
        description: "directory removal",
    },
    RuleSpec {
        id: "del",
        pattern: r"^del\s+",
        description: "file deletion (Windows)",
    },
    RuleSpec {
        id: "format",
        pattern: r"^format\s+",
        description: "disk formatting",
    },
    RuleSpec {
        id: "fdisk",
        pattern: r"^fdisk\s+",
        description: "partition table editing",
    },
    RuleSpec {
        id: "dd",
        pattern: r"^dd\s+",
        description: "raw block copy",
    },
    RuleSpec {
        id: "mkfs",
        pattern: r"^mkfs(\.[a-z0-9]+)?\s+",
        description: "filesystem creation",
    },
    RuleSpec {
        id: "block-device-redirect",
        pattern: r">\s*/dev/(sd[a-z]|hd[a-z]|vd[a-z]|nvme\d|mmcblk\d|disk\d)",
        description: "output redirected onto a block device",
    },
    RuleSpec {
        id: "fork-bomb",
        pattern: r"^\s*:\(\s*\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
        description: "fork bomb",
    },
    RuleSpec {
        id: "privileged-power",
        pattern: r"^sudo\s+(halt|reboot|shutdown|poweroff)\b",
        description: "privileged halt, reboot or shutdown",
    },
    RuleSpec {
        id: "chmod-777",
        pattern: r"^chmod\s+(-[a-z]+\s+)*777\b",
        description: "world-writable permissions",
    },
    RuleSpec {
        id: "chown-recursive",
        pattern: r"^chown\s+(-[a-z]*r|--recursive)",
        description: "recursive ownership change",
    },
    RuleSpec {
        id: "force-flag",
        pattern: r"--force",
        description: "generic --force flag",
    },
    RuleSpec {
        id: "recursive-delete",
        pattern: r"--recursive.*delete",
        description: "recursive delete flag combination",
    },
];

/// Checked only when no danger rule matched.
const CAUTION_RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "package-install",
        pattern: r"^(npm|pip|pip3|apt|apt-get|yum|brew)\s+install\b",
        description: "package installation",
    },
    RuleSpec {
        id: "sudo",
        pattern: r"^sudo\s+",
        description: "privileged execution",
    },
    RuleSpec {
        id: "chmod",
        pattern: r"^chmod\s+",
        description: "permission change",
    },
    RuleSpec {
        id: "chown",
        pattern: r"^chown\s+",
        description: "ownership change",
    },
    RuleSpec {
        id: "git-reset-hard",
        pattern: r"^git\s+reset\s+--hard",
        description: "hard git reset discards local changes",
    },
    RuleSpec {
        id: "git-clean",
        pattern: r"^git\s+clean\s+-[a-z]*f",
        description: "git clean removes untracked files",
    },
    RuleSpec {
        id: "overwrite-redirect",
        pattern: r"(^|[^>])>([^>&]|$)",
        description: "output redirection overwrites a file",
    },
    RuleSpec {
        id: "mv-to-root",
        pattern: r"^mv\s+.*\s+/\w+",
        description: "move into an absolute path",
    },
    RuleSpec {
        id: "recursive-copy",
        pattern: r"^cp\s+-[a-z]*r",
        description: "recursive copy",
    },
    RuleSpec {
        id: "pipe-to-shell",
        pattern: r"^(curl|wget)\s+.*\|\s*(sudo\s+)?(ba|z)?sh\b",
        description: "remote script piped into a shell",
    },
    RuleSpec {
        id: "systemctl",
        pattern: r"\bsystemctl\b",
        description: "service manager control",
    },
    RuleSpec {
        id: "service",
        pattern: r"^service\s+",
        description: "service control",
    },
];

/// Matches harmless output suppression as well as destructive sinks. Its tier
/// is configurable; see [`RuleTable::builtin_with_null_device_tier`].
const NULL_DEVICE_RULE: RuleSpec = RuleSpec {
    id: NULL_DEVICE_RULE_ID,
    pattern: r">\s*/dev/(null|zero)\b",
    description: "output redirected into /dev/null or /dev/zero",
};

/// Default tier of [`NULL_DEVICE_RULE_ID`].
pub const DEFAULT_NULL_DEVICE_TIER: SafetyTier = SafetyTier::Caution;

/// One compiled classification rule.
#[derive(Debug, Clone)]
pub struct SafetyRule {
    /// Stable rule identifier, e.g. `rm-force-recursive`
    pub id: &'static str,
    /// Tier assigned when the rule matches
    pub tier: SafetyTier,
    /// Human-readable reason, shown in tooltips
    pub description: &'static str,
    pattern: Regex,
}

impl SafetyRule {
    /// Returns true if the rule matches an already-normalized command.
    pub fn matches(&self, normalized: &str) -> bool {
        self.pattern.is_match(normalized)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

fn compile(spec: &RuleSpec, tier: SafetyTier) -> SafetyRule {
    SafetyRule {
        id: spec.id,
        tier,
        description: spec.description,
        // The patterns are compile-time constants covered by the tests below.
        pattern: Regex::new(spec.pattern).expect("built-in safety rule must be a valid regex"),
    }
}

static BUILTIN_DANGER: Lazy<Vec<SafetyRule>> = Lazy::new(|| {
    DANGER_RULES
        .iter()
        .map(|spec| compile(spec, SafetyTier::Danger))
        .collect()
});

static BUILTIN_CAUTION: Lazy<Vec<SafetyRule>> = Lazy::new(|| {
    CAUTION_RULES
        .iter()
        .map(|spec| compile(spec, SafetyTier::Caution))
        .collect()
});

static DEFAULT_CLASSIFIER: Lazy<SafetyClassifier> =
    Lazy::new(|| SafetyClassifier::new(RuleTable::builtin()));

/// Versioned, ordered danger and caution rule lists.
#[derive(Debug, Clone)]
pub struct RuleTable {
    version: Version,
    danger: Vec<SafetyRule>,
    caution: Vec<SafetyRule>,
}

impl RuleTable {
    /// The built-in table with the null-device rule at its default tier.
    pub fn builtin() -> Self {
        Self::builtin_with_null_device_tier(DEFAULT_NULL_DEVICE_TIER)
    }

    /// The built-in table with the null-device rule placed at `tier`.
    ///
    /// `Danger` puts it at the end of the danger list, `Caution` at the head of
    /// the caution list, and `Safe` leaves it out entirely.
    pub fn builtin_with_null_device_tier(tier: SafetyTier) -> Self {
        let mut danger = BUILTIN_DANGER.clone();
        let mut caution = BUILTIN_CAUTION.clone();

        match tier {
            SafetyTier::Danger => danger.push(compile(&NULL_DEVICE_RULE, SafetyTier::Danger)),
            SafetyTier::Caution => {
                caution.insert(0, compile(&NULL_DEVICE_RULE, SafetyTier::Caution))
            }
            SafetyTier::Safe => {}
        }

        Self {
            version: RULE_TABLE_VERSION,
            danger,
            caution,
        }
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// All rules in evaluation order: danger first, then caution.
    pub fn rules(&self) -> impl Iterator<Item = &SafetyRule> {
        self.danger.iter().chain(self.caution.iter())
    }

    pub fn rule(&self, id: &str) -> Option<&SafetyRule> {
        self.rules().find(|rule| rule.id == id)
    }

    /// First matching rule, danger list before caution list.
    fn first_match(&self, normalized: &str) -> Option<&SafetyRule> {
        self.danger
            .iter()
            .find(|rule| rule.matches(normalized))
            .or_else(|| self.caution.iter().find(|rule| rule.matches(normalized)))
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Maps command strings to a [`SafetyTier`] using a [`RuleTable`].
#[derive(Debug, Clone, Default)]
pub struct SafetyClassifier {
    table: RuleTable,
}

impl SafetyClassifier {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Classifies `command`. Falls back to `Safe` when no rule matches.
    pub fn classify(&self, command: &str) -> SafetyTier {
        match self.explain(command) {
            Some(rule) => {
                tracing::debug!(
                    "[SafetyClassifier] '{}' matched rule {} ({})",
                    command,
                    rule.id,
                    rule.tier
                );
                rule.tier
            }
            None => SafetyTier::Safe,
        }
    }

    /// Returns the rule that decides the tier of `command`, if any.
    pub fn explain(&self, command: &str) -> Option<&SafetyRule> {
        self.table.first_match(&normalize(command))
    }
}

/// Classifies `command` with the built-in rule table.
pub fn classify(command: &str) -> SafetyTier {
    DEFAULT_CLASSIFIER.classify(command)
}

fn normalize(command: &str) -> String {
    command.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_patterns_compile() {
        let table = RuleTable::builtin();
        assert_eq!(
            table.rules().count(),
            DANGER_RULES.len() + CAUTION_RULES.len() + 1
        );
        assert_eq!(table.version(), &RULE_TABLE_VERSION);
    }

    #[test]
    fn test_rule_ids_are_unique() {
        let table = RuleTable::builtin();
        let mut ids: Vec<_> = table.rules().map(|r| r.id).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_reference_commands() {
        assert_eq!(classify("rm -rf /tmp/x"), SafetyTier::Danger);
        assert_eq!(classify("npm install left-pad"), SafetyTier::Caution);
        assert_eq!(classify("ls -la"), SafetyTier::Safe);
    }

    #[test]
    fn test_danger_commands() {
        let cases = [
            "rm -r build",
            "rm -f Cargo.lock",
            "rm -v -rf /",
            "rm -i -r ~",
            "rm --recursive /",
            "rm notes.txt --force",
            "  RM -RF ~/  ",
            "sudo rm /etc/hosts",
            "rmdir old",
            "del C:\\temp\\file.txt",
            "format C:",
            "fdisk /dev/sda",
            "dd if=/dev/zero of=/dev/sda bs=1M",
            "mkfs.ext4 /dev/sdb1",
            "cat image.iso > /dev/sdb",
            ":(){ :|:& };:",
            "sudo reboot",
            "sudo shutdown -h now",
            "chmod 777 /var/www",
            "chmod -R 777 /var/www",
            "chown -R nobody /srv",
            "git push --force origin main",
            "aws s3 rm --recursive s3://bucket --delete",
        ];

        for cmd in cases {
            assert_eq!(classify(cmd), SafetyTier::Danger, "expected DANGER for {cmd:?}");
        }
    }

    #[test]
    fn test_caution_commands() {
        let cases = [
            "pip install requests",
            "apt install htop",
            "brew install jq",
            "sudo apt update",
            "chmod +x script.sh",
            "chown user file.txt",
            "git reset --hard HEAD~1",
            "git clean -fd",
            "echo hello > notes.txt",
            "mv build /opt",
            "cp -r src backup",
            "curl -fsSL https://example.com/install.sh | bash",
            "wget -qO- https://example.com/x.sh | sh",
            "systemctl restart nginx",
            "service nginx reload",
        ];

        for cmd in cases {
            assert_eq!(classify(cmd), SafetyTier::Caution, "expected CAUTION for {cmd:?}");
        }
    }

    #[test]
    fn test_safe_commands() {
        let cases = [
            "ls -la",
            "pwd",
            "git status",
            "cat README.md",
            "grep -rn TODO src",
            "echo hello >> notes.txt",
            "cargo build 2>&1",
            "docker ps",
            "rm notes.txt",
            "rm my-fresh-build.log",
        ];

        for cmd in cases {
            assert_eq!(classify(cmd), SafetyTier::Safe, "expected SAFE for {cmd:?}");
        }
    }

    #[test]
    fn test_danger_takes_precedence_over_caution() {
        // matches both `sudo` (caution) and `privileged-power` (danger)
        let classifier = SafetyClassifier::default();
        let rule = classifier.explain("sudo halt").unwrap();
        assert_eq!(rule.id, "privileged-power");
        assert_eq!(rule.tier, SafetyTier::Danger);
    }

    #[test]
    fn test_null_device_redirect_defaults_to_caution() {
        let classifier = SafetyClassifier::default();
        assert_eq!(classifier.classify("make 2> /dev/null"), SafetyTier::Caution);
        assert_eq!(
            classifier.explain("find / -name x 2>/dev/null").unwrap().id,
            NULL_DEVICE_RULE_ID
        );
    }

    #[test]
    fn test_null_device_tier_is_configurable() {
        let strict = SafetyClassifier::new(RuleTable::builtin_with_null_device_tier(
            SafetyTier::Danger,
        ));
        assert_eq!(strict.classify("ls > /dev/null"), SafetyTier::Danger);

        let lenient =
            SafetyClassifier::new(RuleTable::builtin_with_null_device_tier(SafetyTier::Safe));
        assert!(lenient.table().rule(NULL_DEVICE_RULE_ID).is_none());
        // still an overwrite redirect
        assert_eq!(lenient.classify("ls > /dev/null"), SafetyTier::Caution);
        assert_eq!(lenient.classify("ls 2>/dev/null"), SafetyTier::Caution);
    }

    #[test]
    fn test_classification_ignores_case_and_padding() {
        assert_eq!(classify("   NPM INSTALL   "), SafetyTier::Caution);
        assert_eq!(classify("\tSudo Reboot\n"), SafetyTier::Danger);
    }

    #[test]
    fn test_every_rule_is_reachable() {
        // Each rule must decide the tier of at least one sample, so no entry
        // is shadowed by an earlier one.
        let samples = [
            ("rm-force-recursive", "rm -rf x"),
            ("sudo-rm", "sudo rm x"),
            ("rmdir", "rmdir x"),
            ("del", "del x"),
            ("format", "format d:"),
            ("fdisk", "fdisk -l"),
            ("dd", "dd if=a of=b"),
            ("mkfs", "mkfs /dev/x"),
            ("block-device-redirect", "echo x > /dev/sda"),
            ("fork-bomb", ":(){ :|:& };:"),
            ("privileged-power", "sudo poweroff"),
            ("chmod-777", "chmod 777 x"),
            ("chown-recursive", "chown --recursive u x"),
            ("force-flag", "npm publish --force"),
            ("recursive-delete", "rsync --recursive --delete a b"),
            (NULL_DEVICE_RULE_ID, "ls > /dev/null"),
            ("package-install", "yum install git"),
            ("sudo", "sudo ls"),
            ("chmod", "chmod 644 x"),
            ("chown", "chown u x"),
            ("git-reset-hard", "git reset --hard"),
            ("git-clean", "git clean -f"),
            ("overwrite-redirect", "date > now.txt"),
            ("mv-to-root", "mv a /b"),
            ("recursive-copy", "cp -r a b"),
            ("pipe-to-shell", "curl x | bash"),
            ("systemctl", "systemctl status"),
            ("service", "service ssh restart"),
        ];

        let classifier = SafetyClassifier::default();
        for (id, sample) in samples {
            let rule = classifier
                .explain(sample)
                .unwrap_or_else(|| panic!("no rule matched {sample:?}"));
            assert_eq!(rule.id, id, "sample {sample:?}");
        }
        assert_eq!(samples.len(), classifier.table().rules().count());
    }
}
