//! Ecosystem rule table: marker file → install and test commands.
//!
//! Detection is expressed over an `exists` predicate so the table can be
//! evaluated without touching the filesystem. The first matching rule wins;
//! a directory is never classified as more than one ecosystem.

use std::fmt;

/// Build ecosystem of a workspace, decided by marker-file presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectEcosystem {
    Node,
    Rust,
    PythonRequirements,
    PythonPoetry,
    Go,
    Unknown,
}

impl ProjectEcosystem {
    /// Human-readable label used in progress output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Node => "Node.js",
            Self::Rust => "Rust",
            Self::PythonRequirements => "Python (requirements)",
            Self::PythonPoetry => "Python (poetry)",
            Self::Go => "Go",
            Self::Unknown => "unknown",
        }
    }

    /// The table row for this ecosystem (`None` for `Unknown`).
    pub fn rule(self) -> Option<&'static EcosystemRule> {
        ECOSYSTEM_RULES.iter().find(|rule| rule.ecosystem == self)
    }

    /// Install argv, if any.
    pub fn install_command(self) -> Option<&'static [&'static str]> {
        self.rule().map(|rule| rule.install)
    }

    /// Test argv from the table, if any. Does not apply the pytest heuristic.
    pub fn test_command(self) -> Option<&'static [&'static str]> {
        self.rule().and_then(|rule| rule.test)
    }
}

impl fmt::Display for ProjectEcosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the detection table.
#[derive(Debug)]
pub struct EcosystemRule {
    pub ecosystem: ProjectEcosystem,
    /// File whose presence (relative to the workspace root) selects this row.
    pub marker: &'static str,
    pub install: &'static [&'static str],
    pub test: Option<&'static [&'static str]>,
}

/// Detection table in priority order.
pub static ECOSYSTEM_RULES: [EcosystemRule; 5] = [
    EcosystemRule {
        ecosystem: ProjectEcosystem::Node,
        marker: "package.json",
        install: &["npm", "install"],
        test: Some(&["npm", "test"]),
    },
    EcosystemRule {
        ecosystem: ProjectEcosystem::Rust,
        marker: "Cargo.toml",
        install: &["cargo", "build"],
        test: Some(&["cargo", "test"]),
    },
    EcosystemRule {
        ecosystem: ProjectEcosystem::PythonRequirements,
        marker: "requirements.txt",
        install: &["pip", "install", "-r", "requirements.txt"],
        test: None,
    },
    EcosystemRule {
        ecosystem: ProjectEcosystem::PythonPoetry,
        marker: "pyproject.toml",
        install: &["poetry", "install"],
        test: None,
    },
    EcosystemRule {
        ecosystem: ProjectEcosystem::Go,
        marker: "go.mod",
        install: &["go", "mod", "download"],
        test: None,
    },
];

/// Test-configuration markers that imply `pytest` when no table test command applies.
pub const PYTEST_MARKERS: [&str; 2] = ["pytest.ini", "conftest.py"];

/// Argv used when a pytest marker is present.
pub const PYTEST_COMMAND: &[&str] = &["pytest"];

/// Classify a workspace from marker presence.
pub fn classify(exists: impl Fn(&str) -> bool) -> ProjectEcosystem {
    ECOSYSTEM_RULES
        .iter()
        .find(|rule| exists(rule.marker))
        .map_or(ProjectEcosystem::Unknown, |rule| rule.ecosystem)
}

/// Pick the baseline test argv for `ecosystem`.
///
/// The table entry wins; otherwise the pytest markers are checked
/// (verification-only heuristic, never used for installs).
pub fn resolve_test_command(
    ecosystem: ProjectEcosystem,
    exists: impl Fn(&str) -> bool,
) -> Option<&'static [&'static str]> {
    if let Some(cmd) = ecosystem.test_command() {
        return Some(cmd);
    }
    if PYTEST_MARKERS.iter().any(|marker| exists(marker)) {
        return Some(PYTEST_COMMAND);
    }
    None
}
