//! Test-first audit of a plan: every code file the plan touches needs a test.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

/// Extensions treated as code; other references (docs, configs) are skipped.
pub const CODE_EXTENSIONS: [&str; 6] = ["py", "js", "ts", "go", "java", "rs"];

static CHANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(NEW|MODIFY)\]\s+(\S+)").expect("valid change regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    New,
    Modify,
}

/// One `[NEW] path` or `[MODIFY] path` reference in a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    pub kind: ChangeKind,
    pub path: String,
}

impl fmt::Display for PlannedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            ChangeKind::New => "NEW",
            ChangeKind::Modify => "MODIFY",
        };
        write!(f, "[{tag}] {}", self.path)
    }
}

/// Extract file references from plan text, in document order.
pub fn parse_plan(contents: &str) -> Vec<PlannedChange> {
    CHANGE_RE
        .captures_iter(contents)
        .map(|caps| PlannedChange {
            kind: if &caps[1] == "NEW" {
                ChangeKind::New
            } else {
                ChangeKind::Modify
            },
            path: caps[2].to_string(),
        })
        .collect()
}

pub fn is_code_file(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CODE_EXTENSIONS.contains(&ext))
}

/// A file whose name mentions `test` or `spec` counts as its own test.
pub fn is_test_file(path: &str) -> bool {
    let name = file_name(path).to_lowercase();
    name.contains("test") || name.contains("spec")
}

/// First file under `root` whose name looks like a test for `stem`.
pub fn find_test(root: &Path, stem: &str) -> Option<PathBuf> {
    let candidates = [
        format!("test_{stem}"),
        format!("{stem}_test"),
        format!("{stem}.test"),
    ];
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .find(|e| {
            let name = e.file_name().to_string_lossy();
            candidates.iter().any(|c| name.contains(c.as_str()))
        })
        .map(|e| e.path().to_path_buf())
}

/// Result of auditing a plan against the files under a root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// References found in the plan.
    pub referenced: usize,
    /// Code files that were checked (not tests themselves).
    pub checked: usize,
    /// Checked paths with no matching test file, in plan order.
    pub missing: Vec<String>,
}

impl AuditReport {
    pub fn passed(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn audit(root: &Path, changes: &[PlannedChange]) -> AuditReport {
    let mut report = AuditReport {
        referenced: changes.len(),
        ..AuditReport::default()
    };
    for change in changes {
        if !is_code_file(&change.path) || is_test_file(&change.path) {
            continue;
        }
        report.checked += 1;
        let stem = file_stem(&change.path);
        match find_test(root, &stem) {
            Some(test) => debug!(change = %change, test = %test.display(), "test found"),
            None => report.missing.push(change.path.clone()),
        }
    }
    report
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
