//! Issues and summary produced by a synchronization run.

use std::{fmt::Display, path::PathBuf};

use serde::{Deserialize, Serialize};

/// A UQI definition found in a scanned resource file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UqiEntry {
    pub identifier: String,
    pub code: u16,
    pub path: PathBuf,
}

/// Whether an issue fails the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Issue type captured during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DuplicateIdentifier,
    DuplicateCode,
    MissingDefinition,
    ConflictingReference,
    MissingCode,
    FileReadFailure,
    FileWriteFailure,
    CodeSpaceExhausted,
}

/// One problem found during a run, with the files involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    /// Identifier, code, or token the issue is about.
    pub subject: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub paths: Vec<PathBuf>,
    pub message: String,
}

impl Issue {
    pub fn new(
        kind: IssueKind,
        severity: Severity,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            subject: subject.into(),
            paths: Vec::new(),
            message: message.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if !self.paths.is_empty() {
            let paths: Vec<String> = self
                .paths
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            write!(f, " ({})", paths.join(", "))?;
        }
        Ok(())
    }
}

/// A language variant block removed from a resource file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRemoval {
    pub path: PathBuf,
    pub language: String,
}

/// Outcome of a synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Resolved UQI list file.
    pub target: PathBuf,
    pub resource_files: usize,
    pub form_files: usize,
    /// UQI definitions known after scanning, before allocation.
    pub existing_entries: usize,
    pub referenced_tokens: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub allocated: Vec<UqiEntry>,
    pub relocated_definitions: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub removed_languages: Vec<LanguageRemoval>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub rewritten: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub issues: Vec<Issue>,
}

impl SyncReport {
    /// True when no issue of [`Severity::Error`] was recorded.
    pub fn is_success(&self) -> bool {
        !self.issues.iter().any(Issue::is_fatal)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display_includes_severity_and_paths() {
        let issue = Issue::new(
            IssueKind::DuplicateCode,
            Severity::Error,
            "0001",
            "UQI value 0001 was assigned more than once",
        )
        .with_path("a.uni")
        .with_path("b.uni");
        assert_eq!(
            issue.to_string(),
            "ERROR: UQI value 0001 was assigned more than once (a.uni, b.uni)"
        );
    }

    #[test]
    fn test_report_success_ignores_warnings() {
        let mut report = SyncReport::default();
        assert!(report.is_success());

        report.issues.push(Issue::new(
            IssueKind::ConflictingReference,
            Severity::Warning,
            "STR_A",
            "STR_A referred by different HII questions",
        ));
        assert!(report.is_success());
        assert_eq!(report.warnings().count(), 1);

        report.issues.push(Issue::new(
            IssueKind::MissingCode,
            Severity::Error,
            "STR_B",
            "No UQI for STR_B",
        ));
        assert!(!report.is_success());
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.issues_of(IssueKind::MissingCode).count(), 1);
    }

    #[test]
    fn test_issue_without_paths() {
        let issue = Issue::new(
            IssueKind::MissingDefinition,
            Severity::Warning,
            "STR_MODE",
            "No definition for STR_MODE referred by HII question",
        );
        assert!(!issue.is_fatal());
        assert_eq!(
            issue.to_string(),
            "WARNING: No definition for STR_MODE referred by HII question"
        );
    }
}
