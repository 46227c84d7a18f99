//! Critique verdicts produced by review capabilities.

use serde::{Deserialize, Serialize};

/// How serious a critique issue is.
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
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    /// Cosmetic
    Minor,
    /// Noticeable but tolerable
    Moderate,
    /// Should be fixed
    Major,
    /// Breaks the output
    Critical,
}

/// One defect reported by a critique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CritiqueIssue {
    /// Severity of the defect
    pub severity: Severity,
    /// What is wrong, phrased as an instruction-ready description
    pub description: String,
}

impl CritiqueIssue {
    /// Create an issue.
    pub fn new(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            severity,
            description: description.into(),
        }
    }
}

/// Result of reviewing a step output.
///
/// # Examples
///
/// ```
/// use timepoint_core::{CritiqueIssue, CritiqueVerdict, Severity};
///
/// let verdict = CritiqueVerdict::from_issues(vec![
///     CritiqueIssue::new(Severity::Minor, "comma splice in line 3"),
/// ]);
/// assert!(!verdict.must_retry);
///
/// let verdict = CritiqueVerdict::from_issues(vec![
///     CritiqueIssue::new(Severity::Major, "anachronistic slang"),
/// ]);
/// assert!(verdict.must_retry);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CritiqueVerdict {
    /// Reported defects
    #[serde(default)]
    pub issues: Vec<CritiqueIssue>,
    /// Whether the reviewed step must run again
    #[serde(default)]
    pub must_retry: bool,
}

impl CritiqueVerdict {
    /// A verdict with explicit retry decision.
    pub fn new(issues: Vec<CritiqueIssue>, must_retry: bool) -> Self {
        Self { issues, must_retry }
    }

    /// A verdict with no issues.
    pub fn clean() -> Self {
        Self::default()
    }

    /// A verdict that requires a retry when any issue is `Major` or worse.
    pub fn from_issues(issues: Vec<CritiqueIssue>) -> Self {
        let must_retry = issues
            .iter()
            .any(|issue| issue.severity >= Severity::Major);
        Self { issues, must_retry }
    }
}
