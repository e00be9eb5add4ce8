//! Root-cause synthesis.
//!
//! Picks the primary cause from the collected issues by severity, in
//! discovery order, and attaches the checklist for its category.

use tracing::info;

use crate::catalog::next_steps_for;
use crate::types::{Category, DiagnosticResult, Issue, Severity};

/// Pod status reported when no status table was parsed.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Root cause when only medium and low issues were found.
pub const MINOR_ISSUES_ROOT_CAUSE: &str = "Multiple minor issues detected";

/// Root cause when nothing was found.
pub const HEALTHY_ROOT_CAUSE: &str = "No critical issues detected";

/// Synthesizes a diagnosis from issues in discovery order.
///
/// 1. the first critical issue is the root cause, with its category checklist
/// 2. otherwise the first high issue, without a checklist
/// 3. otherwise any issues are summarised as minor
/// 4. otherwise the pod is presumed healthy
#[must_use]
pub fn synthesize(issues: Vec<Issue>, pod_status: Option<String>) -> DiagnosticResult {
    let logs_needed = issues
        .iter()
        .any(|i| matches!(i.category, Category::Stability | Category::Application));

    let (root_cause, recommendation, next_steps): (String, String, Vec<String>) =
        if let Some(issue) = first_with(&issues, Severity::Critical) {
            (
                issue.message.clone(),
                issue.suggestion.clone(),
                next_steps_for(issue.category)
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect(),
            )
        } else if let Some(issue) = first_with(&issues, Severity::High) {
            (issue.message.clone(), issue.suggestion.clone(), Vec::new())
        } else if issues.is_empty() {
            (
                HEALTHY_ROOT_CAUSE.to_string(),
                "The pod appears healthy; no action is required".to_string(),
                Vec::new(),
            )
        } else {
            (
                MINOR_ISSUES_ROOT_CAUSE.to_string(),
                "Review the warnings below; none is blocking on its own".to_string(),
                Vec::new(),
            )
        };

    info!(
        issues = issues.len(),
        critical = issues.iter().filter(|i| i.is_critical()).count(),
        root_cause = %root_cause,
        "synthesized diagnosis"
    );

    DiagnosticResult {
        pod_status: pod_status.unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        issues,
        root_cause,
        recommendation,
        next_steps,
        logs_needed,
    }
}

fn first_with(issues: &[Issue], severity: Severity) -> Option<&Issue> {
    issues.iter().find(|i| i.severity == severity)
}
