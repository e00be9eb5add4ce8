//! Human-readable report formatting.
//!
//! Pod diagnostics render the synthesized diagnosis and suppress raw step
//! output. Every other workflow renders the step trail with truncated output
//! and a success/failure tally.

// Allow format string pushing for readability in formatter functions
#![allow(clippy::format_push_string)]

use crate::types::{DiagnosticResult, Run, StepResult, Target, WorkflowStep};

const RULE: &str = "───────────────────────────────────────────────────────────────\n";
const DOUBLE_RULE: &str = "═══════════════════════════════════════════════════════════════\n";

/// Formats a pod diagnosis: status, root cause, recommendation, issues and
/// next steps.
#[must_use]
pub fn format_pod_report(target: &Target, diagnostic: &DiagnosticResult) -> String {
    let mut output = String::new();

    output.push_str(DOUBLE_RULE);
    output.push_str("                    POD DIAGNOSIS\n");
    output.push_str(DOUBLE_RULE);
    output.push_str(&format!(
        "Pod: {} (namespace {})\n",
        target.pod_name().unwrap_or("-"),
        target.namespace
    ));
    output.push_str(&format!("Status: {}\n", diagnostic.pod_status));
    output.push_str(RULE);
    output.push_str(&format!("🔍 Root cause: {}\n", diagnostic.root_cause));
    if !diagnostic.recommendation.is_empty() {
        output.push_str(&format!("💡 Recommendation: {}\n", diagnostic.recommendation));
    }

    if !diagnostic.issues.is_empty() {
        output.push_str("\n📋 ISSUES\n");
        output.push_str(RULE);
        for issue in &diagnostic.issues {
            output.push_str(&format!(
                "{} [{}] {} ({}, from {})\n",
                issue.severity.emoji(),
                issue.severity,
                issue.message,
                issue.category,
                issue.source
            ));
        }
    }

    if !diagnostic.next_steps.is_empty() {
        output.push_str("\n🧭 NEXT STEPS\n");
        output.push_str(RULE);
        for (i, step) in diagnostic.next_steps.iter().enumerate() {
            output.push_str(&format!("{}. {step}\n", i + 1));
        }
    }

    if diagnostic.logs_needed {
        output.push_str("\nContainer logs are likely to explain the failure; review them next.\n");
    }

    output
}

/// Formats each step with its output preview, followed by a tally.
#[must_use]
pub fn format_step_trail(
    steps: &[WorkflowStep],
    results: &[StepResult],
    preview_chars: usize,
) -> String {
    let mut output = String::new();

    for (step, result) in steps.iter().zip(results) {
        let marker = if result.is_success() { "✅" } else { "❌" };
        output.push_str(&format!("\n{marker} Step {}: {}\n", step.ordinal, step.description));
        output.push_str(&format!("   Command: {}\n", step.command));
        output.push_str(&format!("   Purpose: {}\n", step.purpose));

        // Bounded commands exit non-zero at their deadline but keep what they printed.
        let preview = truncate(result.output.trim_end(), preview_chars);
        if !preview.is_empty() {
            output.push_str("   Output:\n");
            for line in preview.lines() {
                output.push_str(&format!("   │ {line}\n"));
            }
        } else if result.is_success() {
            output.push_str("   (no output)\n");
        }

        if !result.is_success() {
            let error = result.error.as_deref().unwrap_or("command failed");
            output.push_str(&format!(
                "   Error (exit {}): {}\n",
                result.exit_code,
                truncate(error.trim(), preview_chars)
            ));
        }
    }

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    output.push_str(&format!(
        "\n{succeeded} succeeded, {} failed\n",
        results.len() - succeeded
    ));

    output
}

/// Formats the report for a finished run.
///
/// Uses the pod report when a diagnosis exists, the step trail otherwise.
#[must_use]
pub fn format_run_report(run: &Run, preview_chars: usize) -> String {
    let mut output = format!("Query: {}\nWorkflow: {}\n", run.query, run.workflow_type);

    match &run.diagnostic {
        Some(diagnostic) => output.push_str(&format_pod_report(&run.target, diagnostic)),
        None => output.push_str(&format_step_trail(&run.steps, &run.results, preview_chars)),
    }

    output
}

/// Formats a run as a one-line summary.
#[must_use]
pub fn format_summary(run: &Run) -> String {
    let indicator = match &run.diagnostic {
        _ if !run.success => "[FAIL]",
        Some(d) if d.has_critical_issues() => "[CRIT]",
        Some(d) if !d.issues.is_empty() => "[WARN]",
        _ => "[OK]",
    };

    let subject = run.target.pod_name().map_or_else(
        || format!("namespace {}", run.target.namespace),
        |pod| format!("{}/{pod}", run.target.namespace),
    );

    let detail = run.diagnostic.as_ref().map_or_else(
        || {
            format!(
                "{} {}/{} steps succeeded",
                run.workflow_type,
                run.succeeded_steps(),
                run.results.len()
            )
        },
        |d| d.root_cause.clone(),
    );

    format!("{indicator} {subject}: {detail}")
}

/// Truncates to `max_chars` characters, marking the cut with `...`.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Formats a run as JSON for programmatic consumption.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_as_json(run: &Run) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(run)
}

/// Formats a run as compact JSON (single line).
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_as_json_compact(run: &Run) -> Result<String, serde_json::Error> {
    serde_json::to_string(run)
}
