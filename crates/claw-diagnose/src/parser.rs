//! Output parsing.
//!
//! Turns the text printed by inspection commands into [`Issue`]s. Each parser
//! is purely additive: lines it does not recognise are skipped, never errors.
//! [`extract_issues`] dispatches on the step kind.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::catalog::{lookup_event, lookup_status, LOG_SIGNATURES};
use crate::types::{Category, Issue, IssueSource, Severity, StepResult, WorkflowStep};

static EXIT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Exit Code:\s+(\d+)").unwrap_or_else(|_| unreachable!()));

/// Exit code of a container killed by SIGKILL, typically the OOM killer.
const EXIT_SIGKILL: u32 = 137;

const MAX_LOG_EXCERPT: usize = 160;

/// One row of a `get pod`/`get pods` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    /// Pod name.
    pub name: String,
    /// Ready and total containers, if the READY column was present.
    pub ready: Option<(u32, u32)>,
    /// STATUS column.
    pub status: String,
    /// Leading number of the RESTARTS column.
    pub restarts: u32,
}

/// Parses a pod status table, locating columns from its header.
///
/// Returns no rows if there is no header with a STATUS column.
#[must_use]
pub fn parse_status_table(output: &str) -> Vec<StatusRow> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };

    let columns: Vec<&str> = header.split_whitespace().collect();
    let position = |name: &str| columns.iter().position(|c| *c == name);
    let (Some(name_col), Some(status_col)) = (position("NAME"), position("STATUS")) else {
        return Vec::new();
    };
    let ready_col = position("READY");
    let restarts_col = position("RESTARTS");

    lines
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            Some(StatusRow {
                name: (*fields.get(name_col)?).to_string(),
                status: (*fields.get(status_col)?).to_string(),
                ready: ready_col
                    .and_then(|i| fields.get(i))
                    .and_then(|v| parse_ready(v)),
                restarts: restarts_col
                    .and_then(|i| fields.get(i))
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0),
            })
        })
        .collect()
}

fn parse_ready(value: &str) -> Option<(u32, u32)> {
    let (ready, total) = value.split_once('/')?;
    Some((ready.parse().ok()?, total.parse().ok()?))
}

/// Status of the first row, if any.
#[must_use]
pub fn pod_status(output: &str) -> Option<String> {
    parse_status_table(output).into_iter().next().map(|r| r.status)
}

/// Issues for the rows of a status table.
#[must_use]
pub fn parse_status(output: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    for row in parse_status_table(output) {
        if let Some(sig) = lookup_status(&row.status) {
            issues.push(
                Issue::new(
                    IssueSource::Status,
                    sig.severity,
                    sig.category,
                    format!("{} (pod {})", sig.message, row.name),
                )
                .with_suggestion(sig.suggestion),
            );
        }

        if row.restarts > 0 {
            issues.push(
                Issue::new(
                    IssueSource::Status,
                    Severity::Medium,
                    Category::Stability,
                    format!("Pod {} has restarted {} times", row.name, row.restarts),
                )
                .with_suggestion("Check the previous container logs for why it restarted"),
            );
        }

        if let Some((ready, total)) = row.ready {
            if row.status == "Running" && ready < total {
                issues.push(
                    Issue::new(
                        IssueSource::Status,
                        Severity::Medium,
                        Category::Application,
                        format!(
                            "Pod {} is Running but only {ready}/{total} containers are ready",
                            row.name
                        ),
                    )
                    .with_suggestion("Check the readiness probe and the not-ready container's logs"),
                );
            }
        }
    }

    issues
}

/// Issue for a status lookup that failed because the object does not exist.
#[must_use]
pub fn parse_status_failure(result: &StepResult) -> Option<Issue> {
    let error = result.error.as_deref()?;
    if !(error.contains("NotFound") || error.contains("not found")) {
        return None;
    }

    let detail = error.lines().next().unwrap_or(error).trim();
    Some(
        Issue::new(
            IssueSource::Status,
            Severity::Critical,
            Category::Config,
            format!("Pod not found: {detail}"),
        )
        .with_suggestion("Check the pod name and namespace; list the pods in the namespace"),
    )
}

/// Issues from `describe pod` output.
///
/// Looks at container state reasons, non-zero exit codes and the warning
/// lines of the trailing `Events:` section.
#[must_use]
pub fn parse_describe(output: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut in_state_block = false;
    let mut in_events = false;

    for line in output.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("Events:") {
            in_events = true;
            in_state_block = false;
            continue;
        }

        if in_events {
            if trimmed.starts_with("Warning") {
                issues.push(event_issue(IssueSource::Describe, trimmed));
            }
            continue;
        }

        if let Some(state) = trimmed
            .strip_prefix("State:")
            .or_else(|| trimmed.strip_prefix("Last State:"))
        {
            let state = state.trim();
            in_state_block = state.starts_with("Waiting") || state.starts_with("Terminated");
            continue;
        }

        if trimmed.starts_with("Ready:") || trimmed.starts_with("Restart Count:") {
            in_state_block = false;
            continue;
        }

        if in_state_block {
            if let Some(reason) = trimmed.strip_prefix("Reason:") {
                if let Some(sig) = lookup_status(reason.trim()) {
                    issues.push(
                        Issue::new(IssueSource::Describe, sig.severity, sig.category, sig.message)
                            .with_suggestion(sig.suggestion),
                    );
                }
                continue;
            }
        }

        if let Some(code) = EXIT_CODE
            .captures(trimmed)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        {
            if code != 0 {
                issues.push(exit_code_issue(code));
            }
        }
    }

    issues
}

fn exit_code_issue(code: u32) -> Issue {
    if code == EXIT_SIGKILL {
        Issue::new(
            IssueSource::Describe,
            Severity::High,
            Category::Compute,
            format!("Container exited with code {code} (killed, likely out of memory)"),
        )
        .with_suggestion("Compare memory usage with the container limit")
    } else {
        Issue::new(
            IssueSource::Describe,
            Severity::High,
            Category::Application,
            format!("Container exited with code {code}"),
        )
        .with_suggestion("Check the previous container logs for the failure")
    }
}

fn event_issue(source: IssueSource, line: &str) -> Issue {
    lookup_event(line).map_or_else(
        || {
            Issue::new(source, Severity::Medium, Category::Events, line)
                .with_suggestion("Review the event and the object it refers to")
                .informational()
        },
        |sig| {
            Issue::new(source, sig.severity, sig.category, sig.message)
                .with_suggestion(sig.suggestion)
        },
    )
}

/// Issues from an event listing: every line mentioning Warning or Error.
#[must_use]
pub fn parse_events(output: &str) -> Vec<Issue> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.contains("Warning") || line.contains("Error"))
        .map(|line| event_issue(IssueSource::Events, line))
        .collect()
}

/// Issues from container logs; the first matching signature per line wins.
#[must_use]
pub fn parse_logs(output: &str) -> Vec<Issue> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let sig = LOG_SIGNATURES.iter().find(|s| s.pattern.is_match(line))?;
            let excerpt: String = line.chars().take(MAX_LOG_EXCERPT).collect();
            Some(
                Issue::new(
                    IssueSource::Logs,
                    sig.severity,
                    sig.category,
                    format!("{}: {excerpt}", sig.label),
                )
                .with_suggestion(sig.suggestion),
            )
        })
        .collect()
}

/// Issues for one executed step, chosen by its kind.
///
/// Failed steps contribute nothing except a status lookup reporting that the
/// pod does not exist.
#[must_use]
pub fn extract_issues(step: &WorkflowStep, result: &StepResult) -> Vec<Issue> {
    let Some(source) = step.kind.issue_source() else {
        return Vec::new();
    };

    if !result.is_success() {
        return match source {
            IssueSource::Status => parse_status_failure(result).into_iter().collect(),
            _ => Vec::new(),
        };
    }

    let issues = match source {
        IssueSource::Status => parse_status(&result.output),
        IssueSource::Describe => parse_describe(&result.output),
        IssueSource::Events => parse_events(&result.output),
        IssueSource::Logs => parse_logs(&result.output),
    };

    debug!(step = step.ordinal, source = %source, issues = issues.len(), "parsed step output");
    issues
}
