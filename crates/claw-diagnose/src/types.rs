//! Core types for the troubleshooting pipeline.
//!
//! This module defines the data that flows through a diagnostic run: the
//! classified workflow, the extracted target, planned steps and their results,
//! the issues parsed from step output and the synthesized diagnosis.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The diagnostic scenario that determines which inspection steps are planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    /// Packet capture inside a pod.
    Tcpdump,
    /// ICMP reachability from a pod.
    Ping,
    /// Name resolution from a pod.
    Dns,
    /// HTTP request from a pod.
    Http,
    /// Socket and connection inspection inside a pod.
    Netstat,
    /// Full pod inspection with root-cause synthesis.
    PodDiagnostics,
    /// Generic listing of pods and services.
    #[default]
    General,
}

impl WorkflowType {
    /// All workflow families in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Tcpdump,
        Self::Ping,
        Self::Dns,
        Self::Http,
        Self::Netstat,
        Self::PodDiagnostics,
        Self::General,
    ];

    /// Returns the wire name of the workflow.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tcpdump => "tcpdump",
            Self::Ping => "ping",
            Self::Dns => "dns",
            Self::Http => "http",
            Self::Netstat => "netstat",
            Self::PodDiagnostics => "pod_diagnostics",
            Self::General => "general",
        }
    }

    /// Returns true if this workflow runs a network tool inside a pod.
    #[must_use]
    pub const fn is_network_tool(&self) -> bool {
        matches!(
            self,
            Self::Tcpdump | Self::Ping | Self::Dns | Self::Http | Self::Netstat
        )
    }
}

impl std::fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of intent classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Whether the query asks for diagnostics at all.
    pub is_diagnostic: bool,
    /// The workflow family to run.
    pub workflow: WorkflowType,
}

impl Classification {
    /// A diagnostic classification for the given workflow.
    #[must_use]
    pub const fn diagnostic(workflow: WorkflowType) -> Self {
        Self {
            is_diagnostic: true,
            workflow,
        }
    }

    /// A query that does not ask for diagnostics.
    #[must_use]
    pub const fn not_diagnostic() -> Self {
        Self {
            is_diagnostic: false,
            workflow: WorkflowType::General,
        }
    }
}

/// The resource a query is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Pod name, if one was found in the query.
    pub resource_name: Option<String>,
    /// Namespace (explicit or the configured default).
    pub namespace: String,
    /// Network interface for captures.
    pub interface: Option<String>,
    /// Capture filter expression.
    pub filter: Option<String>,
    /// Capture/probe duration in seconds.
    pub duration_secs: Option<u64>,
    /// Remote host or URL for ping/dns/http probes.
    pub destination: Option<String>,
    /// True iff a resource name was extracted.
    pub found: bool,
}

impl Target {
    /// Creates a target with no resource in the given namespace.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            resource_name: None,
            namespace: namespace.into(),
            interface: None,
            filter: None,
            duration_secs: None,
            destination: None,
            found: false,
        }
    }

    /// Creates a target for a named pod.
    #[must_use]
    pub fn pod(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::new(namespace).with_resource(name)
    }

    /// Sets the resource name and marks the target as found.
    #[must_use]
    pub fn with_resource(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self.found = true;
        self
    }

    /// Sets the network interface.
    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// Sets the capture filter.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets the duration in seconds.
    #[must_use]
    pub const fn with_duration(mut self, secs: u64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// Sets the remote destination.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Returns the pod name when the target was found.
    #[must_use]
    pub fn pod_name(&self) -> Option<&str> {
        self.resource_name.as_deref()
    }
}

/// What a planned step inspects; selects the parser applied to its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// `get pod <name> -o wide`.
    PodStatus,
    /// `describe pod <name>`.
    DescribePod,
    /// `get events` for one pod.
    PodEvents,
    /// Logs of the running container.
    CurrentLogs,
    /// Logs of the previous container instance.
    PreviousLogs,
    /// `get pods` in a namespace.
    ListPods,
    /// `get pods -o wide` in a namespace.
    ListPodsWide,
    /// `get services` in a namespace.
    ListServices,
    /// A tool run inside a pod via exec.
    ExecProbe,
}

impl StepKind {
    /// The issue source this step's output is parsed as, if any.
    #[must_use]
    pub const fn issue_source(&self) -> Option<IssueSource> {
        match self {
            Self::PodStatus | Self::ListPods => Some(IssueSource::Status),
            Self::DescribePod => Some(IssueSource::Describe),
            Self::PodEvents => Some(IssueSource::Events),
            Self::CurrentLogs | Self::PreviousLogs => Some(IssueSource::Logs),
            Self::ListPodsWide | Self::ListServices | Self::ExecProbe => None,
        }
    }
}

/// One planned inspection command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// 1-based position in the plan.
    pub ordinal: usize,
    /// What the step inspects.
    pub kind: StepKind,
    /// Short human description.
    pub description: String,
    /// Full command line.
    pub command: String,
    /// Why the step is part of the plan.
    pub purpose: String,
    /// Minimum deadline for a step that runs for a planned duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

impl WorkflowStep {
    /// The minimum deadline, if the step runs for a planned duration.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// The outcome of executing one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// The command that was executed.
    pub command: String,
    /// Captured standard output.
    pub output: String,
    /// Process exit code (`-1` if the process never ran to completion).
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Error text (stderr, spawn failure, timeout).
    pub error: Option<String>,
    /// When the step finished.
    pub timestamp: DateTime<Utc>,
}

impl StepResult {
    /// Returns true if the command exited with code 0.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Returns true iff at least one step exited with code 0.
#[must_use]
pub fn any_succeeded(results: &[StepResult]) -> bool {
    results.iter().any(StepResult::is_success)
}

/// Severity of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic or informational.
    Low,
    /// Should be looked at.
    Medium,
    /// Likely breaks the workload.
    High,
    /// The workload cannot run.
    Critical,
}

impl Severity {
    /// Returns an emoji representation for display purposes.
    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Low => "ℹ️",
            Self::Medium => "⚠️",
            Self::High => "❌",
            Self::Critical => "🚨",
        }
    }

    /// The issue kind implied by this severity.
    #[must_use]
    pub const fn default_kind(&self) -> IssueKind {
        match self {
            Self::Critical | Self::High => IssueKind::Error,
            Self::Medium => IssueKind::Warning,
            Self::Low => IssueKind::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Whether an issue is an error, a warning or informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// Something is broken.
    Error,
    /// Something looks wrong.
    Warning,
    /// Worth knowing.
    Info,
}

/// Which kind of step output an issue was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSource {
    /// Pod status table.
    Status,
    /// `describe pod` output.
    Describe,
    /// Event listing.
    Events,
    /// Container logs.
    Logs,
}

impl std::fmt::Display for IssueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status => write!(f, "status"),
            Self::Describe => write!(f, "describe"),
            Self::Events => write!(f, "events"),
            Self::Logs => write!(f, "logs"),
        }
    }
}

/// Problem area an issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Image pulls.
    Image,
    /// Crashes and restarts.
    Stability,
    /// CPU and memory.
    Compute,
    /// Connectivity.
    Network,
    /// Volumes and disks.
    Storage,
    /// Placement onto nodes.
    Scheduling,
    /// Configuration, RBAC, missing objects.
    Config,
    /// Cluster events without a more specific area.
    Events,
    /// The application itself.
    Application,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Stability => "stability",
            Self::Compute => "compute",
            Self::Network => "network",
            Self::Storage => "storage",
            Self::Scheduling => "scheduling",
            Self::Config => "config",
            Self::Events => "events",
            Self::Application => "application",
        };
        f.write_str(name)
    }
}

/// One structured finding parsed from a step's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Error, warning or info.
    pub kind: IssueKind,
    /// Which output it came from.
    pub source: IssueSource,
    /// What was found.
    pub message: String,
    /// How bad it is.
    pub severity: Severity,
    /// Problem area.
    pub category: Category,
    /// Whether the operator can act on it.
    pub actionable: bool,
    /// Suggested remediation.
    pub suggestion: String,
}

impl Issue {
    /// Creates an actionable issue whose kind follows from its severity.
    #[must_use]
    pub fn new(
        source: IssueSource,
        severity: Severity,
        category: Category,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: severity.default_kind(),
            source,
            message: message.into(),
            severity,
            category,
            actionable: true,
            suggestion: String::new(),
        }
    }

    /// Sets the suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    /// Marks the issue as not actionable.
    #[must_use]
    pub const fn informational(mut self) -> Self {
        self.actionable = false;
        self
    }

    /// Returns true if the issue is critical.
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self.severity, Severity::Critical)
    }
}

/// The synthesized diagnosis of a pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    /// Pod status as reported by the status table.
    pub pod_status: String,
    /// All issues in discovery order.
    pub issues: Vec<Issue>,
    /// Primary explanation.
    pub root_cause: String,
    /// Primary remediation.
    pub recommendation: String,
    /// Follow-up checklist.
    pub next_steps: Vec<String>,
    /// Whether container logs deserve a closer look.
    pub logs_needed: bool,
}

impl DiagnosticResult {
    /// Returns the count of issues with the given severity.
    #[must_use]
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Returns true if any issue is critical.
    #[must_use]
    pub fn has_critical_issues(&self) -> bool {
        self.issues.iter().any(Issue::is_critical)
    }
}

/// Everything produced while answering one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier for this run.
    pub id: Uuid,
    /// The operator query.
    pub query: String,
    /// Workflow that was planned.
    pub workflow_type: WorkflowType,
    /// Extracted target.
    pub target: Target,
    /// Planned steps.
    pub steps: Vec<WorkflowStep>,
    /// One result per executed step, same order as `steps`.
    pub results: Vec<StepResult>,
    /// Diagnosis (pod workflow with at least two results only).
    pub diagnostic: Option<DiagnosticResult>,
    /// Rendered report.
    pub summary: String,
    /// True iff at least one step exited with code 0.
    pub success: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Total run duration in milliseconds.
    pub duration_ms: u64,
}

impl Run {
    /// Number of steps that exited with code 0.
    #[must_use]
    pub fn succeeded_steps(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of steps that failed.
    #[must_use]
    pub fn failed_steps(&self) -> usize {
        self.results.len() - self.succeeded_steps()
    }

    /// Iterates over steps paired with their results.
    pub fn step_results(&self) -> impl Iterator<Item = (&WorkflowStep, &StepResult)> {
        self.steps.iter().zip(self.results.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_code: i32) -> StepResult {
        StepResult {
            command: "kubectl get pods".to_string(),
            output: String::new(),
            exit_code,
            duration_ms: 5,
            error: None,
            timestamp: Utc::now(),
        }
    }

    mod workflow_type_tests {
        use super::*;

        #[test]
        fn test_workflow_default_is_general() {
            assert_eq!(WorkflowType::default(), WorkflowType::General);
        }

        #[test]
        fn test_workflow_serialization() {
            let json = serde_json::to_string(&WorkflowType::PodDiagnostics)
                .expect("serialization should work in test");
            assert_eq!(json, "\"pod_diagnostics\"");

            let parsed: WorkflowType =
                serde_json::from_str("\"tcpdump\"").expect("deserialization should work in test");
            assert_eq!(parsed, WorkflowType::Tcpdump);
        }

        #[test]
        fn test_display_matches_wire_name() {
            for workflow in WorkflowType::ALL {
                let json = serde_json::to_string(&workflow).expect("serialization should work");
                assert_eq!(json.trim_matches('"'), workflow.to_string());
            }
        }

        #[test]
        fn test_network_tool_families() {
            assert!(WorkflowType::Tcpdump.is_network_tool());
            assert!(WorkflowType::Netstat.is_network_tool());
            assert!(!WorkflowType::PodDiagnostics.is_network_tool());
            assert!(!WorkflowType::General.is_network_tool());
        }
    }

    mod target_tests {
        use super::*;

        #[test]
        fn test_new_target_is_not_found() {
            let target = Target::new("default");
            assert!(!target.found);
            assert!(target.pod_name().is_none());
        }

        #[test]
        fn test_pod_target_is_found() {
            let target = Target::pod("httpd", "app1")
                .with_interface("eth0")
                .with_duration(15);
            assert!(target.found);
            assert_eq!(target.pod_name(), Some("httpd"));
            assert_eq!(target.namespace, "app1");
            assert_eq!(target.interface.as_deref(), Some("eth0"));
            assert_eq!(target.duration_secs, Some(15));
        }
    }

    mod step_tests {
        use super::*;

        #[test]
        fn test_step_kind_sources() {
            assert_eq!(StepKind::PodStatus.issue_source(), Some(IssueSource::Status));
            assert_eq!(StepKind::ListPods.issue_source(), Some(IssueSource::Status));
            assert_eq!(StepKind::PreviousLogs.issue_source(), Some(IssueSource::Logs));
            assert_eq!(StepKind::ListPodsWide.issue_source(), None);
            assert_eq!(StepKind::ExecProbe.issue_source(), None);
        }

        #[test]
        fn test_any_succeeded() {
            assert!(!any_succeeded(&[]));
            assert!(!any_succeeded(&[result(1), result(-1)]));
            assert!(any_succeeded(&[result(1), result(0)]));
        }
    }

    mod severity_tests {
        use super::*;

        #[test]
        fn test_severity_ordering() {
            assert!(Severity::Low < Severity::Medium);
            assert!(Severity::Medium < Severity::High);
            assert!(Severity::High < Severity::Critical);
        }

        #[test]
        fn test_severity_display() {
            assert_eq!(Severity::Critical.to_string(), "CRITICAL");
            assert_eq!(Severity::Low.to_string(), "LOW");
        }

        #[test]
        fn test_default_kind() {
            assert_eq!(Severity::Critical.default_kind(), IssueKind::Error);
            assert_eq!(Severity::High.default_kind(), IssueKind::Error);
            assert_eq!(Severity::Medium.default_kind(), IssueKind::Warning);
            assert_eq!(Severity::Low.default_kind(), IssueKind::Info);
        }
    }

    mod issue_tests {
        use super::*;

        #[test]
        fn test_issue_creation() {
            let issue = Issue::new(
                IssueSource::Status,
                Severity::Critical,
                Category::Image,
                "Image cannot be pulled",
            )
            .with_suggestion("Verify the image name and registry credentials");

            assert_eq!(issue.kind, IssueKind::Error);
            assert!(issue.actionable);
            assert!(issue.is_critical());
            assert!(issue.suggestion.contains("registry"));
        }

        #[test]
        fn test_issue_serialization() {
            let issue = Issue::new(
                IssueSource::Logs,
                Severity::Medium,
                Category::Network,
                "connection refused",
            )
            .informational();

            let json = serde_json::to_string(&issue).expect("serialization should work in test");
            assert!(json.contains("\"severity\":\"medium\""));
            assert!(json.contains("\"category\":\"network\""));
            assert!(json.contains("\"source\":\"logs\""));
            assert!(json.contains("\"actionable\":false"));
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_step_counts() {
            let run = Run {
                id: Uuid::nil(),
                query: "list pods".to_string(),
                workflow_type: WorkflowType::General,
                target: Target::new("default"),
                steps: vec![],
                results: vec![result(0), result(1), result(0)],
                diagnostic: None,
                summary: String::new(),
                success: true,
                started_at: Utc::now(),
                duration_ms: 0,
            };

            assert_eq!(run.succeeded_steps(), 2);
            assert_eq!(run.failed_steps(), 1);
        }
    }
}
