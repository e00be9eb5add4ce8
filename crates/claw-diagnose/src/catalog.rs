//! Static keyword and signature catalogs.
//!
//! Every table here is an ordered slice: earlier entries win. Classification,
//! extraction and parsing read these tables instead of branching on literals,
//! so each catalog can be tested and extended on its own.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Category, Severity, WorkflowType};

/// A keyword that selects a workflow family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordRule {
    /// Lower-case keyword or phrase.
    pub keyword: &'static str,
    /// Family selected when it matches.
    pub workflow: WorkflowType,
}

const fn rule(keyword: &'static str, workflow: WorkflowType) -> KeywordRule {
    KeywordRule { keyword, workflow }
}

/// Network-tool keywords. Ping-style generic words come last.
pub static NETWORK_KEYWORDS: &[KeywordRule] = &[
    rule("tcpdump", WorkflowType::Tcpdump),
    rule("packet capture", WorkflowType::Tcpdump),
    rule("capture packets", WorkflowType::Tcpdump),
    rule("capture traffic", WorkflowType::Tcpdump),
    rule("sniff", WorkflowType::Tcpdump),
    rule("nslookup", WorkflowType::Dns),
    rule("dig", WorkflowType::Dns),
    rule("dns", WorkflowType::Dns),
    rule("name resolution", WorkflowType::Dns),
    rule("resolv.conf", WorkflowType::Dns),
    rule("curl", WorkflowType::Http),
    rule("wget", WorkflowType::Http),
    rule("http", WorkflowType::Http),
    rule("https", WorkflowType::Http),
    rule("netstat", WorkflowType::Netstat),
    rule("open ports", WorkflowType::Netstat),
    rule("listening ports", WorkflowType::Netstat),
    rule("port usage", WorkflowType::Netstat),
    rule("ping", WorkflowType::Ping),
    rule("icmp", WorkflowType::Ping),
    rule("connectivity", WorkflowType::Ping),
    rule("reachability", WorkflowType::Ping),
    rule("reachable", WorkflowType::Ping),
];

/// Keywords that on their own point at a broken pod.
pub static POD_SYMPTOM_KEYWORDS: &[&str] = &[
    "crashloopbackoff",
    "crashloop",
    "imagepullbackoff",
    "errimagepull",
    "oomkilled",
    "containercreating",
    "createcontainerconfigerror",
    "evicted",
    "keeps restarting",
    "restarting",
];

/// Symptom tokens that mean "broken" when they appear next to "pod".
pub static CONTEXTUAL_SYMPTOMS: &[&str] = &[
    "failing",
    "failed",
    "fails",
    "failure",
    "crash",
    "crashes",
    "crashing",
    "crashed",
    "stuck",
    "pending",
    "why is",
    "troubleshoot pod",
    "debug pod",
    "not running",
    "not ready",
    "not starting",
    "unhealthy",
    "broken",
    "error",
    "errors",
];

/// Verbs that ask for an investigation.
pub static DIAGNOSTIC_VERBS: &[&str] = &[
    "troubleshoot",
    "debug",
    "diagnose",
    "analyze",
    "analyse",
    "check",
    "examine",
    "investigate",
    "inspect",
];

/// Markers of resource-creation and RBAC requests.
pub static CREATION_MARKERS: &[&str] = &[
    "create",
    "apply",
    "service account",
    "serviceaccount",
    "admin access",
    "rolebinding",
    "role binding",
    "clusterrole",
    "clusterrolebinding",
    "grant",
];

/// Words that extraction rules must never return as a resource name.
pub static NOISE_WORDS: &[&str] = &[
    "a", "an", "the", "my", "our", "your", "this", "that", "these", "those", "its", "it", "is",
    "are", "was", "in", "on", "of", "for", "with", "from", "to", "and", "or", "all", "any",
    "every", "some", "which", "what", "why", "how", "pod", "pods", "namespace", "namespaces",
    "failing", "failed", "crashing", "crashed", "stuck", "pending", "running", "restarting",
    "logs", "status", "not", "keeps", "called", "named", "troubleshoot", "debug", "diagnose",
    "check", "examine", "analyze", "inspect", "investigate", "cluster",
];

/// Known pod status strings and what they mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSignature {
    /// Status substring as printed in the STATUS column.
    pub status: &'static str,
    /// Severity of the resulting issue.
    pub severity: Severity,
    /// Category of the resulting issue.
    pub category: Category,
    /// What the status means.
    pub message: &'static str,
    /// What to do about it.
    pub suggestion: &'static str,
}

const fn status(
    status: &'static str,
    severity: Severity,
    category: Category,
    message: &'static str,
    suggestion: &'static str,
) -> StatusSignature {
    StatusSignature {
        status,
        severity,
        category,
        message,
        suggestion,
    }
}

/// Pod status catalog; matched by substring so `Init:CrashLoopBackOff` hits.
pub static STATUS_SIGNATURES: &[StatusSignature] = &[
    status(
        "CrashLoopBackOff",
        Severity::Critical,
        Category::Stability,
        "Container is in CrashLoopBackOff and keeps crashing after start",
        "Check the previous container logs for the crash reason and verify the command, probes and configuration",
    ),
    status(
        "ImagePullBackOff",
        Severity::Critical,
        Category::Image,
        "Container image cannot be pulled (ImagePullBackOff)",
        "Verify the image name and tag, registry availability and imagePullSecrets",
    ),
    status(
        "ErrImagePull",
        Severity::Critical,
        Category::Image,
        "Container image pull failed (ErrImagePull)",
        "Verify the image name and tag, registry availability and imagePullSecrets",
    ),
    status(
        "InvalidImageName",
        Severity::Critical,
        Category::Image,
        "Container image reference is invalid",
        "Fix the image reference in the pod spec",
    ),
    status(
        "OOMKilled",
        Severity::Critical,
        Category::Compute,
        "Container was killed for exceeding its memory limit (OOMKilled)",
        "Increase the memory limit or reduce the application's memory usage",
    ),
    status(
        "CreateContainerConfigError",
        Severity::High,
        Category::Config,
        "Container configuration is invalid (CreateContainerConfigError)",
        "Check that referenced ConfigMaps, Secrets and keys exist",
    ),
    status(
        "CreateContainerError",
        Severity::High,
        Category::Config,
        "Container could not be created (CreateContainerError)",
        "Describe the pod and check the container command, mounts and security context",
    ),
    status(
        "Evicted",
        Severity::High,
        Category::Compute,
        "Pod was evicted from its node",
        "Check node resource pressure and set appropriate requests and limits",
    ),
    status(
        "Pending",
        Severity::High,
        Category::Scheduling,
        "Pod is Pending and has not been scheduled or started",
        "Check node capacity, taints, node selectors and PersistentVolumeClaim binding",
    ),
    status(
        "ContainerCreating",
        Severity::Medium,
        Category::Storage,
        "Pod is stuck in ContainerCreating",
        "Check volume mounts, secrets and the pod sandbox in the pod events",
    ),
    status(
        "Terminating",
        Severity::Medium,
        Category::Config,
        "Pod is stuck in Terminating",
        "Check finalizers and the node hosting the pod; force deletion only as a last resort",
    ),
    status(
        "Error",
        Severity::High,
        Category::Application,
        "Container exited with an error",
        "Check the container logs for the failure",
    ),
];

/// Returns the first status signature contained in `status`.
#[must_use]
pub fn lookup_status(status: &str) -> Option<&'static StatusSignature> {
    STATUS_SIGNATURES.iter().find(|s| status.contains(s.status))
}

/// A known event reason or message fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSignature {
    /// Fragment looked for in the event line.
    pub pattern: &'static str,
    /// Severity of the resulting issue.
    pub severity: Severity,
    /// Category of the resulting issue.
    pub category: Category,
    /// What the event means.
    pub message: &'static str,
    /// What to do about it.
    pub suggestion: &'static str,
}

const fn event(
    pattern: &'static str,
    severity: Severity,
    category: Category,
    message: &'static str,
    suggestion: &'static str,
) -> EventSignature {
    EventSignature {
        pattern,
        severity,
        category,
        message,
        suggestion,
    }
}

/// Event catalog. Image pull back-offs precede the generic `BackOff`.
pub static EVENT_SIGNATURES: &[EventSignature] = &[
    event(
        "FailedScheduling",
        Severity::High,
        Category::Scheduling,
        "Pod cannot be scheduled",
        "Check node capacity, taints and tolerations, affinity rules and node selectors",
    ),
    event(
        "FailedMount",
        Severity::High,
        Category::Storage,
        "Volume mount failed",
        "Check that the PVC, ConfigMap or Secret exists and the volume is attachable",
    ),
    event(
        "FailedAttachVolume",
        Severity::High,
        Category::Storage,
        "Volume attach failed",
        "Check the storage class and whether the volume is attached to another node",
    ),
    event(
        "pulling image",
        Severity::High,
        Category::Image,
        "Image pull is backing off",
        "Verify the image name and tag, registry availability and imagePullSecrets",
    ),
    event(
        "pull image",
        Severity::High,
        Category::Image,
        "Image pull failed",
        "Verify the image name and tag, registry availability and imagePullSecrets",
    ),
    event(
        "ErrImagePull",
        Severity::High,
        Category::Image,
        "Image pull failed",
        "Verify the image name and tag, registry availability and imagePullSecrets",
    ),
    event(
        "OOMKill",
        Severity::High,
        Category::Compute,
        "Container was OOM killed",
        "Increase the memory limit or reduce memory usage",
    ),
    event(
        "BackOff",
        Severity::High,
        Category::Stability,
        "Kubelet is backing off restarting a failed container",
        "Check the previous container logs for the crash reason",
    ),
    event(
        "Unhealthy",
        Severity::Medium,
        Category::Application,
        "Health probe failed",
        "Check the liveness/readiness probe path, port and timing against the application",
    ),
    event(
        "FailedCreatePodSandBox",
        Severity::High,
        Category::Network,
        "Pod sandbox could not be created",
        "Check the CNI plugin and node networking",
    ),
    event(
        "Evicted",
        Severity::High,
        Category::Compute,
        "Pod was evicted",
        "Check node resource pressure and pod requests and limits",
    ),
    event(
        "NodeNotReady",
        Severity::High,
        Category::Scheduling,
        "Node hosting the pod is not ready",
        "Check the node's conditions and kubelet",
    ),
];

/// Returns the first event signature found in `line`.
#[must_use]
pub fn lookup_event(line: &str) -> Option<&'static EventSignature> {
    EVENT_SIGNATURES.iter().find(|e| line.contains(e.pattern))
}

/// A log line signature.
#[derive(Debug)]
pub struct LogSignature {
    /// Pattern applied to one log line.
    pub pattern: Regex,
    /// Severity of the resulting issue.
    pub severity: Severity,
    /// Category of the resulting issue.
    pub category: Category,
    /// Short label used in the issue message.
    pub label: &'static str,
    /// What to do about it.
    pub suggestion: &'static str,
}

fn log_signature(
    pattern: &str,
    severity: Severity,
    category: Category,
    label: &'static str,
    suggestion: &'static str,
) -> LogSignature {
    LogSignature {
        pattern: Regex::new(pattern).unwrap_or_else(|_| unreachable!()),
        severity,
        category,
        label,
        suggestion,
    }
}

/// Log signatures in priority order; only the first match per line counts.
pub static LOG_SIGNATURES: Lazy<Vec<LogSignature>> = Lazy::new(|| {
    vec![
        log_signature(
            r"(?i)(outofmemory|out of memory|\boom(killed)?\b)",
            Severity::High,
            Category::Compute,
            "Memory problem",
            "Compare memory usage with the container limit and raise it or fix the leak",
        ),
        log_signature(
            r"(?i)(error|exception|fatal|panic|crash|traceback)",
            Severity::High,
            Category::Application,
            "Application error",
            "Inspect the surrounding log lines and stack trace for the failing code path",
        ),
        log_signature(
            r"(?i)memory",
            Severity::High,
            Category::Compute,
            "Memory problem",
            "Compare memory usage with the container limit and raise it or fix the leak",
        ),
        log_signature(
            r"(?i)(connection refused|timed out|timeout)",
            Severity::Medium,
            Category::Network,
            "Connectivity problem",
            "Verify the dependency's service, endpoints and network policies",
        ),
        log_signature(
            r"(?i)(permission denied|access denied|forbidden)",
            Severity::Medium,
            Category::Config,
            "Permission problem",
            "Check the service account's RBAC, the security context and file ownership",
        ),
        log_signature(
            r"(?i)(\b(disk|volume|mount)\b.*\bfail|no space left)",
            Severity::Medium,
            Category::Storage,
            "Storage problem",
            "Check volume mounts, PVC status and free disk space",
        ),
    ]
});

/// Checklist for image problems.
pub static IMAGE_NEXT_STEPS: &[&str] = &[
    "Verify the image name and tag exist in the registry",
    "Check imagePullSecrets and registry credentials",
    "Confirm the node can reach the registry",
    "Review the pod events for the exact pull error",
];

/// Checklist for crash and restart problems.
pub static STABILITY_NEXT_STEPS: &[&str] = &[
    "Review the previous container logs (logs --previous)",
    "Check liveness and readiness probe configuration",
    "Verify required environment variables, ConfigMaps and Secrets",
    "Check the container command and entrypoint",
];

/// Checklist for CPU and memory problems.
pub static COMPUTE_NEXT_STEPS: &[&str] = &[
    "Compare container memory usage against its limits",
    "Raise memory or CPU limits, or reduce the application's usage",
    "Check node capacity and pressure conditions",
];

/// Checklist for scheduling problems.
pub static SCHEDULING_NEXT_STEPS: &[&str] = &[
    "Check node capacity and allocatable resources",
    "Review nodeSelector, affinity, taints and tolerations",
    "Verify PersistentVolumeClaims are bound",
];

/// Checklist for critical issues outside the dedicated categories.
pub static GENERAL_NEXT_STEPS: &[&str] = &[
    "Describe the pod and review recent events",
    "Check the logs of the affected container",
    "Verify related ConfigMaps, Secrets and Services exist",
];

/// Returns the checklist for a root-cause category.
#[must_use]
pub fn next_steps_for(category: Category) -> &'static [&'static str] {
    match category {
        Category::Image => IMAGE_NEXT_STEPS,
        Category::Stability => STABILITY_NEXT_STEPS,
        Category::Compute => COMPUTE_NEXT_STEPS,
        Category::Scheduling => SCHEDULING_NEXT_STEPS,
        _ => GENERAL_NEXT_STEPS,
    }
}
