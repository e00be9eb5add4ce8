//! Workflow planning.
//!
//! One planner function per [`WorkflowType`] variant turns a [`Target`] into
//! the ordered inspection commands for that scenario. Network families exec a
//! tool inside the pod after verifying it exists; without a pod they only list
//! what is there.

use tracing::info;

use crate::config::{DiagnoseConfig, PROBE_GRACE_SECS};
use crate::types::{StepKind, Target, WorkflowStep, WorkflowType};

/// Builds the ordered step list for a workflow.
#[must_use]
pub fn plan(workflow: WorkflowType, target: &Target, config: &DiagnoseConfig) -> Vec<WorkflowStep> {
    let mut plan = StepPlan::new(config);

    match workflow {
        WorkflowType::PodDiagnostics => plan_pod_diagnostics(&mut plan, target),
        WorkflowType::Tcpdump => plan_tcpdump(&mut plan, target),
        WorkflowType::Ping => plan_ping(&mut plan, target),
        WorkflowType::Dns => plan_dns(&mut plan, target),
        WorkflowType::Http => plan_http(&mut plan, target),
        WorkflowType::Netstat => plan_netstat(&mut plan, target),
        WorkflowType::General => plan_general(&mut plan, target),
    }

    let steps = plan.finish();
    info!(
        workflow = %workflow,
        steps = steps.len(),
        namespace = %target.namespace,
        pod = target.pod_name().unwrap_or("-"),
        "planned workflow"
    );
    steps
}

/// Accumulates steps, numbering them as they are pushed.
struct StepPlan<'a> {
    config: &'a DiagnoseConfig,
    steps: Vec<WorkflowStep>,
}

impl<'a> StepPlan<'a> {
    fn new(config: &'a DiagnoseConfig) -> Self {
        Self {
            config,
            steps: Vec::new(),
        }
    }

    fn push(&mut self, kind: StepKind, description: String, args: String, purpose: &str) {
        self.steps.push(WorkflowStep {
            ordinal: self.steps.len() + 1,
            kind,
            description,
            command: format!("{} {args}", self.config.cli.binary()),
            purpose: purpose.to_string(),
            deadline_secs: None,
        });
    }

    fn exec(&mut self, pod: &str, ns: &str, description: String, tool: &str, purpose: &str) {
        self.push(
            StepKind::ExecProbe,
            description,
            format!("exec {pod} -n {ns} -- {tool}"),
            purpose,
        );
    }

    /// An exec step that runs for `duration_secs`; its deadline covers that
    /// duration plus the grace period.
    fn exec_bounded(
        &mut self,
        pod: &str,
        ns: &str,
        description: String,
        tool: &str,
        purpose: &str,
        duration_secs: u64,
    ) {
        self.exec(pod, ns, description, tool, purpose);
        if let Some(step) = self.steps.last_mut() {
            step.deadline_secs = Some(duration_secs.saturating_add(PROBE_GRACE_SECS));
        }
    }

    fn verify_pod(&mut self, pod: &str, ns: &str) {
        self.push(
            StepKind::PodStatus,
            format!("Verify pod {pod} exists"),
            format!("get pod {pod} -n {ns}"),
            "Confirm the pod is present and running before exec",
        );
    }

    fn list_pods(&mut self, ns: &str) {
        self.push(
            StepKind::ListPods,
            format!("List pods in namespace {ns}"),
            format!("get pods -n {ns}"),
            "Show which pods exist and their status",
        );
    }

    const fn config(&self) -> &'a DiagnoseConfig {
        self.config
    }

    fn finish(self) -> Vec<WorkflowStep> {
        self.steps
    }
}

fn plan_pod_diagnostics(plan: &mut StepPlan<'_>, target: &Target) {
    let ns = &target.namespace;
    let Some(pod) = target.pod_name() else {
        plan.list_pods(ns);
        plan.push(
            StepKind::ListPodsWide,
            format!("List pods in namespace {ns} with node placement"),
            format!("get pods -n {ns} -o wide"),
            "Identify the failing pod and the node it runs on",
        );
        return;
    };

    let tail = plan.config().log_tail_lines;
    plan.push(
        StepKind::PodStatus,
        format!("Get status of pod {pod}"),
        format!("get pod {pod} -n {ns} -o wide"),
        "Check phase, readiness, restarts and node placement",
    );
    plan.push(
        StepKind::DescribePod,
        format!("Describe pod {pod}"),
        format!("describe pod {pod} -n {ns}"),
        "Inspect container states, exit codes and recent events",
    );
    plan.push(
        StepKind::PodEvents,
        format!("Get events for pod {pod}"),
        format!(
            "get events -n {ns} --field-selector involvedObject.name={pod} --sort-by=.lastTimestamp"
        ),
        "Find scheduling, image and probe failures",
    );
    plan.push(
        StepKind::CurrentLogs,
        format!("Get logs of pod {pod}"),
        format!("logs {pod} -n {ns} --tail={tail}"),
        "Look for application errors in the running container",
    );
    plan.push(
        StepKind::PreviousLogs,
        format!("Get previous logs of pod {pod}"),
        format!("logs {pod} -n {ns} --previous --tail={tail}"),
        "See why the last container instance exited",
    );
}

fn plan_tcpdump(plan: &mut StepPlan<'_>, target: &Target) {
    let ns = &target.namespace;
    let Some(pod) = target.pod_name() else {
        plan.list_pods(ns);
        return;
    };

    let capture = &plan.config().capture;
    let interface = target
        .interface
        .clone()
        .unwrap_or_else(|| capture.interface.clone());
    let duration = target.duration_secs.unwrap_or(capture.duration_secs);
    let mut tool = format!(
        "timeout {duration} tcpdump -i {interface} -nn -c {}",
        capture.packet_count
    );
    if let Some(filter) = &target.filter {
        tool.push(' ');
        tool.push_str(filter);
    }

    plan.verify_pod(pod, ns);
    plan.exec_bounded(
        pod,
        ns,
        format!("Capture packets on {interface} in pod {pod} for {duration}s"),
        &tool,
        "Observe live traffic entering and leaving the pod",
        duration,
    );
}

fn plan_ping(plan: &mut StepPlan<'_>, target: &Target) {
    let ns = &target.namespace;
    let Some(pod) = target.pod_name() else {
        plan.list_pods(ns);
        return;
    };

    let probe = &plan.config().probe;
    let destination = target
        .destination
        .as_deref()
        .map_or_else(|| probe.ping_destination.clone(), host_of);

    plan.verify_pod(pod, ns);
    plan.exec(
        pod,
        ns,
        format!("Ping {destination} from pod {pod}"),
        &format!("ping -c {} {destination}", probe.ping_count),
        "Check ICMP reachability and latency from inside the pod",
    );
}

fn plan_dns(plan: &mut StepPlan<'_>, target: &Target) {
    let ns = &target.namespace;
    let Some(pod) = target.pod_name() else {
        plan.list_pods(ns);
        return;
    };

    let name = target
        .destination
        .as_deref()
        .map_or_else(|| plan.config().probe.dns_name.clone(), host_of);

    plan.verify_pod(pod, ns);
    plan.exec(
        pod,
        ns,
        format!("Show resolver configuration of pod {pod}"),
        "cat /etc/resolv.conf",
        "Check nameservers and search domains",
    );
    plan.exec(
        pod,
        ns,
        format!("Resolve {name} from pod {pod}"),
        &format!("nslookup {name}"),
        "Check that cluster DNS answers from inside the pod",
    );
}

fn plan_http(plan: &mut StepPlan<'_>, target: &Target) {
    let ns = &target.namespace;
    let Some(pod) = target.pod_name() else {
        plan.list_pods(ns);
        return;
    };

    let probe = &plan.config().probe;
    let url = target
        .destination
        .clone()
        .unwrap_or_else(|| probe.http_url.clone());
    let max_time = target.duration_secs.unwrap_or(probe.http_timeout_secs);

    plan.verify_pod(pod, ns);
    plan.exec_bounded(
        pod,
        ns,
        format!("Request {url} from pod {pod}"),
        &format!("curl -sS -I --max-time {max_time} {url}"),
        "Check that the endpoint answers HTTP from inside the pod",
        max_time,
    );
}

fn plan_netstat(plan: &mut StepPlan<'_>, target: &Target) {
    let ns = &target.namespace;
    let Some(pod) = target.pod_name() else {
        plan.list_pods(ns);
        return;
    };

    plan.verify_pod(pod, ns);
    plan.exec(
        pod,
        ns,
        format!("List listening sockets in pod {pod}"),
        "netstat -tulpn",
        "See which ports the pod listens on",
    );
    plan.exec(
        pod,
        ns,
        format!("Show protocol statistics in pod {pod}"),
        "netstat -s",
        "Spot retransmissions, resets and dropped packets",
    );
}

fn plan_general(plan: &mut StepPlan<'_>, target: &Target) {
    let ns = &target.namespace;
    plan.list_pods(ns);
    plan.push(
        StepKind::ListServices,
        format!("List services in namespace {ns}"),
        format!("get services -n {ns}"),
        "Show how workloads are exposed",
    );
    if let Some(pod) = target.pod_name() {
        plan.push(
            StepKind::DescribePod,
            format!("Describe pod {pod}"),
            format!("describe pod {pod} -n {ns}"),
            "Inspect the pod named in the query",
        );
    }
}

/// Reduces a URL to its host; plain hosts pass through.
fn host_of(destination: &str) -> String {
    let rest = destination
        .split_once("://")
        .map_or(destination, |(_, rest)| rest);
    let host = rest.split(['/', '?']).next().unwrap_or(rest);
    let host = host.rsplit_once(':').map_or(host, |(h, port)| {
        if port.chars().all(|c| c.is_ascii_digit()) {
            h
        } else {
            host
        }
    });
    host.to_string()
}
