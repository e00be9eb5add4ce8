//! The troubleshooting pipeline.
//!
//! [`Troubleshooter`] classifies a query, extracts its target, plans the
//! workflow, executes every step in order, parses the output and, for pod
//! diagnostics, synthesizes a root cause. A run never aborts: failed steps
//! are recorded and the remaining steps still execute.

use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DiagnoseConfig;
use crate::executor::StepExecutor;
use crate::formatter::format_run_report;
use crate::intent;
use crate::parser::{extract_issues, pod_status};
use crate::planner;
use crate::synthesizer::synthesize;
use crate::target::extract_with_default;
use crate::types::{
    any_succeeded, Classification, DiagnosticResult, Run, StepKind, StepResult, Target,
    WorkflowStep, WorkflowType,
};

/// Minimum executed steps before a pod diagnosis is synthesized.
const MIN_RESULTS_FOR_DIAGNOSIS: usize = 2;

/// What a query resolves to before anything is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    /// Classifier verdict.
    pub classification: Classification,
    /// Extracted target.
    pub target: Target,
    /// Steps that would run.
    pub steps: Vec<WorkflowStep>,
}

/// Runs diagnostic workflows against a cluster through a [`StepExecutor`].
///
/// Holds only configuration and the executor, so one instance can serve
/// concurrent callers through `&self`.
#[derive(Debug)]
pub struct Troubleshooter<E> {
    config: DiagnoseConfig,
    executor: E,
}

impl<E: StepExecutor> Troubleshooter<E> {
    /// Creates a troubleshooter.
    #[must_use]
    pub const fn new(config: DiagnoseConfig, executor: E) -> Self {
        Self { config, executor }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &DiagnoseConfig {
        &self.config
    }

    /// The executor in use.
    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Classifies a query without running anything.
    #[must_use]
    pub fn classify(&self, query: &str) -> Classification {
        intent::classify(query)
    }

    /// Resolves a query into its classification, target and steps.
    ///
    /// Non-diagnostic queries plan the general workflow.
    #[must_use]
    pub fn plan(&self, query: &str) -> QueryPlan {
        let classification = self.classify(query);
        let target = extract_with_default(query, &self.config.default_namespace);
        let steps = planner::plan(classification.workflow, &target, &self.config);

        QueryPlan {
            classification,
            target,
            steps,
        }
    }

    /// Answers a query end to end.
    pub async fn run(&self, query: &str) -> Run {
        let started_at = Utc::now();
        let start = Instant::now();

        let QueryPlan {
            classification,
            target,
            steps,
        } = self.plan(query);
        let workflow = classification.workflow;

        if !classification.is_diagnostic {
            debug!(query, "query is not diagnostic, running general workflow");
        }

        let mut results = Vec::with_capacity(steps.len());
        for step in &steps {
            results.push(self.execute_step(step).await);
        }

        let diagnostic = (workflow == WorkflowType::PodDiagnostics
            && results.len() >= MIN_RESULTS_FOR_DIAGNOSIS)
            .then(|| diagnose(&steps, &results));

        let success = any_succeeded(&results);
        let mut run = Run {
            id: Uuid::new_v4(),
            query: query.to_string(),
            workflow_type: workflow,
            target,
            steps,
            results,
            diagnostic,
            summary: String::new(),
            success,
            started_at,
            duration_ms: 0,
        };
        run.summary = format_run_report(&run, self.config.output_preview_chars);
        run.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            run_id = %run.id,
            workflow = %run.workflow_type,
            steps = run.steps.len(),
            failed = run.failed_steps(),
            success = run.success,
            duration_ms = run.duration_ms,
            "diagnostic run finished"
        );

        run
    }

    async fn execute_step(&self, step: &WorkflowStep) -> StepResult {
        debug!(step = step.ordinal, command = %step.command, "running step");
        let output = match step.deadline() {
            Some(deadline) => {
                self.executor
                    .execute_with_deadline(&step.command, deadline)
                    .await
            }
            None => self.executor.execute(&step.command).await,
        };

        if output.exit_code != 0 {
            warn!(
                step = step.ordinal,
                command = %step.command,
                exit_code = output.exit_code,
                error = output.error.as_deref().unwrap_or(""),
                "step failed"
            );
        }

        StepResult {
            command: step.command.clone(),
            output: output.output,
            exit_code: output.exit_code,
            duration_ms: output.duration_ms,
            error: output.error,
            timestamp: Utc::now(),
        }
    }
}

/// Parses every step and synthesizes the pod diagnosis.
fn diagnose(steps: &[WorkflowStep], results: &[StepResult]) -> DiagnosticResult {
    let issues = steps
        .iter()
        .zip(results)
        .flat_map(|(step, result)| extract_issues(step, result))
        .collect();

    let status = steps
        .iter()
        .zip(results)
        .filter(|(step, result)| {
            matches!(step.kind, StepKind::PodStatus | StepKind::ListPods) && result.is_success()
        })
        .find_map(|(_, result)| pod_status(&result.output));

    synthesize(issues, status)
}
