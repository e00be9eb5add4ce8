//! # claw-diagnose
//!
//! Query-driven troubleshooting for Kubernetes pods and pod networking.
//!
//! Given a plain-language query such as "troubleshoot the httpd pod in app1
//! namespace", the crate decides whether diagnostics are wanted, extracts the
//! target pod and namespace, plans the inspection commands for the matching
//! workflow, runs them one after another and turns their output into issues
//! and a ranked root cause.
//!
//! ## Pipeline
//!
//! - [`intent`]: is the query diagnostic, and which workflow answers it
//! - [`target`]: pod, namespace and probe parameters from the query
//! - [`planner`]: ordered `kubectl`/`oc` commands per workflow
//! - [`executor`]: runs commands; [`KubectlExecutor`] uses child processes
//! - [`parser`]: status tables, `describe`, events and logs into [`Issue`]s
//! - [`synthesizer`]: root cause, recommendation and next steps
//! - [`formatter`]: text and JSON reports
//!
//! ## Quick Start
//!
//! ```rust
//! use claw_diagnose::{classify, extract, plan, DiagnoseConfig, WorkflowType};
//!
//! let query = "troubleshoot the httpd pod in app1 namespace";
//!
//! let classification = classify(query);
//! assert_eq!(classification.workflow, WorkflowType::PodDiagnostics);
//!
//! let target = extract(query);
//! assert_eq!(target.pod_name(), Some("httpd"));
//! assert_eq!(target.namespace, "app1");
//!
//! let steps = plan(classification.workflow, &target, &DiagnoseConfig::default());
//! assert_eq!(steps.len(), 5);
//! assert_eq!(steps[0].command, "kubectl get pod httpd -n app1 -o wide");
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod intent;
pub mod parser;
pub mod planner;
pub mod synthesizer;
pub mod target;
pub mod types;

// Re-export core types for convenience
pub use types::{
    Category, Classification, DiagnosticResult, Issue, IssueKind, IssueSource, Run, Severity,
    StepKind, StepResult, Target, WorkflowStep, WorkflowType,
};

pub use config::{CaptureConfig, ClusterCli, DiagnoseConfig, ProbeConfig};
pub use engine::{QueryPlan, Troubleshooter};
pub use error::{DiagnoseError, DiagnoseResult};
pub use executor::{CommandOutput, KubectlExecutor, StepExecutor};

// Re-export the pipeline stages
pub use intent::classify;
pub use parser::extract_issues;
pub use planner::plan;
pub use synthesizer::synthesize;
pub use target::{extract, extract_with_default};

pub use formatter::{
    format_as_json, format_as_json_compact, format_pod_report, format_run_report,
    format_step_trail, format_summary,
};
