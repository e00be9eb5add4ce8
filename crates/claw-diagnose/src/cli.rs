//! Command-line interface for the `claw-diagnose` binary.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};

use crate::config::{ClusterCli, DiagnoseConfig};
use crate::engine::{QueryPlan, Troubleshooter};
use crate::executor::{KubectlExecutor, StepExecutor};
use crate::formatter::{format_as_json, format_summary};

/// Diagnose Kubernetes pods and pod networking from a plain-language query.
#[derive(Parser, Debug, Clone)]
#[command(name = "claw-diagnose")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, env = "CLAW_DIAGNOSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cluster CLI used for inspection commands.
    #[arg(long, value_enum)]
    pub cli: Option<ClusterCli>,

    /// Namespace used when the query names none.
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Only classify the query.
    #[arg(long, conflicts_with = "dry_run")]
    pub classify_only: bool,

    /// Print the planned steps without executing them.
    #[arg(long)]
    pub dry_run: bool,

    /// The query, e.g. "troubleshoot the httpd pod in app1 namespace".
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,
}

impl Cli {
    /// The query words joined with single spaces.
    #[must_use]
    pub fn query(&self) -> String {
        self.query.join(" ")
    }

    /// Loads configuration and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is unreadable or invalid.
    pub fn load_config(&self) -> anyhow::Result<DiagnoseConfig> {
        let mut config = match &self.config {
            Some(path) => DiagnoseConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => DiagnoseConfig::default(),
        };

        if let Some(cli) = self.cli {
            config = config.with_cli(cli);
        }
        if let Some(namespace) = &self.namespace {
            config = config.with_default_namespace(namespace.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable report.
    #[default]
    Text,
    /// JSON for scripting.
    Json,
}

/// Runs the command against a real cluster.
///
/// Returns whether the run succeeded.
///
/// # Errors
///
/// Returns an error for configuration, query or output failures.
pub async fn execute<W: Write>(cli: &Cli, out: &mut W) -> anyhow::Result<bool> {
    let config = cli.load_config()?;
    let executor = KubectlExecutor::from_config(&config);
    execute_with(cli, Troubleshooter::new(config, executor), out).await
}

/// Runs the command with the given troubleshooter.
///
/// # Errors
///
/// Returns an error for an empty query or when output cannot be written.
pub async fn execute_with<E: StepExecutor, W: Write>(
    cli: &Cli,
    troubleshooter: Troubleshooter<E>,
    out: &mut W,
) -> anyhow::Result<bool> {
    let query = cli.query();
    if query.trim().is_empty() {
        bail!("query cannot be empty");
    }

    if cli.classify_only {
        let classification = troubleshooter.classify(&query);
        match cli.format {
            Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(&classification)?)?,
            Format::Text => writeln!(
                out,
                "diagnostic: {}\nworkflow: {}",
                classification.is_diagnostic, classification.workflow
            )?,
        }
        return Ok(true);
    }

    if cli.dry_run {
        let plan = troubleshooter.plan(&query);
        match cli.format {
            Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(&plan)?)?,
            Format::Text => write_plan(out, &plan)?,
        }
        return Ok(true);
    }

    let run = troubleshooter.run(&query).await;
    match cli.format {
        Format::Json => writeln!(out, "{}", format_as_json(&run)?)?,
        Format::Text => {
            writeln!(out, "{}", run.summary)?;
            writeln!(out, "{}", format_summary(&run))?;
        }
    }

    Ok(run.success)
}

fn write_plan<W: Write>(out: &mut W, plan: &QueryPlan) -> std::io::Result<()> {
    writeln!(
        out,
        "Workflow: {} (diagnostic: {})",
        plan.classification.workflow, plan.classification.is_diagnostic
    )?;
    writeln!(
        out,
        "Target: {} in namespace {}",
        plan.target.pod_name().unwrap_or("(none)"),
        plan.target.namespace
    )?;
    for step in &plan.steps {
        writeln!(out, "{}. {}", step.ordinal, step.description)?;
        writeln!(out, "   $ {}", step.command)?;
    }
    Ok(())
}
