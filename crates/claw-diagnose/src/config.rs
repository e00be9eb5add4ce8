//! Troubleshooter configuration.
//!
//! Configuration for the diagnostic pipeline, including:
//! - Which cluster CLI the planned commands invoke
//! - Namespace fallback and log tail length
//! - Step deadline and report preview length
//! - Defaults for packet captures and in-pod network probes

use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DiagnoseError;

/// Extra time a bounded step gets on top of its planned duration, for the
/// `exec` round trip.
pub const PROBE_GRACE_SECS: u64 = 5;

/// Cluster CLI used in planned commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClusterCli {
    /// Upstream `kubectl`.
    #[default]
    Kubectl,
    /// OpenShift `oc`.
    Oc,
}

impl ClusterCli {
    /// The binary name.
    #[must_use]
    pub const fn binary(&self) -> &'static str {
        match self {
            Self::Kubectl => "kubectl",
            Self::Oc => "oc",
        }
    }
}

impl std::fmt::Display for ClusterCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

/// Defaults for `tcpdump` captures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Interface used when the query names none.
    pub interface: String,
    /// Capture duration when the query names none.
    pub duration_secs: u64,
    /// Maximum packets captured.
    pub packet_count: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: "any".to_string(),
            duration_secs: 10,
            packet_count: 100,
        }
    }
}

/// Defaults for ping, DNS and HTTP probes run inside a pod.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProbeConfig {
    /// Echo requests sent by `ping`.
    pub ping_count: u32,
    /// Host pinged when the query names none.
    pub ping_destination: String,
    /// Name resolved when the query names none.
    pub dns_name: String,
    /// URL requested when the query names none.
    pub http_url: String,
    /// `curl --max-time` when the query names no duration.
    pub http_timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ping_count: 4,
            ping_destination: "8.8.8.8".to_string(),
            dns_name: "kubernetes.default.svc.cluster.local".to_string(),
            http_url: "http://localhost:80".to_string(),
            http_timeout_secs: 10,
        }
    }
}

/// Main troubleshooter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiagnoseConfig {
    /// Cluster CLI binary.
    pub cli: ClusterCli,
    /// Namespace used when the query names none.
    pub default_namespace: String,
    /// `--tail` for log steps.
    pub log_tail_lines: u32,
    /// Deadline for a single step.
    pub step_timeout_secs: u64,
    /// Characters of raw output shown per step in reports.
    pub output_preview_chars: usize,
    /// Packet capture defaults.
    pub capture: CaptureConfig,
    /// In-pod probe defaults.
    pub probe: ProbeConfig,
}

impl Default for DiagnoseConfig {
    fn default() -> Self {
        Self {
            cli: ClusterCli::Kubectl,
            default_namespace: "default".to_string(),
            log_tail_lines: 100,
            step_timeout_secs: 30,
            output_preview_chars: 500,
            capture: CaptureConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

impl DiagnoseConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DiagnoseError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DiagnoseError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self, DiagnoseError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| DiagnoseError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), DiagnoseError> {
        if self.default_namespace.trim().is_empty() {
            return Err(DiagnoseError::config("default_namespace cannot be empty"));
        }

        if self.log_tail_lines == 0 {
            return Err(DiagnoseError::config(
                "log_tail_lines must be greater than 0",
            ));
        }

        if self.step_timeout_secs == 0 {
            return Err(DiagnoseError::config(
                "step_timeout_secs must be greater than 0",
            ));
        }

        if self.capture.interface.trim().is_empty() {
            return Err(DiagnoseError::config("capture.interface cannot be empty"));
        }

        if self.capture.duration_secs == 0 || self.capture.packet_count == 0 {
            return Err(DiagnoseError::config(
                "capture.duration_secs and capture.packet_count must be greater than 0",
            ));
        }

        if self.capture.duration_secs >= self.step_timeout_secs {
            return Err(DiagnoseError::config(
                "capture.duration_secs must be less than step_timeout_secs",
            ));
        }

        if self.probe.ping_count == 0 || self.probe.http_timeout_secs == 0 {
            return Err(DiagnoseError::config(
                "probe.ping_count and probe.http_timeout_secs must be greater than 0",
            ));
        }

        Ok(())
    }

    /// The per-step deadline.
    #[must_use]
    pub const fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    /// Overrides the cluster CLI.
    #[must_use]
    pub const fn with_cli(mut self, cli: ClusterCli) -> Self {
        self.cli = cli;
        self
    }

    /// Overrides the default namespace.
    #[must_use]
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("failed to write temp file");
        file
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DiagnoseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cli, ClusterCli::Kubectl);
        assert_eq!(config.default_namespace, "default");
        assert_eq!(config.step_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = DiagnoseConfig::from_toml("").expect("should parse empty config");
        assert_eq!(config, DiagnoseConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            cli = "oc"
            default_namespace = "openshift-monitoring"
            log_tail_lines = 200
            step_timeout_secs = 60
            output_preview_chars = 1000

            [capture]
            interface = "eth0"
            duration_secs = 5
            packet_count = 50

            [probe]
            ping_count = 2
            ping_destination = "10.0.0.1"
        "#;

        let config = DiagnoseConfig::from_toml(toml).expect("should parse full config");

        assert_eq!(config.cli, ClusterCli::Oc);
        assert_eq!(config.cli.binary(), "oc");
        assert_eq!(config.default_namespace, "openshift-monitoring");
        assert_eq!(config.log_tail_lines, 200);
        assert_eq!(config.capture.interface, "eth0");
        assert_eq!(config.capture.packet_count, 50);
        assert_eq!(config.probe.ping_count, 2);
        assert_eq!(config.probe.ping_destination, "10.0.0.1");
        // Unset probe fields keep their defaults
        assert_eq!(config.probe.http_timeout_secs, 10);
    }

    #[test]
    fn test_load_from_file() {
        let temp_file = create_temp_config("default_namespace = \"app1\"\n");
        let config = DiagnoseConfig::from_file(temp_file.path()).expect("should load from file");
        assert_eq!(config.default_namespace, "app1");
    }

    #[test]
    fn test_file_not_found() {
        let result = DiagnoseConfig::from_file("/nonexistent/path/diagnose.toml");
        assert!(matches!(result, Err(DiagnoseError::Config(_))));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let result = DiagnoseConfig::from_toml("cli = \"helm\"");
        let err = result.expect_err("unknown cli should be rejected");
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let result = DiagnoseConfig::from_toml("default_namespace = \"  \"");
        let err = result.expect_err("empty namespace should be rejected");
        assert!(err.to_string().contains("default_namespace cannot be empty"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = DiagnoseConfig::from_toml("step_timeout_secs = 0");
        assert!(result.is_err());
    }

    #[test]
    fn test_capture_longer_than_step_timeout_rejected() {
        let result = DiagnoseConfig::from_toml(
            "step_timeout_secs = 20\n[capture]\nduration_secs = 20\n",
        );
        let err = result.expect_err("capture outlasting the step should be rejected");
        assert!(err.to_string().contains("capture.duration_secs"));

        let config = DiagnoseConfig::from_toml(
            "step_timeout_secs = 20\n[capture]\nduration_secs = 15\n",
        )
        .expect("shorter capture should be accepted");
        assert_eq!(config.capture.duration_secs, 15);
    }

    #[test]
    fn test_builder_overrides() {
        let config = DiagnoseConfig::default()
            .with_cli(ClusterCli::Oc)
            .with_default_namespace("kube-system");
        assert_eq!(config.cli.to_string(), "oc");
        assert_eq!(config.default_namespace, "kube-system");
    }
}
