//! ngspice process runner.
//!
//! Each run writes the deck into a fresh temporary directory and invokes
//! ngspice in batch mode with a rawfile output.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::engine::SpiceEngine;
use crate::error::EngineError;
use crate::ngspice::rawfile::parse_rawfile;
use crate::ngspice::types::RawfileData;

const DECK_FILE: &str = "circuit.cir";
const RAW_FILE: &str = "circuit.raw";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NgspiceConfig {
    /// Path to the ngspice executable (default: `ngspice` in PATH).
    pub executable: String,
    pub timeout_secs: u64,
}

impl Default for NgspiceConfig {
    fn default() -> Self {
        Self {
            executable: "ngspice".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NgspiceEngine {
    config: NgspiceConfig,
}

impl NgspiceEngine {
    pub fn new(config: NgspiceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NgspiceConfig {
        &self.config
    }

    pub async fn is_available(&self) -> bool {
        self.version().await.is_ok()
    }

    fn spawn_error(&self, err: std::io::Error) -> EngineError {
        if err.kind() == ErrorKind::NotFound {
            EngineError::NgspiceNotFound(format!("'{}' is not on PATH", self.config.executable))
        } else {
            EngineError::ExecutionFailed(format!(
                "failed to start '{}': {}",
                self.config.executable, err
            ))
        }
    }

    async fn run_command(&self, command: &mut Command) -> Result<std::process::Output, EngineError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| self.spawn_error(e))?;
        let timeout = Duration::from_secs(self.config.timeout_secs);

        // Dropping the pending future on timeout kills the child.
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => Ok(output?),
            Err(_) => {
                warn!("ngspice exceeded {}s, killing it", self.config.timeout_secs);
                Err(EngineError::Timeout(self.config.timeout_secs))
            }
        }
    }
}

fn output_text(output: &std::process::Output) -> String {
    format!(
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout).trim(),
        String::from_utf8_lossy(&output.stderr).trim()
    )
}

/// Pull the version banner out of `ngspice --version` output.
fn parse_version(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find(|line| line.to_lowercase().contains("ngspice"))
        .map(|line| line.trim_matches(|c: char| c == '*' || c.is_whitespace()).to_string())
        .filter(|line| !line.is_empty())
}

#[async_trait]
impl SpiceEngine for NgspiceEngine {
    fn name(&self) -> &str {
        "ngspice"
    }

    async fn run(&self, deck: &str) -> Result<RawfileData, EngineError> {
        let workdir = tempfile::tempdir()?;
        let deck_path = workdir.path().join(DECK_FILE);
        let raw_path = workdir.path().join(RAW_FILE);
        tokio::fs::write(&deck_path, deck).await?;

        debug!("Running ngspice on {}", deck_path.display());
        let output = self
            .run_command(
                Command::new(&self.config.executable)
                    .current_dir(workdir.path())
                    .arg("-b")
                    .arg("-r")
                    .arg(&raw_path)
                    .arg(&deck_path),
            )
            .await?;

        if !output.status.success() {
            return Err(EngineError::ExecutionFailed(format!(
                "ngspice exited with {}\n{}",
                output.status,
                output_text(&output)
            )));
        }

        // ngspice can exit cleanly after a failed analysis, leaving no rawfile.
        let raw = match tokio::fs::read(&raw_path).await {
            Ok(raw) if !raw.is_empty() => raw,
            _ => {
                return Err(EngineError::ExecutionFailed(format!(
                    "ngspice produced no results\n{}",
                    output_text(&output)
                )))
            }
        };

        let data = parse_rawfile(&raw)?;
        debug!(
            "ngspice returned plot '{}' with {} variables and {} points",
            data.header.plotname, data.header.num_variables, data.header.num_points
        );
        Ok(data)
    }

    async fn version(&self) -> Result<String, EngineError> {
        let output = self
            .run_command(Command::new(&self.config.executable).arg("--version"))
            .await?;
        if !output.status.success() {
            return Err(EngineError::NgspiceNotFound("--version failed".to_string()));
        }
        Ok(parse_version(&String::from_utf8_lossy(&output.stdout))
            .unwrap_or_else(|| "unknown".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NgspiceConfig::default();
        assert_eq!(config.executable, "ngspice");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_parse_version() {
        let banner = "******\n** ngspice-42 : Circuit level simulation program\n** Compiled with KLU\n";
        assert_eq!(
            parse_version(banner).as_deref(),
            Some("ngspice-42 : Circuit level simulation program")
        );
        assert_eq!(parse_version("nothing here"), None);
    }

    #[tokio::test]
    async fn test_missing_executable_reports_not_found() {
        let engine = NgspiceEngine::new(NgspiceConfig {
            executable: "definitely-not-ngspice-7f3a".to_string(),
            timeout_secs: 5,
        });
        let err = engine.run("t\n.op\n.end\n").await.unwrap_err();
        assert!(matches!(err, EngineError::NgspiceNotFound(_)));
        assert!(!engine.is_available().await);
    }

    #[tokio::test]
    #[ignore] // Requires ngspice to be installed
    async fn test_run_voltage_divider() {
        let engine = NgspiceEngine::default();
        if !engine.is_available().await {
            return;
        }

        let deck = "Voltage Divider\nV1 1 0 DC 10\nR1 1 2 1k\nR2 2 0 1k\n.op\n.end\n";
        let data = engine.run(deck).await.unwrap();
        let v2 = data.find_variable("v(2)").unwrap();
        assert!((data.first_value(v2.index).unwrap() - 5.0).abs() < 1e-6);
    }
}
