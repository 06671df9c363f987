//! Restarting the vector store so it picks up a rotated key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use utoipa::ToSchema;

pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OpsApplyMode {
    #[default]
    DockerCompose,
    Systemctl,
}

impl OpsApplyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpsApplyMode::DockerCompose => "docker_compose",
            OpsApplyMode::Systemctl => "systemctl",
        }
    }

    /// The argv that restarts `service`.
    pub fn command(&self, compose_file: &Path, service: &str) -> Vec<String> {
        match self {
            OpsApplyMode::DockerCompose => vec![
                "docker".to_string(),
                "compose".to_string(),
                "-f".to_string(),
                compose_file.display().to_string(),
                "up".to_string(),
                "-d".to_string(),
                service.to_string(),
            ],
            OpsApplyMode::Systemctl => vec![
                "systemctl".to_string(),
                "restart".to_string(),
                service.to_string(),
            ],
        }
    }
}

impl FromStr for OpsApplyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker_compose" => Ok(OpsApplyMode::DockerCompose),
            "systemctl" => Ok(OpsApplyMode::Systemctl),
            other => Err(format!(
                "'{}' is not one of docker_compose, systemctl",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub rc: i32,
    pub stdout: String,
    pub stderr: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv[0]` with the remaining arguments and capture its output.
    async fn run(&self, argv: &[String]) -> io::Result<CommandOutput>;
}

/// Runs commands as child processes, killed after [`COMMAND_TIMEOUT`].
#[derive(Clone, Debug, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, argv: &[String]) -> io::Result<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        let child = tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(COMMAND_TIMEOUT, child)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "command timed out"))??;

        Ok(CommandOutput {
            rc: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
