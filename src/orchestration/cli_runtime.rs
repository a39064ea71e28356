//! Docker-compatible CLI runtime
//!
//! Implements the ContainerRuntime trait by invoking `docker` (or any CLI
//! with the same `version` / `image inspect` / `pull` surface, e.g. podman).

use crate::error::{CrossgoError, CrossgoResult};
use crate::logging::{LogWriter, Logger};
use crate::orchestration::process::{describe, never_cancelled, run_command};
use crate::orchestration::runtime::ContainerRuntime;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Container runtime driven through its command line
#[derive(Debug, Clone)]
pub struct CliRuntime {
    program: String,
    global_args: Vec<String>,
}

impl CliRuntime {
    /// Create a runtime invoking `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            global_args: Vec::new(),
        }
    }

    /// Create a runtime with arguments placed before every subcommand
    pub fn with_global_args(program: impl Into<String>, global_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            global_args,
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.global_args).args(args);
        cmd
    }
}

impl Default for CliRuntime {
    fn default() -> Self {
        Self::new("docker")
    }
}

#[async_trait]
impl ContainerRuntime for CliRuntime {
    async fn check(&self, log: &dyn Logger) -> CrossgoResult<()> {
        log.println("INFO: Checking docker installation...");
        let mut sink = LogWriter::new(log);
        run_command(self.command(&["version"]), &mut sink, &mut never_cancelled())
            .await
            .map_err(|e| CrossgoError::RuntimeUnavailable {
                runtime: self.program.clone(),
                reason: e.to_string(),
            })?;
        log.println("");
        Ok(())
    }

    async fn image_exists(&self, image: &str) -> CrossgoResult<bool> {
        let mut cmd = self.command(&["image", "inspect", image]);
        debug!("Executing: {}", describe(&cmd));

        let status = cmd
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| CrossgoError::ImageInspect {
                image: image.to_string(),
                reason: e.to_string(),
            })?;
        Ok(status.success())
    }

    async fn pull(&self, image: &str, log: &dyn Logger) -> CrossgoResult<()> {
        log.printf(format_args!("INFO: Pulling {} from docker registry...", image));
        let mut sink = LogWriter::new(log);
        run_command(self.command(&["pull", image]), &mut sink, &mut never_cancelled())
            .await
            .map_err(|e| CrossgoError::ImagePull {
                image: image.to_string(),
                reason: e.to_string(),
            })
    }

    fn program(&self) -> &str {
        &self.program
    }

    fn global_args(&self) -> &[String] {
        &self.global_args
    }
}
