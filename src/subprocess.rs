// SPDX-FileCopyrightText: Copyright (c) 2025 The mlflow-run Authors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context as _;
use async_trait::async_trait;

use crate::config::ServerConfig;

/// A fully assembled `mlflow server` invocation.
///
/// Building one is pure so the flag layout can be checked without spawning
/// anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ServerCommand {
    /// Assemble the argument list. Flag order is stable:
    /// `server --host --port --backend-store-uri --default-artifact-root
    /// --serve-artifacts [--workers]`, with `--workers` present only when a
    /// non-empty worker count was configured.
    pub fn build(mlflow_bin: &Path, config: &ServerConfig) -> Self {
        let mut args = vec![
            "server".to_string(),
            "--host".to_string(),
            config.host.clone(),
            "--port".to_string(),
            config.port.to_string(),
            "--backend-store-uri".to_string(),
            config.backend_store_uri.clone(),
            "--default-artifact-root".to_string(),
            config.default_artifact_root.to_string_lossy().to_string(),
            "--serve-artifacts".to_string(),
        ];
        if let Some(workers) = config.workers() {
            args.push("--workers".to_string());
            args.push(workers.to_string());
        }
        ServerCommand {
            program: mlflow_bin.to_path_buf(),
            args,
        }
    }
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program.display(), self.args.join(" "))
    }
}

/// What the child process came to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerOutcome {
    /// The server terminated on its own with this exit code. A child killed
    /// by a signal carries no code and is reported as 1.
    Exited(i32),
    /// Ctrl-C arrived while we were waiting on the child.
    Interrupted,
}

/// Process start as an injectable capability, so argument assembly and
/// exit-status propagation are testable without a real `mlflow` on PATH.
#[async_trait]
pub trait ServerSpawner: Send + Sync {
    /// Run `command` to completion and report how it ended.
    async fn run(&self, command: &ServerCommand) -> anyhow::Result<ServerOutcome>;
}

/// Spawns the real server with inherited stdio and waits, racing the wait
/// against Ctrl-C. The child owns the console for its lifetime.
pub struct MlflowSpawner;

#[async_trait]
impl ServerSpawner for MlflowSpawner {
    async fn run(&self, command: &ServerCommand) -> anyhow::Result<ServerOutcome> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed running: '{command}'"))?;

        tokio::select! {
            status = child.wait() => {
                let status = status.context("waiting on mlflow server")?;
                Ok(ServerOutcome::Exited(status.code().unwrap_or(1)))
            }
            _ = tokio::signal::ctrl_c() => {
                // Sharing a process group, the child got the SIGINT too and
                // is shutting itself down.
                Ok(ServerOutcome::Interrupted)
            }
        }
    }
}
