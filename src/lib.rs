// SPDX-FileCopyrightText: Copyright (c) 2025 The mlflow-run Authors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! mlflow-run launches the MLflow tracking server with the integrated AI
//! gateway and forwards its exit code. The gateway itself (SQL-backed
//! endpoint storage, provider routing, OpenAI/Anthropic-compatible
//! translation, web UI at `/#/gateway`) lives entirely in the external
//! `mlflow` executable; this crate only resolves configuration and
//! supervises the process.

use std::path::PathBuf;

use anyhow::Context as _;

pub mod config;
mod flags;
pub mod logging;
mod subprocess;

pub use config::ServerConfig;
pub use flags::Flags;
pub use subprocess::{MlflowSpawner, ServerCommand, ServerOutcome, ServerSpawner};

/// Resolve configuration, create the colocated artifact directory, then hand
/// the assembled command to the real spawner and wait. Returns the exit code
/// the launcher process should finish with.
pub async fn run(flags: Flags) -> anyhow::Result<i32> {
    run_with(flags, &MlflowSpawner).await
}

/// `run` with the process-start capability injected.
pub async fn run_with(flags: Flags, spawner: &dyn ServerSpawner) -> anyhow::Result<i32> {
    let dir = launcher_dir()?;
    config::ensure_local_artifact_dir(&dir)?;
    let config = ServerConfig::from_env(&dir)?;

    tracing::info!("Starting MLflow server with AI gateway");
    tracing::info!("Host: {}:{}", config.host, config.port);
    tracing::info!("Backend store: {}", config.backend_store_uri);
    tracing::info!("Artifact root: {}", config.default_artifact_root.display());
    tracing::info!("Gateway UI: http://{}:{}/#/gateway", config.host, config.port);
    tracing::info!("API docs: http://{}:{}/docs", config.host, config.port);

    let command = ServerCommand::build(&flags.mlflow_bin, &config);
    tracing::info!("Command: {command}");

    let outcome = spawner.run(&command).await?;
    Ok(exit_code(outcome))
}

/// Map the child's outcome to the launcher's own exit code, logging as we
/// go. Interrupt is a clean shutdown, not an error.
pub fn exit_code(outcome: ServerOutcome) -> i32 {
    match outcome {
        ServerOutcome::Exited(0) => 0,
        ServerOutcome::Exited(code) => {
            tracing::error!("MLflow server failed with exit code {code}");
            code
        }
        ServerOutcome::Interrupted => {
            tracing::info!("Server shutdown requested");
            0
        }
    }
}

/// Directory holding the launcher executable. The default backend store and
/// artifact root are colocated with it.
fn launcher_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("resolving launcher executable path")?;
    let dir = exe
        .parent()
        .context("launcher executable has no parent directory")?;
    Ok(dir.to_path_buf())
}
