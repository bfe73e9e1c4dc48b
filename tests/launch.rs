// SPDX-FileCopyrightText: Copyright (c) 2025 The mlflow-run Authors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Exit-status propagation through the real spawner, using `sh` as a
//! stand-in for the mlflow executable.

use std::path::PathBuf;

use mlflow_run::{MlflowSpawner, ServerCommand, ServerOutcome, ServerSpawner};

fn sh(script: &str) -> ServerCommand {
    ServerCommand {
        program: PathBuf::from("sh"),
        args: vec!["-c".to_string(), script.to_string()],
    }
}

#[tokio::test]
async fn clean_exit_reports_code_zero() {
    let outcome = MlflowSpawner.run(&sh("exit 0")).await.unwrap();
    assert_eq!(outcome, ServerOutcome::Exited(0));
}

#[tokio::test]
async fn failure_code_is_reported_verbatim() {
    let outcome = MlflowSpawner.run(&sh("exit 3")).await.unwrap();
    assert_eq!(outcome, ServerOutcome::Exited(3));
}

#[tokio::test]
async fn signal_killed_child_reports_code_one() {
    // kill -9 $$ leaves no exit code on the child
    let outcome = MlflowSpawner.run(&sh("kill -9 $$")).await.unwrap();
    assert_eq!(outcome, ServerOutcome::Exited(1));
}

#[tokio::test]
async fn missing_executable_is_a_spawn_error() {
    let command = ServerCommand {
        program: PathBuf::from("/nonexistent/mlflow"),
        args: vec!["server".to_string()],
    };
    let err = MlflowSpawner.run(&command).await.unwrap_err();
    assert!(err.to_string().contains("Failed running"));
}
