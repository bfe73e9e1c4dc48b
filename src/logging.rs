// SPDX-FileCopyrightText: Copyright (c) 2025 The mlflow-run Authors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Launcher logging.
//!
//! Output is `READABLE` (compact, UTC timestamps) by default; JSON lines can
//! be enabled by setting the `MLFLOW_RUN_LOG_JSONL` environment variable to
//! a truthy value. Filters are configured through the `MLFLOW_RUN_LOG`
//! environment variable; the default level is `info`.

use std::sync::Once;

use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{disable_ansi_logging, jsonl_logging_enabled};

/// ENV used to set the log level
const FILTER_ENV: &str = "MLFLOW_RUN_LOG";

/// Default log level
const DEFAULT_FILTER_LEVEL: &str = "info";

/// Once instance to ensure the logger is only initialized once
static INIT: Once = Once::new();

/// Initialize the logger
pub fn init() {
    INIT.call_once(setup_logging);
}

fn setup_logging() {
    let f = filters();
    // The builder generics differ per shape, so each branch is spelled out.
    if jsonl_logging_enabled() {
        let l = fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .with_filter(f);
        tracing_subscriber::registry().with(l).init();
    } else {
        let l = fmt::layer()
            .with_ansi(!disable_ansi_logging())
            .event_format(fmt::format().compact().with_timer(UtcTimer))
            .with_writer(std::io::stderr)
            .with_filter(f);
        tracing_subscriber::registry().with(l).init();
    }
}

fn filters() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(DEFAULT_FILTER_LEVEL.parse().unwrap())
        .with_env_var(FILTER_ENV)
        .from_env_lossy()
}

struct UtcTimer;

impl FormatTime for UtcTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ")
        )
    }
}
