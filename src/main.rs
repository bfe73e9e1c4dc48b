// SPDX-FileCopyrightText: Copyright (c) 2025 The mlflow-run Authors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context as _;
use clap::Parser;

use mlflow_run::{logging, Flags};

fn main() -> anyhow::Result<()> {
    let flags = Flags::parse();

    // Set log level based on verbosity flag
    let log_level = match flags.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    if log_level != "info" {
        std::env::set_var("MLFLOW_RUN_LOG", log_level);
    }
    logging::init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    let code = runtime.block_on(mlflow_run::run(flags))?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
