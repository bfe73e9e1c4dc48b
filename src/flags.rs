// SPDX-FileCopyrightText: Copyright (c) 2025 The mlflow-run Authors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Almost everything comes from the environment (see `config`); flags cover
/// what an operator tweaks at the command line.
#[derive(clap::Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Flags {
    /// The mlflow executable to launch. Resolved through PATH unless given
    /// as a path.
    #[arg(long, env = "MLFLOW_BIN", default_value = "mlflow")]
    pub mlflow_bin: PathBuf,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, default_value_t = 0)]
    pub verbosity: u8,
}
