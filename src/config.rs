// SPDX-FileCopyrightText: Copyright (c) 2025 The mlflow-run Authors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Bind address used when `HOST` is unset
const DEFAULT_HOST: &str = "0.0.0.0";

/// Bind port used when `PORT` is unset
const DEFAULT_PORT: u16 = 8000;

/// Name of the artifact directory kept next to the launcher
const ARTIFACTS_DIR: &str = "mlartifacts";

/// Everything the launcher forwards to `mlflow server`, resolved once per
/// invocation.
///
/// Defaults for the backend store and artifact root are colocated with the
/// launcher executable: `sqlite:///<dir>/mlflow.db` and `<dir>/mlartifacts`.
/// SQLite keeps a fresh deployment self-contained; point
/// `MLFLOW_BACKEND_STORE_URI` at PostgreSQL in production.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Connection string for the tracking metadata store.
    pub backend_store_uri: String,
    /// Where the server keeps binary artifacts. Forwarded verbatim; may be
    /// a remote URI.
    pub default_artifact_root: PathBuf,
    /// Worker count, forwarded verbatim. Empty counts as unset.
    #[serde(default, deserialize_with = "workers_from_scalar")]
    pub workers: Option<String>,
}

/// figment's `Env` provider parses values, so `MLFLOW_WORKERS=4` arrives as
/// a number rather than a string. The count is only ever forwarded verbatim,
/// so accept any scalar and render it back to a string.
fn workers_from_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Visitor};
    use std::fmt;

    struct Scalar;

    impl<'de> Visitor<'de> for Scalar {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a worker count")
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_bool<E: Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    struct MaybeScalar;

    impl<'de> Visitor<'de> for MaybeScalar {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an optional worker count")
        }

        fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, d: D2) -> Result<Self::Value, D2::Error>
        where
            D2: serde::Deserializer<'de>,
        {
            d.deserialize_any(Scalar).map(Some)
        }
    }

    deserializer.deserialize_option(MaybeScalar)
}

impl ServerConfig {
    /// Read the configuration from the environment, falling back to defaults
    /// computed relative to `launcher_dir`. `HOST` and `PORT` are read as-is;
    /// the remaining variables carry the `MLFLOW_` prefix
    /// (`MLFLOW_BACKEND_STORE_URI`, `MLFLOW_DEFAULT_ARTIFACT_ROOT`,
    /// `MLFLOW_WORKERS`).
    pub fn from_env(launcher_dir: &Path) -> anyhow::Result<Self> {
        Figment::new()
            .merge(Serialized::defaults(Self::defaults_in(launcher_dir)))
            .merge(Env::raw().only(&["host", "port"]))
            .merge(Env::prefixed("MLFLOW_").only(&[
                "backend_store_uri",
                "default_artifact_root",
                "workers",
            ]))
            .extract()
            .context("resolving server configuration from environment")
    }

    fn defaults_in(dir: &Path) -> Self {
        ServerConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            backend_store_uri: format!("sqlite:///{}", dir.join("mlflow.db").display()),
            default_artifact_root: dir.join(ARTIFACTS_DIR),
            workers: None,
        }
    }

    /// The worker count to forward, if one was supplied and is non-empty.
    pub fn workers(&self) -> Option<&str> {
        self.workers.as_deref().filter(|w| !w.is_empty())
    }
}

/// Create the artifact directory colocated with the launcher if it is
/// missing. Only this directory, never parents; running twice must not fail.
/// A configured `MLFLOW_DEFAULT_ARTIFACT_ROOT` override is forwarded to the
/// server verbatim (it may be a remote URI) and is never created here.
pub fn ensure_local_artifact_dir(launcher_dir: &Path) -> anyhow::Result<PathBuf> {
    let dir = launcher_dir.join(ARTIFACTS_DIR);
    match std::fs::create_dir(&dir) {
        Ok(()) => Ok(dir),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(dir),
        Err(e) => Err(e).with_context(|| format!("creating artifact directory {}", dir.display())),
    }
}

/// Check if a string is truthy
/// This will be used to evaluate environment variables or any other subjective
/// configuration parameters that can be set by the user that should be
/// evaluated as a boolean value.
pub fn is_truthy(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "1" | "true" | "on" | "yes")
}

/// Check if an environment variable is truthy
pub fn env_is_truthy(env: &str) -> bool {
    match std::env::var(env) {
        Ok(val) => is_truthy(val.as_str()),
        Err(_) => false,
    }
}

/// Whether log output should be JSON lines instead of the readable format.
/// Set the `MLFLOW_RUN_LOG_JSONL` environment variable to a [`is_truthy`] value
pub fn jsonl_logging_enabled() -> bool {
    env_is_truthy("MLFLOW_RUN_LOG_JSONL")
}

/// Whether ANSI terminal escape codes and colors are disabled.
/// Set the `MLFLOW_RUN_DISABLE_ANSI` environment variable to a [`is_truthy`] value
pub fn disable_ansi_logging() -> bool {
    env_is_truthy("MLFLOW_RUN_DISABLE_ANSI")
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_colocated_with_launcher() {
        Jail::expect_with(|_jail| {
            let config = ServerConfig::from_env(Path::new("/opt/mlflow-run")).unwrap();

            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.port, 8000);
            assert_eq!(
                config.backend_store_uri,
                "sqlite:////opt/mlflow-run/mlflow.db"
            );
            assert_eq!(
                config.default_artifact_root,
                PathBuf::from("/opt/mlflow-run/mlartifacts")
            );
            assert_eq!(config.workers(), None);
            Ok(())
        });
    }

    #[test]
    fn test_port_override_keeps_default_host() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "9000");

            let config = ServerConfig::from_env(Path::new("/opt/mlflow-run")).unwrap();
            assert_eq!(config.port, 9000);
            assert_eq!(config.host, "0.0.0.0");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("HOST", "127.0.0.1");
            jail.set_env("PORT", "5000");
            jail.set_env(
                "MLFLOW_BACKEND_STORE_URI",
                "postgresql://mlflow@db/mlflow",
            );
            jail.set_env("MLFLOW_DEFAULT_ARTIFACT_ROOT", "s3://bucket/artifacts");
            jail.set_env("MLFLOW_WORKERS", "4");

            let config = ServerConfig::from_env(Path::new("/opt/mlflow-run")).unwrap();
            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 5000);
            assert_eq!(config.backend_store_uri, "postgresql://mlflow@db/mlflow");
            assert_eq!(
                config.default_artifact_root,
                PathBuf::from("s3://bucket/artifacts")
            );
            assert_eq!(config.workers(), Some("4"));
            Ok(())
        });
    }

    #[test]
    fn test_numeric_workers_resolves_to_string() {
        Jail::expect_with(|jail| {
            jail.set_env("MLFLOW_WORKERS", "4");

            let config = ServerConfig::from_env(Path::new("/opt/mlflow-run")).unwrap();
            assert_eq!(config.workers(), Some("4"));
            Ok(())
        });
    }

    #[test]
    fn test_remote_artifact_root_is_forwarded_untouched() {
        Jail::expect_with(|jail| {
            jail.set_env("MLFLOW_DEFAULT_ARTIFACT_ROOT", "s3://bucket/artifacts");

            let config = ServerConfig::from_env(Path::new("/opt/mlflow-run")).unwrap();
            assert_eq!(
                config.default_artifact_root,
                PathBuf::from("s3://bucket/artifacts")
            );
            Ok(())
        });
    }

    #[test]
    fn test_empty_workers_counts_as_unset() {
        Jail::expect_with(|jail| {
            jail.set_env("MLFLOW_WORKERS", "");

            let config = ServerConfig::from_env(Path::new("/opt/mlflow-run")).unwrap();
            assert_eq!(config.workers(), None);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_port_fails_fast() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "not-a-port");

            assert!(ServerConfig::from_env(Path::new("/opt/mlflow-run")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_local_artifact_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();

        let created = ensure_local_artifact_dir(dir.path()).unwrap();
        assert_eq!(created, dir.path().join("mlartifacts"));
        assert!(created.is_dir());

        // Second run must not fail
        ensure_local_artifact_dir(dir.path()).unwrap();
        assert!(created.is_dir());
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("on"));
        assert!(is_truthy("yes"));

        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("maybe"));
    }

    #[test]
    fn test_jsonl_logging_toggle() {
        temp_env::with_vars(
            vec![("MLFLOW_RUN_LOG_JSONL", Some("1"))],
            || assert!(jsonl_logging_enabled()),
        );
        temp_env::with_vars(
            vec![("MLFLOW_RUN_LOG_JSONL", None::<&str>)],
            || assert!(!jsonl_logging_enabled()),
        );
    }
}
