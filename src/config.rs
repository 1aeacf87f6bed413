use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::cli::CliArgs;
use crate::model::NamespaceScope;

pub const DEFAULT_SERVER: &str = "http://localhost:8080";
const DEFAULT_REFRESH_MS: u64 = 5_000;
const MIN_REFRESH_MS: u64 = 500;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, alias = "refresh", alias = "refresh_interval_ms")]
    pub refresh_ms: Option<u64>,
    #[serde(default, alias = "timeout", alias = "timeout_secs")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source: Option<String>,
    pub server: String,
    pub scope: NamespaceScope,
    pub refresh_interval: Option<Duration>,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn load(args: &CliArgs) -> Result<Self> {
        let path = match &args.config {
            Some(path) => Some(path.clone()),
            None => discover_config_path(),
        };

        let file = match &path {
            Some(path) => read_config_file(path)?,
            None => FileConfig::default(),
        };

        Ok(Self::resolve(
            args,
            file,
            path.map(|path| path.display().to_string()),
        ))
    }

    pub fn resolve(args: &CliArgs, file: FileConfig, source: Option<String>) -> Self {
        let server = args
            .server
            .clone()
            .or(file.server)
            .map(|server| server.trim().to_string())
            .filter(|server| !server.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());

        if args.all_namespaces && args.namespace.is_some() {
            warn!("both --all-namespaces and --namespace were provided, using all namespaces");
        }
        let scope = if args.all_namespaces {
            NamespaceScope::All
        } else {
            args.namespace
                .as_deref()
                .or(file.namespace.as_deref())
                .map(NamespaceScope::parse)
                .unwrap_or_default()
        };

        let refresh_ms = args
            .refresh_ms
            .or(file.refresh_ms)
            .unwrap_or(DEFAULT_REFRESH_MS);
        let refresh_interval =
            (refresh_ms > 0).then(|| Duration::from_millis(refresh_ms.max(MIN_REFRESH_MS)));

        let request_timeout = Duration::from_secs(
            file.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
                .max(1),
        );

        Self {
            source,
            server,
            scope,
            refresh_interval,
            request_timeout,
        }
    }
}

fn read_config_file(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PODGLASS_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("podglass.yaml"),
        PathBuf::from("podglass.yml"),
        PathBuf::from(".podglass.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/podglass/config.yaml"),
            PathBuf::from(&home).join(".config/podglass/config.yml"),
            PathBuf::from(&home).join(".podglass.yaml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}
