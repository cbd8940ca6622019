#![forbid(unsafe_code)]

//! Runtime configuration for the collector.
//!
//! Values are read from the process environment first and from a `.env` file
//! in the working directory second. Only the API key and the channel id are
//! required; everything else has a default.

use anyhow::{Context, Result, anyhow};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::persist::SnapshotPaths;
use crate::retry::RetryPolicy;

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_LISTING_EXTRA_PASSES: usize = 3;
pub const DEFAULT_FETCH_ATTEMPTS: usize = 3;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const LATEST_FILE: &str = "videos.json";
const ARCHIVE_SUBDIR: &str = "archive";

/// Everything one collector run needs, resolved up front and handed to the
/// collector at construction.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub api_key: String,
    pub channel_id: String,
    pub api_base: String,
    pub http_timeout: Duration,
    pub output: SnapshotPaths,
    pub retry: RetryPolicy,
    pub listing_extra_passes: usize,
    pub fetch_attempts: usize,
}

pub fn load_collector_config() -> Result<CollectorConfig> {
    resolve_collector_config(ConfigOverrides::default())
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub channel_id: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_collector_config(overrides: ConfigOverrides) -> Result<CollectorConfig> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    build_config_with_overrides(&file_vars, env_var_string, overrides)
}

#[cfg(test)]
fn build_config(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<CollectorConfig> {
    build_config_with_overrides(file_vars, env_lookup, ConfigOverrides::default())
}

fn build_config_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: ConfigOverrides,
) -> Result<CollectorConfig> {
    let api_key = non_blank(overrides.api_key)
        .or_else(|| lookup_value("YOUTUBE_API_KEY", file_vars, &env_lookup))
        .ok_or_else(|| anyhow!("YOUTUBE_API_KEY not set"))?;
    let channel_id = non_blank(overrides.channel_id)
        .or_else(|| lookup_value("YOUTUBE_CHANNEL_ID", file_vars, &env_lookup))
        .ok_or_else(|| anyhow!("YOUTUBE_CHANNEL_ID not set"))?;
    let api_base = lookup_value("YOUTUBE_API_BASE", file_vars, &env_lookup)
        .map(|value| value.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let output_dir = overrides
        .output_dir
        .or_else(|| lookup_value("STATS_OUTPUT_DIR", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let retry_attempts = lookup_parsed("STATS_RETRY_ATTEMPTS", file_vars, &env_lookup)
        .unwrap_or(DEFAULT_RETRY_ATTEMPTS);
    let retry_delay_ms = lookup_parsed("STATS_RETRY_DELAY_MS", file_vars, &env_lookup)
        .unwrap_or(DEFAULT_RETRY_DELAY_MS);
    let listing_extra_passes = lookup_parsed("STATS_LISTING_EXTRA_PASSES", file_vars, &env_lookup)
        .unwrap_or(DEFAULT_LISTING_EXTRA_PASSES);
    let fetch_attempts = lookup_parsed("STATS_FETCH_ATTEMPTS", file_vars, &env_lookup)
        .filter(|attempts: &usize| *attempts > 0)
        .unwrap_or(DEFAULT_FETCH_ATTEMPTS);
    let http_timeout_secs = lookup_parsed("STATS_HTTP_TIMEOUT_SECS", file_vars, &env_lookup)
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

    Ok(CollectorConfig {
        api_key,
        channel_id,
        api_base,
        http_timeout: Duration::from_secs(http_timeout_secs),
        output: SnapshotPaths {
            latest: output_dir.join(LATEST_FILE),
            archive_dir: output_dir.join(ARCHIVE_SUBDIR),
        },
        retry: RetryPolicy::exponential(retry_attempts, Duration::from_millis(retry_delay_ms)),
        listing_extra_passes,
        fetch_attempts,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_var_string(key: &str) -> Option<String> {
    non_blank(env::var(key).ok())
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key)
        .or_else(|| file_vars.get(key).cloned())
        .and_then(|value| non_blank(Some(value)))
}

fn lookup_parsed<T: std::str::FromStr>(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<T> {
    lookup_value(key, file_vars, env_lookup).and_then(|value| value.parse::<T>().ok())
}

pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value_raw.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .or_else(|| {
                value
                    .strip_prefix('\'')
                    .and_then(|value| value.strip_suffix('\''))
            })
            .unwrap_or(value);
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}
