use anyhow::{anyhow, Context};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_API_URL: &str = "KOMPETENSI_API_URL";
const ENV_TIMEOUT_MS: &str = "KOMPETENSI_TIMEOUT_MS";
const ENV_WORKSPACE: &str = "KOMPETENSI_WORKSPACE";
const ENV_LOG: &str = "KOMPETENSI_LOG";
const ENV_LOG_DIR: &str = "KOMPETENSI_LOG_DIR";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub api_base_url: String,
    #[serde(serialize_with = "duration_ms")]
    pub request_timeout: Duration,
    pub workspace: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

fn duration_ms<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            workspace: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup` so tests can feed a fixed map.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_API_URL) {
            cfg.api_base_url = normalize_base_url(&url)?;
        }
        if let Some(raw) = non_empty(ENV_TIMEOUT_MS) {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_MS} must be a whole number of milliseconds"))?;
            if ms == 0 {
                return Err(anyhow!("{ENV_TIMEOUT_MS} must be > 0"));
            }
            cfg.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ws) = non_empty(ENV_WORKSPACE) {
            cfg.workspace = Some(PathBuf::from(ws));
        }
        if let Some(level) = non_empty(ENV_LOG) {
            cfg.log_level = level.trim().to_ascii_lowercase();
        }
        if let Some(dir) = non_empty(ENV_LOG_DIR) {
            cfg.log_dir = Some(PathBuf::from(dir));
        }
        Ok(cfg)
    }
}

/// Accepts `http(s)://host[:port][/prefix]` and drops trailing slashes.
pub fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| anyhow!("api base url must start with http:// or https://: {raw}"))?;
    if rest.is_empty() {
        return Err(anyhow!("api base url has no host: {raw}"));
    }
    Ok(trimmed.to_string())
}
