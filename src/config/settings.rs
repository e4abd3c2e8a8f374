use crate::config::toml_config::{
    write_file, DraftDefaults, FileConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECONDS,
};
use crate::core::retry::RetryConfig;
use crate::utils::error::{Result, TypefullyError};
use crate::utils::output::OutputFormat;
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

pub const API_KEY_ENV: &str = "TYPEFULLY_API_KEY";

/// Where the effective API key was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    Flag,
    Environment,
    File,
    Missing,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            KeySource::Flag => "--api-key flag",
            KeySource::Environment => API_KEY_ENV,
            KeySource::File => "settings file",
            KeySource::Missing => "not configured",
        };
        f.write_str(label)
    }
}

/// Values given on the command line; they win over the environment and the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub format: Option<OutputFormat>,
}

/// Connection settings consumed by the HTTP client.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub path: PathBuf,
    pub api: ApiSettings,
    pub key_source: KeySource,
    pub output_format: OutputFormat,
    pub log_json: bool,
    pub draft_defaults: DraftDefaults,
}

impl Settings {
    /// Merges flags, the `TYPEFULLY_API_KEY` value (passed in by the caller) and the file.
    pub fn resolve(
        path: PathBuf,
        file: &FileConfig,
        overrides: Overrides,
        env_api_key: Option<String>,
    ) -> Result<Self> {
        file.validate()?;

        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let (api_key, key_source) = if let Some(key) = non_empty(overrides.api_key) {
            (Some(key), KeySource::Flag)
        } else if let Some(key) = non_empty(env_api_key) {
            (Some(key), KeySource::Environment)
        } else if let Some(key) = file.api_key() {
            (Some(key.to_string()), KeySource::File)
        } else {
            (None, KeySource::Missing)
        };

        let base_url = overrides
            .base_url
            .or_else(|| file.api.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        validate_url("base_url", &base_url)?;

        let retry = match &file.retry {
            Some(r) => {
                let defaults = RetryConfig::default();
                RetryConfig {
                    max_retries: r.max_retries.unwrap_or(defaults.max_retries),
                    base_delay_ms: r.base_delay_ms.unwrap_or(defaults.base_delay_ms),
                    max_delay_ms: r.max_delay_ms.unwrap_or(defaults.max_delay_ms),
                    jitter: r.jitter.unwrap_or(defaults.jitter),
                }
            }
            None => RetryConfig::default(),
        };

        Ok(Self {
            path,
            api: ApiSettings {
                api_key,
                base_url,
                timeout_seconds: file.api.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
                retry,
            },
            key_source,
            output_format: overrides
                .format
                .or_else(|| file.output.as_ref().and_then(|o| o.format))
                .unwrap_or_default(),
            log_json: file.logging.as_ref().and_then(|l| l.json).unwrap_or(false),
            draft_defaults: file.defaults.unwrap_or_default(),
        })
    }

    /// Loads the file at `path` (or the default location) and reads the environment.
    pub fn load(path: Option<PathBuf>, overrides: Overrides) -> Result<Self> {
        let path = match path {
            Some(p) => p,
            None => FileConfig::default_path()?,
        };
        let file = FileConfig::load_or_default(&path)?;
        Self::resolve(path, &file, overrides, std::env::var(API_KEY_ENV).ok())
    }

    /// Human-readable summary with the key masked.
    pub fn describe(&self) -> String {
        let key = self
            .api
            .api_key
            .as_deref()
            .map(mask_key)
            .unwrap_or_else(|| "-".to_string());
        let r = &self.api.retry;

        [
            format!("settings file:   {}", self.path.display()),
            format!("api key:         {} ({})", key, self.key_source),
            format!("base url:        {}", self.api.base_url),
            format!("timeout:         {}s", self.api.timeout_seconds),
            format!(
                "retry:           {} retries, {}-{}ms backoff, jitter {}",
                r.max_retries, r.base_delay_ms, r.max_delay_ms, r.jitter
            ),
            format!("output format:   {}", self.output_format),
            format!("json logs:       {}", self.log_json),
            format!(
                "draft defaults:  threadify={} share={} auto_retweet={} auto_plug={}",
                self.draft_defaults.threadify,
                self.draft_defaults.share,
                self.draft_defaults.auto_retweet,
                self.draft_defaults.auto_plug
            ),
        ]
        .join("\n")
    }
}

/// Keeps the first four characters and hides the rest.
pub fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    let hidden = key.chars().count().saturating_sub(4);
    format!("{}{}", visible, "*".repeat(hidden))
}

/// Stores `key` in the settings file at `path`, keeping every other value as
/// written, `${VAR}` references included.
pub fn store_api_key(path: &std::path::Path, key: &str) -> Result<()> {
    validate_non_empty_string("api.key", key)?;

    let mut table = if path.exists() {
        std::fs::read_to_string(path)?
            .parse::<toml::Table>()
            .map_err(|e| TypefullyError::config(format!("TOML parsing error: {}", e)))?
    } else {
        toml::Table::new()
    };

    let api = table
        .entry("api")
        .or_insert_with(|| toml::Value::Table(toml::Table::new()))
        .as_table_mut()
        .ok_or_else(|| TypefullyError::config("'api' in the settings file is not a table"))?;
    api.insert("key".to_string(), toml::Value::String(key.trim().to_string()));

    let content = toml::to_string_pretty(&table)
        .map_err(|e| TypefullyError::config(format!("Cannot serialize settings: {}", e)))?;
    write_file(path, &content)
}
