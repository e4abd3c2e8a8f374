use crate::utils::error::{Result, TypefullyError};
use crate::utils::output::OutputFormat;
use crate::utils::validation::{validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://api.typefully.com/v1";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Contents of `config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryFileConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DraftDefaults>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

/// Draft flags applied when the command line does not set them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftDefaults {
    #[serde(default)]
    pub threadify: bool,
    #[serde(default)]
    pub share: bool,
    #[serde(default)]
    pub auto_retweet: bool,
    #[serde(default)]
    pub auto_plug: bool,
}

const TEMPLATE: &str = r#"# Typefully CLI settings
#
# ${VAR} references are replaced with environment variables when loaded.

[api]
key = "${TYPEFULLY_API_KEY}"
base_url = "https://api.typefully.com/v1"
timeout_seconds = 30

[retry]
max_retries = 3
base_delay_ms = 500
max_delay_ms = 8000

[output]
# text, json or csv
format = "text"

[logging]
json = false

[defaults]
threadify = false
share = false
auto_retweet = false
auto_plug = false
"#;

impl FileConfig {
    /// `<config_dir>/typefully/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("typefully").join("config.toml"))
            .ok_or_else(|| TypefullyError::config("Cannot determine the user configuration directory"))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TypefullyError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Missing files yield the default configuration.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        tracing::debug!("Loading settings from {}", path.display());
        Self::from_file(path)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| {
            TypefullyError::config(format!("TOML parsing error: {}", e))
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// The API key, unless it is empty or still an unresolved `${VAR}` reference.
    pub fn api_key(&self) -> Option<&str> {
        self.api
            .key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !(key.starts_with("${") && key.ends_with('}')))
    }

    /// Writes the commented template; refuses to overwrite unless `force`.
    pub fn write_template<P: AsRef<Path>>(path: P, force: bool) -> Result<()> {
        let path = path.as_ref();
        if path.exists() && !force {
            return Err(TypefullyError::config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        write_file(path, TEMPLATE)
    }
}

pub(crate) fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    tracing::debug!("Wrote settings to {}", path.display());
    Ok(())
}

impl Validate for FileConfig {
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.api.base_url {
            validate_url("api.base_url", base_url)?;
        }

        if let Some(timeout) = self.api.timeout_seconds {
            validate_range("api.timeout_seconds", timeout, 1, 600)?;
        }

        if let Some(retry) = &self.retry {
            if let Some(max_retries) = retry.max_retries {
                validate_range("retry.max_retries", max_retries, 0, 10)?;
            }
            if let Some(jitter) = retry.jitter {
                validate_range("retry.jitter", jitter, 0.0, 1.0)?;
            }
            if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
                if base > max {
                    return Err(TypefullyError::InvalidConfigValueError {
                        field: "retry.base_delay_ms".to_string(),
                        value: base.to_string(),
                        reason: format!("must not exceed retry.max_delay_ms ({})", max),
                    });
                }
            }
        }

        Ok(())
    }
}
