use thiserror::Error;

#[derive(Error, Debug)]
pub enum TypefullyError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV output error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Authentication failed: {message}")]
    AuthenticationError { message: String },

    #[error("Rate limited by the Typefully API")]
    RateLimitedError { retry_after: Option<u64> },

    #[error("Typefully API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Configuration,
    Api,
    Input,
    Output,
}

/// Drives the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Transient; running the same command again may succeed.
    Medium,
    /// The request itself was wrong or was refused.
    High,
    /// The local environment is broken (files, settings).
    Critical,
}

impl ErrorSeverity {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl TypefullyError {
    pub fn validation(message: impl Into<String>) -> Self {
        TypefullyError::ValidationError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        TypefullyError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TypefullyError::HttpError(e) if e.is_decode() => ErrorCategory::Api,
            TypefullyError::HttpError(_) => ErrorCategory::Network,
            TypefullyError::IoError(_) => ErrorCategory::Output,
            TypefullyError::SerializationError(_) => ErrorCategory::Api,
            TypefullyError::CsvError(_) => ErrorCategory::Output,
            TypefullyError::ConfigError { .. }
            | TypefullyError::MissingConfigError { .. }
            | TypefullyError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            TypefullyError::AuthenticationError { .. } => ErrorCategory::Authentication,
            TypefullyError::RateLimitedError { .. } => ErrorCategory::Network,
            TypefullyError::ApiError { .. } => ErrorCategory::Api,
            TypefullyError::ValidationError { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TypefullyError::HttpError(e) if e.is_decode() => ErrorSeverity::High,
            TypefullyError::HttpError(_) | TypefullyError::RateLimitedError { .. } => {
                ErrorSeverity::Medium
            }
            TypefullyError::ApiError { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            TypefullyError::IoError(_)
            | TypefullyError::CsvError(_)
            | TypefullyError::ConfigError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Whether the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            TypefullyError::HttpError(e) => e.is_timeout() || e.is_connect(),
            TypefullyError::RateLimitedError { .. } => true,
            TypefullyError::ApiError { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }

    /// Whether a non-idempotent request may be sent again: only when the
    /// server never took it (connection refused, rate limited).
    pub fn is_retryable_without_duplicates(&self) -> bool {
        match self {
            TypefullyError::HttpError(e) => e.is_connect() && !e.is_timeout(),
            TypefullyError::RateLimitedError { .. } => true,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TypefullyError::HttpError(e) if e.is_timeout() => {
                "The Typefully API did not answer in time".to_string()
            }
            TypefullyError::HttpError(e) if e.is_connect() => {
                "Could not connect to the Typefully API".to_string()
            }
            TypefullyError::HttpError(_) => format!("Request to Typefully failed: {}", self),
            TypefullyError::MissingConfigError { field } => {
                format!("No value configured for '{}'", field)
            }
            TypefullyError::AuthenticationError { .. } => {
                "Typefully rejected the API key".to_string()
            }
            TypefullyError::RateLimitedError {
                retry_after: Some(secs),
            } => format!("Too many requests; Typefully asked to wait {}s", secs),
            TypefullyError::RateLimitedError { retry_after: None } => {
                "Too many requests to Typefully".to_string()
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check your network connection and try again in a moment",
            ErrorCategory::Authentication => {
                "Run `typefully auth login --key <KEY>` or set TYPEFULLY_API_KEY with a key from Typefully's integration settings"
            }
            ErrorCategory::Configuration => {
                "Run `typefully config path` to find the settings file, then fix it or recreate it with `typefully config init --force`"
            }
            ErrorCategory::Api => "Check the command arguments; run with --verbose for the raw response",
            ErrorCategory::Input => "Run the command with --help to see the accepted values",
            ErrorCategory::Output => "Check that the file exists and that you have permission to read or write it",
        }
    }
}

pub type Result<T> = std::result::Result<T, TypefullyError>;
