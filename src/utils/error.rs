use crate::adapters::http::SUMMARY_PATH;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited by {endpoint}: {body}")]
    RateLimited { endpoint: String, body: String },

    #[error("No data found at {endpoint}")]
    NotFound { endpoint: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Unknown country or bloc: {label}")]
    UnknownCountry { label: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Upstream,
    Configuration,
    Input,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LookupError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LookupError::ApiError(_) => ErrorCategory::Network,
            LookupError::HttpStatus { .. }
            | LookupError::RateLimited { .. }
            | LookupError::NotFound { .. } => ErrorCategory::Upstream,
            LookupError::ConfigError { .. }
            | LookupError::ConfigValidationError { .. }
            | LookupError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            LookupError::ValidationError { .. } | LookupError::UnknownCountry { .. } => {
                ErrorCategory::Input
            }
            LookupError::CsvError(_)
            | LookupError::IoError(_)
            | LookupError::SerializationError(_) => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LookupError::NotFound { .. } => ErrorSeverity::Low,
            LookupError::RateLimited { .. } | LookupError::ApiError(_) => ErrorSeverity::Medium,
            LookupError::HttpStatus { .. }
            | LookupError::ValidationError { .. }
            | LookupError::UnknownCountry { .. }
            | LookupError::CsvError(_)
            | LookupError::SerializationError(_) => ErrorSeverity::High,
            LookupError::IoError(_)
            | LookupError::ConfigError { .. }
            | LookupError::ConfigValidationError { .. }
            | LookupError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 判斷是否為限流錯誤 (429 或後端轉包的 ThrottlingException)
    pub fn is_rate_limited(&self) -> bool {
        match self {
            LookupError::RateLimited { .. } => true,
            LookupError::HttpStatus { status, body } => {
                *status == 429 || body_signals_rate_limit(body)
            }
            LookupError::ApiError(e) => e.status().map(|s| s.as_u16() == 429).unwrap_or(false),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            LookupError::NotFound { .. } => true,
            LookupError::HttpStatus { status, body } => {
                *status == 404 || body_signals_not_found(body)
            }
            LookupError::ApiError(e) => e.status().map(|s| s.as_u16() == 404).unwrap_or(false),
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the lookup API is running and reachable",
            ErrorCategory::Upstream if self.is_rate_limited() => {
                "The service is throttling requests; wait a moment and try again"
            }
            ErrorCategory::Upstream => "Check the lookup API logs for details",
            ErrorCategory::Configuration => "Review tariff-lookup.toml and environment variables",
            ErrorCategory::Input => "Check the product description and selected countries",
            ErrorCategory::Data => "Check file permissions and the output path",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LookupError::ApiError(_) => "Could not reach the tariff lookup service".to_string(),
            LookupError::RateLimited { endpoint, .. } if endpoint == SUMMARY_PATH => {
                "The summary service is busy right now".to_string()
            }
            LookupError::RateLimited { .. } => "The lookup service is busy right now".to_string(),
            LookupError::NotFound { .. } => "No data found".to_string(),
            LookupError::UnknownCountry { label } => {
                format!("'{}' is not a supported country or region", label)
            }
            other => other.to_string(),
        }
    }
}

pub(crate) fn body_signals_rate_limit(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    ["throttlingexception", "too many requests", "rate limit", "ratelimit"]
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// 後端把找不到資料集包成其他狀態碼時，訊息仍會帶 "not found"
pub(crate) fn body_signals_not_found(body: &str) -> bool {
    body.to_ascii_lowercase().contains("not found")
}

pub type Result<T> = std::result::Result<T, LookupError>;
