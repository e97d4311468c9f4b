use crate::core::retry::RetryPolicy;
use crate::core::ConfigProvider;
use crate::utils::error::{LookupError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "tariff-lookup.toml";
pub const API_URL_ENV: &str = "TARIFF_API_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub search: SearchConfig,
    pub summary: SummaryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8003".to_string(),
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub bucket: String,
    pub top_k: usize,
    pub fast: bool,
    pub hs_code_top_k: usize,
    pub dataset_key_template: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            bucket: "tsinfo".to_string(),
            top_k: 5,
            fast: true,
            hs_code_top_k: 3,
            dataset_key_template: "trade-data/normal/{code}/Oct15.2025.jsonl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub enabled: bool,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub prompt_records: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 2,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            max_tokens: 500,
            temperature: 0.1,
            prompt_records: 5,
        }
    }
}

impl SummaryConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "compact".to_string(),
            verbose: false,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LookupError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LookupError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 檔案存在就讀檔，否則使用預設值；最後套用環境變數覆蓋
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(path)?
        } else {
            tracing::debug!(
                "Config file {} not found, using defaults",
                path.display()
            );
            Self::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            tracing::debug!("{} overrides api.base_url", API_URL_ENV);
            config.api.base_url = url;
        }

        Ok(config)
    }

    /// 替換環境變數 (例如 ${API_HOST})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LookupError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_positive_number(
            "api.timeout_seconds",
            self.api.timeout_seconds as usize,
            1,
        )?;

        validation::validate_non_empty_string("search.bucket", &self.search.bucket)?;
        validation::validate_positive_number("search.top_k", self.search.top_k, 1)?;
        validation::validate_range("search.top_k", self.search.top_k, 1, 100)?;
        validation::validate_positive_number("search.hs_code_top_k", self.search.hs_code_top_k, 1)?;
        validation::validate_key_template(
            "search.dataset_key_template",
            &self.search.dataset_key_template,
        )?;

        validation::validate_range("summary.max_retries", self.summary.max_retries, 0, 10)?;
        validation::validate_positive_number(
            "summary.prompt_records",
            self.summary.prompt_records,
            1,
        )?;
        validation::validate_range("summary.temperature", self.summary.temperature, 0.0, 1.0)?;
        if self.summary.max_delay_ms < self.summary.base_delay_ms {
            return Err(LookupError::InvalidConfigValueError {
                field: "summary.max_delay_ms".to_string(),
                value: self.summary.max_delay_ms.to_string(),
                reason: "Must not be smaller than summary.base_delay_ms".to_string(),
            });
        }

        let valid_formats = ["compact", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(LookupError::InvalidConfigValueError {
                field: "logging.format".to_string(),
                value: self.logging.format.clone(),
                reason: format!(
                    "Unsupported format. Valid formats: {}",
                    valid_formats.join(", ")
                ),
            });
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.api.connect_timeout_seconds)
    }
}

impl ConfigProvider for AppConfig {
    fn bucket(&self) -> &str {
        &self.search.bucket
    }

    fn top_k(&self) -> usize {
        self.search.top_k
    }

    fn hs_code_top_k(&self) -> usize {
        self.search.hs_code_top_k
    }

    fn fast_mode(&self) -> bool {
        self.search.fast
    }

    fn dataset_key_for(&self, country_code: &str) -> String {
        self.search
            .dataset_key_template
            .replace("{code}", &country_code.to_ascii_uppercase())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
