use crate::config::toml_config::AppConfig;
use crate::core::TariffApi;
use crate::domain::model::{
    HealthResponse, HsCodeRequest, HsCodeResponse, LookupRequest, LookupResponse, PromptRequest,
    PromptResponse, SearchAllRequest, SearchAllResponse,
};
use crate::utils::error::{body_signals_not_found, body_signals_rate_limit, LookupError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub const LOOKUP_PATH: &str = "/api/lookup";
pub const SEARCH_ALL_PATH: &str = "/api/search-all";
pub const HS_CODES_PATH: &str = "/api/lookup-hs-codes";
pub const SUMMARY_PATH: &str = "/api/bedrock";

/// reqwest 實作的查詢 API 客戶端
#[derive(Debug, Clone)]
pub struct HttpTariffApi {
    client: Client,
    base_url: String,
}

impl HttpTariffApi {
    pub fn new(base_url: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.api.base_url,
            config.request_timeout(),
            config.connect_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!("📡 POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        tracing::debug!("📡 {} responded {}", path, status);
        let text = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&text)?);
        }

        let body = error_detail(&text);
        match status {
            StatusCode::NOT_FOUND => Err(LookupError::NotFound {
                endpoint: path.to_string(),
            }),
            StatusCode::TOO_MANY_REQUESTS => Err(LookupError::RateLimited {
                endpoint: path.to_string(),
                body,
            }),
            _ if body_signals_rate_limit(&body) => Err(LookupError::RateLimited {
                endpoint: path.to_string(),
                body,
            }),
            _ if body_signals_not_found(&body) => {
                tracing::debug!("📭 {} responded {} with a not-found detail", path, status);
                Err(LookupError::NotFound {
                    endpoint: path.to_string(),
                })
            }
            _ => Err(LookupError::HttpStatus {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

/// FastAPI 錯誤格式為 {"detail": "..."}，取出 detail；否則回傳原文
fn error_detail(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| {
            value
                .get("detail")
                .and_then(|detail| detail.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.trim().to_string())
}

#[async_trait]
impl TariffApi for HttpTariffApi {
    async fn health(&self) -> Result<HealthResponse> {
        let response = self.client.get(self.url("/")).send().await?;
        Self::decode("/", response).await
    }

    async fn lookup(&self, request: &LookupRequest) -> Result<LookupResponse> {
        self.post_json(LOOKUP_PATH, request).await
    }

    async fn search_all(&self, request: &SearchAllRequest) -> Result<SearchAllResponse> {
        self.post_json(SEARCH_ALL_PATH, request).await
    }

    async fn lookup_hs_codes(&self, request: &HsCodeRequest) -> Result<HsCodeResponse> {
        self.post_json(HS_CODES_PATH, request).await
    }

    async fn generate_summary(&self, request: &PromptRequest) -> Result<String> {
        let response: PromptResponse = self.post_json(SUMMARY_PATH, request).await?;
        Ok(response.result)
    }
}
