use crate::domain::model::{
    HealthResponse, HsCodeRequest, HsCodeResponse, LookupRequest, LookupResponse, PromptRequest,
    SearchAllRequest, SearchAllResponse,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 外部查詢 API 的抽象；HTTP 實作位於 adapters::http
#[async_trait]
pub trait TariffApi: Send + Sync {
    async fn health(&self) -> Result<HealthResponse>;
    async fn lookup(&self, request: &LookupRequest) -> Result<LookupResponse>;
    async fn search_all(&self, request: &SearchAllRequest) -> Result<SearchAllResponse>;
    async fn lookup_hs_codes(&self, request: &HsCodeRequest) -> Result<HsCodeResponse>;
    async fn generate_summary(&self, request: &PromptRequest) -> Result<String>;
}

pub trait ConfigProvider: Send + Sync {
    fn bucket(&self) -> &str;
    fn top_k(&self) -> usize;
    fn hs_code_top_k(&self) -> usize;
    fn fast_mode(&self) -> bool;
    fn dataset_key_for(&self, country_code: &str) -> String;
}
