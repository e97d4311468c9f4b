use crate::core::countries::Country;
use crate::core::form::{ExportForm, SearchMode};
use crate::core::summary::{SummaryInput, SummaryState, SummaryView, Summarizer};
use crate::core::{ConfigProvider, Record, TariffApi};
use crate::domain::model::{HsCodeMatch, HsCodeRequest, LookupRequest, SearchAllRequest};
use crate::utils::error::LookupError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultsView {
    /// The endpoint answered 404; shown as "no data", not as an error.
    NoData,
    Error { message: String },
    Matches {
        records: Vec<Record>,
        summary: SummaryView,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultSection {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hs_codes: Vec<HsCodeMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_searched: Option<usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub sources_by_country: BTreeMap<String, serde_json::Value>,
    pub view: ResultsView,
    #[serde(skip)]
    pub summary_attempts: u32,
    #[serde(skip)]
    pub summary_trace: Vec<SummaryState>,
}

impl ResultSection {
    fn new(title: impl Into<String>, view: ResultsView) -> Self {
        Self {
            title: title.into(),
            country_code: None,
            hs_codes: Vec::new(),
            sources_searched: None,
            sources_by_country: BTreeMap::new(),
            view,
            summary_attempts: 0,
            summary_trace: Vec::new(),
        }
    }

    pub fn records(&self) -> &[Record] {
        match &self.view {
            ResultsView::Matches { records, .. } => records,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsReport {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<ResultSection>,
}

/// Drives the lookup flows behind the results page.
pub struct ResultsPage<A: TariffApi, C: ConfigProvider> {
    api: A,
    config: C,
    summarizer: Summarizer,
}

impl<A: TariffApi, C: ConfigProvider> ResultsPage<A, C> {
    pub fn new(api: A, config: C, summarizer: Summarizer) -> Self {
        Self {
            api,
            config,
            summarizer,
        }
    }

    pub async fn run(&self, form: &ExportForm) -> ResultsReport {
        self.run_observed(form, |_, _| {}).await
    }

    /// `observer` receives every summary view change with its section title.
    pub async fn run_observed<O>(&self, form: &ExportForm, mut observer: O) -> ResultsReport
    where
        O: FnMut(&str, &SummaryView),
    {
        let query = form.query();
        let sections = match &form.mode {
            SearchMode::Country => {
                let countries = form.selection.countries();
                tracing::info!("🌍 Looking up \"{}\" in {} countries", query, countries.len());

                // HS 代碼只依查詢字串決定，整次搜尋共用一份
                let hs_codes = if countries.is_empty() {
                    Vec::new()
                } else {
                    self.lookup_hs_codes(query).await
                };

                // 逐一查詢；單一國家失敗不影響其他國家
                let mut sections = Vec::with_capacity(countries.len());
                for country in countries {
                    sections.push(
                        self.lookup_country(query, country, &hs_codes, &mut observer)
                            .await,
                    );
                }
                sections
            }
            SearchMode::Global => {
                let filter: Vec<String> = form
                    .selection
                    .countries()
                    .iter()
                    .map(|c| c.name.to_string())
                    .collect();
                vec![self.search_global(query, &filter, &mut observer).await]
            }
            SearchMode::Dataset { key } => vec![self.lookup_plain(query, key, &mut observer).await],
        };

        ResultsReport {
            query: query.to_string(),
            company: form.company_name.clone(),
            generated_at: Utc::now(),
            sections,
        }
    }

    /// Plain lookup against one dataset key.
    pub async fn lookup_plain<O>(&self, query: &str, key: &str, observer: &mut O) -> ResultSection
    where
        O: FnMut(&str, &SummaryView),
    {
        tracing::info!("🔍 Looking up \"{}\" in {}", query, key);
        let request = LookupRequest {
            bucket: self.config.bucket().to_string(),
            key: key.to_string(),
            query: query.to_string(),
            country: None,
            top_k: self.config.top_k(),
            fast: self.config.fast_mode(),
            hs_codes: Vec::new(),
        };

        match self.api.lookup(&request).await {
            Ok(response) => {
                let section = ResultSection::new(key, ResultsView::NoData);
                self.present(section, response.matches, query, None, observer)
                    .await
            }
            Err(e) => failed_section(key, e),
        }
    }

    /// Enhanced lookup for the country's dataset, hinted with `hs_codes`.
    pub async fn lookup_country<O>(
        &self,
        query: &str,
        country: &Country,
        hs_codes: &[HsCodeMatch],
        observer: &mut O,
    ) -> ResultSection
    where
        O: FnMut(&str, &SummaryView),
    {
        let request = LookupRequest {
            bucket: self.config.bucket().to_string(),
            key: self.config.dataset_key_for(country.code),
            query: query.to_string(),
            country: Some(country.name.to_string()),
            top_k: self.config.top_k(),
            fast: self.config.fast_mode(),
            hs_codes: hs_codes.iter().map(|m| m.code.clone()).collect(),
        };

        tracing::info!(
            "🔍 {}: looking up \"{}\" with {} HS code hint(s)",
            country.name,
            query,
            request.hs_codes.len()
        );

        let mut section = match self.api.lookup(&request).await {
            Ok(response) => {
                let section = ResultSection::new(country.name, ResultsView::NoData);
                self.present(section, response.matches, query, Some(country.name), observer)
                    .await
            }
            Err(e) => failed_section(country.name, e),
        };
        section.country_code = Some(country.code.to_string());
        section.hs_codes = hs_codes.to_vec();
        section
    }

    /// Multi-source search, optionally limited to `countries`.
    pub async fn search_global<O>(
        &self,
        query: &str,
        countries: &[String],
        observer: &mut O,
    ) -> ResultSection
    where
        O: FnMut(&str, &SummaryView),
    {
        let title = "All sources";
        tracing::info!(
            "🌐 Global search for \"{}\" ({} country filter(s))",
            query,
            countries.len()
        );

        let request = SearchAllRequest {
            query: query.to_string(),
            bucket: self.config.bucket().to_string(),
            top_k: self.config.top_k(),
            fast: self.config.fast_mode(),
            countries: countries.to_vec(),
        };

        match self.api.search_all(&request).await {
            Ok(response) => {
                tracing::info!(
                    "🌐 {} matches from {} sources",
                    response.matches.len(),
                    response.sources_searched
                );
                let mut section = ResultSection::new(title, ResultsView::NoData);
                section.sources_searched = Some(response.sources_searched);
                section.sources_by_country = response.sources_by_country;
                self.present(section, response.matches, query, None, observer)
                    .await
            }
            Err(e) => failed_section(title, e),
        }
    }

    /// HS-code pre-lookup. Failures are logged and yield no hints.
    pub async fn lookup_hs_codes(&self, query: &str) -> Vec<HsCodeMatch> {
        let request = HsCodeRequest {
            query: query.to_string(),
            top_k: self.config.hs_code_top_k(),
        };

        match self.api.lookup_hs_codes(&request).await {
            Ok(response) => {
                tracing::debug!("🏷️ {} HS code candidates", response.hs_codes.len());
                response.hs_codes
            }
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => {
                tracing::warn!("⚠️ HS code lookup failed, continuing without hints: {}", e);
                Vec::new()
            }
        }
    }

    async fn present<O>(
        &self,
        mut section: ResultSection,
        records: Vec<Record>,
        query: &str,
        country: Option<&str>,
        observer: &mut O,
    ) -> ResultSection
    where
        O: FnMut(&str, &SummaryView),
    {
        let title = section.title.clone();
        let input = SummaryInput {
            records: &records,
            query,
            country,
        };
        let outcome = self
            .summarizer
            .summarize(&self.api, input, |view| observer(&title, view))
            .await;

        section.summary_attempts = outcome.attempts;
        section.summary_trace = outcome.trace;
        section.view = ResultsView::Matches {
            records,
            summary: outcome.view,
        };
        section
    }
}

fn failed_section(title: &str, error: LookupError) -> ResultSection {
    if error.is_not_found() {
        tracing::info!("📭 {}: no data", title);
        return ResultSection::new(title, ResultsView::NoData);
    }

    tracing::error!("❌ {}: lookup failed: {}", title, error);
    ResultSection::new(
        title,
        ResultsView::Error {
            message: error.user_friendly_message(),
        },
    )
}
