//! Retry-with-fallback summarization.
//!
//! `Summarizer::run` is the reusable piece: it takes a request builder, a
//! rate-limit detector and a fallback builder. `Summarizer::summarize` wires
//! it to the `/api/bedrock` port with the default prompt and fallback.

use crate::config::toml_config::SummaryConfig;
use crate::core::retry::{retry_with_backoff, RetryPolicy};
use crate::core::{Record, TariffApi};
use crate::domain::model::PromptRequest;
use crate::utils::error::LookupError;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Mutex;

const MAX_VALUE_CHARS: usize = 200;

const HS_CODE_FIELDS: &[&str] = &[
    "hs_code",
    "hts_number",
    "hts_code",
    "tariff_code",
    "hs",
    "code",
];
const DESCRIPTION_FIELDS: &[&str] = &[
    "description",
    "product_description",
    "article_description",
    "desc",
    "product",
];
const RATE_FIELDS: &[&str] = &[
    "tariff_rate",
    "rate",
    "general_rate",
    "mfn_rate",
    "general",
    "tariff",
];
const DUTY_FIELDS: &[&str] = &["duty_rate", "duty", "duties", "special_rate"];

/// Summarizer state machine. Terminal states: `Success`, `FallbackSummary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SummaryState {
    Idle,
    Requesting { attempt: u32 },
    Throttled { retry_count: u32 },
    Success,
    Failed { message: String },
    FallbackSummary,
}

impl SummaryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SummaryState::Success | SummaryState::FallbackSummary)
    }
}

/// What the results view shows for the summary slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryView {
    NoMatches,
    Loading,
    Ready { text: String },
    Degraded { error: String, fallback: String },
    /// Summaries disabled; only the manual extract is shown.
    Manual { text: String },
}

impl SummaryView {
    pub fn text(&self) -> Option<&str> {
        match self {
            SummaryView::Ready { text } | SummaryView::Manual { text } => Some(text),
            SummaryView::Degraded { fallback, .. } => Some(fallback),
            SummaryView::NoMatches | SummaryView::Loading => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SummaryInput<'a> {
    pub records: &'a [Record],
    pub query: &'a str,
    pub country: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub view: SummaryView,
    pub attempts: u32,
    pub trace: Vec<SummaryState>,
}

pub struct Summarizer {
    policy: RetryPolicy,
    settings: SummaryConfig,
}

impl Summarizer {
    pub fn new(settings: SummaryConfig) -> Self {
        Self {
            policy: settings.retry_policy(),
            settings,
        }
    }

    /// Default wiring against the text-generation endpoint.
    pub async fn summarize<A, O>(&self, api: &A, input: SummaryInput<'_>, observer: O) -> SummaryOutcome
    where
        A: TariffApi + ?Sized,
        O: FnMut(&SummaryView),
    {
        let request = PromptRequest {
            prompt: build_prompt(&input, self.settings.prompt_records),
            company_details: Some(input.query.to_string()),
            company_location: input.country.map(str::to_string),
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
        };
        let request = &request;

        self.run(
            input,
            move || api.generate_summary(request),
            LookupError::is_rate_limited,
            fallback_summary,
            observer,
        )
        .await
    }

    pub async fn run<E, F, Fut, D, B, O>(
        &self,
        input: SummaryInput<'_>,
        mut request: F,
        is_rate_limited: D,
        fallback: B,
        mut observer: O,
    ) -> SummaryOutcome
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        D: Fn(&E) -> bool,
        B: Fn(&SummaryInput<'_>) -> String,
        O: FnMut(&SummaryView),
    {
        // 沒有比對結果就不呼叫 AI
        if input.records.is_empty() {
            let view = SummaryView::NoMatches;
            observer(&view);
            return SummaryOutcome {
                view,
                attempts: 0,
                trace: vec![SummaryState::Idle],
            };
        }

        if !self.settings.enabled {
            let view = SummaryView::Manual {
                text: fallback(&input),
            };
            observer(&view);
            return SummaryOutcome {
                view,
                attempts: 0,
                trace: vec![SummaryState::Idle, SummaryState::FallbackSummary],
            };
        }

        observer(&SummaryView::Loading);
        let trace = Mutex::new(vec![SummaryState::Idle]);
        let max_retries = self.policy.max_retries;

        tracing::info!(
            "🤖 Requesting AI summary for {} records ({})",
            input.records.len(),
            input.country.unwrap_or("all sources")
        );

        let outcome = retry_with_backoff(
            &self.policy,
            |attempt| {
                push_state(&trace, SummaryState::Requesting { attempt });
                request()
            },
            |err: &E| is_rate_limited(err),
            |retry_count, delay, err: &E| {
                tracing::warn!(
                    "⏳ AI service throttled ({}), retry {}/{} in {:?}",
                    err,
                    retry_count,
                    max_retries,
                    delay
                );
                push_state(&trace, SummaryState::Throttled { retry_count });
            },
        )
        .await;

        let mut trace = trace.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        let view = match outcome.result {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!("✅ AI summary received after {} attempt(s)", outcome.attempts);
                trace.push(SummaryState::Success);
                SummaryView::Ready { text }
            }
            Ok(_) => {
                let message = "AI service returned an empty summary".to_string();
                tracing::warn!("⚠️ {}, using manual summary", message);
                trace.push(SummaryState::Failed {
                    message: message.clone(),
                });
                trace.push(SummaryState::FallbackSummary);
                SummaryView::Degraded {
                    error: message,
                    fallback: fallback(&input),
                }
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(
                    "⚠️ AI summary failed after {} attempt(s): {}, using manual summary",
                    outcome.attempts,
                    message
                );
                trace.push(SummaryState::Failed {
                    message: message.clone(),
                });
                trace.push(SummaryState::FallbackSummary);
                SummaryView::Degraded {
                    error: message,
                    fallback: fallback(&input),
                }
            }
        };

        observer(&view);
        SummaryOutcome {
            view,
            attempts: outcome.attempts,
            trace,
        }
    }
}

fn push_state(trace: &Mutex<Vec<SummaryState>>, state: SummaryState) {
    match trace.lock() {
        Ok(mut guard) => guard.push(state),
        Err(poisoned) => poisoned.into_inner().push(state),
    }
}

pub fn build_prompt(input: &SummaryInput<'_>, max_records: usize) -> String {
    let destination = input
        .country
        .map(|country| format!(" when exporting to {}", country))
        .unwrap_or_default();

    let mut prompt = format!(
        "You are an expert international trade consultant. Analyze the following tariff/product \
records and provide a clear, actionable summary for someone planning to export \"{}\"{}.\n\n",
        input.query, destination
    );
    prompt.push_str("Structure your response as follows:\n");
    prompt.push_str("1. TARIFF RATES: What are the key duty rates and taxes?\n");
    prompt.push_str("2. PRODUCT CLASSIFICATION: What HS codes or product categories apply?\n");
    prompt.push_str(
        "3. KEY REQUIREMENTS: Any special restrictions, documentation, or compliance needs?\n",
    );
    prompt.push_str("4. BUSINESS IMPACT: What does this mean for the exporter in practical terms?\n\n");
    prompt.push_str(
        "Keep it concise but comprehensive (6-10 sentences total). Focus on actionable insights.\n\n",
    );
    prompt.push_str("Tariff Records:\n");

    for (index, record) in input.records.iter().take(max_records).enumerate() {
        let fields: Vec<String> = record
            .primitive_fields()
            .into_iter()
            .map(|(key, value)| format!("{}: {}", key, truncate(&value, MAX_VALUE_CHARS)))
            .collect();
        prompt.push_str(&format!("{}. {}\n", index + 1, fields.join("; ")));
    }

    prompt.push_str("\nExpert Analysis:");
    prompt
}

/// Manual summary from the top-ranked record's known fields.
pub fn fallback_summary(input: &SummaryInput<'_>) -> String {
    let subject = match input.country {
        Some(country) => format!("Top match for \"{}\" in {}", input.query, country),
        None => format!("Top match for \"{}\"", input.query),
    };

    let Some(top) = input.records.first() else {
        return format!("No matches found for \"{}\".", input.query);
    };

    let hs_code = top.first_text(HS_CODE_FIELDS);
    let description = top
        .first_text(DESCRIPTION_FIELDS)
        .map(|d| truncate(&d, MAX_VALUE_CHARS));
    let rate = top.first_text(RATE_FIELDS);
    let duty = top.first_text(DUTY_FIELDS);

    if hs_code.is_none() && description.is_none() && rate.is_none() && duty.is_none() {
        return format!(
            "{} has no recognizable tariff fields; see the raw records below.",
            subject
        );
    }

    let mut sentences = Vec::new();
    match (hs_code, description) {
        (Some(code), Some(desc)) => sentences.push(format!("{}: HS code {} ({}).", subject, code, desc)),
        (Some(code), None) => sentences.push(format!("{}: HS code {}.", subject, code)),
        (None, Some(desc)) => sentences.push(format!("{}: {}.", subject, desc)),
        (None, None) => sentences.push(format!("{}.", subject)),
    }
    if let Some(rate) = rate {
        sentences.push(format!("Tariff rate: {}.", rate));
    }
    if let Some(duty) = duty {
        sentences.push(format!("Duty rate: {}.", duty));
    }
    if input.country.is_none() {
        if let Some(source) = top.source_country() {
            sentences.push(format!("Source: {}.", source));
        }
    }

    sentences.join(" ")
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
