use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 單筆比對結果：後端回傳的任意欄位
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(obj) => Some(Self {
                data: obj.into_iter().collect(),
            }),
            _ => None,
        }
    }

    /// Case-insensitive field lookup; empty strings and nulls count as missing.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.data
            .get(name)
            .or_else(|| {
                self.data
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .filter(|value| match value {
                serde_json::Value::Null => false,
                serde_json::Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
    }

    /// 取出第一個存在的欄位並轉為字串
    pub fn first_text(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .find_map(|name| self.field(name))
            .and_then(value_to_text)
    }

    /// Primitive fields in key order, for prompts and CSV rows.
    pub fn primitive_fields(&self) -> BTreeMap<&str, String> {
        self.data
            .iter()
            .filter_map(|(key, value)| value_to_text(value).map(|text| (key.as_str(), text)))
            .collect()
    }

    pub fn score(&self) -> Option<f64> {
        self.field("score").and_then(|v| v.as_f64())
    }

    pub fn source_country(&self) -> Option<String> {
        self.first_text(&["source_country"])
    }
}

pub fn value_to_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRequest {
    pub bucket: String,
    pub key: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub top_k: usize,
    pub fast: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub hs_codes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub matches: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchAllRequest {
    pub query: String,
    pub bucket: String,
    pub top_k: usize,
    pub fast: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchAllResponse {
    #[serde(default)]
    pub matches: Vec<Record>,
    #[serde(default)]
    pub sources_searched: usize,
    #[serde(default)]
    pub sources_by_country: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsCodeRequest {
    pub query: String,
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HsCodeMatch {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HsCodeResponse {
    #[serde(default)]
    pub hs_codes: Vec<HsCodeMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
    #[serde(rename = "companyDetails", skip_serializing_if = "Option::is_none")]
    pub company_details: Option<String>,
    #[serde(rename = "companyLocation", skip_serializing_if = "Option::is_none")]
    pub company_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptResponse {
    pub result: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub message: String,
}
