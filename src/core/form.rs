use crate::core::countries::CountrySelection;
use crate::utils::error::{LookupError, Result};
use crate::utils::validation::Validate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// One section per selected country, with HS-code pre-lookup.
    Country,
    /// One multi-source search, optionally filtered by the selection.
    Global,
    /// Plain lookup against a single dataset key.
    Dataset { key: String },
}

#[derive(Debug, Clone)]
pub struct ExportForm {
    pub company_name: Option<String>,
    pub product_description: String,
    pub selection: CountrySelection,
    pub mode: SearchMode,
}

impl ExportForm {
    pub fn new(product_description: impl Into<String>, selection: CountrySelection) -> Self {
        Self {
            company_name: None,
            product_description: product_description.into(),
            selection,
            mode: SearchMode::Country,
        }
    }

    pub fn with_company(mut self, company_name: impl Into<String>) -> Self {
        let name = company_name.into();
        self.company_name = if name.trim().is_empty() {
            None
        } else {
            Some(name)
        };
        self
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn query(&self) -> &str {
        self.product_description.trim()
    }
}

impl Validate for ExportForm {
    fn validate(&self) -> Result<()> {
        if self.query().is_empty() {
            return Err(LookupError::ValidationError {
                message: "Product description is required".to_string(),
            });
        }

        match &self.mode {
            SearchMode::Country if self.selection.is_empty() => Err(LookupError::ValidationError {
                message: "Select at least one target country".to_string(),
            }),
            SearchMode::Dataset { key } if key.trim().is_empty() => {
                Err(LookupError::ValidationError {
                    message: "Dataset key cannot be empty".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}
