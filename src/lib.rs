pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::HttpTariffApi;
pub use config::AppConfig;
pub use crate::core::{
    countries::CountrySelection,
    form::{ExportForm, SearchMode},
    results::{ResultsPage, ResultsReport, ResultsView},
    summary::{Summarizer, SummaryView},
};
pub use utils::error::{LookupError, Result};
