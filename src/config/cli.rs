use crate::config::toml_config::{AppConfig, DEFAULT_CONFIG_FILE};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "tariff-lookup")]
#[command(about = "Look up HS codes and tariff rates for export destinations")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the lookup API base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Search tariff data for a product
    Search(SearchArgs),
    /// Ask the help assistant a question
    Chat {
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// List supported countries and regional blocs
    Countries,
    /// Check that the lookup API is reachable
    Health,
}

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Product description
    #[arg(short, long)]
    pub query: String,

    /// Company name shown in the report header
    #[arg(long)]
    pub company: Option<String>,

    /// Target country or regional bloc (repeatable, comma separated)
    #[arg(short = 'c', long = "country", value_delimiter = ',')]
    pub countries: Vec<String>,

    /// Search every data source instead of per-country datasets
    #[arg(long)]
    pub global: bool,

    /// Query a single dataset key directly
    #[arg(long, conflicts_with = "global")]
    pub dataset_key: Option<String>,

    #[arg(long)]
    pub top_k: Option<usize>,

    /// Override fast mode (skip AI reranking on the backend)
    #[arg(long)]
    pub fast: Option<bool>,

    /// Skip AI summaries
    #[arg(long)]
    pub no_summary: bool,

    /// Write results to a .csv or .json file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Print results as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl CliArgs {
    /// 命令列參數覆蓋檔案設定
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if self.verbose {
            config.logging.verbose = true;
        }
        if let Command::Search(search) = &self.command {
            if let Some(top_k) = search.top_k {
                config.search.top_k = top_k;
            }
            if let Some(fast) = search.fast {
                config.search.fast = fast;
            }
            if search.no_summary {
                config.summary.enabled = false;
            }
        }
    }
}
