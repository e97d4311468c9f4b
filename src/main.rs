use clap::Parser;
use tariff_lookup::config::{CliArgs, Command, SearchArgs};
use tariff_lookup::core::chatbot::ChatBot;
use tariff_lookup::core::countries::{self, BLOCS, COUNTRIES};
use tariff_lookup::core::{export, render, TariffApi};
use tariff_lookup::utils::error::ErrorSeverity;
use tariff_lookup::utils::{logger, validation::Validate};
use tariff_lookup::{
    AppConfig, CountrySelection, ExportForm, HttpTariffApi, LookupError, ResultsPage, SearchMode,
    Summarizer, SummaryView,
};

const MAX_ROWS: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 載入配置，命令列參數優先
    let mut config = match AppConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file is valid TOML");
            std::process::exit(1);
        }
    };
    args.apply_overrides(&mut config);

    logger::init_logger(&config.logging.format, config.logging.verbose);
    tracing::debug!("Effective config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let result = match &args.command {
        Command::Search(search) => run_search(&config, search).await,
        Command::Chat { message } => run_chat(&message.join(" ")),
        Command::Countries => {
            list_countries();
            Ok(())
        }
        Command::Health => run_health(&config).await,
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run_search(config: &AppConfig, search: &SearchArgs) -> Result<(), LookupError> {
    let selection = CountrySelection::from_labels(&search.countries)?;
    let mode = if search.global {
        SearchMode::Global
    } else if let Some(key) = &search.dataset_key {
        SearchMode::Dataset { key: key.clone() }
    } else {
        SearchMode::Country
    };

    let mut form = ExportForm::new(search.query.clone(), selection).with_mode(mode);
    if let Some(company) = &search.company {
        form = form.with_company(company.clone());
    }
    form.validate()?;

    tracing::info!(
        "🚀 Searching \"{}\" ({:?}, {} destination(s))",
        form.query(),
        form.mode,
        form.selection.len()
    );

    let api = HttpTariffApi::from_config(config)?;
    let page = ResultsPage::new(api, config.clone(), Summarizer::new(config.summary.clone()));
    let report = page
        .run_observed(&form, |title, view| {
            if matches!(view, SummaryView::Loading) {
                eprintln!("⏳ {}: generating summary...", title);
            }
        })
        .await;

    if search.json {
        println!("{}", export::to_json(&report)?);
    } else {
        print!("{}", render::render_report(&report, MAX_ROWS));
    }

    if let Some(path) = &search.export {
        export::write_report(&report, path)?;
        println!("📁 Results saved to: {}", path.display());
    }

    Ok(())
}

fn run_chat(message: &str) -> Result<(), LookupError> {
    let bot = ChatBot::with_default_rules()?;
    println!("{}", bot.reply(message));
    Ok(())
}

async fn run_health(config: &AppConfig) -> Result<(), LookupError> {
    let api = HttpTariffApi::from_config(config)?;
    let health = api.health().await?;
    println!("✅ {} is up: {}", api.base_url(), health.message);
    Ok(())
}

fn list_countries() {
    println!("Regional blocs:");
    for bloc in BLOCS {
        let members: Vec<&str> = bloc
            .members
            .iter()
            .filter_map(|code| countries::find_country(code))
            .map(|c| c.name)
            .collect();
        println!("  {} ({} members): {}", bloc.label, members.len(), members.join(", "));
    }

    println!();
    println!("Countries:");
    for country in COUNTRIES {
        let blocs: Vec<&str> = countries::blocs_containing(country.code)
            .map(|b| b.label)
            .collect();
        if blocs.is_empty() {
            println!("  {:<22} {}", country.name, country.code);
        } else {
            println!("  {:<22} {}  [{}]", country.name, country.code, blocs.join(", "));
        }
    }
}
