mod catalog_cmds;
mod console;
mod telemetry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use vasini_config::AppConfig;
use vasini_llm::LlmProfileGateway;
use vasini_store::{SurveyService, open_store};
use vasini_survey::{Catalog, SurveyMachine, SurveySettings};

#[derive(Debug, Parser)]
#[command(
    name = "vasini",
    version,
    about = "Personality survey bot: questionnaire, profile and daily advice"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the Telegram bot (the default).
    Telegram,
    /// Drive one local session from stdin.
    Console {
        /// Seed the advice generator for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Inspect question catalogs.
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Manage the configuration file.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum CatalogCommands {
    /// Validate a catalog file (or the configured/built-in one) and summarise it.
    Check {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Write a config file filled with defaults.
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Telegram);

    if let Commands::Config {
        command: ConfigCommands::Init { force },
    } = command
    {
        run_config_init(&cli.config, force)?;
        println!("wrote default configuration to {}", cli.config.display());
        return Ok(());
    }

    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let _log_guard = telemetry::init(&config.telemetry)?;

    match command {
        Commands::Telegram => {
            let service = build_service(&config, None)?;
            vasini_telegram::start_bot(service, &config).await?;
        }
        Commands::Console { seed } => {
            let service = build_service(&config, seed)?;
            console::run_console(service).await?;
        }
        Commands::Catalog {
            command: CatalogCommands::Check { path },
        } => {
            let path = path.or_else(|| config.survey.catalog_path.as_ref().map(PathBuf::from));
            catalog_cmds::run_catalog_check(path.as_deref(), config.survey.inventory_len)?;
        }
        // Handled before the config file is read.
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn build_service(config: &AppConfig, seed: Option<u64>) -> Result<Arc<SurveyService>> {
    let catalog_path = config.survey.catalog_path.as_deref().map(Path::new);
    let catalog = Catalog::load_or_builtin(catalog_path, config.survey.inventory_len)
        .inspect_err(|err| error!(error = %err, "question catalog rejected"))
        .context("refusing to start with an invalid question catalog")?;

    let gateway = LlmProfileGateway::from_config(config, std::env::var("OPENROUTER_API_KEY").ok())
        .context("failed to build the profile gateway HTTP client")?;
    info!(
        provider = ?gateway.provider(),
        model = gateway.model(),
        "profile gateway ready"
    );

    let machine = SurveyMachine::new(
        Arc::new(catalog),
        Arc::new(gateway),
        SurveySettings::from(config),
    );
    let store = open_store(&config.storage);
    let service = match seed {
        Some(seed) => SurveyService::with_seed(machine, store, seed),
        None => SurveyService::new(machine, store),
    };
    Ok(Arc::new(service))
}

fn run_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }
    AppConfig::default().save_to(path)
}
