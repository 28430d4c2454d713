use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use chat::{config::ChatConfig, ChatModule};
use clap::{Parser, Subcommand};
use modkit::{DbOptions, ModuleRegistry, RunOptions, ShutdownOptions};
use runtime::{AppConfig, AppConfigProvider, CliArgs};

/// ProjectHub Server - project messaging service
#[derive(Parser)]
#[command(name = "projecthub-server")]
#[command(about = "ProjectHub Server - project messaging service")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (home_dir is normalized inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    ensure_ingress_section(&mut config);
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ProjectHub Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(&config),
    }
}

/// Give the ingress a bind address derived from `server` when the file has none.
fn ensure_ingress_section(config: &mut AppConfig) {
    let fallback = format!("{}:{}", config.server.host, config.server.port);
    let section = config
        .modules
        .entry(api_ingress::MODULE_NAME.to_string())
        .or_insert_with(|| serde_json::json!({}));
    if let serde_json::Value::Object(map) = section {
        map.entry("bind_addr")
            .or_insert_with(|| serde_json::Value::String(fallback));
    }
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let modules_cfg = Arc::new(AppConfigProvider::new(&config));

    let db = match &config.database {
        Some(db_config) => {
            let conn = runtime::connect_database(db_config, &config.home_dir(), args.mock).await?;
            DbOptions::Connection(conn)
        }
        None if args.mock => {
            let conn =
                runtime::connect_database(&Default::default(), &config.home_dir(), true).await?;
            DbOptions::Connection(conn)
        }
        None => {
            tracing::warn!("No database configuration found, running without database");
            DbOptions::None
        }
    };

    let ingress = Arc::new(ApiIngress::default());
    let chat_module = Arc::new(ChatModule::new());
    let registry = ModuleRegistry::builder()
        .module(api_ingress::MODULE_NAME, ingress.clone())
        .rest_host(api_ingress::MODULE_NAME, ingress.clone())
        .stateful(api_ingress::MODULE_NAME, ingress)
        .module(chat::module::MODULE_NAME, chat_module.clone())
        .db(chat::module::MODULE_NAME, chat_module.clone())
        .rest(chat::module::MODULE_NAME, chat_module)
        .build()?;

    modkit::run(RunOptions {
        registry,
        modules_cfg,
        db,
        shutdown: ShutdownOptions::Signals,
    })
    .await
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    if let Some(db) = &config.database {
        let backend = runtime::detect_backend(&db.url)?;
        println!("Database backend: {backend:?}");
    }
    if let Some(section) = config.modules.get(api_ingress::MODULE_NAME) {
        serde_json::from_value::<ApiIngressConfig>(section.clone())
            .context("invalid modules.api_ingress section")?;
    }
    if let Some(section) = config.modules.get(chat::module::MODULE_NAME) {
        serde_json::from_value::<ChatConfig>(section.clone())
            .context("invalid modules.chat section")?;
    }

    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
