//! Teamsync - install a Teams app on many teams
//!
//! Usage:
//!   teamsync install --app <ID> --team <ID>...   # Install where missing
//!   teamsync status --app <ID> --team <ID>...    # Show where it is installed
//!   teamsync config init --tenant <ID> ...       # Write teamsync.toml

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use teamsync_core::config::{
    CLIENT_SECRET_ENV, ConfigOverrides, ConfigStore, EndpointsConfig, RunSettings, TeamsyncConfig,
};
use teamsync_core::error::InstallationError;
use teamsync_core::install::{FanOutCoordinator, TeamStatus};
use teamsync_core::teams::GraphClient;

#[derive(Parser)]
#[command(name = "teamsync")]
#[command(about = "Install a Microsoft Teams app across teams", long_about = None)]
struct Cli {
    /// Path to teamsync.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the app on every team that does not have it yet
    Install(RunArgs),

    /// Report which teams already have the app (read-only)
    Status(RunArgs),

    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a new teamsync.toml (the client secret is never stored)
    Init(InitArgs),
}

#[derive(Args)]
struct InitArgs {
    /// Directory (tenant) ID
    #[arg(long = "tenant")]
    tenant_id: Option<String>,

    /// App registration (client) ID
    #[arg(long = "client")]
    client_id: Option<String>,

    /// Teams app catalog ID
    #[arg(long = "app")]
    app_id: Option<String>,

    /// Team ID (repeatable)
    #[arg(long = "team")]
    teams: Vec<String>,

    /// Maximum teams processed at once
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Graph API base URL (national clouds)
    #[arg(long)]
    graph_url: Option<String>,

    /// Token authority base URL (national clouds)
    #[arg(long)]
    authority_url: Option<String>,

    /// Overwrite an existing config file
    #[arg(long)]
    force: bool,
}

impl InitArgs {
    fn into_config(self) -> TeamsyncConfig {
        TeamsyncConfig {
            tenant_id: self.tenant_id,
            client_id: self.client_id,
            app_id: self.app_id,
            teams: self.teams,
            max_concurrency: self.max_concurrency,
            endpoints: EndpointsConfig {
                graph: self.graph_url,
                authority: self.authority_url,
            },
            client_secret: None,
        }
    }
}

#[derive(Args)]
struct RunArgs {
    /// Directory (tenant) ID
    #[arg(long = "tenant")]
    tenant_id: Option<String>,

    /// App registration (client) ID
    #[arg(long = "client")]
    client_id: Option<String>,

    /// App registration client secret
    #[arg(long = "secret", env = CLIENT_SECRET_ENV, hide_env_values = true)]
    client_secret: Option<String>,

    /// Teams app catalog ID
    #[arg(long = "app")]
    app_id: Option<String>,

    /// Team ID (repeatable; replaces the teams listed in the config file)
    #[arg(long = "team")]
    teams: Vec<String>,

    /// Maximum teams processed at once (unbounded by default)
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable output
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamsync=info,teamsync_core=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Install(args) => run_install(cli.config, args).await?,
        Commands::Status(args) => run_status(cli.config, args).await?,
        Commands::Config {
            command: ConfigCommands::Init(args),
        } => run_config_init(cli.config, args)?,
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Process exit status: 1 when any team failed, 0 otherwise.
fn exit_code(failed: usize) -> i32 {
    if failed == 0 { 0 } else { 1 }
}

fn config_store(config: Option<PathBuf>) -> Result<ConfigStore> {
    Ok(match config {
        Some(path) => ConfigStore::from_path(path),
        None => ConfigStore::default_location()?,
    })
}

fn resolve_settings(config: Option<PathBuf>, args: &RunArgs) -> Result<RunSettings> {
    let store = config_store(config)?;
    let file = store.load()?;

    let overrides = ConfigOverrides {
        tenant_id: args.tenant_id.clone(),
        client_id: args.client_id.clone(),
        client_secret: args.client_secret.clone(),
        app_id: args.app_id.clone(),
        teams: args.teams.clone(),
        max_concurrency: args.max_concurrency,
    };
    file.resolve(overrides)
        .with_context(|| format!("Invalid settings (config: {})", store.config_path().display()))
}

fn coordinator(settings: &RunSettings) -> Result<FanOutCoordinator<GraphClient>> {
    let client = GraphClient::new(settings.endpoints.clone(), settings.credentials.clone())
        .context("Failed to create Graph client")?;
    let coordinator = FanOutCoordinator::new(Arc::new(client));
    Ok(match settings.max_concurrency {
        Some(limit) => coordinator.with_max_concurrency(limit),
        None => coordinator,
    })
}

async fn run_install(config: Option<PathBuf>, args: RunArgs) -> Result<i32> {
    let settings = resolve_settings(config, &args)?;
    let coordinator = coordinator(&settings)?;

    let mut stream =
        coordinator.install_across_teams(settings.teams.clone(), settings.app.clone());
    let mut failures = Vec::new();
    while let Some(err) = stream.next().await {
        if matches!(args.format, OutputFormat::Table) {
            eprintln!("install error: {}", err);
        }
        failures.push(err);
    }

    match args.format {
        OutputFormat::Table => {
            println!("App installation complete.");
            if !failures.is_empty() {
                println!(
                    "{} of {} teams failed.",
                    failures.len(),
                    settings.teams.len()
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "app": settings.app,
                "teams": settings.teams.len(),
                "failed": failures.iter().map(failure_json).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    tracing::info!(
        app = %settings.app,
        teams = settings.teams.len(),
        failed = failures.len(),
        "Install run finished"
    );
    Ok(exit_code(failures.len()))
}

async fn run_status(config: Option<PathBuf>, args: RunArgs) -> Result<i32> {
    let settings = resolve_settings(config, &args)?;
    let coordinator = coordinator(&settings)?;

    let statuses = coordinator
        .installation_status(settings.teams.clone(), &settings.app)
        .await;
    let failed = statuses.iter().filter(|s| s.installed.is_err()).count();

    match args.format {
        OutputFormat::Table => print_status_table(&statuses),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "app": settings.app,
                "teams": statuses.iter().map(status_json).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    tracing::info!(
        app = %settings.app,
        teams = statuses.len(),
        failed,
        "Status run finished"
    );
    Ok(exit_code(failed))
}

fn run_config_init(config: Option<PathBuf>, args: InitArgs) -> Result<i32> {
    let store = config_store(config)?;
    let force = args.force;
    store.init(&args.into_config(), force)?;
    println!("Wrote {}", store.config_path().display());
    Ok(0)
}

fn print_status_table(statuses: &[TeamStatus]) {
    let width = statuses
        .iter()
        .map(|s| s.team.as_str().len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!("{:<width$}  STATE", "TEAM", width = width);
    for status in statuses {
        let state = match &status.installed {
            Ok(true) => "installed".to_string(),
            Ok(false) => "missing".to_string(),
            Err(err) => format!("error: {}", err),
        };
        println!("{:<width$}  {}", status.team, state, width = width);
    }
}

fn failure_json(err: &InstallationError) -> serde_json::Value {
    serde_json::json!({
        "team": err.team(),
        "stage": err.stage(),
        "error": err.to_string(),
    })
}

fn status_json(status: &TeamStatus) -> serde_json::Value {
    match &status.installed {
        Ok(installed) => serde_json::json!({
            "team": status.team,
            "installed": installed,
        }),
        Err(err) => serde_json::json!({
            "team": status.team,
            "error": err.to_string(),
        }),
    }
}
