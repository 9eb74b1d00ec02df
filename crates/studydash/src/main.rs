use std::io::{self, IsTerminal, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use config::{Config, Environment, File, FileFormat};
use log::{LevelFilter, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use studydash::api::{AppState, create_router};
use studydash::auth::{AuthConfig, AuthGate, FederatedDisabled, FederatedVerifier, FirebaseVerifier};
use studydash::db::Database;
use studydash::user::{UserRepository, UserService};
use studydash::youtube::YouTubeClient;

const APP_NAME: &str = "studydash";
const ENV_PREFIX: &str = "STUDYDASH";

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.common);

    let config = load_config(cli.common.config.clone())?;

    match cli.command {
        Command::Serve(cmd) => run_serve(config, cmd),
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Student dashboard backend server.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Override the config file path
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Reduce output to only errors
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    quiet: bool,
    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP API server
    Serve(ServeCommand),
}

#[derive(Debug, Clone, Args)]
struct ServeCommand {
    /// Override the listen host
    #[arg(long)]
    host: Option<String>,
    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct AppConfig {
    server: ServerSection,
    auth: AuthConfig,
    database: DatabaseSection,
    youtube: YouTubeSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct ServerSection {
    host: String,
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct DatabaseSection {
    /// Path to the SQLite database file. Defaults to the platform data dir.
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct YouTubeSection {
    api_key: Option<String>,
}

fn load_config(override_path: Option<PathBuf>) -> Result<AppConfig> {
    let config_file = match override_path {
        Some(path) => path,
        None => default_config_path()?,
    };

    let built = Config::builder()
        .add_source(
            File::from(config_file.as_path())
                .format(FileFormat::Toml)
                .required(false),
        )
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .context("building configuration")?;

    built
        .try_deserialize()
        .context("deserializing configuration")
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| anyhow!("cannot determine config directory"))?;
    Ok(base.join(APP_NAME).join("config.toml"))
}

fn default_database_path() -> Result<PathBuf> {
    let base = dirs::data_dir().ok_or_else(|| anyhow!("cannot determine data directory"))?;
    Ok(base.join(APP_NAME).join(format!("{APP_NAME}.db")))
}

fn init_logging(common: &CommonOpts) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let level = if common.quiet {
        LevelFilter::Error
    } else {
        match common.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{APP_NAME}={level},tower_http={level}")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_ansi(io::stderr().is_terminal()))
        .try_init()
        .ok();
}

// ============================================================================
// Serve
// ============================================================================

#[tokio::main]
async fn run_serve(config: AppConfig, cmd: ServeCommand) -> Result<()> {
    info!("Starting student dashboard backend...");

    // Fail fast on a broken auth section rather than serving 500s later.
    if let Err(err) = config.auth.validate() {
        error!("Invalid auth configuration: {err}");
        return Err(anyhow!(err));
    }

    let db_path = match config.database.path.clone() {
        Some(path) => path,
        None => default_database_path()?,
    };
    info!("Database path: {}", db_path.display());
    let database = Database::new(&db_path).await?;

    let federated: Arc<dyn FederatedVerifier> = match config.auth.firebase_project_id.as_deref() {
        Some(project_id) => {
            info!("Federated verifier enabled for project {project_id}");
            Arc::new(FirebaseVerifier::new(project_id)?)
        }
        None => {
            warn!("No Firebase project configured; federated tokens will be rejected");
            Arc::new(FederatedDisabled)
        }
    };

    let auth = AuthGate::new(config.auth.clone(), federated);
    let users = UserService::new(UserRepository::new(database.pool().clone()));
    let youtube = YouTubeClient::new(config.youtube.api_key.clone())?;
    if !youtube.api_key_configured() {
        warn!("No YouTube API key configured; /youtube routes will return errors");
    }

    let state = AppState {
        auth,
        users,
        youtube,
    };
    let app = create_router(state);

    let host = cmd.host.unwrap_or(config.server.host);
    let port = cmd.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Shutdown signal received");
}
