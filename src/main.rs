mod backend;
mod catalog;
mod config;
mod harness;
mod interp;
mod notices;
mod server;
mod workspace;

use std::error::Error;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::backend::BackendClient;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::harness::adapter::ExecutionAdapter;
use crate::harness::controller::{RunController, RunOutcome};
use crate::harness::events::EventLog;
use crate::interp::library::ModuleLibrary;
use crate::interp::process::ProcessRuntime;
use crate::workspace::{DraftStore, Workspace};

#[derive(Parser)]
#[command(name = "scriptorium", about = "Script workspace with a sandboxed run harness")]
enum Cli {
    /// Start the HTTP server (default when no subcommand is given)
    Serve {
        /// Path to the config file
        #[arg(long, default_value = "scriptorium.toml")]
        config: PathBuf,
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Execute one script through the harness and print the outcome
    Run {
        /// Script file; reads stdin when omitted
        file: Option<PathBuf>,
        /// Path to the config file
        #[arg(long, default_value = "scriptorium.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    // Default to Serve when no subcommand is given, but still let --help
    // and --version work.
    let args: Vec<String> = std::env::args().collect();
    let cli = if args.len() <= 1 {
        Cli::Serve {
            config: PathBuf::from("scriptorium.toml"),
            port: None,
        }
    } else {
        Cli::parse()
    };

    match cli {
        Cli::Serve { config, port } => run_server(&config, port).await,
        Cli::Run { file, config } => run_once(file, &config).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scriptorium=info,tower_http=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_tree::HierarchicalLayer::new(2)
                .with_targets(true)
                .with_bracketed_fields(false),
        )
        .init();
}

fn load_library(config: &Config) -> Result<ModuleLibrary> {
    let mut library = ModuleLibrary::new();
    for entry in &config.library {
        let source = std::fs::read_to_string(&entry.path).with_context(|| {
            format!("failed to read library file: {}", entry.path.display())
        })?;
        library.insert(entry.name.clone(), source);
    }
    Ok(library)
}

fn build_controller(config: &Config, data_dir: &std::path::Path) -> Result<Arc<RunController>> {
    let library = load_library(config)?;
    let runtime = ProcessRuntime::new(
        config.interpreter.command.clone(),
        config.interpreter.args.clone(),
        config.interpreter.timeout_secs,
        data_dir.join("sandbox"),
    );
    let adapter = ExecutionAdapter::new(Arc::new(runtime), library);
    let events = Arc::new(EventLog::with_capacity(config.workspace.event_capacity));
    Ok(Arc::new(RunController::new(adapter, events)))
}

async fn run_server(config_path: &std::path::Path, port: Option<u16>) -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = Config::load_or_default(config_path)?;
    tracing::info!(environment = %config.server.environment, "starting workspace");
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let http_client = Arc::new(
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.backend.timeout_secs))
            .build()
            .context("failed to build HTTP client")?,
    );

    let controller = build_controller(&config, &data_dir)?;

    let workspace = Arc::new(Workspace::new(DraftStore::new(&data_dir)));
    match workspace.restore_draft().await {
        Ok(true) => {
            tracing::info!("restored editor draft");
            controller.events().record("Draft restored from storage").await;
        }
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "failed to restore draft");
            controller.events().record("Draft restore failed").await;
        }
    }

    let backend = Arc::new(BackendClient::new(
        http_client.clone(),
        config.backend.base_url.clone(),
    ));
    let catalog = Arc::new(Catalog::builtin(backend.base_url()));

    // Startup health probe, same as the workspace does on load.
    {
        let backend = backend.clone();
        let controller = controller.clone();
        tokio::spawn(async move {
            match backend.health().await {
                Ok(health) => {
                    tracing::info!(status = %health.status, "backend healthy");
                    controller
                        .events()
                        .record("Backend responded to health probe")
                        .await;
                }
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "backend health probe failed");
                    controller
                        .events()
                        .record("Backend health probe failed")
                        .await;
                }
            }
        });
    }

    let state = server::AppState {
        controller,
        workspace,
        catalog,
        backend,
    };
    let app = server::create_app(state, config.workspace.ui_dir.clone());

    let port = port.unwrap_or(config.server.port);
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("Listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_once(file: Option<PathBuf>, config_path: &std::path::Path) -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = Config::load_or_default(config_path)?;
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let source = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read script: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read script from stdin")?;
            buf
        }
    };

    let controller = build_controller(&config, &data_dir)?;
    let report = controller.trigger(source).await?;

    print!("{}", report.output);
    match report.outcome {
        RunOutcome::Succeeded => {
            if let Some(elapsed) = report.elapsed_ms {
                eprintln!("completed in {elapsed:.1} ms");
            }
            Ok(())
        }
        RunOutcome::Failed => {
            if let Some(error) = report.error {
                eprintln!("{error}");
            }
            std::process::exit(1);
        }
    }
}
