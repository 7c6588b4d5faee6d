//! Queue server binary for the job-queue broker.
//!
//! Thin CLI wrapper: parse args, initialise logging, bootstrap the broker,
//! serve, wait for a shutdown signal.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use taskqueue_core::{Broker, ExpiryLoopHandle};
use taskqueue_shared::config::BrokerConfig;
use taskqueue_shared::logging;
use taskqueue_shared::mail::LoggingMailGateway;
use taskqueue_shared::registry::{DefaultRegistry, ModelDefinition};
use taskqueue_shared::templates::TemplateRenderer;
use tracing::{error, info};

/// Job-queue coordinator for the batch model-evaluation service.
#[derive(Debug, Parser)]
#[command(name = "taskqueue-broker", version)]
struct Args {
    /// Config file (TOML); missing file falls back to built-in defaults.
    #[arg(short = 'c', long = "config", default_value = "config.cfg")]
    config: PathBuf,

    /// Port to listen on; overrides the config file's `port` when given.
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Log filename, or "-" for standard error.
    #[arg(short = 'l', long = "log-filename", default_value = "-")]
    log: String,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = Args::parse();

    if let Err(err) = logging::init_tracing(&args.log) {
        eprintln!("failed to initialise logging at '{}': {err}", args.log);
        return std::process::ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = BrokerConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.port = port;
    }

    info!(port = config.port, config = %args.config.display(), "queue server booting up");

    let renderer = Arc::new(TemplateRenderer::compile(&config.email_template_source())?);
    let registry = Arc::new(DefaultRegistry::new(default_model_definitions(), Arc::clone(&renderer)));
    let mail = Arc::new(LoggingMailGateway::spawn());

    let broker = Arc::new(Broker::new(config.clone(), registry, mail, renderer));
    let expiry_loop = taskqueue_core::expiry_loop::spawn(Arc::clone(&broker));

    let router = taskqueue_http::router(Arc::clone(&broker));
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("queue server listening on {addr}");
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    info!("shutdown signal received, stopping expiry loop");
    shutdown_expiry_loop(expiry_loop).await;

    Ok(())
}

async fn shutdown_expiry_loop(handle: ExpiryLoopHandle) {
    handle.stop().await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// A small built-in model catalogue so the server is runnable without an
/// external model registry. Production deployments would supply their own
/// [`taskqueue_shared::registry::ModelRegistry`] implementation.
fn default_model_definitions() -> Vec<ModelDefinition> {
    vec![ModelDefinition::new("m", 1, vec![])]
}
