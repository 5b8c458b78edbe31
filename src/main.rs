//! Broadcast Tower
//!
//! Ephemeral, byte-bounded message log served over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Broadcast Tower                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐   │
//! │  │  API server  │───▶│  Broadcast   │───▶│   Bounded    │   │
//! │  │  (:3000)     │    │   Service    │    │    Store     │   │
//! │  └──────────────┘    └──────┬───────┘    └──────────────┘   │
//! │  ┌──────────────┐           │                               │
//! │  │ Health server│◀──────────┘ metrics                       │
//! │  │  (:8081)     │                                           │
//! │  └──────────────┘                                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use broadcast_tower::api::{self, ApiRouter, HealthRouter};
use broadcast_tower::config::TowerConfig;
use broadcast_tower::error::{Error, Result};
use broadcast_tower::health::HealthCheck;
use broadcast_tower::memory::{FixedMemoryCeiling, MemoryCeiling, SystemMemoryCeiling};
use broadcast_tower::metrics::TowerMetrics;
use broadcast_tower::service::BroadcastService;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Broadcast Tower - ephemeral in-memory message log
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API bind host
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// API bind port
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Maximum number of messages returned by one query
    #[arg(long, env = "MAX_NUMBER_OF_MESSAGES_PER_QUERY", default_value = "1000")]
    max_number_of_messages_per_query: usize,

    /// Maximum message size in bytes
    #[arg(long, env = "MAX_MESSAGE_SIZE_IN_BYTES", default_value = "10000")]
    max_message_size_in_bytes: usize,

    /// Upper bound on stored message bytes
    #[arg(long, env = "MAX_CACHE_SIZE_IN_BYTES", default_value = "1000000000")]
    max_cache_size_in_bytes: u64,

    /// Memory ceiling override; read from cgroups/procfs when unset
    #[arg(long, env = "MEMORY_LIMIT_BYTES")]
    memory_limit_bytes: Option<u64>,

    /// Health server bind address
    #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:8081")]
    health_addr: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn tower_config(&self) -> TowerConfig {
        TowerConfig {
            max_message_size_bytes: self.max_message_size_in_bytes,
            max_messages_per_query: self.max_number_of_messages_per_query,
            max_cache_size_bytes: self.max_cache_size_in_bytes,
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    let config = args.tower_config();
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let ceiling: Box<dyn MemoryCeiling> = match args.memory_limit_bytes {
        Some(limit) => Box::new(FixedMemoryCeiling(Some(limit))),
        None => Box::new(SystemMemoryCeiling::default()),
    };
    let memory_limit = ceiling.memory_limit_bytes();
    if memory_limit.is_none() {
        warn!("Could not determine memory limit, using configured cache size as budget");
    }
    let budget = config.effective_budget(memory_limit);

    info!("Starting Broadcast Tower v{}", broadcast_tower::VERSION);
    info!(
        "  Max messages per query: {}",
        config.max_messages_per_query
    );
    info!(
        "  Max message size: {} bytes",
        config.max_message_size_bytes
    );
    info!("  Max cache size: {} bytes", config.max_cache_size_bytes);
    match memory_limit {
        Some(limit) => info!("  Memory limit: {} bytes", limit),
        None => info!("  Memory limit: unknown"),
    }
    info!("  Store budget: {} bytes", budget);

    let metrics = TowerMetrics::new()?;
    let service = Arc::new(BroadcastService::new(config, budget, metrics.clone()));
    let health = Arc::new(HealthCheck::new());
    let shutdown = CancellationToken::new();

    // Start health server
    let health_addr: SocketAddr = args.health_addr.parse()?;
    let health_listener = TcpListener::bind(health_addr).await.map_err(|e| {
        error!("Failed to bind health server on {}: {}", health_addr, e);
        Error::Io(e)
    })?;
    let health_router = HealthRouter::new(health.clone(), metrics);
    let health_task = tokio::spawn(api::serve(
        "health",
        health_listener,
        move |req| {
            let router = health_router.clone();
            async move { router.handle(req).await }
        },
        shutdown.clone(),
    ));

    // Start API server
    let api_addr = format!("{}:{}", args.host, args.port);
    let api_listener = TcpListener::bind(&api_addr).await.map_err(|e| {
        error!("Failed to bind API server on {}: {}", api_addr, e);
        Error::Io(e)
    })?;
    health.set_ready(true);

    let api_router = ApiRouter::new(service);
    let api_task = tokio::spawn(api::serve(
        "api",
        api_listener,
        move |req| {
            let router = api_router.clone();
            async move { router.handle(req).await }
        },
        shutdown.clone(),
    ));

    wait_for_signal().await;
    info!("Shutdown signal received");
    health.set_ready(false);
    shutdown.cancel();

    for (name, task) in [("api", api_task), ("health", health_task)] {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("{} server error: {}", name, e),
            Err(e) => error!("{} server task failed: {}", name, e),
        }
    }

    info!("Broadcast Tower shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let hyper_directive: Directive = "hyper=warn"
        .parse()
        .map_err(|e| Error::Config(format!("invalid log directive: {}", e)))?;
    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive(hyper_directive);

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
    Ok(())
}

// =============================================================================
// Signals
// =============================================================================

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Cannot install SIGTERM handler: {}", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Cannot listen for Ctrl-C: {}", e);
            }
            return;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Cannot listen for Ctrl-C: {}", e);
            }
        }
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl-C: {}", e);
    }
}
