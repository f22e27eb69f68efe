//! rollerdyno - Real-time roller dynamometer telemetry
//!
//! Reads revolution-timing samples from a Hall-sensor board and serves live
//! RPM, speed, torque, and power readings over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Run with the synthetic sensor (demo profile)
//! cargo run --release
//!
//! # Run with a live sensor piped in over a serial bridge
//! socat /dev/ttyACM0,b9600 - | rollerdyno --stdin
//!
//! # Replay a recorded capture at 10x speed
//! rollerdyno --replay pull.csv --speed 10
//! ```
//!
//! # Environment Variables
//!
//! - `ROLLERDYNO_CONFIG`: Path to a TOML config file (default: ./rollerdyno.toml)
//! - `ROLLERDYNO_ADDR`: HTTP bind address override
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use rollerdyno::api::{create_app, DashboardState};
use rollerdyno::config::{self, DynoConfig};
use rollerdyno::pipeline::source::{ReplaySource, SampleSource, StdinSource, SyntheticSource};
use rollerdyno::pipeline::{AppState, PipelineController, ProcessingLoop, ReadingStore};

use axum::Router;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "rollerdyno")]
#[command(about = "Roller dynamometer telemetry pipeline")]
#[command(version)]
struct CliArgs {
    /// Read sensor CSV lines from stdin instead of the synthetic profile.
    /// Use with a serial bridge: socat /dev/ttyACM0,b9600 - | rollerdyno --stdin
    #[arg(long)]
    stdin: bool,

    /// Replay a recorded sensor capture file
    #[arg(long, value_name = "PATH")]
    replay: Option<String>,

    /// Speed multiplier for replay (1 = realtime, 10 = 10x faster, 0 = no delay)
    #[arg(long, default_value = "1.0")]
    speed: f64,

    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    SampleProcessor,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::SampleProcessor => write!(f, "SampleProcessor"),
        }
    }
}

// ============================================================================
// Shared Pipeline Initialization
// ============================================================================

/// Common infrastructure shared between all input modes.
struct PipelineCore {
    app_state: Arc<RwLock<AppState>>,
    controller: PipelineController,
    listener: tokio::net::TcpListener,
    app: Router,
}

/// Initialize the shared pipeline: reading store, app state, controller,
/// dashboard router, and HTTP listener.
async fn init_pipeline(server_addr: &str) -> Result<PipelineCore> {
    let reading_store = Arc::new(ReadingStore::new());
    let app_state = Arc::new(RwLock::new(AppState::default()));
    info!("✓ Application state initialized");

    let controller = PipelineController::new(config::get(), Arc::clone(&reading_store));

    let dashboard_state = DashboardState::new(Arc::clone(&reading_store), Arc::clone(&app_state));
    let app = create_app(dashboard_state);

    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server_addr))?;

    info!("✓ HTTP server listening on {}", server_addr);
    info!("");
    info!("🎯 Dashboard API available at: http://{}", server_addr);
    info!("");

    Ok(PipelineCore {
        app_state,
        controller,
        listener,
        app,
    })
}

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("🔒 Supervisor: All tasks spawned, monitoring...");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("🛑 Supervisor: Shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("🔒 Supervisor: Task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("🔒 Supervisor: Task failed with error: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("🔒 Supervisor: Task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("🔒 Supervisor: All tasks completed");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

// ============================================================================
// Unified Pipeline Runner
// ============================================================================

/// Run the telemetry pipeline with any sample source.
///
/// All input modes (stdin, replay, synthetic) flow through this function.
async fn run_pipeline<S: SampleSource>(
    mut source: S,
    server_addr: String,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("🚀 Starting rollerdyno telemetry pipeline");

    let core = init_pipeline(&server_addr).await?;

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    // Task 1: HTTP Server
    spawn_http_server(&mut task_set, core.listener, core.app, cancel_token.clone());

    // Task 2: Sample Processor (unified processing loop)
    let proc_cancel = cancel_token.clone();
    let proc_state = Arc::clone(&core.app_state);
    let controller = core.controller;
    task_set.spawn(async move {
        info!("[SampleProcessor] Task starting");
        let processing_loop = ProcessingLoop::new(controller, proc_state, proc_cancel);
        let _stats = processing_loop.run(&mut source).await;
        Ok(TaskName::SampleProcessor)
    });

    run_supervisor(&mut task_set, cancel_token).await
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    // Load run configuration
    let dyno_config = DynoConfig::load();
    info!(
        "Roller: {:.4} m | J: {:.6} kg·m² | Window: {:.1} s",
        dyno_config.roller.circumference_m,
        dyno_config.physics.rotational_inertia,
        dyno_config.physics.window_s,
    );
    let config_addr = dyno_config.server.addr.clone();
    config::init(dyno_config);

    let server_addr = args
        .addr
        .or_else(|| std::env::var("ROLLERDYNO_ADDR").ok())
        .unwrap_or(config_addr);

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  rollerdyno - Roller Dynamometer Telemetry");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    // Dispatch to the unified pipeline with the appropriate source
    if let Some(path) = args.replay {
        info!("📥 Input: replay ({} at {}x)", path, args.speed);
        let frames = rollerdyno::acquisition::load_frames(std::path::Path::new(&path))
            .with_context(|| format!("Failed to load capture {}", path))?;
        let source = ReplaySource::new(frames, args.speed);
        run_pipeline(source, server_addr, cancel_token).await?;
    } else if args.stdin {
        info!("📥 Input: stdin (sensor CSV lines)");
        run_pipeline(StdinSource::new(), server_addr, cancel_token).await?;
    } else {
        info!("📥 Input: synthetic run profile");
        run_pipeline(SyntheticSource::new(), server_addr, cancel_token).await?;
    }

    info!("");
    info!("✓ rollerdyno shutdown complete");
    Ok(())
}
