//! Posture Guard server
//!
//! # Usage
//!
//! ```bash
//! # WebSocket server (default 127.0.0.1:8765, see [server] addr)
//! cargo run --release
//!
//! # One session over stdin/stdout, JSON lines
//! cargo run --bin simulation | cargo run -- --stdin
//!
//! # Print the effective configuration as TOML
//! cargo run -- --print-config
//! ```
//!
//! # Environment Variables
//!
//! - `POSTURE_CONFIG`: path to a TOML config file
//! - `POSTURE_CORS_ORIGINS`: comma-separated allowed origins
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use posture_guard::api::{create_app, ApiState};
use posture_guard::config::{self, PostureConfig};
use posture_guard::pipeline::source::{StdinSource, StdoutSink};
use posture_guard::pipeline::{PostureSession, ProcessingLoop, SessionSettings};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "posture-guard")]
#[command(about = "Real-time sitting posture monitoring from face and shoulder landmarks")]
#[command(version)]
struct CliArgs {
    /// Run one session over stdin/stdout (JSON lines) instead of the server
    #[arg(long)]
    stdin: bool,

    /// Override the server address (default: [server] addr)
    #[arg(short, long, value_name = "HOST:PORT")]
    addr: Option<String>,

    /// Config file; skips the POSTURE_CONFIG / ./posture_config.toml search
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

// ============================================================================
// Modes
// ============================================================================

async fn run_stdin(cancel_token: CancellationToken) -> Result<()> {
    info!("Input: stdin (JSON lines), replies on stdout");
    let session = PostureSession::new(SessionSettings::current());
    let summary = ProcessingLoop::new(session, cancel_token)
        .run(&mut StdinSource::new(), &mut StdoutSink::default())
        .await;
    info!(
        "Session {}: {} messages, {} frames, {:.1}s bad in total",
        summary.session_id,
        summary.messages_handled,
        summary.frames_processed,
        summary.statistics.total_bad_duration
    );
    Ok(())
}

async fn run_server(addr: &str, config: PostureConfig, cancel_token: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let app = create_app(ApiState::new(config, cancel_token.clone()));

    info!("[HttpServer] Listening on http://{}", addr);
    info!("[HttpServer] WebSocket endpoint: ws://{}/ws", addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await;

    match result {
        Ok(()) => {
            info!("[HttpServer] Graceful shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("[HttpServer] Server error: {}", e);
            Err(anyhow::anyhow!("HTTP server error: {}", e))
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries protocol replies in --stdin mode
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let posture_config = match &args.config {
        Some(path) => PostureConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PostureConfig::load(),
    };

    if args.print_config {
        print!("{}", posture_config.to_toml()?);
        return Ok(());
    }

    let t = &posture_config.thresholds;
    info!(
        "Thresholds: pitch {:.1}° | distance {:.1} cm | roll {:.1}° | shoulders {:.1}°",
        t.pitch_deg, t.distance_cm, t.roll_deg, t.shoulder_tilt_deg
    );
    let server_addr = args
        .addr
        .clone()
        .unwrap_or_else(|| posture_config.server.addr.clone());
    config::init(posture_config.clone());

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    if args.stdin {
        run_stdin(cancel_token).await
    } else {
        run_server(&server_addr, posture_config, cancel_token).await
    }
}
