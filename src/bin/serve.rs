#![recursion_limit = "256"]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use burn::tensor::backend::Backend;
use burn_ndarray::NdArray;
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};

#[cfg(feature = "wgpu")]
use burn_lyrics::wgpu::init_runtime;
#[cfg(feature = "wgpu")]
use burn_wgpu::Wgpu;

use burn_lyrics::telemetry::init_tracing;
use burn_lyrics::{AppConfig, AppState, LyricsGenerator, load_config_with_base, router};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve generated lyrics over HTTP")]
struct Args {
    /// Additional configuration files applied in order (later files override earlier ones).
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Vec<PathBuf>,
    /// Address to listen on (overrides `server.bind`).
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,
    /// Checkpoint base path (overrides `server.checkpoint`).
    #[arg(long, value_name = "PATH")]
    checkpoint: Option<PathBuf>,
    /// Backend to run inference on.
    #[arg(long, value_enum, default_value_t = BackendArg::Ndarray)]
    backend: BackendArg,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BackendArg {
    Ndarray,
    Wgpu,
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config_with_base(Path::new("config/base.toml"), &args.config)?;
    let bind = args.bind.unwrap_or(config.server.bind);
    let checkpoint = args
        .checkpoint
        .clone()
        .unwrap_or_else(|| config.server.checkpoint.clone());

    match args.backend {
        BackendArg::Ndarray => {
            serve_backend::<NdArray<f32>, _>(config, checkpoint, bind, |_| {}).await
        }
        BackendArg::Wgpu => {
            #[cfg(feature = "wgpu")]
            {
                serve_backend::<Wgpu<f32>, _>(config, checkpoint, bind, init_runtime).await
            }
            #[cfg(not(feature = "wgpu"))]
            {
                Err(anyhow::anyhow!(
                    "wgpu backend selected but this build lacks the `wgpu` feature; rebuild with `--features wgpu`"
                ))
            }
        }
    }
}

async fn serve_backend<B, Init>(
    config: AppConfig,
    checkpoint: PathBuf,
    bind: SocketAddr,
    init_backend: Init,
) -> Result<()>
where
    B: Backend,
    Init: Fn(&B::Device),
{
    let device = B::Device::default();
    init_backend(&device);

    let loaded = tokio::task::spawn_blocking(move || {
        LyricsGenerator::<B>::load(&config, &checkpoint, device)
    })
    .await
    .context("model loading task panicked")?;

    let generator = match loaded {
        Ok(generator) => Some(generator),
        Err(err) => {
            error!("Error loading model: {err:#}");
            warn!("Serving without a model; /generate will fail until one is trained");
            None
        }
    };

    let app = router(Arc::new(AppState::new(generator)));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Shutting down");
}
