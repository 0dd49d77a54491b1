#![recursion_limit = "256"]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::tensor::backend::AutodiffBackend;
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use clap::{Parser, ValueEnum};
use tracing::info;

#[cfg(feature = "wgpu")]
use burn_lyrics::wgpu::init_runtime;
#[cfg(feature = "wgpu")]
use burn_wgpu::Wgpu;

use burn_lyrics::config::default_checkpoint;
use burn_lyrics::telemetry::init_tracing;
use burn_lyrics::{
    AppConfig, ChunkBatcher, LyricsCorpus, RecurrentLm, build_model_config, load_checkpoint,
    load_config_with_base, train,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Train the lyrics GRU on a CSV of songs")]
struct Cli {
    /// CSV export with the lyrics in a fixed column.
    #[arg(value_name = "SONGS_CSV")]
    songs_csv: PathBuf,
    /// Checkpoint base path; the recorder appends `.mpk`.
    #[arg(value_name = "OUTPUT", default_value_os_t = default_checkpoint())]
    output: PathBuf,
    /// Number of passes over the corpus (overrides the config file).
    #[arg(long, value_name = "N")]
    epochs: Option<usize>,
    /// Additional configuration files applied in order (later files override earlier ones).
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Vec<PathBuf>,
    /// Backend to train on.
    #[arg(long, value_enum, default_value_t = BackendArg::Ndarray)]
    backend: BackendArg,
    /// Start from an existing checkpoint instead of fresh weights.
    #[arg(long, value_name = "PATH")]
    resume: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BackendArg {
    Ndarray,
    Wgpu,
}

pub fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Cli::parse();

    let mut config = load_config_with_base(Path::new("config/base.toml"), &args.config)?;
    if let Some(epochs) = args.epochs {
        config.training.epochs = epochs;
    }

    match args.backend {
        BackendArg::Ndarray => {
            train_backend::<Autodiff<NdArray<f32>>, _>(&config, &args, "ndarray", |_| {})
        }
        BackendArg::Wgpu => {
            #[cfg(feature = "wgpu")]
            {
                train_backend::<Autodiff<Wgpu<f32>>, _>(&config, &args, "wgpu", init_runtime)
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

fn train_backend<B, Init>(
    config: &AppConfig,
    args: &Cli,
    backend_name: &str,
    init_backend: Init,
) -> Result<()>
where
    B: AutodiffBackend,
    Init: Fn(&B::Device),
{
    let device = B::Device::default();
    B::seed(&device, config.training.seed);
    init_backend(&device);
    info!("Using {backend_name} backend");

    let tokenizer = config.tokenizer.load().context("failed to load tokenizer")?;
    info!(
        "Tokenizer `{}` ready with {} tokens",
        config.tokenizer.kind_name(),
        tokenizer.len()
    );

    let corpus = LyricsCorpus::from_csv(&args.songs_csv, &config.training.corpus)?;
    let chunks = corpus.chunks(tokenizer.as_ref(), config.training.chunk_len)?;
    let batcher = ChunkBatcher::new(chunks, config.training.batch_size)?;

    let model_config = build_model_config(&config.model, tokenizer.len());
    let model = match &args.resume {
        Some(path) => {
            info!("Resuming from {}", path.display());
            load_checkpoint::<B>(&model_config, path, &device)?
        }
        None => RecurrentLm::<B>::new(&model_config, &device),
    };

    let (_model, summary) = train(
        model,
        &batcher,
        tokenizer.special_tokens(),
        &config.training,
        &device,
        &args.output,
    )?;

    if let Some(last) = summary.epoch_losses.last() {
        info!(
            "Training complete on {backend_name}: {} steps, final epoch loss {last:.4}, checkpoint {}",
            summary.steps,
            summary.checkpoint.display()
        );
    }

    Ok(())
}
