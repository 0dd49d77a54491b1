#![recursion_limit = "256"]

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::tensor::backend::Backend;
use burn_ndarray::NdArray;
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[cfg(feature = "wgpu")]
use burn_lyrics::wgpu::init_runtime;
#[cfg(feature = "wgpu")]
use burn_wgpu::Wgpu;

use burn_lyrics::telemetry::init_tracing;
use burn_lyrics::tokenizer::{BOS_TOKEN, EOS_TOKEN};
use burn_lyrics::{
    AppConfig, GenerationSettings, LyricsGenerator, generate_tokens, load_config_with_base,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate lyrics from a trained checkpoint")]
struct Args {
    /// Additional configuration files applied in order (later files override earlier ones).
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Vec<PathBuf>,
    /// Checkpoint base path (overrides `server.checkpoint`).
    #[arg(long, value_name = "PATH")]
    checkpoint: Option<PathBuf>,
    /// Text the song starts with.
    #[arg(long, default_value = "")]
    prompt: String,
    /// Cap on the generated sequence, prompt included.
    #[arg(long, value_name = "N")]
    max_length: Option<usize>,
    /// Sampling temperature; lower is more conservative.
    #[arg(long)]
    temperature: Option<f32>,
    /// Seed the sampler for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
    /// Print the unformatted text instead of stanzas.
    #[arg(long)]
    raw: bool,
    /// Print tokens as they are sampled.
    #[arg(long)]
    streaming: bool,
    /// Backend to run inference on.
    #[arg(long, value_enum, default_value_t = BackendArg::Ndarray)]
    backend: BackendArg,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BackendArg {
    Ndarray,
    Wgpu,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config_with_base(Path::new("config/base.toml"), &args.config)?;

    match args.backend {
        BackendArg::Ndarray => infer_backend::<NdArray<f32>, _>(&config, &args, |_| {}),
        BackendArg::Wgpu => {
            #[cfg(feature = "wgpu")]
            {
                infer_backend::<Wgpu<f32>, _>(&config, &args, init_runtime)
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

fn infer_backend<B, Init>(config: &AppConfig, args: &Args, init_backend: Init) -> Result<()>
where
    B: Backend,
    Init: Fn(&B::Device),
{
    let device = B::Device::default();
    init_backend(&device);

    let checkpoint = args
        .checkpoint
        .clone()
        .unwrap_or_else(|| config.server.checkpoint.clone());
    let generator = LyricsGenerator::<B>::load(config, &checkpoint, device.clone())?;

    let settings = GenerationSettings {
        max_length: args.max_length.unwrap_or(config.generation.max_length),
        temperature: args.temperature.unwrap_or(config.generation.temperature),
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if args.streaming {
        return stream(&generator, &device, &args.prompt, settings, &mut rng);
    }

    let lyrics = generator.generate_with_rng(&args.prompt, settings, &mut rng)?;
    if args.raw {
        println!("{}", lyrics.raw_text);
    } else {
        println!("{}", lyrics.formatted_text);
    }

    Ok(())
}

/// Print the decoded text after every sampled token. Output is raw; stanza
/// layout needs the whole song.
fn stream<B: Backend>(
    generator: &LyricsGenerator<B>,
    device: &B::Device,
    prompt: &str,
    settings: GenerationSettings,
    rng: &mut StdRng,
) -> Result<()> {
    let tokenizer = generator.tokenizer().clone();
    let model = generator.model_snapshot();

    let prompt_ids = tokenizer.encode(&format!("{BOS_TOKEN}{prompt}"))?;
    let prompt_text = without_markers(&tokenizer.decode(&prompt_ids)?);
    let mut writer = io::stdout();
    writer
        .write_all(prompt_text.as_bytes())
        .context("failed to write prompt to stdout")?;
    writer.flush().context("failed to flush stdout")?;

    let mut sequence = prompt_ids.clone();
    let mut printed = prompt_text.len();
    let mut stream_err: Option<anyhow::Error> = None;
    let mut on_token = |token: u32| {
        if stream_err.is_some() {
            return;
        }
        sequence.push(token);
        let decoded = match tokenizer.decode(&sequence) {
            Ok(text) => without_markers(&text),
            Err(err) => {
                stream_err = Some(err);
                return;
            }
        };
        if decoded.len() > printed && decoded.is_char_boundary(printed) {
            let fresh = &decoded[printed..];
            if let Err(err) = writer
                .write_all(fresh.as_bytes())
                .and_then(|_| writer.flush())
            {
                stream_err = Some(anyhow::anyhow!("failed to write streamed token: {err}"));
                return;
            }
            printed = decoded.len();
        }
    };
    let callback: &mut dyn FnMut(u32) = &mut on_token;

    generate_tokens(
        &model,
        prompt_ids,
        tokenizer.special_tokens(),
        device,
        settings,
        rng,
        Some(callback),
    )?;

    if let Some(err) = stream_err {
        return Err(err);
    }

    println!();
    Ok(())
}

fn without_markers(text: &str) -> String {
    text.replace(BOS_TOKEN, "").replace(EOS_TOKEN, "")
}
