use std::path::Path;

use anyhow::{Context, Result};
use burn::tensor::backend::Backend;
use parking_lot::Mutex;
use rand::Rng;
use tracing::info;

use crate::format::format_as_song;
use crate::generation::{GenerationSettings, generate_text};
use crate::model::{RecurrentLm, build_model_config, checkpoint_file, load_checkpoint};
use crate::tokenizer::SharedTokenizer;
use crate::{AppConfig, GenerationConfig};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedLyrics {
    pub raw_text: String,
    pub formatted_text: String,
}

/// Trained model, tokenizer and device, built once and read-only afterwards.
///
/// burn modules are `Send` but not `Sync`, so the model sits behind a mutex that
/// is held only while cloning it. Module clones share tensor storage, and every
/// request samples on its own clone with its own hidden state.
pub struct LyricsGenerator<B: Backend> {
    model: Mutex<RecurrentLm<B>>,
    tokenizer: SharedTokenizer,
    device: B::Device,
    defaults: GenerationConfig,
}

impl<B: Backend> LyricsGenerator<B> {
    pub fn new(
        model: RecurrentLm<B>,
        tokenizer: SharedTokenizer,
        device: B::Device,
        defaults: GenerationConfig,
    ) -> Self {
        Self {
            model: Mutex::new(model),
            tokenizer,
            device,
            defaults,
        }
    }

    /// Load the configured tokenizer and the checkpoint at `checkpoint`.
    pub fn load(config: &AppConfig, checkpoint: &Path, device: B::Device) -> Result<Self> {
        let tokenizer = config.tokenizer.load().context("failed to load tokenizer")?;
        let model_config = build_model_config(&config.model, tokenizer.len());
        let model = load_checkpoint::<B>(&model_config, checkpoint, &device)?;
        info!(
            "Model loaded from {} (vocab={}, hidden={})",
            checkpoint_file(checkpoint).display(),
            model.vocab_size(),
            model.hidden_dim()
        );

        Ok(Self::new(model, tokenizer, device, config.generation.clone()))
    }

    pub fn defaults(&self) -> &GenerationConfig {
        &self.defaults
    }

    pub fn tokenizer(&self) -> &SharedTokenizer {
        &self.tokenizer
    }

    /// Clone the model out from under the lock.
    pub fn model_snapshot(&self) -> RecurrentLm<B> {
        self.model.lock().clone()
    }

    pub fn generate(&self, prompt: &str, settings: GenerationSettings) -> Result<GeneratedLyrics> {
        self.generate_with_rng(prompt, settings, &mut rand::thread_rng())
    }

    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        prompt: &str,
        settings: GenerationSettings,
        rng: &mut R,
    ) -> Result<GeneratedLyrics> {
        let model = self.model_snapshot();
        let raw_text = generate_text(
            &model,
            self.tokenizer.as_ref(),
            &self.device,
            prompt,
            settings,
            rng,
        )?;
        let formatted_text = format_as_song(&raw_text);

        Ok(GeneratedLyrics {
            raw_text,
            formatted_text,
        })
    }
}
