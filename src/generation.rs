use anyhow::{Result, anyhow};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::GenerationConfig;
use crate::model::{HiddenState, RecurrentLm};
use crate::tokenizer::{BOS_TOKEN, EOS_TOKEN, SpecialTokens, Tokenizer};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationSettings {
    /// Cap on the full sequence, prompt tokens included.
    pub max_length: usize,
    pub temperature: f32,
}

impl GenerationSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(anyhow!(
                "temperature must be a positive finite number, got {}",
                self.temperature
            ));
        }
        Ok(())
    }
}

impl From<&GenerationConfig> for GenerationSettings {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_length: config.max_length,
            temperature: config.temperature,
        }
    }
}

/// Temperature-scaled softmax. Degenerate inputs fall back to a uniform distribution.
pub fn softmax_with_temperature(logits: &[f32], temperature: f32) -> Vec<f32> {
    let vocab = logits.len();
    let scaled: Vec<f32> = logits.iter().map(|value| value / temperature).collect();
    let max_logit = scaled.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let mut probs: Vec<f32> = scaled
        .iter()
        .map(|value| (value - max_logit).exp())
        .collect();
    let sum: f32 = probs.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        let uniform = 1.0 / vocab as f32;
        probs.iter_mut().for_each(|p| *p = uniform);
    } else {
        probs.iter_mut().for_each(|p| *p /= sum);
    }
    probs
}

/// Draw one token id from temperature-scaled logits.
pub fn sample_from_logits_values<R: Rng + ?Sized>(
    logits: &[f32],
    temperature: f32,
    rng: &mut R,
) -> Result<u32> {
    if logits.is_empty() {
        return Err(anyhow!("logits are empty"));
    }

    let probs = softmax_with_temperature(logits, temperature);
    let dist = WeightedIndex::new(&probs).map_err(|err| anyhow!(err.to_string()))?;
    Ok(dist.sample(rng) as u32)
}

/// Run the prompt through the model once. Returns the primed state and the
/// logits at the final prompt position.
pub fn prefill_state<B: Backend>(
    model: &RecurrentLm<B>,
    prompt_tokens: &[u32],
    device: &B::Device,
) -> Result<(HiddenState<B>, Tensor<B, 1>)> {
    let prompt_len = prompt_tokens.len();
    if prompt_len == 0 {
        return Err(anyhow!("prompt must contain at least one token"));
    }

    let ids: Vec<i64> = prompt_tokens.iter().map(|&id| id as i64).collect();
    let prompt_tensor =
        Tensor::<B, 2, Int>::from_data(TensorData::new(ids, [1, prompt_len]), device);

    let (logits, state) = model.forward(prompt_tensor);
    let [_, time, vocab] = logits.dims();
    let last_logits = logits.slice_dim(1, (time - 1)..time).reshape([vocab]);

    Ok((state, last_logits))
}

pub fn sample_token<B: Backend, R: Rng + ?Sized>(
    last_logits: Tensor<B, 1>,
    temperature: f32,
    rng: &mut R,
) -> Result<u32> {
    let values = last_logits
        .to_data()
        .convert::<f32>()
        .into_vec::<f32>()
        .map_err(|err| anyhow!("{err:?}"))?;
    sample_from_logits_values(&values, temperature, rng)
}

/// Feed one token back through the model.
pub fn advance<B: Backend>(
    model: &RecurrentLm<B>,
    state: HiddenState<B>,
    token: u32,
    device: &B::Device,
) -> (Tensor<B, 1>, HiddenState<B>) {
    let input = Tensor::<B, 1, Int>::from_data(TensorData::new(vec![token as i64], [1]), device);
    let (logits, state) = model.step(input, state);
    let vocab = logits.dims()[1];
    (logits.reshape([vocab]), state)
}

/// Sample until an end or pad token is drawn or the sequence reaches `max_length`.
///
/// Returns the prompt followed by every sampled token, including a terminal one.
pub fn generate_tokens<B: Backend, R: Rng + ?Sized>(
    model: &RecurrentLm<B>,
    prompt_tokens: Vec<u32>,
    special: SpecialTokens,
    device: &B::Device,
    settings: GenerationSettings,
    rng: &mut R,
    mut on_token: Option<&mut dyn FnMut(u32)>,
) -> Result<Vec<u32>> {
    settings.validate()?;

    let mut tokens = prompt_tokens;
    let (mut state, mut last_logits) = prefill_state(model, &tokens, device)?;

    while tokens.len() < settings.max_length {
        let next = sample_token(last_logits, settings.temperature, rng)?;
        tokens.push(next);

        if let Some(callback) = &mut on_token {
            callback(next);
        }

        if special.is_terminal(next) {
            break;
        }
        if tokens.len() >= settings.max_length {
            break;
        }

        (last_logits, state) = advance(model, state, next, device);
    }

    Ok(tokens)
}

/// Encode a prompt, sample a continuation and decode it without the sequence markers.
pub fn generate_text<B: Backend, R: Rng + ?Sized>(
    model: &RecurrentLm<B>,
    tokenizer: &dyn Tokenizer,
    device: &B::Device,
    prompt: &str,
    settings: GenerationSettings,
    rng: &mut R,
) -> Result<String> {
    let framed = if prompt.starts_with(BOS_TOKEN) {
        prompt.to_string()
    } else {
        format!("{BOS_TOKEN}{prompt}")
    };

    let prompt_ids = tokenizer.encode(&framed)?;
    let tokens = generate_tokens(
        model,
        prompt_ids,
        tokenizer.special_tokens(),
        device,
        settings,
        rng,
        None,
    )?;

    let decoded = tokenizer.decode(&tokens)?;
    Ok(strip_sequence_markers(&decoded))
}

pub fn strip_sequence_markers(text: &str) -> String {
    text.replace(BOS_TOKEN, "")
        .replace(EOS_TOKEN, "")
        .trim()
        .to_string()
}
