use burn::module::Module;
use burn::nn::gru::{Gru, GruConfig};
use burn::nn::{Embedding, EmbeddingConfig, LayerNorm, LayerNormConfig, Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use super::config::RecurrentLmConfig;
use super::state::HiddenState;

/// Embedding, single-layer GRU, layer norm and a projection onto vocabulary logits.
///
/// The module carries no recurrent state of its own: every entry point takes the
/// previous [`HiddenState`] as an argument and returns the next one.
#[derive(Module, Debug)]
pub struct RecurrentLm<B: Backend> {
    vocab_size: usize,
    hidden_dim: usize,
    embedding: Embedding<B>,
    gru: Gru<B>,
    layer_norm: LayerNorm<B>,
    fc: Linear<B>,
}

impl<B: Backend> RecurrentLm<B> {
    pub fn new(config: &RecurrentLmConfig, device: &B::Device) -> Self {
        let embedding = EmbeddingConfig::new(config.vocab_size, config.embed_dim).init(device);
        let gru = GruConfig::new(config.embed_dim, config.hidden_dim, true).init(device);
        let layer_norm = LayerNormConfig::new(config.hidden_dim)
            .with_epsilon(config.layer_norm_eps)
            .init(device);
        let fc = LinearConfig::new(config.hidden_dim, config.vocab_size).init(device);

        Self {
            vocab_size: config.vocab_size,
            hidden_dim: config.hidden_dim,
            embedding,
            gru,
            layer_norm,
            fc,
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    pub fn init_state(&self, batch: usize, device: &B::Device) -> HiddenState<B> {
        HiddenState::zeros(batch, self.hidden_dim, device)
    }

    /// Full-sequence pass from a zero state. Returns `[batch, time, vocab]` logits
    /// and the state after the last position.
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> (Tensor<B, 3>, HiddenState<B>) {
        self.forward_with_state(tokens, None)
    }

    pub fn forward_with_state(
        &self,
        tokens: Tensor<B, 2, Int>,
        state: Option<HiddenState<B>>,
    ) -> (Tensor<B, 3>, HiddenState<B>) {
        let [batch, time] = tokens.dims();
        assert!(time > 0, "recurrent forward requires at least one time step");

        let embedded = self.embedding.forward(tokens);
        let outputs = self
            .gru
            .forward(embedded, state.map(HiddenState::into_tensor));

        let last = outputs
            .clone()
            .slice_dim(1, (time - 1)..time)
            .reshape([batch, self.hidden_dim]);
        let logits = self.fc.forward(self.layer_norm.forward(outputs));

        (logits, HiddenState::from_tensor(last))
    }

    /// Advance every sequence in the batch by one token. Returns `[batch, vocab]` logits.
    pub fn step(
        &self,
        tokens: Tensor<B, 1, Int>,
        state: HiddenState<B>,
    ) -> (Tensor<B, 2>, HiddenState<B>) {
        let [batch] = tokens.dims();
        let (logits, next) = self.forward_with_state(tokens.reshape([batch, 1]), Some(state));
        (logits.reshape([batch, self.vocab_size]), next)
    }
}
