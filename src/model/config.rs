use crate::config::ModelOverrides;

#[derive(Clone, Debug, PartialEq)]
pub struct RecurrentLmConfig {
    pub vocab_size: usize,
    pub embed_dim: usize,
    pub hidden_dim: usize,
    pub layer_norm_eps: f64,
}

impl Default for RecurrentLmConfig {
    fn default() -> Self {
        Self {
            vocab_size: 50_259,
            embed_dim: 64,
            hidden_dim: 1024,
            layer_norm_eps: 1e-5,
        }
    }
}

/// Build a model configuration from file overrides and the tokenizer's vocabulary size.
pub fn build_model_config(overrides: &ModelOverrides, vocab_size: usize) -> RecurrentLmConfig {
    let mut model_config = RecurrentLmConfig {
        vocab_size,
        ..RecurrentLmConfig::default()
    };

    if let Some(embed_dim) = overrides.embed_dim {
        model_config.embed_dim = embed_dim;
    }
    if let Some(hidden_dim) = overrides.hidden_dim {
        model_config.hidden_dim = hidden_dim;
    }
    if let Some(eps) = overrides.layer_norm_eps {
        model_config.layer_norm_eps = eps;
    }

    model_config
}
