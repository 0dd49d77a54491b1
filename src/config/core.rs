use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tokenizer::TokenizerConfig;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelOverrides,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    #[serde(default)]
    pub training: TrainingHyperparameters,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct ModelOverrides {
    pub embed_dim: Option<usize>,
    pub hidden_dim: Option<usize>,
    pub layer_norm_eps: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TrainingHyperparameters {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_chunk_len")]
    pub chunk_len: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_log_frequency")]
    pub log_frequency: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub corpus: CorpusConfig,
}

impl Default for TrainingHyperparameters {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            chunk_len: default_chunk_len(),
            learning_rate: default_learning_rate(),
            log_frequency: default_log_frequency(),
            seed: default_seed(),
            corpus: CorpusConfig::default(),
        }
    }
}

/// Layout of the lyrics CSV consumed by the trainer.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CorpusConfig {
    #[serde(default = "default_lyrics_column")]
    pub lyrics_column: usize,
    #[serde(default = "default_skip_header_rows")]
    pub skip_header_rows: usize,
    #[serde(default = "default_skip_trailing_rows")]
    pub skip_trailing_rows: usize,
    #[serde(default = "default_section_marker_pattern")]
    pub section_marker_pattern: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            lyrics_column: default_lyrics_column(),
            skip_header_rows: default_skip_header_rows(),
            skip_trailing_rows: default_skip_trailing_rows(),
            section_marker_pattern: default_section_marker_pattern(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GenerationConfig {
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default = "default_checkpoint")]
    pub checkpoint: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            checkpoint: default_checkpoint(),
        }
    }
}

fn default_epochs() -> usize {
    15
}

fn default_batch_size() -> usize {
    32
}

fn default_chunk_len() -> usize {
    64
}

fn default_learning_rate() -> f64 {
    7e-4
}

fn default_log_frequency() -> usize {
    100
}

fn default_seed() -> u64 {
    1337
}

fn default_lyrics_column() -> usize {
    2
}

fn default_skip_header_rows() -> usize {
    1
}

fn default_skip_trailing_rows() -> usize {
    5
}

fn default_section_marker_pattern() -> String {
    r"\n\[[\x20-\x7f]+\]".to_string()
}

fn default_max_length() -> usize {
    128
}

fn default_temperature() -> f32 {
    0.8
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

pub fn default_checkpoint() -> PathBuf {
    PathBuf::from("models/model")
}
