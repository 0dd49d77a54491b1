#![recursion_limit = "256"]

pub mod config;
pub mod dataset;
pub mod format;
pub mod generation;
pub mod inference;
pub mod model;
pub mod server;
pub mod telemetry;
pub mod tokenizer;
pub mod training;
#[cfg(feature = "wgpu")]
pub mod wgpu;

pub use config::{
    AppConfig, CorpusConfig, GenerationConfig, ModelOverrides, ServerConfig,
    TrainingHyperparameters, load_config, load_config_with_base,
};
pub use dataset::{ChunkBatcher, LyricsCorpus, SequenceBatch, chunk_tokens};
pub use format::format_as_song;
pub use generation::{
    GenerationSettings, generate_text, generate_tokens, prefill_state, sample_from_logits_values,
};
pub use inference::{GeneratedLyrics, LyricsGenerator};
pub use model::{
    HiddenState, RecurrentLm, RecurrentLmConfig, build_model_config, language_model_loss,
    load_checkpoint, save_checkpoint,
};
pub use server::{AppState, router};
pub use tokenizer::{SharedTokenizer, SpecialTokens, Tokenizer, TokenizerConfig};
pub use training::{TrainingSummary, train};
