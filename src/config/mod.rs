pub mod core;
mod loader;

pub use self::core::{
    AppConfig, CorpusConfig, GenerationConfig, ModelOverrides, ServerConfig,
    TrainingHyperparameters, default_checkpoint,
};
pub use loader::{load_config, load_config_with_base};
