mod checkpoint;
mod config;
mod loss;
mod recurrent;
mod state;

pub use checkpoint::{checkpoint_file, load_checkpoint, save_checkpoint};
pub use config::{RecurrentLmConfig, build_model_config};
pub use loss::language_model_loss;
pub use recurrent::RecurrentLm;
pub use state::HiddenState;
