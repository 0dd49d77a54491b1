use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::backend::Backend;

use super::config::RecurrentLmConfig;
use super::recurrent::RecurrentLm;

type CheckpointRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

const CHECKPOINT_EXTENSION: &str = "mpk";

/// File actually written for a checkpoint base path (the recorder owns the extension).
pub fn checkpoint_file(base: &Path) -> PathBuf {
    let mut path = base.to_path_buf();
    path.set_extension(CHECKPOINT_EXTENSION);
    path
}

/// Persist parameters keyed by module path, creating missing parent directories.
pub fn save_checkpoint<B: Backend>(model: &RecurrentLm<B>, base: &Path) -> Result<PathBuf> {
    if let Some(parent) = base.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    model
        .clone()
        .save_file(base.to_path_buf(), &CheckpointRecorder::new())
        .map_err(|err| anyhow!("failed to save checkpoint {}: {err:?}", base.display()))?;

    Ok(checkpoint_file(base))
}

pub fn load_checkpoint<B: Backend>(
    config: &RecurrentLmConfig,
    base: &Path,
    device: &B::Device,
) -> Result<RecurrentLm<B>> {
    let file = checkpoint_file(base);
    if !file.is_file() {
        return Err(anyhow!("checkpoint file {} not found", file.display()));
    }

    RecurrentLm::<B>::new(config, device)
        .load_file(base.to_path_buf(), &CheckpointRecorder::new(), device)
        .map_err(|err| anyhow!("failed to load checkpoint {}: {err:?}", file.display()))
}
