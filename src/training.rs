use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Result, anyhow};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::Tensor;
use burn::tensor::backend::{AutodiffBackend, Backend};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::TrainingHyperparameters;
use crate::dataset::ChunkBatcher;
use crate::model::{RecurrentLm, language_model_loss, save_checkpoint};
use crate::tokenizer::SpecialTokens;

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSummary {
    /// Mean batch loss for each completed epoch.
    pub epoch_losses: Vec<f64>,
    pub steps: usize,
    pub checkpoint: PathBuf,
}

/// Run every epoch over shuffled batches with Adam, then write the checkpoint.
pub fn train<B: AutodiffBackend>(
    model: RecurrentLm<B>,
    batcher: &ChunkBatcher,
    special: SpecialTokens,
    training: &TrainingHyperparameters,
    device: &B::Device,
    output: &Path,
) -> Result<(RecurrentLm<B>, TrainingSummary)> {
    let steps_per_epoch = batcher.steps_per_epoch();
    if steps_per_epoch == 0 {
        return Err(anyhow!(
            "corpus has {} chunks, fewer than one batch of {}",
            batcher.len(),
            batcher.batch_size()
        ));
    }

    info!(
        "train schedule: chunks={}, steps_per_epoch={steps_per_epoch}, epochs={}, lr={}",
        batcher.len(),
        training.epochs,
        training.learning_rate
    );

    let mut model = model;
    let mut optimizer = AdamConfig::new().init::<B, RecurrentLm<B>>();
    let mut rng = StdRng::seed_from_u64(training.seed);
    let log_frequency = training.log_frequency.max(1);

    let mut epoch_losses = Vec::with_capacity(training.epochs);
    let mut steps = 0usize;

    for epoch in 0..training.epochs {
        let started = Instant::now();
        let mut total_loss = 0.0f64;

        for (batch_idx, batch) in batcher.epoch::<B, _>(&mut rng, device).enumerate() {
            let (logits, _) = model.forward(batch.inputs);
            let loss = language_model_loss::<B>(logits, batch.targets, special.pad);
            let loss_value = scalar(&loss)?;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(training.learning_rate, model, grads);

            total_loss += loss_value;
            steps += 1;

            if batch_idx % log_frequency == 0 {
                info!(
                    "Epoch {}/{}, Batch {batch_idx}/{steps_per_epoch}, Loss: {loss_value:.4}",
                    epoch + 1,
                    training.epochs
                );
            }
        }

        let avg_loss = total_loss / steps_per_epoch as f64;
        info!(
            "Epoch {}/{} completed in {:.1}s, Average Loss: {avg_loss:.4}",
            epoch + 1,
            training.epochs,
            started.elapsed().as_secs_f32()
        );
        epoch_losses.push(avg_loss);
    }

    let checkpoint = save_checkpoint(&model, output)?;
    info!("Model saved to {}", checkpoint.display());

    Ok((
        model,
        TrainingSummary {
            epoch_losses,
            steps,
            checkpoint,
        },
    ))
}

fn scalar<B: Backend>(loss: &Tensor<B, 1>) -> Result<f64> {
    let values = loss
        .clone()
        .to_data()
        .convert::<f32>()
        .into_vec::<f32>()
        .map_err(|err| anyhow!("{err:?}"))?;
    let value = values
        .first()
        .copied()
        .ok_or_else(|| anyhow!("loss tensor is empty"))?;
    if !value.is_finite() {
        return Err(anyhow!("loss diverged to {value}"));
    }
    Ok(value as f64)
}
