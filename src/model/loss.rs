use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, activation};

/// Mean next-token cross-entropy over `[batch, time]` targets, skipping `pad_id` positions.
pub fn language_model_loss<B: Backend>(
    logits: Tensor<B, 3>,
    targets: Tensor<B, 2, Int>,
    pad_id: u32,
) -> Tensor<B, 1> {
    let [batch, time, vocab] = logits.dims();
    let rows = batch * time;

    let log_probs = activation::log_softmax(logits.reshape([rows, vocab]), 1);
    let targets = targets.reshape([rows]);
    let picked = log_probs
        .gather(1, targets.clone().reshape([rows, 1]))
        .reshape([rows]);

    let keep = targets.not_equal_elem(pad_id as i64).float();
    let count = keep.clone().sum().clamp_min(1.0);

    picked.mul(keep).sum().neg().div(count)
}
