use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use tempfile::tempdir;

use burn_lyrics::{
    RecurrentLm, RecurrentLmConfig, language_model_loss, load_checkpoint, save_checkpoint,
};

type TrainBackend = Autodiff<NdArray<f32>>;
type InferBackend = NdArray<f32>;

const VOCAB: usize = 32;
const PAD: u32 = 0;

fn tiny_config() -> RecurrentLmConfig {
    RecurrentLmConfig {
        vocab_size: VOCAB,
        embed_dim: 8,
        hidden_dim: 16,
        layer_norm_eps: 1e-5,
    }
}

fn sample_tokens<B: Backend>(device: &B::Device) -> (Tensor<B, 2, Int>, Tensor<B, 2, Int>) {
    let tokens = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
    let targets = vec![2, 3, 4, 5, 0, 7, 8, 9, 10, 0];
    let inputs = Tensor::<B, 2, Int>::from_data(TensorData::new(tokens, [2, 5]), device);
    let targets = Tensor::<B, 2, Int>::from_data(TensorData::new(targets, [2, 5]), device);
    (inputs, targets)
}

fn to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Vec<f32> {
    tensor
        .to_data()
        .convert::<f32>()
        .into_vec::<f32>()
        .expect("tensor to vec")
}

fn assert_close(lhs: &[f32], rhs: &[f32]) {
    assert_eq!(lhs.len(), rhs.len());
    for (idx, (a, b)) in lhs.iter().zip(rhs).enumerate() {
        assert!((a - b).abs() < 1e-4, "mismatch at {idx}: {a} vs {b}");
    }
}

#[test]
fn forward_shapes_and_state() {
    let device = <InferBackend as Backend>::Device::default();
    let model = RecurrentLm::<InferBackend>::new(&tiny_config(), &device);
    let (inputs, _) = sample_tokens::<InferBackend>(&device);

    let (logits, state) = model.forward(inputs);
    assert_eq!(logits.dims(), [2, 5, VOCAB]);
    assert_eq!(state.batch_size(), 2);
    assert_eq!(state.hidden_dim(), 16);
}

#[test]
fn stepping_matches_full_sequence() {
    let device = <InferBackend as Backend>::Device::default();
    let model = RecurrentLm::<InferBackend>::new(&tiny_config(), &device);
    let ids = [3i64, 9, 1, 4, 7, 2];
    let inputs =
        Tensor::<InferBackend, 2, Int>::from_data(TensorData::new(ids.to_vec(), [1, 6]), &device);

    let (full_logits, full_state) = model.forward(inputs);
    let last_full = full_logits.slice_dim(1, 5..6).reshape([VOCAB]);

    let mut state = model.init_state(1, &device);
    let mut last_step = None;
    for &id in &ids {
        let token = Tensor::<InferBackend, 1, Int>::from_data(TensorData::new(vec![id], [1]), &device);
        let (logits, next) = model.step(token, state);
        state = next;
        last_step = Some(logits.reshape([VOCAB]));
    }

    assert_close(
        &to_vec(last_full),
        &to_vec(last_step.expect("stepped at least once")),
    );
    assert_close(&to_vec(full_state.tensor()), &to_vec(state.tensor()));
}

#[test]
fn state_carries_across_segments() {
    let device = <InferBackend as Backend>::Device::default();
    let model = RecurrentLm::<InferBackend>::new(&tiny_config(), &device);
    let ids = vec![5i64, 6, 7, 8, 9];
    let whole =
        Tensor::<InferBackend, 2, Int>::from_data(TensorData::new(ids.clone(), [1, 5]), &device);
    let head =
        Tensor::<InferBackend, 2, Int>::from_data(TensorData::new(ids[..3].to_vec(), [1, 3]), &device);
    let tail =
        Tensor::<InferBackend, 2, Int>::from_data(TensorData::new(ids[3..].to_vec(), [1, 2]), &device);

    let (whole_logits, _) = model.forward(whole);
    let (_, state) = model.forward(head);
    let (tail_logits, _) = model.forward_with_state(tail, Some(state));

    assert_close(
        &to_vec(whole_logits.slice_dim(1, 3..5)),
        &to_vec(tail_logits),
    );
}

#[test]
fn loss_backward_runs() {
    let device = <TrainBackend as Backend>::Device::default();
    let model = RecurrentLm::<TrainBackend>::new(&tiny_config(), &device);
    let (inputs, targets) = sample_tokens::<TrainBackend>(&device);

    let (logits, _) = model.forward(inputs);
    let loss = language_model_loss::<TrainBackend>(logits, targets, PAD);
    let value = to_vec(loss.clone())[0];
    assert!(value.is_finite());
    assert!(value > 0.0);
    let _ = loss.backward();
}

#[test]
fn padded_targets_do_not_contribute() {
    let device = <InferBackend as Backend>::Device::default();
    let model = RecurrentLm::<InferBackend>::new(&tiny_config(), &device);
    let (inputs, _) = sample_tokens::<InferBackend>(&device);
    let all_pad = Tensor::<InferBackend, 2, Int>::zeros([2, 5], &device);

    let (logits, _) = model.forward(inputs);
    let loss = language_model_loss::<InferBackend>(logits, all_pad, PAD);
    assert_eq!(to_vec(loss)[0], 0.0);
}

#[test]
fn checkpoint_round_trip() {
    let dir = tempdir().expect("tempdir");
    let base = dir.path().join("nested").join("model");
    let device = <InferBackend as Backend>::Device::default();
    let config = tiny_config();
    let model = RecurrentLm::<InferBackend>::new(&config, &device);

    let written = save_checkpoint(&model, &base).expect("save");
    assert!(written.is_file());
    assert_eq!(written.extension().and_then(|ext| ext.to_str()), Some("mpk"));

    let restored = load_checkpoint::<InferBackend>(&config, &base, &device).expect("load");
    let (inputs, _) = sample_tokens::<InferBackend>(&device);
    let (expected, _) = model.forward(inputs.clone());
    let (actual, _) = restored.forward(inputs);
    assert_close(&to_vec(expected), &to_vec(actual));
}

#[test]
fn missing_checkpoint_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let device = <InferBackend as Backend>::Device::default();
    let err = load_checkpoint::<InferBackend>(&tiny_config(), &dir.path().join("absent"), &device)
        .expect_err("missing checkpoint");
    assert!(err.to_string().contains("not found"));
}
