#![recursion_limit = "256"]

use std::hint::black_box;

use burn::tensor::backend::Backend as BackendTrait;
use burn::tensor::{Int, Tensor, TensorData};
use burn_lyrics::tokenizer::{ByteTokenizer, Tokenizer};
use burn_lyrics::{GenerationSettings, RecurrentLm, RecurrentLmConfig, generate_tokens};
use burn_ndarray::NdArray;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Clone, Copy)]
struct ModelShape {
    name: &'static str,
    embed_dim: usize,
    hidden_dim: usize,
}

const SHAPES: &[ModelShape] = &[
    ModelShape {
        name: "e32_h128",
        embed_dim: 32,
        hidden_dim: 128,
    },
    ModelShape {
        name: "e64_h512",
        embed_dim: 64,
        hidden_dim: 512,
    },
];

const PROMPT_LEN: usize = 16;
const MAX_LENGTH: usize = 64;

type Backend = NdArray<f32>;

fn build_model(shape: ModelShape, device: &<Backend as BackendTrait>::Device) -> RecurrentLm<Backend> {
    let config = RecurrentLmConfig {
        vocab_size: ByteTokenizer::new().len(),
        embed_dim: shape.embed_dim,
        hidden_dim: shape.hidden_dim,
        layer_norm_eps: 1e-5,
    };
    RecurrentLm::new(&config, device)
}

fn prefill_bench(c: &mut Criterion) {
    let device = <Backend as BackendTrait>::Device::default();
    let mut group = c.benchmark_group("prefill/ndarray");

    for &shape in SHAPES {
        let model = build_model(shape, &device);
        let ids: Vec<i64> = (0..PROMPT_LEN as i64).map(|id| 97 + id % 26).collect();
        group.throughput(Throughput::Elements(PROMPT_LEN as u64));
        group.bench_with_input(BenchmarkId::from_parameter(shape.name), &ids, |b, ids| {
            b.iter(|| {
                let tokens = Tensor::<Backend, 2, Int>::from_data(
                    TensorData::new(ids.clone(), [1, PROMPT_LEN]),
                    &device,
                );
                let (logits, state) = model.forward(tokens);
                black_box((logits.into_data(), state));
            });
        });
    }

    group.finish();
}

fn sampling_bench(c: &mut Criterion) {
    let device = <Backend as BackendTrait>::Device::default();
    let tokenizer = ByteTokenizer::new();
    let special = tokenizer.special_tokens();
    let prompt = tokenizer
        .encode("<s>We are never ever")
        .unwrap_or_else(|_| vec![special.bos]);
    let mut group = c.benchmark_group("generate/ndarray");

    for &shape in SHAPES {
        let model = build_model(shape, &device);
        let settings = GenerationSettings {
            max_length: MAX_LENGTH,
            temperature: 0.8,
        };
        group.throughput(Throughput::Elements((MAX_LENGTH - prompt.len()) as u64));
        group.bench_function(BenchmarkId::from_parameter(shape.name), |b| {
            let mut rng = StdRng::seed_from_u64(0);
            b.iter(|| {
                let tokens = generate_tokens(
                    &model,
                    prompt.clone(),
                    special,
                    &device,
                    settings,
                    &mut rng,
                    None,
                );
                black_box(tokens).ok();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, prefill_bench, sampling_bench);
criterion_main!(benches);
