use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use rand::Rng;
use rand::seq::SliceRandom;

/// Batched token inputs and next-token targets, both `[batch, chunk_len - 1]`.
#[derive(Clone, Debug)]
pub struct SequenceBatch<B: Backend> {
    pub inputs: Tensor<B, 2, Int>,
    pub targets: Tensor<B, 2, Int>,
}

impl<B: Backend> SequenceBatch<B> {
    pub fn new(inputs: Tensor<B, 2, Int>, targets: Tensor<B, 2, Int>) -> Self {
        Self { inputs, targets }
    }
}

/// Fixed-size mini-batches over framed chunks, reshuffled every epoch.
///
/// A trailing partial batch is dropped.
#[derive(Clone, Debug)]
pub struct ChunkBatcher {
    chunks: Vec<Vec<u32>>,
    chunk_len: usize,
    batch_size: usize,
}

impl ChunkBatcher {
    /// All chunks must share one length of at least two tokens.
    pub fn new(chunks: Vec<Vec<u32>>, batch_size: usize) -> anyhow::Result<Self> {
        if batch_size == 0 {
            return Err(anyhow::anyhow!("batch size must be positive"));
        }
        let chunk_len = chunks.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = chunks.iter().position(|chunk| chunk.len() != chunk_len) {
            return Err(anyhow::anyhow!(
                "chunk {bad} has length {} but expected {chunk_len}",
                chunks[bad].len()
            ));
        }
        if !chunks.is_empty() && chunk_len < 2 {
            return Err(anyhow::anyhow!("chunks need at least two tokens to form targets"));
        }

        Ok(Self {
            chunks,
            chunk_len,
            batch_size,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn sequence_len(&self) -> usize {
        self.chunk_len.saturating_sub(1)
    }

    pub fn steps_per_epoch(&self) -> usize {
        self.chunks.len() / self.batch_size
    }

    /// Shuffle chunk order and yield one epoch of full batches.
    pub fn epoch<'a, B: Backend, R: Rng + ?Sized>(
        &'a self,
        rng: &mut R,
        device: &'a B::Device,
    ) -> impl Iterator<Item = SequenceBatch<B>> + use<'a, B, R> {
        let mut order: Vec<usize> = (0..self.chunks.len()).collect();
        order.shuffle(rng);

        let steps = self.steps_per_epoch();
        (0..steps).map(move |step| {
            let start = step * self.batch_size;
            self.build_batch(&order[start..start + self.batch_size], device)
        })
    }

    fn build_batch<B: Backend>(&self, indices: &[usize], device: &B::Device) -> SequenceBatch<B> {
        let seq_len = self.sequence_len();
        let mut inputs = Vec::with_capacity(indices.len() * seq_len);
        let mut targets = Vec::with_capacity(indices.len() * seq_len);

        for &idx in indices {
            let chunk = &self.chunks[idx];
            inputs.extend(chunk[..seq_len].iter().map(|&tok| tok as i64));
            targets.extend(chunk[1..].iter().map(|&tok| tok as i64));
        }

        let shape = [indices.len(), seq_len];
        SequenceBatch::new(
            Tensor::<B, 2, Int>::from_data(TensorData::new(inputs, shape), device),
            Tensor::<B, 2, Int>::from_data(TensorData::new(targets, shape), device),
        )
    }
}
