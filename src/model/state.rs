use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// GRU hidden state for a batch of independent sequences, shape `[batch, hidden]`.
///
/// Each value belongs to exactly one sequence being trained or generated and is
/// passed by value from one step to the next.
#[derive(Debug, Clone)]
pub struct HiddenState<B: Backend> {
    tensor: Tensor<B, 2>,
}

impl<B: Backend> HiddenState<B> {
    pub fn zeros(batch: usize, hidden_dim: usize, device: &B::Device) -> Self {
        Self {
            tensor: Tensor::zeros([batch, hidden_dim], device),
        }
    }

    pub fn from_tensor(tensor: Tensor<B, 2>) -> Self {
        Self { tensor }
    }

    pub fn tensor(&self) -> Tensor<B, 2> {
        self.tensor.clone()
    }

    pub fn into_tensor(self) -> Tensor<B, 2> {
        self.tensor
    }

    pub fn batch_size(&self) -> usize {
        self.tensor.dims()[0]
    }

    pub fn hidden_dim(&self) -> usize {
        self.tensor.dims()[1]
    }
}
