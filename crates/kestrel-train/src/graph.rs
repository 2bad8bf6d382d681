//! Interfaces of the autodiff graph and the batches it consumes.
//!
//! Graph construction, differentiation rules and parameter containers live
//! outside this crate; the trainer only needs these entry points.

use kestrel_core::{DeviceContext, DeviceMatrix};

use crate::Result;

/// A training batch.
pub trait Batch {
    /// Number of target-side words; drives learning-rate scaling.
    fn words_trg(&self) -> usize;

    /// Number of sentence pairs.
    fn size(&self) -> usize;
}

/// A computation graph bound to one device.
///
/// Parameters are exposed as one flat matrix so they can be averaged,
/// swapped and checkpointed without knowing the model structure.
pub trait ExpressionGraph {
    /// Build the model for `batch`, run the forward pass and return the cost.
    fn forward(&mut self, batch: &dyn Batch) -> Result<f32>;

    /// Backpropagate from the cost of the last forward pass.
    fn backward(&mut self) -> Result<()>;

    fn params(&self) -> &DeviceMatrix;

    fn params_mut(&mut self) -> &mut DeviceMatrix;

    /// Gradients from the last backward pass, laid out like `params`.
    fn grads(&self) -> &DeviceMatrix;

    /// Device the graph's tensors live on.
    fn context(&self) -> &DeviceContext {
        self.params().context()
    }
}
