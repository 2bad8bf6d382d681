//! Scheduler interface and the training state it publishes.

use crate::graph::{Batch, ExpressionGraph};
use crate::Result;

/// Progress counters published by the scheduler after every update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingState {
    /// Updates performed so far.
    pub batches: usize,
    /// Completed passes over the corpus.
    pub epochs: usize,
    /// Current learning rate.
    pub eta: f32,
    /// Cost of the most recent batch.
    pub last_cost: f32,
}

/// Anything that reacts to scheduler progress, e.g. an optimizer picking up
/// a new learning rate.
pub trait TrainingObserver {
    fn on_update(&mut self, _state: &TrainingState) {}
}

/// Batch iteration bookkeeping plus the save/validate triggers.
pub trait Scheduler: TrainingObserver {
    /// Record the cost of a finished batch.
    fn update(&mut self, cost: f32, batch: &dyn Batch);

    /// Whether a checkpoint is due.
    fn saving(&self) -> bool;

    /// Whether a validation run is due.
    fn validating(&self) -> bool;

    /// Validate the model currently held by `graph`.
    fn validate(&mut self, graph: &dyn ExpressionGraph) -> Result<()>;

    fn state(&self) -> &TrainingState;

    fn number_of_batches(&self) -> usize {
        self.state().batches
    }
}
