use crate::graph::ExpressionGraph;
use crate::scheduler::TrainingObserver;
use crate::Result;

/// Parameter update rule.
///
/// The rule itself is external; it observes the scheduler so it can follow
/// learning-rate changes.
pub trait Optimizer: TrainingObserver {
    /// Apply one update to `graph`'s parameters from its current gradients.
    /// `multiply_factor` scales the learning rate for this step only.
    fn update(&mut self, graph: &mut dyn ExpressionGraph, multiply_factor: f32) -> Result<()>;
}
