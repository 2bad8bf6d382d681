//! # kestrel-train
//!
//! Single-device training step coordination.
//!
//! The expression graph, the optimizer and the scheduler are external
//! collaborators described here only as traits. `SingletonTrainer` runs one
//! step over them: forward and backward pass, parameter update (optionally
//! scaled by batch size), exponential smoothing of the parameters, and the
//! save/validate triggers the scheduler raises.

pub mod error;
pub mod config;
pub mod graph;
pub mod optimizer;
pub mod scheduler;
pub mod averaging;
pub mod checkpoint;
pub mod trainer;

pub use averaging::{smoothing_decay, update_avg_params};
pub use checkpoint::{load_params, save_params};
pub use config::TrainerConfig;
pub use error::TrainError;
pub use graph::{Batch, ExpressionGraph};
pub use optimizer::Optimizer;
pub use scheduler::{Scheduler, TrainingObserver, TrainingState};
pub use trainer::{SingletonTrainer, StepReport};

pub type Result<T> = std::result::Result<T, TrainError>;
