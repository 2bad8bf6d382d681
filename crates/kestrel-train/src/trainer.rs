//! SingletonTrainer: one training step on one device.
//!
//! Orchestrates forward pass, backward pass, optimizer update, exponential
//! smoothing of the parameters, and the scheduler's save/validate triggers.
//!
//! # Example (Rust)
//! ```ignore
//! use kestrel_train::{SingletonTrainer, TrainerConfig};
//!
//! let config = TrainerConfig::from_file(Path::new("train.json"))?;
//! let mut trainer = SingletonTrainer::new(graph, optimizer, config)?;
//! trainer.set_scheduler(scheduler);
//!
//! for batch in corpus.batches() {
//!     let report = trainer.execute(&batch)?;
//!     if report.saved {
//!         println!("checkpoint after {} words", report.words);
//!     }
//! }
//! ```

use kestrel_core::DeviceMatrix;
use tracing::{debug, info, warn};

use crate::averaging::update_avg_params;
use crate::checkpoint::save_params;
use crate::config::TrainerConfig;
use crate::graph::{Batch, ExpressionGraph};
use crate::optimizer::Optimizer;
use crate::scheduler::Scheduler;
use crate::{Result, TrainError};

/// Outcome of one `execute` call.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Cost returned by the forward pass.
    pub cost: f32,
    /// Target words in the batch.
    pub words: usize,
    /// A checkpoint was written during this step.
    pub saved: bool,
    /// A validation run happened during this step.
    pub validated: bool,
}

/// Training coordinator for a single graph on a single device.
pub struct SingletonTrainer {
    graph: Box<dyn ExpressionGraph>,
    optimizer: Box<dyn Optimizer>,
    scheduler: Option<Box<dyn Scheduler>>,
    /// Smoothed copy of the graph parameters, created on the first step.
    avg_params: Option<DeviceMatrix>,
    config: TrainerConfig,
}

impl SingletonTrainer {
    pub fn new(
        graph: impl ExpressionGraph + 'static,
        optimizer: impl Optimizer + 'static,
        config: TrainerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            graph: Box::new(graph),
            optimizer: Box::new(optimizer),
            scheduler: None,
            avg_params: None,
            config,
        })
    }

    pub fn set_scheduler(&mut self, scheduler: impl Scheduler + 'static) {
        self.scheduler = Some(Box::new(scheduler));
    }

    /// Run one training step on `batch`.
    pub fn execute(&mut self, batch: &dyn Batch) -> Result<StepReport> {
        let cost = self.graph.forward(batch)?;
        if !cost.is_finite() {
            warn!(cost, "non-finite cost");
        }
        self.graph.backward()?;

        let words = batch.words_trg();
        let factor = if self.config.scale_learning_rate {
            words as f32 / self.config.avg_batch_words
        } else {
            1.0
        };
        self.optimizer.update(self.graph.as_mut(), factor)?;

        if self.config.smoothing_enabled() {
            self.smooth_params()?;
        }

        let mut report = StepReport {
            cost,
            words,
            saved: false,
            validated: false,
        };

        let (saving, validating) = match self.scheduler.as_mut() {
            Some(scheduler) => {
                scheduler.update(cost, batch);
                let state = scheduler.state().clone();
                // Scheduler first, optimizer last, so the optimizer sees
                // the learning rate the scheduler just settled on.
                scheduler.on_update(&state);
                self.optimizer.on_update(&state);
                debug!(batches = state.batches, eta = state.eta, cost, "training step");
                (scheduler.saving(), scheduler.validating())
            }
            None => return Ok(report),
        };

        if saving {
            self.save()?;
            report.saved = true;
        }
        if validating {
            self.validate()?;
            report.validated = true;
        }
        Ok(report)
    }

    fn smooth_params(&mut self) -> Result<()> {
        let batches = self
            .scheduler
            .as_ref()
            .ok_or(TrainError::SchedulerRequired)?
            .number_of_batches();

        match self.avg_params.as_mut() {
            Some(avg) => update_avg_params(
                avg,
                self.graph.params(),
                batches,
                self.config.exponential_smoothing,
            ),
            None => {
                self.avg_params = Some(self.graph.params().try_clone()?);
                Ok(())
            }
        }
    }

    /// Validate through the scheduler, using the smoothed parameters when
    /// averaging is enabled. The live parameters are restored afterwards.
    pub fn validate(&mut self) -> Result<()> {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return Ok(());
        };
        match self.avg_params.as_mut() {
            Some(avg) => {
                self.graph.params_mut().swap(avg);
                let result = scheduler.validate(self.graph.as_ref());
                self.graph.params_mut().swap(avg);
                result?;
            }
            None => scheduler.validate(self.graph.as_ref())?,
        }
        info!(batches = scheduler.number_of_batches(), "validated model");
        Ok(())
    }

    /// Write a checkpoint to `config.model_path`; the smoothed parameters
    /// are saved when averaging is enabled.
    pub fn save(&self) -> Result<()> {
        let params = self.avg_params.as_ref().unwrap_or_else(|| self.graph.params());
        save_params(params, &self.config.param_name, &self.config.model_path)?;
        info!(path = %self.config.model_path.display(), size = params.size(), "saved model");
        Ok(())
    }

    pub fn graph(&self) -> &dyn ExpressionGraph {
        self.graph.as_ref()
    }

    /// Smoothed parameters, once the first averaged step has run.
    pub fn avg_params(&self) -> Option<&DeviceMatrix> {
        self.avg_params.as_ref()
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }
}
