//! Trainer configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Result, TrainError};

/// Configuration for `SingletonTrainer`.
///
/// Every field has a default, so a JSON config only needs to name what it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Scale each update by `target words in batch / avg_batch_words`.
    pub scale_learning_rate: bool,
    /// Typical number of target words per batch; the reference point for scaling.
    pub avg_batch_words: f32,
    /// Minimum decay for exponential smoothing of parameters (0.0 = off).
    pub exponential_smoothing: f32,
    /// Checkpoint file written when the scheduler asks for a save.
    pub model_path: PathBuf,
    /// Tensor name of the parameters inside the checkpoint.
    pub param_name: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            scale_learning_rate: false,
            avg_batch_words: 1.0,
            exponential_smoothing: 0.0,
            model_path: PathBuf::from("model.safetensors"),
            param_name: "params".into(),
        }
    }
}

impl TrainerConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: TrainerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Whether parameter averaging is enabled.
    pub fn smoothing_enabled(&self) -> bool {
        self.exponential_smoothing > 0.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.scale_learning_rate && (self.avg_batch_words.is_nan() || self.avg_batch_words <= 0.0) {
            return Err(TrainError::Config(format!(
                "avg_batch_words must be positive when scaling the learning rate, got {}",
                self.avg_batch_words
            )));
        }
        if !(0.0..1.0).contains(&self.exponential_smoothing) {
            return Err(TrainError::Config(format!(
                "exponential_smoothing must be in [0, 1), got {}",
                self.exponential_smoothing
            )));
        }
        if self.param_name.is_empty() {
            return Err(TrainError::Config("param_name must not be empty".into()));
        }
        Ok(())
    }
}
