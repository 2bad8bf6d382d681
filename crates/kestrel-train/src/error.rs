use kestrel_core::MatrixError;

/// Training-step errors.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error("graph error: {0}")]
    Graph(String),

    #[error("optimizer error: {0}")]
    Optimizer(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("scheduler is required for exponential smoothing")]
    SchedulerRequired,

    #[error("invalid trainer config: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<kestrel_core::DeviceError> for TrainError {
    fn from(e: kestrel_core::DeviceError) -> Self {
        TrainError::Matrix(MatrixError::Device(e))
    }
}
