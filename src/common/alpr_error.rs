use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the adapters, the orchestrator and the directory driver.
#[derive(Error, Debug)]
pub enum AlprError {
    /// The model artifact is missing, corrupt, or the runtime refused it.
    #[error("Model load error ({path}): {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// The caller handed over something unusable (empty frame, bad path, bad config).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The runtime failed while executing a model, or produced an unusable tensor.
    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Image decoding error ({path}): {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AlprError {
    pub fn model_load(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        AlprError::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_input(reason: impl std::fmt::Display) -> Self {
        AlprError::InvalidInput(reason.to_string())
    }

    /// Wraps a runtime failure. `{:#}` keeps the whole anyhow context chain.
    pub fn inference(err: anyhow::Error) -> Self {
        AlprError::Inference(format!("{err:#}"))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, AlprError::Decode { .. })
    }
}
