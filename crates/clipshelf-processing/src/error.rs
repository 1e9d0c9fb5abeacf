//! Pipeline error taxonomy.

use clipshelf_core::models::ReferenceError;
use clipshelf_core::AppError;
use clipshelf_storage::StorageError;
use thiserror::Error;

use crate::command::CommandError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload was rejected before any processing happened
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload exceeds the size limit: {0}")]
    PayloadTooLarge(String),

    /// An external tool failed; `diagnostics` carries its stderr
    #[error("Processing error: {message}")]
    Processing {
        message: String,
        diagnostics: Option<String>,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn processing(message: impl Into<String>) -> Self {
        PipelineError::Processing {
            message: message.into(),
            diagnostics: None,
        }
    }

    pub(crate) fn from_tool(err: CommandError) -> Self {
        PipelineError::Processing {
            message: err.to_string(),
            diagnostics: None,
        }
    }
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        PipelineError::Storage(err.to_string())
    }
}

impl From<ReferenceError> for PipelineError {
    fn from(err: ReferenceError) -> Self {
        PipelineError::DataIntegrity(err.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(msg) => AppError::InvalidInput(msg),
            PipelineError::PayloadTooLarge(msg) => AppError::PayloadTooLarge(msg),
            PipelineError::Processing {
                message,
                diagnostics,
            } => AppError::Processing {
                message,
                diagnostics,
            },
            PipelineError::Storage(msg) => AppError::Storage(msg),
            PipelineError::DataIntegrity(msg) => AppError::DataIntegrity(msg),
            PipelineError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
