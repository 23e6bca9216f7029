use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("Configuration error: {0}")]
    ConfigInvalid(String),

    #[error("Execution failed: {reason}{}", .source.as_ref().map(|e| format!(": {e}")).unwrap_or_default())]
    ExecutionFailed {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Checksum calculation failed for {}: {source}", .path.display())]
    ChecksumFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Promotion into {tier} failed at {}: {source}", .file.display())]
    PromotionFailed {
        tier: String,
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rotation of {tier} failed at {}: {source}", .file.display())]
    RotationFailed {
        tier: String,
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DumpError>;

impl DumpError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigInvalid(msg.into())
    }

    pub fn execution(reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            reason: reason.into(),
            source: None,
        }
    }

    pub fn execution_io(reason: impl Into<String>, source: std::io::Error) -> Self {
        Self::ExecutionFailed {
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Configuration mistakes never heal on their own; everything else may be
    /// environmental and worth another whole-job attempt by the caller.
    pub fn is_retriable(&self) -> bool {
        !matches!(self, DumpError::ConfigInvalid(_))
    }
}
