use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while merging content into a target file.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The target file does not exist and creation was not requested.
    #[error("resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),
    /// A registered rule or transform is internally inconsistent.
    #[error("malformed rule: {0}")]
    MalformedRule(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MergeError {
    pub fn is_resource_not_found(&self) -> bool {
        matches!(self, MergeError::ResourceNotFound(_))
    }

    pub fn is_malformed_rule(&self) -> bool {
        matches!(self, MergeError::MalformedRule(_))
    }
}

/// Result type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;
