use thiserror::Error;

use needlework_merge::MergeError;

use crate::model::GenerationReport;
use crate::render::RenderError;

/// Errors emitted by the generation driver.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Invalid configuration, or a model rejected in strict mode.
    #[error(transparent)]
    Core(#[from] needlework_core::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("merge error: {0}")]
    Merge(#[from] MergeError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("generation failed: {} of {} files produced", .0.files_produced(), .0.files.len())]
    Failed(GenerationReport),
}
