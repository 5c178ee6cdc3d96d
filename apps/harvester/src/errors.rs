use thiserror::Error;

use crate::export::ExportError;
use crate::nav::NavError;

/// Pipeline-level error type.
///
/// Locator misses and single-node extraction failures never reach this
/// enum: they are absorbed inside the extractor (the field falls back to
/// the sentinel, the node is skipped). What remains here is the
/// per-collaborator failures the run loop logs and contains per unit.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("navigation error: {0}")]
    Navigation(#[from] NavError),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("export error: {0}")]
    Export(#[from] ExportError),

    #[error("LLM error: {0}")]
    Llm(String),
}
