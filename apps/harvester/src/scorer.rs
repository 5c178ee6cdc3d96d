//! Compatibility scoring — pluggable, trait-based scorer that measures a
//! resume against one extracted listing.
//!
//! The pipeline holds a `Box<dyn CompatibilityScorer>` and treats scoring
//! as strictly optional: a scorer failure downgrades the record to
//! unscored, it never blocks persistence.

use async_trait::async_trait;

use crate::errors::PipelineError;
use crate::extract::ExtractedRecord;
use crate::llm_client::prompts::{build_match_score_prompt, MATCH_SCORE_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};

/// The scorer trait. Implement this to swap backends without touching the
/// pipeline.
#[async_trait]
pub trait CompatibilityScorer: Send + Sync {
    /// Returns the scorer's verdict for `listing_text` against
    /// `resume_text`, as opaque text stored verbatim on the record.
    async fn score(&self, resume_text: &str, listing_text: &str)
        -> Result<String, PipelineError>;
}

/// Claude-backed scorer. The response keeps the model's full tagged output
/// (scratchpad, justification, match_score); callers that want just the
/// percentage can extract the `<match_score>` tag downstream.
pub struct LlmCompatibilityScorer {
    llm: LlmClient,
}

impl LlmCompatibilityScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CompatibilityScorer for LlmCompatibilityScorer {
    async fn score(
        &self,
        resume_text: &str,
        listing_text: &str,
    ) -> Result<String, PipelineError> {
        let prompt = build_match_score_prompt(resume_text, listing_text);
        let response = self
            .llm
            .call(&prompt, MATCH_SCORE_SYSTEM)
            .await
            .map_err(|e| PipelineError::Llm(e.to_string()))?;
        let text = response
            .text()
            .ok_or_else(|| PipelineError::Llm(LlmError::EmptyContent.to_string()))?;
        Ok(text.to_string())
    }
}

/// Flattens a record into the listing text handed to the scorer: every
/// extracted field on its own `name: value` line, sentinels included so
/// the model sees what the page did not provide.
pub fn listing_text(record: &ExtractedRecord) -> String {
    record
        .columns()
        .into_iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
