//! Relevance filtering over extracted records.
//!
//! Each keyword set must land at least one case-insensitive substring hit
//! in the record's title + snippet text; sets combine with AND. Pure
//! functions, no collaborator access.

use serde::{Deserialize, Serialize};

use crate::extract::{ExtractedRecord, SENTINEL};

/// Fields whose text feeds the relevance check.
const RELEVANCE_FIELDS: [&str; 2] = ["title", "snippet"];

/// An immutable set of lowercase search terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSet {
    terms: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// True when at least one term appears in the (already lowercased) blob.
    fn hits(&self, blob: &str) -> bool {
        self.terms.iter().any(|term| blob.contains(term.as_str()))
    }
}

/// AND across all keyword sets; each set needs one substring hit.
/// An empty set list passes everything. Sentinel fields contribute no
/// text, so a record that matched nothing can never pass a non-empty set.
pub fn is_relevant(record: &ExtractedRecord, keyword_sets: &[KeywordSet]) -> bool {
    let blob = relevance_blob(record);
    keyword_sets.iter().all(|set| set.hits(&blob))
}

fn relevance_blob(record: &ExtractedRecord) -> String {
    RELEVANCE_FIELDS
        .iter()
        .filter_map(|field| record.get(field))
        .filter(|value| *value != SENTINEL)
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
