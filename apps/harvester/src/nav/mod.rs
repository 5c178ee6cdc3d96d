//! Navigation collaborator interface.
//!
//! The extractor and pipeline depend only on these traits, never on a
//! concrete fetching engine. `HttpNavigator` is the shipped
//! implementation; tests substitute in-memory fakes, and a real browser
//! engine could sit behind the same surface.

use async_trait::async_trait;
use thiserror::Error;

pub mod http;

pub use http::HttpNavigator;

/// Errors surfaced by a navigation collaborator.
///
/// Note the asymmetry: `Navigator::open` failures abort the *page*, while
/// `ListingNode` query failures are absorbed by the extractor as locator
/// misses and never propagate.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("node query failed: {0}")]
    Query(String),
}

/// Opens result pages. One instance per run, carried in the run context.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn open(&self, url: &str) -> Result<Box<dyn PageHandle>, NavError>;
}

/// A loaded results page. Yields candidate listing nodes for a locator.
pub trait PageHandle: Send {
    /// All descendants matching `locator`. An unparseable locator yields
    /// an empty collection, not an error.
    fn query_all(&self, locator: &str) -> Vec<Box<dyn ListingNode>>;
}

/// One DOM subtree representing a single job posting. Read-only.
pub trait ListingNode: Send {
    /// First descendant matching `locator`, if any.
    fn query_one(&self, locator: &str) -> Result<Option<Box<dyn ListingNode>>, NavError>;

    /// Rendered inner text of this node.
    fn read_text(&self) -> Result<String, NavError>;

    /// Value of the named attribute on this node's own element.
    fn read_attribute(&self, name: &str) -> Result<Option<String>, NavError>;
}
