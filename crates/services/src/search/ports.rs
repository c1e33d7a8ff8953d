use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;

/// Result from a web search, in provider order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    RequestFailed(String),
    #[error("Search provider returned an error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },
    #[error("Search response parsing failed: {0}")]
    ResponseParsingFailed(String),
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),
}

/// External web search restricted to trusted legal sources
#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait SearchProviderTrait: Send + Sync {
    /// Search for `query`. Returns an empty list when no credential is configured.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;
}
