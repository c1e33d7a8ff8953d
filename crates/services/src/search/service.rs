use super::format::format_search_results;
use super::ports::{SearchError, SearchProviderTrait, SearchResult};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait SearchServiceTrait: Send + Sync {
    /// Validated search returning raw results
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;

    /// Search and render the results as model context
    async fn search_formatted(&self, query: &str) -> Result<String, SearchError> {
        let results = self.search(query).await?;
        Ok(format_search_results(&results))
    }
}

pub struct SearchServiceImpl {
    provider: Arc<dyn SearchProviderTrait>,
}

impl SearchServiceImpl {
    pub fn new(provider: Arc<dyn SearchProviderTrait>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl SearchServiceTrait for SearchServiceImpl {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery(
                "Query must not be empty".to_string(),
            ));
        }

        let results = self.provider.search(query).await?;
        tracing::info!(results = results.len(), "Legal search completed");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ports::MockSearchProviderTrait;
    use crate::search::NO_RESULTS_SENTINEL;

    #[tokio::test]
    async fn test_blank_query_is_rejected_without_provider_call() {
        let mut provider = MockSearchProviderTrait::new();
        provider.expect_search().never();

        let service = SearchServiceImpl::new(Arc::new(provider));
        let result = service.search("   ").await;

        assert!(matches!(result, Err(SearchError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_query_is_trimmed_before_search() {
        let mut provider = MockSearchProviderTrait::new();
        provider
            .expect_search()
            .withf(|query| query.to_string() == "husleieloven")
            .times(1)
            .returning(|_| {
                Ok(vec![SearchResult {
                    title: "Husleieloven".to_string(),
                    link: "https://lovdata.no/husleieloven".to_string(),
                    snippet: "Lov om husleieavtaler".to_string(),
                }])
            });

        let service = SearchServiceImpl::new(Arc::new(provider));
        let results = service.search("  husleieloven \n").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Husleieloven");
    }

    #[tokio::test]
    async fn test_formatted_search_without_results_is_sentinel() {
        let mut provider = MockSearchProviderTrait::new();
        provider.expect_search().returning(|_| Ok(Vec::new()));

        let service = SearchServiceImpl::new(Arc::new(provider));
        let formatted = service.search_formatted("arveloven").await.unwrap();

        assert_eq!(formatted, NO_RESULTS_SENTINEL);
    }

    #[tokio::test]
    async fn test_provider_error_is_propagated() {
        let mut provider = MockSearchProviderTrait::new();
        provider.expect_search().returning(|_| {
            Err(SearchError::ApiError {
                status: 500,
                body: "upstream down".to_string(),
            })
        });

        let service = SearchServiceImpl::new(Arc::new(provider));
        let result = service.search_formatted("arveloven").await;

        assert!(matches!(result, Err(SearchError::ApiError { status: 500, .. })));
    }
}
