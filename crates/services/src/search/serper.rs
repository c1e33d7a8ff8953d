use super::ports::{SearchError, SearchProviderTrait, SearchResult};
use config::SearchConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Web search backed by the Serper Google-search API
///
/// Queries are restricted to the configured trusted domains with a `site:`
/// filter. Without an API key every search returns no results and no
/// request is made.
pub struct SerperSearchProvider {
    api_key: Option<String>,
    base_url: String,
    trusted_domains: Vec<String>,
    max_results: u32,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SerperSearchRequest<'a> {
    q: &'a str,
    num: u32,
}

/// Root response from the Serper search endpoint
#[derive(Debug, Clone, Deserialize)]
struct SerperSearchResponse {
    #[serde(default)]
    organic: Vec<SerperOrganicResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct SerperOrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: Option<String>,
}

impl SerperSearchProvider {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SearchError::RequestFailed(format!("Failed to create HTTP client: {e}")))?;

        if config.api_key.is_none() {
            tracing::warn!("SERPER_API_KEY is not set; legal search will return no results");
        }

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            trusted_domains: config.trusted_domains.clone(),
            max_results: config.max_results,
            client,
        })
    }

    /// Prefix the query with a `site:` filter over the trusted domains
    pub fn build_query(&self, query: &str) -> String {
        if self.trusted_domains.is_empty() {
            return query.to_string();
        }

        let sites = self
            .trusted_domains
            .iter()
            .map(|domain| format!("site:{domain}"))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("({sites}) {query}")
    }
}

#[async_trait::async_trait]
impl SearchProviderTrait for SerperSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let Some(api_key) = &self.api_key else {
            tracing::debug!("Search skipped, no API key configured");
            return Ok(Vec::new());
        };

        let filtered_query = self.build_query(query);
        tracing::debug!(query = %filtered_query, "Searching trusted legal sources");

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", api_key)
            .json(&SerperSearchRequest {
                q: &filtered_query,
                num: self.max_results,
            })
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            tracing::error!(status = %status, body = %body, "Serper API error");
            return Err(SearchError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let serper_response: SerperSearchResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Serper response: {}", e);
            SearchError::ResponseParsingFailed(format!("JSON parsing error: {e}"))
        })?;

        let results: Vec<SearchResult> = serper_response
            .organic
            .into_iter()
            .take(self.max_results as usize)
            .map(|result| SearchResult {
                title: result.title,
                link: result.link,
                snippet: result.snippet.unwrap_or_default(),
            })
            .collect();
        tracing::debug!("Found {} results", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config(base_url: String, api_key: Option<&str>) -> SearchConfig {
        SearchConfig {
            api_key: api_key.map(str::to_string),
            base_url,
            trusted_domains: vec!["lovdata.no".to_string(), "regjeringen.no".to_string()],
            max_results: 5,
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_build_query_adds_site_filter() {
        let provider =
            SerperSearchProvider::new(&config("http://localhost".to_string(), None)).unwrap();
        assert_eq!(
            provider.build_query("skifte av dødsbo"),
            "(site:lovdata.no OR site:regjeringen.no) skifte av dødsbo"
        );
    }

    #[tokio::test]
    async fn test_search_without_api_key_makes_no_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200).json_body(json!({"organic": []}));
            })
            .await;

        let provider = SerperSearchProvider::new(&config(server.base_url(), None)).unwrap();
        let results = provider.search("arveloven").await.unwrap();

        assert!(results.is_empty());
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_search_sends_filtered_query_and_maps_results() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/search")
                    .header("x-api-key", "serper-key")
                    .json_body(json!({
                        "q": "(site:lovdata.no OR site:regjeringen.no) ekteskapsloven gjeld",
                        "num": 5
                    }));
                then.status(200).json_body(json!({
                    "searchParameters": {"q": "ignored"},
                    "organic": [
                        {"title": "Ekteskapsloven", "link": "https://lovdata.no/a", "snippet": "§ 40", "position": 1},
                        {"title": "Gjeld i ekteskap", "link": "https://regjeringen.no/b", "position": 2}
                    ]
                }));
            })
            .await;

        let provider =
            SerperSearchProvider::new(&config(server.base_url(), Some("serper-key"))).unwrap();
        let results = provider.search("ekteskapsloven gjeld").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            results,
            vec![
                SearchResult {
                    title: "Ekteskapsloven".to_string(),
                    link: "https://lovdata.no/a".to_string(),
                    snippet: "§ 40".to_string(),
                },
                SearchResult {
                    title: "Gjeld i ekteskap".to_string(),
                    link: "https://regjeringen.no/b".to_string(),
                    snippet: String::new(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/search");
                then.status(403).body("Unauthorized");
            })
            .await;

        let provider =
            SerperSearchProvider::new(&config(server.base_url(), Some("bad-key"))).unwrap();
        let result = provider.search("arveloven").await;

        match result {
            Err(SearchError::ApiError { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "Unauthorized");
            }
            other => panic!("Expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_parsing_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/search");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let provider =
            SerperSearchProvider::new(&config(server.base_url(), Some("serper-key"))).unwrap();
        let result = provider.search("arveloven").await;

        assert!(matches!(result, Err(SearchError::ResponseParsingFailed(_))));
    }
}
