#![allow(dead_code)]

use api::{build_app, init_domain_services_with_providers};
use assistant_providers::{AssistantProvider, MockAssistantProvider};
use axum_test::TestServer;
use config::{ApiConfig, AssistantConfig, LoggingConfig, SearchConfig, ServerConfig};
use services::search::{MockSearchProviderTrait, SearchProviderTrait, SerperSearchProvider};
use std::sync::Arc;

pub const TEST_ASSISTANT_ID: &str = "asst_test";
pub const TEST_SERPER_KEY: &str = "serper-test-key";

/// Helper function to create a test configuration
pub fn test_config() -> ApiConfig {
    ApiConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Use port 0 to get a random available port
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "compact".to_string(),
            modules: std::collections::HashMap::new(),
        },
        assistant: AssistantConfig {
            api_key: Some("sk-test".to_string()),
            assistant_id: Some(TEST_ASSISTANT_ID.to_string()),
            max_tool_rounds: 3,
            ..AssistantConfig::default()
        },
        search: SearchConfig::default(),
    }
}

/// Search configuration pointing at a local mock of the Serper API
pub fn serper_config(base_url: String, api_key: Option<&str>) -> SearchConfig {
    SearchConfig {
        api_key: api_key.map(str::to_string),
        base_url,
        ..SearchConfig::default()
    }
}

/// A search provider that never finds anything
pub fn empty_search_provider() -> Arc<dyn SearchProviderTrait> {
    let mut provider = MockSearchProviderTrait::new();
    provider.expect_search().returning(|_| Ok(Vec::new()));
    Arc::new(provider)
}

/// Build a test server around a scripted assistant provider
pub fn setup_server(
    assistant: Arc<MockAssistantProvider>,
    search_provider: Arc<dyn SearchProviderTrait>,
) -> TestServer {
    let config = test_config();
    let assistant: Arc<dyn AssistantProvider> = assistant;
    let services =
        init_domain_services_with_providers(Some(assistant), search_provider, &config.assistant);
    TestServer::new(build_app(services)).unwrap()
}

/// Build a test server with no assistant credential configured
pub fn setup_unconfigured_server() -> TestServer {
    let services = init_domain_services_with_providers(
        None,
        empty_search_provider(),
        &AssistantConfig::default(),
    );
    TestServer::new(build_app(services)).unwrap()
}

/// Build a test server whose search goes through the real Serper client
pub fn setup_search_server(search_config: &SearchConfig) -> TestServer {
    let provider = SerperSearchProvider::new(search_config).unwrap();
    setup_server(Arc::new(MockAssistantProvider::new()), Arc::new(provider))
}
