pub mod citations;
pub mod consts;
pub mod models;
pub mod openapi;
pub mod routes;

use crate::{
    consts::THREAD_ID_HEADER,
    openapi::ApiDoc,
    routes::{
        chat::{list_thread_messages, send_chat_message},
        health::health_check,
        search::search,
        AppState,
    },
};
use assistant_providers::{
    AssistantError, AssistantProvider, OpenAiAssistantConfig, OpenAiAssistantProvider,
};
use axum::{
    http::{header::HeaderName, Method},
    response::Html,
    routing::{get, post},
    Router,
};
use config::{ApiConfig, AssistantConfig};
use services::{
    chat::ToolDispatcher,
    search::{SearchError, SearchProviderTrait, SerperSearchProvider},
    ChatService, ChatServiceTrait, SearchService, SearchServiceTrait,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to initialize assistant provider: {0}")]
    Assistant(#[from] AssistantError),
    #[error("Failed to initialize search provider: {0}")]
    Search(#[from] SearchError),
}

#[derive(Clone)]
pub struct DomainServices {
    pub chat_service: Arc<dyn ChatServiceTrait>,
    pub search_service: Arc<dyn SearchServiceTrait>,
}

/// Initialize domain services against the configured upstream providers
///
/// A missing assistant credential is not fatal: the service starts and chat
/// requests fail with a configuration error.
pub fn init_domain_services(config: &ApiConfig) -> Result<DomainServices, StartupError> {
    let search_provider: Arc<dyn SearchProviderTrait> =
        Arc::new(SerperSearchProvider::new(&config.search)?);

    let assistant_provider: Option<Arc<dyn AssistantProvider>> = match &config.assistant.api_key {
        Some(api_key) => {
            let provider = OpenAiAssistantProvider::new(OpenAiAssistantConfig::new(
                config.assistant.base_url.clone(),
                api_key.clone(),
                Some(config.assistant.timeout_seconds),
            ))?;
            Some(Arc::new(provider) as Arc<dyn AssistantProvider>)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY is not set; chat requests will be rejected");
            None
        }
    };
    if config.assistant.assistant_id.is_none() {
        tracing::warn!("ASSISTANT_ID is not set; chat requests will be rejected");
    }

    Ok(init_domain_services_with_providers(
        assistant_provider,
        search_provider,
        &config.assistant,
    ))
}

/// Wire the services around the given providers
pub fn init_domain_services_with_providers(
    assistant_provider: Option<Arc<dyn AssistantProvider>>,
    search_provider: Arc<dyn SearchProviderTrait>,
    assistant_config: &AssistantConfig,
) -> DomainServices {
    let search_service: Arc<dyn SearchServiceTrait> =
        Arc::new(SearchService::new(search_provider));

    let dispatcher = Arc::new(ToolDispatcher::new(search_service.clone()));

    let chat_service = Arc::new(ChatService::new(
        assistant_provider,
        dispatcher,
        assistant_config.assistant_id.clone(),
        assistant_config.max_tool_rounds,
    ));

    DomainServices {
        chat_service,
        search_service,
    }
}

/// Build the complete application router
pub fn build_app(domain_services: DomainServices) -> Router {
    let app_state = AppState {
        chat_service: domain_services.chat_service,
        search_service: domain_services.search_service,
    };

    Router::new()
        .merge(build_chat_routes(app_state.clone()))
        .merge(build_search_routes(app_state))
        .route("/health", get(health_check))
        .merge(build_openapi_routes())
        .layer(build_cors_layer())
}

pub fn build_chat_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(send_chat_message))
        .route("/api/chat/{thread_id}/messages", get(list_thread_messages))
        .with_state(app_state)
}

pub fn build_search_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/search", post(search))
        .with_state(app_state)
}

/// Browser clients read the thread id from the response header, so it must be exposed
pub fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(THREAD_ID_HEADER)])
}

/// Build OpenAPI documentation routes
pub fn build_openapi_routes() -> Router {
    Router::new().route("/docs", get(swagger_ui_handler)).route(
        "/api/openapi.json",
        get(|| async { axum::Json(ApiDoc::openapi()) }),
    )
}

/// Serve Swagger UI HTML page
async fn swagger_ui_handler() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html lang="no">
<head>
    <meta charset="UTF-8">
    <title>Lovassistent API</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5.10.5/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5.10.5/swagger-ui-bundle.js"></script>
    <script>
    window.onload = function() {
        SwaggerUIBundle({
            url: '/api/openapi.json',
            dom_id: '#swagger-ui',
            deepLinking: true,
            docExpansion: 'list'
        });
    };
    </script>
</body>
</html>"#,
    )
}
