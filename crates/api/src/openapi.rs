use crate::models::*;
use crate::routes::health::HealthResponse;
use utoipa::OpenApi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lovassistent API",
        description = "Streaming legal assistant for Norwegian law.\n\n`POST /api/chat` streams the answer as plain text and returns the conversation thread id in the `x-thread-id` header. Send that id back as `threadId` to continue the conversation.",
        version = "1.0.0",
        license(
            name = "MIT",
        )
    ),
    paths(
        crate::routes::chat::send_chat_message,
        crate::routes::chat::list_thread_messages,
        crate::routes::search::search,
        crate::routes::health::health_check,
    ),
    components(
        schemas(
            ChatRequest, ThreadMessageResponse, ThreadMessagesResponse,
            SearchRequest, SearchResponse, SearchResultItem,
            ErrorResponse, ErrorDetail, HealthResponse,
        ),
    ),
    tags(
        (name = "Chat", description = "Conversations with the legal assistant"),
        (name = "Search", description = "Direct search in trusted legal sources"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;
