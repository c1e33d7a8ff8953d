use crate::{
    citations::CitationStripper,
    consts::{APOLOGY_MESSAGE, THREAD_ID_HEADER},
    models::*,
    routes::AppState,
};
use assistant_providers::AssistantError;
use axum::{
    body::{Body, Bytes},
    extract::{Json, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json as ResponseJson, Response},
};
use futures::stream::{self, Stream, StreamExt};
use services::chat::{ChatError, ChatEventStream, ChatStreamEvent, ChatTurn};
use std::convert::Infallible;
use tracing::{debug, warn};

fn map_chat_error_to_status(error: &ChatError) -> StatusCode {
    match error {
        ChatError::InvalidParams(_) => StatusCode::BAD_REQUEST,
        ChatError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ChatError::Upstream(AssistantError::ApiError { status: 404, .. }) => StatusCode::NOT_FOUND,
        ChatError::Upstream(_) => StatusCode::BAD_GATEWAY,
        ChatError::ToolRoundLimitExceeded(_) | ChatError::ClientDisconnected => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<ChatError> for ErrorResponse {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::InvalidParams(msg) => {
                ErrorResponse::new(msg, "invalid_request_error".to_string())
            }
            ChatError::NotConfigured(msg) => ErrorResponse::new(
                format!("Chat is not available: {msg}"),
                "configuration_error".to_string(),
            ),
            ChatError::Upstream(AssistantError::ApiError { status: 404, .. }) => {
                ErrorResponse::new("Thread not found".to_string(), "not_found_error".to_string())
            }
            ChatError::Upstream(e) => ErrorResponse::new(
                format!("Assistant service unavailable: {e}"),
                "upstream_error".to_string(),
            ),
            other => ErrorResponse::new(other.to_string(), "internal_error".to_string()),
        }
    }
}

fn error_response(error: ChatError) -> Response {
    let status = map_chat_error_to_status(&error);
    if status.is_server_error() {
        tracing::error!(error = %error, "Chat request failed");
    }
    (status, ResponseJson(ErrorResponse::from(error))).into_response()
}

/// Send a chat message
///
/// Appends the message to the conversation thread (creating one when
/// `threadId` is absent) and streams the assistant's answer as plain text.
/// The thread id is returned in the `x-thread-id` header.
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "Chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Streamed answer text", body = String, content_type = "text/plain",
            headers(("x-thread-id" = String, description = "Conversation thread id"))),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Unknown thread", body = ErrorResponse),
        (status = 500, description = "Chat is not configured", body = ErrorResponse),
        (status = 502, description = "Assistant service unavailable", body = ErrorResponse)
    )
)]
pub async fn send_chat_message(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if let Err(error) = request.validate() {
        return (
            StatusCode::BAD_REQUEST,
            ResponseJson(ErrorResponse::new(
                error,
                "invalid_request_error".to_string(),
            )),
        )
            .into_response();
    }

    let domain_request = services::chat::ChatRequest {
        message: request.message.unwrap_or_default(),
        thread_id: request.thread_id.filter(|id| !id.is_empty()),
    };

    match state.chat_service.send_message(domain_request).await {
        Ok(turn) => stream_turn(turn),
        Err(e) => error_response(e),
    }
}

fn stream_turn(turn: ChatTurn) -> Response {
    let ChatTurn { thread_id, events } = turn;
    debug!(thread_id = %thread_id, "Streaming chat answer");

    let thread_header = match HeaderValue::from_str(&thread_id) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(thread_id = %thread_id, error = %e, "Thread id is not a valid header value");
            return (
                StatusCode::BAD_GATEWAY,
                ResponseJson(ErrorResponse::new(
                    "Assistant service returned an invalid thread id".to_string(),
                    "upstream_error".to_string(),
                )),
            )
                .into_response();
        }
    };

    let mut response = Body::from_stream(text_body_stream(events)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(THREAD_ID_HEADER, thread_header);
    response
}

/// Turn chat events into body chunks
///
/// Citation markers are removed from the text. A failed turn ends the body
/// with an apology after whatever was already streamed.
fn text_body_stream(
    events: ChatEventStream,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send {
    stream::unfold(
        Some((events, CitationStripper::new())),
        |state| async move {
            let (mut events, mut stripper) = state?;
            loop {
                match events.next().await {
                    Some(ChatStreamEvent::TextDelta(delta)) => {
                        let text = stripper.push(&delta);
                        if !text.is_empty() {
                            return Some((Ok(Bytes::from(text)), Some((events, stripper))));
                        }
                    }
                    Some(ChatStreamEvent::Error(message)) => {
                        warn!(error = %message, "Chat answer ended with an error");
                        let mut text = stripper.finish();
                        text.push_str(APOLOGY_MESSAGE);
                        return Some((Ok(Bytes::from(text)), None));
                    }
                    None => {
                        let text = stripper.finish();
                        if text.is_empty() {
                            return None;
                        }
                        return Some((Ok(Bytes::from(text)), None));
                    }
                }
            }
        },
    )
}

/// List the messages of a conversation thread
#[utoipa::path(
    get,
    path = "/api/chat/{thread_id}/messages",
    tag = "Chat",
    params(("thread_id" = String, Path, description = "Conversation thread id")),
    responses(
        (status = 200, description = "Thread history, oldest first", body = ThreadMessagesResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Unknown thread", body = ErrorResponse),
        (status = 502, description = "Assistant service unavailable", body = ErrorResponse)
    )
)]
pub async fn list_thread_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Response {
    if let Err(error) = validate_thread_id(&thread_id) {
        return (
            StatusCode::BAD_REQUEST,
            ResponseJson(ErrorResponse::with_param(
                error,
                "invalid_request_error".to_string(),
                "thread_id".to_string(),
            )),
        )
            .into_response();
    }

    match state.chat_service.list_messages(&thread_id).await {
        Ok(messages) => (
            StatusCode::OK,
            ResponseJson(ThreadMessagesResponse {
                thread_id,
                messages: messages.into_iter().map(Into::into).collect(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
