use crate::{models::*, routes::AppState};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use services::search::SearchError;

fn map_search_error_to_status(error: &SearchError) -> StatusCode {
    match error {
        SearchError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        SearchError::RequestFailed(_)
        | SearchError::ApiError { .. }
        | SearchError::ResponseParsingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SearchError> for ErrorResponse {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidQuery(msg) => ErrorResponse::with_param(
                msg,
                "invalid_request_error".to_string(),
                "query".to_string(),
            ),
            other => ErrorResponse::new(other.to_string(), "search_error".to_string()),
        }
    }
}

/// Search trusted legal sources
///
/// Runs the same search the assistant uses and returns the raw results.
/// Returns an empty list when no search credential is configured.
#[utoipa::path(
    post,
    path = "/api/search",
    tag = "Search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Search results in provider order", body = SearchResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Search provider failed", body = ErrorResponse)
    )
)]
pub async fn search(State(state): State<AppState>, Json(request): Json<SearchRequest>) -> Response {
    if let Err(error) = request.validate() {
        return (
            StatusCode::BAD_REQUEST,
            ResponseJson(ErrorResponse::with_param(
                error,
                "invalid_request_error".to_string(),
                "query".to_string(),
            )),
        )
            .into_response();
    }

    let query = request.query.unwrap_or_default();
    match state.search_service.search(&query).await {
        Ok(results) => (
            StatusCode::OK,
            ResponseJson(SearchResponse {
                results: results.into_iter().map(Into::into).collect(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Legal search failed");
            let status = map_search_error_to_status(&e);
            (status, ResponseJson(ErrorResponse::from(e))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_failures_are_server_errors() {
        assert_eq!(
            map_search_error_to_status(&SearchError::InvalidQuery("empty".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            map_search_error_to_status(&SearchError::ApiError {
                status: 429,
                body: "rate limited".to_string()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_provider_error_message_is_exposed() {
        let body = ErrorResponse::from(SearchError::RequestFailed("timed out".to_string()));
        assert_eq!(body.error.r#type, "search_error");
        assert!(body.error.message.contains("timed out"));
    }
}
