use crate::citations::strip_citation_markers;
use crate::consts::{MAX_MESSAGE_LENGTH, MAX_QUERY_LENGTH, MAX_THREAD_ID_LENGTH};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================
// Chat
// ============================================

/// Send a message to the legal assistant
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The user's message
    #[serde(default)]
    pub message: Option<String>,
    /// Thread to continue; omit to start a new conversation
    #[serde(default, rename = "threadId", alias = "thread_id")]
    pub thread_id: Option<String>,
}

impl ChatRequest {
    pub fn validate(&self) -> Result<(), String> {
        let message = self.message.as_deref().unwrap_or_default();
        if message.trim().is_empty() {
            return Err("message is required".to_string());
        }
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(format!(
                "message is too long (maximum {MAX_MESSAGE_LENGTH} characters)"
            ));
        }
        // An empty threadId starts a new conversation
        if let Some(thread_id) = self.thread_id.as_deref().filter(|id| !id.is_empty()) {
            validate_thread_id(thread_id)?;
        }
        Ok(())
    }
}

/// Thread ids are echoed in a response header, so only a conservative
/// character set is accepted
pub fn validate_thread_id(thread_id: &str) -> Result<(), String> {
    if thread_id.is_empty() || thread_id.len() > MAX_THREAD_ID_LENGTH {
        return Err(format!(
            "threadId must be between 1 and {MAX_THREAD_ID_LENGTH} characters"
        ));
    }
    if !thread_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err("threadId contains invalid characters".to_string());
    }
    Ok(())
}

/// A message in a conversation thread
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadMessageResponse {
    pub id: String,
    /// `user` or `assistant`
    pub role: String,
    pub text: String,
    /// Unix timestamp (seconds)
    pub created_at: i64,
}

/// Citation markers are removed the same way as in the streamed answer
impl From<services::chat::ThreadMessage> for ThreadMessageResponse {
    fn from(message: services::chat::ThreadMessage) -> Self {
        Self {
            id: message.id,
            role: message.role,
            text: strip_citation_markers(&message.text),
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadMessagesResponse {
    #[serde(rename = "threadId")]
    pub thread_id: String,
    pub messages: Vec<ThreadMessageResponse>,
}

// ============================================
// Search
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

impl SearchRequest {
    pub fn validate(&self) -> Result<(), String> {
        let query = self.query.as_deref().unwrap_or_default();
        if query.trim().is_empty() {
            return Err("query is required".to_string());
        }
        if query.chars().count() > MAX_QUERY_LENGTH {
            return Err(format!(
                "query is too long (maximum {MAX_QUERY_LENGTH} characters)"
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResultItem {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

impl From<services::search::SearchResult> for SearchResultItem {
    fn from(result: services::search::SearchResult) -> Self {
        Self {
            title: result.title,
            link: result.link,
            snippet: result.snippet,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    /// Results in provider order
    pub results: Vec<SearchResultItem>,
}

// ============================================
// Errors
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: String, error_type: String) -> Self {
        Self {
            error: ErrorDetail {
                message,
                r#type: error_type,
                param: None,
            },
        }
    }

    pub fn with_param(message: String, error_type: String, param: String) -> Self {
        Self {
            error: ErrorDetail {
                message,
                r#type: error_type,
                param: Some(param),
            },
        }
    }
}
