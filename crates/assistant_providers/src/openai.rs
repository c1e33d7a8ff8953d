use crate::{models::ListResponse, sse_parser::SSEParser, *};
use async_trait::async_trait;
use reqwest::{header::HeaderValue, Client};
use serde::Serialize;

/// Configuration for the OpenAI Assistants provider
#[derive(Debug, Clone)]
pub struct OpenAiAssistantConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

impl OpenAiAssistantConfig {
    pub fn new(base_url: String, api_key: String, timeout_seconds: Option<u64>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_seconds: timeout_seconds.unwrap_or(120),
        }
    }
}

/// OpenAI Assistants (v2) provider implementation
///
/// Threads, messages and runs live on the hosted service; runs are always
/// started and resumed in streaming mode.
pub struct OpenAiAssistantProvider {
    config: OpenAiAssistantConfig,
    client: Client,
}

#[derive(Serialize)]
struct CreateMessageBody<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct StreamingRunBody<'a> {
    #[serde(flatten)]
    params: &'a CreateRunParams,
    stream: bool,
}

#[derive(Serialize)]
struct SubmitToolOutputsBody<'a> {
    tool_outputs: &'a [ToolOutputParam],
    stream: bool,
}

impl OpenAiAssistantProvider {
    /// Create a new provider with the given configuration
    pub fn new(config: OpenAiAssistantConfig) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .read_timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AssistantError::RequestFailed(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Build HTTP request headers
    fn build_headers(&self) -> Result<reqwest::header::HeaderMap, AssistantError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("OpenAI-Beta", HeaderValue::from_static("assistants=v2"));

        let auth_value = format!("Bearer {}", self.config.api_key);
        let header_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| AssistantError::RequestFailed(format!("Invalid API key format: {e}")))?;
        headers.insert("Authorization", header_value);

        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Turn a non-success response into an `ApiError` carrying the body
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AssistantError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("Failed to read error response body: {e}"));
        tracing::error!(status = %status, body = %body, "Assistant API returned an error");
        Err(AssistantError::ApiError {
            status: status.as_u16(),
            body,
        })
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, AssistantError>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .headers(self.build_headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| AssistantError::RequestFailed(e.to_string()))?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AssistantError::InvalidResponse(e.to_string()))
    }

    async fn post_stream<B>(&self, path: &str, body: &B) -> Result<RunEventStream, AssistantError>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .client
            .post(self.url(path))
            .headers(self.build_headers()?)
            .header("Accept", "text/event-stream")
            .json(body)
            .send()
            .await
            .map_err(|e| AssistantError::RequestFailed(e.to_string()))?;

        let response = Self::check_status(response).await?;

        // Use the SSE parser to turn the byte stream into run events
        let sse_stream = SSEParser::new(response.bytes_stream());
        Ok(Box::pin(sse_stream))
    }
}

#[async_trait]
impl AssistantProvider for OpenAiAssistantProvider {
    async fn create_thread(&self) -> Result<ThreadObject, AssistantError> {
        let thread: ThreadObject = self
            .post_json("/threads", &serde_json::json!({}))
            .await?;
        tracing::debug!(thread_id = %thread.id, "Created thread");
        Ok(thread)
    }

    async fn create_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<MessageObject, AssistantError> {
        let body = CreateMessageBody {
            role: "user",
            content,
        };
        self.post_json(&format!("/threads/{thread_id}/messages"), &body)
            .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<MessageObject>, AssistantError> {
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("order", "asc".to_string()), ("limit", "100".to_string())];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            let response = self
                .client
                .get(self.url(&format!("/threads/{thread_id}/messages")))
                .headers(self.build_headers()?)
                .query(&query)
                .send()
                .await
                .map_err(|e| AssistantError::RequestFailed(e.to_string()))?;

            let page: ListResponse<MessageObject> = Self::check_status(response)
                .await?
                .json()
                .await
                .map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;

            let next_cursor = page
                .last_id
                .clone()
                .or_else(|| page.data.last().map(|m| m.id.clone()));
            messages.extend(page.data);

            match (page.has_more, next_cursor) {
                (true, Some(cursor)) => after = Some(cursor),
                _ => break,
            }
        }

        Ok(messages)
    }

    async fn create_run_stream(
        &self,
        thread_id: &str,
        params: CreateRunParams,
    ) -> Result<RunEventStream, AssistantError> {
        tracing::debug!(
            thread_id = %thread_id,
            assistant_id = %params.assistant_id,
            "Starting streamed run"
        );
        let body = StreamingRunBody {
            params: &params,
            stream: true,
        };
        self.post_stream(&format!("/threads/{thread_id}/runs"), &body)
            .await
    }

    async fn submit_tool_outputs_stream(
        &self,
        thread_id: &str,
        run_id: &str,
        tool_outputs: Vec<ToolOutputParam>,
    ) -> Result<RunEventStream, AssistantError> {
        tracing::debug!(
            thread_id = %thread_id,
            run_id = %run_id,
            outputs = tool_outputs.len(),
            "Submitting tool outputs"
        );
        let body = SubmitToolOutputsBody {
            tool_outputs: &tool_outputs,
            stream: true,
        };
        self.post_stream(
            &format!("/threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
            &body,
        )
        .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<RunObject, AssistantError> {
        self.post_json(
            &format!("/threads/{thread_id}/runs/{run_id}/cancel"),
            &serde_json::json!({}),
        )
        .await
    }
}
