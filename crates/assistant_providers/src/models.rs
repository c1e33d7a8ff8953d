use serde::{Deserialize, Serialize};

/// A conversation thread held by the hosted service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadObject {
    pub id: String,
    #[serde(default)]
    pub created_at: i64,
}

/// A message stored on a thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageObject {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    pub role: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub run_id: Option<String>,
}

impl MessageObject {
    /// Concatenate every text part of the message
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                MessageContent::Text { text } => Some(text.value.as_str()),
                MessageContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<serde_json::Value>,
}

/// Response envelope for list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub last_id: Option<String>,
}

/// Function tool definition sent with a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub type_: String,
    pub function: FunctionDefinition,
}

impl ToolDefinition {
    pub fn function(function: FunctionDefinition) -> Self {
        Self {
            type_: "function".to_string(),
            function,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: serde_json::Value,
}

/// Parameters for starting a run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateRunParams {
    pub assistant_id: String,
    /// Overrides the tools configured on the assistant for this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_instructions: Option<String>,
}

impl CreateRunParams {
    pub fn new(assistant_id: impl Into<String>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            tools: None,
            additional_instructions: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Cancelled
                | RunStatus::Failed
                | RunStatus::Completed
                | RunStatus::Incomplete
                | RunStatus::Expired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One model execution against a thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunObject {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl RunObject {
    /// Tool calls the run is waiting on; empty unless it requires action
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        self.required_action
            .as_ref()
            .and_then(|action| action.submit_tool_outputs.as_ref())
            .map(|submit| submit.tool_calls.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequiredAction {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub submit_tool_outputs: Option<SubmitToolOutputsAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitToolOutputsAction {
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// A tool call requested by a paused run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_tool_call_type")]
    pub type_: String,
    pub function: FunctionCall,
}

fn default_tool_call_type() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            type_: default_tool_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments exactly as produced by the model
    #[serde(default)]
    pub arguments: String,
}

/// Output for one tool call, matched by call id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolOutputParam {
    pub tool_call_id: String,
    pub output: String,
}

/// Typed event of a streamed run
#[derive(Debug, Clone, PartialEq)]
pub enum RunStreamEvent {
    /// `thread.message.delta`; `None` when the payload carried no usable text
    TextDelta(Option<String>),
    /// `thread.run.requires_action`; the run is paused on tool outputs
    RequiresAction(RunObject),
    /// completed, failed, cancelled, expired or incomplete
    RunFinished(RunObject),
    /// created, queued, in_progress or cancelling
    RunStatusChanged(RunObject),
    /// Any other event, by name
    Lifecycle(String),
    /// End-of-stream marker
    Done,
}

impl RunStreamEvent {
    /// Decode one SSE event. Malformed message deltas decode to an empty
    /// delta; an `error` event decodes to a stream error.
    pub fn from_sse(event: &str, data: &str) -> Result<Self, AssistantError> {
        match event {
            "thread.message.delta" => Ok(RunStreamEvent::TextDelta(extract_delta_text(data))),
            "thread.run.requires_action" => parse_run(data).map(RunStreamEvent::RequiresAction),
            "thread.run.completed"
            | "thread.run.failed"
            | "thread.run.cancelled"
            | "thread.run.expired"
            | "thread.run.incomplete" => parse_run(data).map(RunStreamEvent::RunFinished),
            "thread.run.created"
            | "thread.run.queued"
            | "thread.run.in_progress"
            | "thread.run.cancelling" => Ok(parse_run(data)
                .map(RunStreamEvent::RunStatusChanged)
                .unwrap_or_else(|_| RunStreamEvent::Lifecycle(event.to_string()))),
            "error" => Err(AssistantError::StreamError(extract_error_message(data))),
            "done" => Ok(RunStreamEvent::Done),
            other => Ok(RunStreamEvent::Lifecycle(other.to_string())),
        }
    }
}

fn parse_run(data: &str) -> Result<RunObject, AssistantError> {
    serde_json::from_str(data)
        .map_err(|e| AssistantError::InvalidResponse(format!("Invalid run payload: {e}")))
}

/// Pull the text fragments out of a `thread.message.delta` payload
fn extract_delta_text(data: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(data).ok()?;
    let parts = json.get("delta")?.get("content")?.as_array()?;

    let text: String = parts
        .iter()
        .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|part| part.get("text")?.get("value")?.as_str())
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn extract_error_message(data: &str) -> String {
    serde_json::from_str::<serde_json::Value>(data)
        .ok()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("error").and_then(|e| e.get("message")))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| data.to_string())
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AssistantError {
    #[error("Assistant request failed: {0}")]
    RequestFailed(String),
    #[error("Assistant API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },
    #[error("Invalid response from assistant API: {0}")]
    InvalidResponse(String),
    #[error("Assistant stream error: {0}")]
    StreamError(String),
}
