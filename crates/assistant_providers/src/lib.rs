//! Assistant providers crate for talking to a hosted conversation service
//!
//! The hosted service owns conversation threads and model runs. This crate
//! provides a streaming-first trait interface over it: starting a run and
//! resuming a paused run both return a stream of typed [`RunStreamEvent`]s
//! rather than a complete response.
//!
//! # Usage
//!
//! ```rust,ignore
//! use assistant_providers::{AssistantProvider, CreateRunParams, RunStreamEvent};
//! use futures_util::StreamExt;
//!
//! async fn example<P: AssistantProvider>(provider: P) -> Result<(), AssistantError> {
//!     let thread = provider.create_thread().await?;
//!     provider.create_message(&thread.id, "Hva sier arveloven?").await?;
//!
//!     let mut stream = provider
//!         .create_run_stream(&thread.id, CreateRunParams::new("asst_123"))
//!         .await?;
//!     while let Some(event) = stream.next().await {
//!         match event? {
//!             RunStreamEvent::TextDelta(Some(text)) => print!("{text}"),
//!             RunStreamEvent::RequiresAction(run) => {
//!                 println!("{} tool calls pending", run.pending_tool_calls().len());
//!                 break;
//!             }
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod mock;
pub mod models;
pub mod openai;
pub mod sse_parser;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

// Re-export commonly used types for convenience
pub use mock::{MockAssistantProvider, MockRound};
pub use models::{
    AssistantError, CreateRunParams, FunctionCall, FunctionDefinition, MessageContent,
    MessageObject, RequiredAction, RunError, RunObject, RunStatus, RunStreamEvent,
    SubmitToolOutputsAction, ThreadObject, ToolCall, ToolDefinition, ToolOutputParam,
};
pub use openai::{OpenAiAssistantConfig, OpenAiAssistantProvider};
pub use sse_parser::SSEParser;

/// Type alias for a streamed run
///
/// Items arrive in the order the hosted service emitted them. A stream
/// error is terminal for the run it belongs to.
pub type RunEventStream = Pin<Box<dyn Stream<Item = Result<RunStreamEvent, AssistantError>> + Send>>;

#[async_trait]
pub trait AssistantProvider: Send + Sync {
    /// Create a new, empty conversation thread
    async fn create_thread(&self) -> Result<ThreadObject, AssistantError>;

    /// Append a user message to an existing thread
    async fn create_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<MessageObject, AssistantError>;

    /// List the messages of a thread, oldest first
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<MessageObject>, AssistantError>;

    /// Start a run against the thread's current state and stream its events
    async fn create_run_stream(
        &self,
        thread_id: &str,
        params: CreateRunParams,
    ) -> Result<RunEventStream, AssistantError>;

    /// Resume a run paused on `requires_action` by submitting every pending
    /// tool output in one batch. The resumed run streams on a new stream.
    async fn submit_tool_outputs_stream(
        &self,
        thread_id: &str,
        run_id: &str,
        tool_outputs: Vec<ToolOutputParam>,
    ) -> Result<RunEventStream, AssistantError>;

    /// Ask the hosted service to stop a run
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<RunObject, AssistantError>;
}
