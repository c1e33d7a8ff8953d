use super::errors::ChatError;
use super::models::{ChatRequest, ChatTurn, ThreadMessage};
use async_trait::async_trait;

#[async_trait]
pub trait ChatServiceTrait: Send + Sync {
    /// Append the user message and start streaming the answer
    ///
    /// Returns once the thread and message exist; the answer arrives on
    /// the returned stream.
    async fn send_message(&self, request: ChatRequest) -> Result<ChatTurn, ChatError>;

    /// Thread history, oldest first
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ChatError>;
}
