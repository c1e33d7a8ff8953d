use assistant_providers::{MessageObject, RunStatus};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// One user turn
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    /// Thread to continue; a new thread is created when absent
    pub thread_id: Option<String>,
}

/// Item of a chat turn's output stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    TextDelta(String),
    /// Terminal; the answer could not be finished
    Error(String),
}

pub type ChatEventStream = Pin<Box<dyn Stream<Item = ChatStreamEvent> + Send>>;

/// A started turn: the thread it belongs to and its live output
pub struct ChatTurn {
    pub thread_id: String,
    pub events: ChatEventStream,
}

impl std::fmt::Debug for ChatTurn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatTurn")
            .field("thread_id", &self.thread_id)
            .finish_non_exhaustive()
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed {
        run_id: Option<String>,
    },
    /// Failed, cancelled, expired or incomplete
    Failed {
        run_id: String,
        status: RunStatus,
        message: String,
    },
}

/// A message of a thread's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: String,
    pub text: String,
    pub created_at: i64,
}

impl From<MessageObject> for ThreadMessage {
    fn from(message: MessageObject) -> Self {
        Self {
            text: message.text(),
            id: message.id,
            role: message.role,
            created_at: message.created_at,
        }
    }
}
