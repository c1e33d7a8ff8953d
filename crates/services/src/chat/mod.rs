pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod ports;
pub mod service;
pub mod tools;

pub use errors::ChatError;
pub use models::{ChatEventStream, ChatRequest, ChatStreamEvent, ChatTurn, RunOutcome, ThreadMessage};
pub use orchestrator::RunOrchestrator;
pub use ports::ChatServiceTrait;
pub use service::ChatServiceImpl;
pub use tools::{legal_search_tool_definition, LegalTool, ToolDispatcher, LEGAL_SEARCH_TOOL_NAME};
