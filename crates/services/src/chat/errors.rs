use assistant_providers::AssistantError;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    #[error("Assistant is not configured: {0}")]
    NotConfigured(String),
    #[error("Assistant service error: {0}")]
    Upstream(#[from] AssistantError),
    #[error("Run exceeded the limit of {0} tool rounds")]
    ToolRoundLimitExceeded(usize),
    #[error("Client disconnected")]
    ClientDisconnected,
}
