pub mod chat;
pub mod search;

pub use chat::{ChatServiceImpl as ChatService, ChatServiceTrait};
pub use search::{SearchServiceImpl as SearchService, SearchServiceTrait};
