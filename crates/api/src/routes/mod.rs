pub mod chat;
pub mod health;
pub mod search;

use services::{ChatServiceTrait, SearchServiceTrait};
use std::sync::Arc;

/// Shared state of every route
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<dyn ChatServiceTrait>,
    pub search_service: Arc<dyn SearchServiceTrait>,
}
