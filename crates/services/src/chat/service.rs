use super::errors::ChatError;
use super::models::{ChatRequest, ChatStreamEvent, ChatTurn, RunOutcome, ThreadMessage};
use super::orchestrator::RunOrchestrator;
use super::ports::ChatServiceTrait;
use super::tools::ToolDispatcher;
use assistant_providers::AssistantProvider;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Capacity of a turn's output channel
const CHAT_EVENT_BUFFER: usize = 64;

pub struct ChatServiceImpl {
    /// `None` when no assistant credential is configured
    provider: Option<Arc<dyn AssistantProvider>>,
    dispatcher: Arc<ToolDispatcher>,
    assistant_id: Option<String>,
    max_tool_rounds: usize,
}

impl ChatServiceImpl {
    pub fn new(
        provider: Option<Arc<dyn AssistantProvider>>,
        dispatcher: Arc<ToolDispatcher>,
        assistant_id: Option<String>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            assistant_id,
            max_tool_rounds,
        }
    }

    fn provider(&self) -> Result<&Arc<dyn AssistantProvider>, ChatError> {
        self.provider
            .as_ref()
            .ok_or_else(|| ChatError::NotConfigured("OPENAI_API_KEY is not set".to_string()))
    }

    fn assistant_id(&self) -> Result<&str, ChatError> {
        self.assistant_id
            .as_deref()
            .ok_or_else(|| ChatError::NotConfigured("ASSISTANT_ID is not set".to_string()))
    }
}

#[async_trait]
impl ChatServiceTrait for ChatServiceImpl {
    async fn send_message(&self, request: ChatRequest) -> Result<ChatTurn, ChatError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ChatError::InvalidParams(
                "message must not be empty".to_string(),
            ));
        }
        let provider = self.provider()?;
        let assistant_id = self.assistant_id()?;

        let thread_id = match request
            .thread_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            Some(id) => id.to_string(),
            None => {
                let thread = provider.create_thread().await?;
                tracing::info!(thread_id = %thread.id, "Started new conversation thread");
                thread.id
            }
        };

        provider.create_message(&thread_id, message).await?;

        let (tx, rx) = mpsc::channel(CHAT_EVENT_BUFFER);
        let orchestrator = RunOrchestrator::new(
            provider.clone(),
            self.dispatcher.clone(),
            assistant_id.to_string(),
            self.max_tool_rounds,
        );
        let task_thread_id = thread_id.clone();

        tokio::spawn(async move {
            let thread_id = task_thread_id;
            match orchestrator.run(&thread_id, &tx).await {
                Ok(RunOutcome::Completed { run_id }) => {
                    tracing::debug!(thread_id = %thread_id, run_id = ?run_id, "Run completed");
                }
                Ok(RunOutcome::Failed {
                    run_id,
                    status,
                    message,
                }) => {
                    tracing::error!(
                        thread_id = %thread_id,
                        run_id = %run_id,
                        status = %status,
                        "Run did not complete: {}",
                        message
                    );
                    let _ = tx.send(ChatStreamEvent::Error(message)).await;
                }
                Err(ChatError::ClientDisconnected) => {
                    tracing::info!(thread_id = %thread_id, "Client disconnected before the answer finished");
                }
                Err(e) => {
                    tracing::error!(thread_id = %thread_id, "Error processing chat turn: {}", e);
                    let _ = tx.send(ChatStreamEvent::Error(e.to_string())).await;
                }
            }
        });

        Ok(ChatTurn {
            thread_id,
            events: Box::pin(ReceiverStream::new(rx)),
        })
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ChatError> {
        let thread_id = thread_id.trim();
        if thread_id.is_empty() {
            return Err(ChatError::InvalidParams(
                "thread id must not be empty".to_string(),
            ));
        }

        let messages = self.provider()?.list_messages(thread_id).await?;
        Ok(messages.into_iter().map(ThreadMessage::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{MockSearchProviderTrait, SearchResult, SearchServiceImpl, NO_RESULTS_SENTINEL};
    use assistant_providers::{MockAssistantProvider, MockRound, ToolCall};
    use futures::StreamExt;

    fn dispatcher(provider: MockSearchProviderTrait) -> Arc<ToolDispatcher> {
        Arc::new(ToolDispatcher::new(Arc::new(SearchServiceImpl::new(
            Arc::new(provider),
        ))))
    }

    fn no_search() -> Arc<ToolDispatcher> {
        let mut provider = MockSearchProviderTrait::new();
        provider.expect_search().returning(|_| Ok(Vec::new()));
        dispatcher(provider)
    }

    fn service(provider: Arc<MockAssistantProvider>, dispatcher: Arc<ToolDispatcher>) -> ChatServiceImpl {
        ChatServiceImpl::new(
            Some(provider),
            dispatcher,
            Some("asst_test".to_string()),
            10,
        )
    }

    fn request(message: &str, thread_id: Option<&str>) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            thread_id: thread_id.map(str::to_string),
        }
    }

    async fn collect(turn: ChatTurn) -> Vec<ChatStreamEvent> {
        turn.events.collect().await
    }

    fn text_of(events: &[ChatStreamEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                ChatStreamEvent::TextDelta(t) => Some(t.as_str()),
                ChatStreamEvent::Error(_) => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_first_message_creates_thread_and_follow_up_reuses_it() {
        let provider = Arc::new(MockAssistantProvider::new());
        let service = service(provider.clone(), no_search());

        let turn = service
            .send_message(request("Hva sier ekteskapsloven om gjeld?", None))
            .await
            .unwrap();
        let thread_id = turn.thread_id.clone();
        let events = collect(turn).await;
        assert!(!text_of(&events).is_empty());

        let follow_up = service
            .send_message(request("Gjelder det også samboere?", Some(&thread_id)))
            .await
            .unwrap();
        assert_eq!(follow_up.thread_id, thread_id);
        collect(follow_up).await;

        assert_eq!(provider.created_threads().await, vec![thread_id.clone()]);
        let history = service.list_messages(&thread_id).await.unwrap();
        let roles: Vec<_> = history.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user", "assistant"]);
        assert_eq!(history[0].text, "Hva sier ekteskapsloven om gjeld?");
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let provider = Arc::new(MockAssistantProvider::new());
        let service = service(provider.clone(), no_search());

        let result = service.send_message(request("  \n ", None)).await;

        assert!(matches!(result, Err(ChatError::InvalidParams(_))));
        assert!(provider.created_threads().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_configuration_fails_fast() {
        let without_provider = ChatServiceImpl::new(None, no_search(), Some("asst".to_string()), 10);
        assert!(matches!(
            without_provider.send_message(request("Hei", None)).await,
            Err(ChatError::NotConfigured(_))
        ));

        let provider = Arc::new(MockAssistantProvider::new());
        let without_assistant = ChatServiceImpl::new(Some(provider.clone()), no_search(), None, 10);
        assert!(matches!(
            without_assistant.send_message(request("Hei", None)).await,
            Err(ChatError::NotConfigured(_))
        ));
        assert!(provider.created_threads().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_thread_fails_before_streaming() {
        let service = service(Arc::new(MockAssistantProvider::new()), no_search());

        let result = service
            .send_message(request("Hei", Some("thread_unknown")))
            .await;

        assert!(matches!(result, Err(ChatError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_two_tool_calls_one_without_results() {
        let provider = Arc::new(MockAssistantProvider::new().with_rounds(vec![
            MockRound::new().requires_tool_calls(vec![
                ToolCall::function("call_found", "legal_search", r#"{"query": "ekteskapsloven gjeld"}"#),
                ToolCall::function("call_empty", "legal_search", r#"{"query": "ukjent paragraf"}"#),
            ]),
            MockRound::answer("Ektefeller hefter for egen gjeld."),
        ]));

        let mut search = MockSearchProviderTrait::new();
        search.expect_search().returning(|query| {
            if query == "ukjent paragraf" {
                return Ok(Vec::new());
            }
            Ok((1..=3)
                .map(|n| SearchResult {
                    title: format!("Treff {n}"),
                    link: format!("https://lovdata.no/{n}"),
                    snippet: format!("Utdrag {n}"),
                })
                .collect())
        });
        let service = service(provider.clone(), dispatcher(search));

        let turn = service
            .send_message(request("Hva sier ekteskapsloven om gjeld?", None))
            .await
            .unwrap();
        let events = collect(turn).await;
        assert_eq!(text_of(&events), "Ektefeller hefter for egen gjeld.");

        let submissions = provider.submissions().await;
        assert_eq!(submissions.len(), 1);
        let outputs = &submissions[0].tool_outputs;
        assert_eq!(outputs.len(), 2);
        let found = outputs.iter().find(|o| o.tool_call_id == "call_found").unwrap();
        assert_eq!(found.output.matches("Title: ").count(), 3);
        let empty = outputs.iter().find(|o| o.tool_call_id == "call_empty").unwrap();
        assert_eq!(empty.output, NO_RESULTS_SENTINEL);
    }

    #[tokio::test]
    async fn test_failed_run_ends_stream_with_error() {
        let provider = Arc::new(MockAssistantProvider::new().with_rounds(vec![MockRound::new()
            .text("Delvis svar")
            .failed("The server had an error")]));
        let service = service(provider, no_search());

        let turn = service.send_message(request("Hei", None)).await.unwrap();
        let events = collect(turn).await;

        assert_eq!(
            events,
            vec![
                ChatStreamEvent::TextDelta("Delvis svar".to_string()),
                ChatStreamEvent::Error("The server had an error".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_round_limit_ends_stream_with_error() {
        let looping = || {
            MockRound::new().requires_tool_calls(vec![ToolCall::function(
                "call",
                "legal_search",
                r#"{"query": "arv"}"#,
            )])
        };
        let provider = Arc::new(
            MockAssistantProvider::new().with_rounds((0..5).map(|_| looping()).collect()),
        );
        let service = ChatServiceImpl::new(
            Some(provider.clone()),
            no_search(),
            Some("asst_test".to_string()),
            3,
        );

        let turn = service.send_message(request("Hei", None)).await.unwrap();
        let events = collect(turn).await;

        assert!(matches!(events.last(), Some(ChatStreamEvent::Error(_))));
        assert_eq!(provider.submissions().await.len(), 3);
        assert_eq!(provider.cancellations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_list_messages_rejects_blank_thread() {
        let service = service(Arc::new(MockAssistantProvider::new()), no_search());
        assert!(matches!(
            service.list_messages(" ").await,
            Err(ChatError::InvalidParams(_))
        ));
    }
}
