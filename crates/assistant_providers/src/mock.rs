//! Mock implementation of AssistantProvider for testing
//!
//! Runs are scripted as a queue of [`MockRound`]s: starting a run consumes
//! the next round, and every tool-output submission consumes the one after
//! it. When the queue is empty a plain answer is streamed. Every thread,
//! message, run start, submission and cancellation is recorded so tests can
//! assert on what the caller did.

use crate::{
    AssistantError, AssistantProvider, CreateRunParams, MessageContent, MessageObject,
    RequiredAction, RunEventStream, RunObject, RunStatus, RunStreamEvent, SubmitToolOutputsAction,
    ThreadObject, ToolCall, ToolOutputParam,
};
use crate::models::{RunError, TextContent};
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

pub const DEFAULT_MOCK_ANSWER: &str =
    "Etter ekteskapsloven hefter hver ektefelle i utgangspunktet bare for egen gjeld.";

/// One scripted step of a mocked run
#[derive(Debug, Clone)]
enum MockStep {
    Text(String),
    EmptyDelta,
    Lifecycle(String),
    ToolCalls(Vec<ToolCall>),
    Failed(String),
    TransportError(String),
}

/// Script for one event stream (a run start or a resumption)
#[derive(Debug, Clone, Default)]
pub struct MockRound {
    steps: Vec<MockStep>,
}

impl MockRound {
    pub fn new() -> Self {
        Self::default()
    }

    /// A round streaming `answer` word by word, then completing
    pub fn answer(answer: &str) -> Self {
        let mut round = Self::new();
        let words: Vec<&str> = answer.split_inclusive(' ').collect();
        for word in words {
            round = round.text(word);
        }
        round
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.steps.push(MockStep::Text(text.into()));
        self
    }

    /// A `thread.message.delta` without usable text
    pub fn empty_delta(mut self) -> Self {
        self.steps.push(MockStep::EmptyDelta);
        self
    }

    pub fn lifecycle(mut self, event: impl Into<String>) -> Self {
        self.steps.push(MockStep::Lifecycle(event.into()));
        self
    }

    /// Pause the run on these tool calls; ends the round
    pub fn requires_tool_calls(mut self, calls: Vec<ToolCall>) -> Self {
        self.steps.push(MockStep::ToolCalls(calls));
        self
    }

    /// Finish the run as failed; ends the round
    pub fn failed(mut self, message: impl Into<String>) -> Self {
        self.steps.push(MockStep::Failed(message.into()));
        self
    }

    /// Break the stream with a transport error; ends the round
    pub fn transport_error(mut self, message: impl Into<String>) -> Self {
        self.steps.push(MockStep::TransportError(message.into()));
        self
    }

    fn full_text(&self) -> String {
        self.steps
            .iter()
            .filter_map(|step| match step {
                MockStep::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Expand the script into the events the hosted service would emit
    fn into_events(
        self,
        thread_id: &str,
        run_id: &str,
    ) -> Vec<Result<RunStreamEvent, AssistantError>> {
        let mut events = vec![Ok(RunStreamEvent::RunStatusChanged(run_object(
            thread_id,
            run_id,
            RunStatus::InProgress,
        )))];

        for step in self.steps {
            match step {
                MockStep::Text(text) => events.push(Ok(RunStreamEvent::TextDelta(Some(text)))),
                MockStep::EmptyDelta => events.push(Ok(RunStreamEvent::TextDelta(None))),
                MockStep::Lifecycle(name) => events.push(Ok(RunStreamEvent::Lifecycle(name))),
                MockStep::ToolCalls(calls) => {
                    let mut run = run_object(thread_id, run_id, RunStatus::RequiresAction);
                    run.required_action = Some(RequiredAction {
                        type_: "submit_tool_outputs".to_string(),
                        submit_tool_outputs: Some(SubmitToolOutputsAction { tool_calls: calls }),
                    });
                    events.push(Ok(RunStreamEvent::RequiresAction(run)));
                    events.push(Ok(RunStreamEvent::Done));
                    return events;
                }
                MockStep::Failed(message) => {
                    let mut run = run_object(thread_id, run_id, RunStatus::Failed);
                    run.last_error = Some(RunError {
                        code: "server_error".to_string(),
                        message,
                    });
                    events.push(Ok(RunStreamEvent::RunFinished(run)));
                    events.push(Ok(RunStreamEvent::Done));
                    return events;
                }
                MockStep::TransportError(message) => {
                    events.push(Err(AssistantError::StreamError(message)));
                    return events;
                }
            }
        }

        events.push(Ok(RunStreamEvent::RunFinished(run_object(
            thread_id,
            run_id,
            RunStatus::Completed,
        ))));
        events.push(Ok(RunStreamEvent::Done));
        events
    }
}

fn run_object(thread_id: &str, run_id: &str, status: RunStatus) -> RunObject {
    RunObject {
        id: run_id.to_string(),
        thread_id: thread_id.to_string(),
        status,
        required_action: None,
        last_error: None,
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Tool outputs submitted for a paused run
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutputSubmission {
    pub thread_id: String,
    pub run_id: String,
    pub tool_outputs: Vec<ToolOutputParam>,
}

/// Mock assistant provider for testing
pub struct MockAssistantProvider {
    rounds: Mutex<VecDeque<MockRound>>,
    default_answer: String,
    delta_delay: Option<Duration>,
    threads: Mutex<Vec<String>>,
    messages: Mutex<HashMap<String, Vec<MessageObject>>>,
    runs: Mutex<Vec<(String, CreateRunParams)>>,
    submissions: Mutex<Vec<ToolOutputSubmission>>,
    cancellations: Mutex<Vec<(String, String)>>,
    counter: AtomicUsize,
}

impl MockAssistantProvider {
    pub fn new() -> Self {
        Self {
            rounds: Mutex::new(VecDeque::new()),
            default_answer: DEFAULT_MOCK_ANSWER.to_string(),
            delta_delay: None,
            threads: Mutex::new(Vec::new()),
            messages: Mutex::new(HashMap::new()),
            runs: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            cancellations: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
        }
    }

    /// Queue scripted rounds, consumed in order
    pub fn with_rounds(self, rounds: Vec<MockRound>) -> Self {
        Self {
            rounds: Mutex::new(rounds.into()),
            ..self
        }
    }

    /// Answer streamed once the scripted rounds run out
    pub fn with_default_answer(mut self, answer: impl Into<String>) -> Self {
        self.default_answer = answer.into();
        self
    }

    /// Sleep before every emitted event
    pub fn with_delta_delay(mut self, delay: Duration) -> Self {
        self.delta_delay = Some(delay);
        self
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{prefix}_mock_{n}_{}", uuid::Uuid::new_v4().simple())
    }

    pub async fn created_threads(&self) -> Vec<String> {
        self.threads.lock().await.clone()
    }

    pub async fn started_runs(&self) -> Vec<(String, CreateRunParams)> {
        self.runs.lock().await.clone()
    }

    pub async fn submissions(&self) -> Vec<ToolOutputSubmission> {
        self.submissions.lock().await.clone()
    }

    pub async fn cancellations(&self) -> Vec<(String, String)> {
        self.cancellations.lock().await.clone()
    }

    async fn ensure_thread(&self, thread_id: &str) -> Result<(), AssistantError> {
        if self.threads.lock().await.iter().any(|t| t == thread_id) {
            Ok(())
        } else {
            Err(AssistantError::ApiError {
                status: 404,
                body: format!("No thread found with id '{thread_id}'."),
            })
        }
    }

    async fn push_message(
        &self,
        thread_id: &str,
        role: &str,
        text: String,
        run_id: Option<String>,
    ) -> MessageObject {
        let message = MessageObject {
            id: self.next_id("msg"),
            thread_id: thread_id.to_string(),
            role: role.to_string(),
            created_at: now_unix(),
            content: vec![MessageContent::Text {
                text: TextContent {
                    value: text,
                    annotations: Vec::new(),
                },
            }],
            run_id,
        };
        self.messages
            .lock()
            .await
            .entry(thread_id.to_string())
            .or_default()
            .push(message.clone());
        message
    }

    async fn stream_next_round(&self, thread_id: &str, run_id: &str) -> RunEventStream {
        let round = self
            .rounds
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockRound::answer(&self.default_answer));

        let text = round.full_text();
        if !text.is_empty() {
            self.push_message(thread_id, "assistant", text, Some(run_id.to_string()))
                .await;
        }

        let events = round.into_events(thread_id, run_id);
        let delay = self.delta_delay;
        Box::pin(stream::iter(events).then(move |event| async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            event
        }))
    }
}

impl Default for MockAssistantProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistantProvider for MockAssistantProvider {
    async fn create_thread(&self) -> Result<ThreadObject, AssistantError> {
        let id = self.next_id("thread");
        self.threads.lock().await.push(id.clone());
        Ok(ThreadObject {
            id,
            created_at: now_unix(),
        })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<MessageObject, AssistantError> {
        self.ensure_thread(thread_id).await?;
        Ok(self
            .push_message(thread_id, "user", content.to_string(), None)
            .await)
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<MessageObject>, AssistantError> {
        self.ensure_thread(thread_id).await?;
        Ok(self
            .messages
            .lock()
            .await
            .get(thread_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_run_stream(
        &self,
        thread_id: &str,
        params: CreateRunParams,
    ) -> Result<RunEventStream, AssistantError> {
        self.ensure_thread(thread_id).await?;
        let run_id = self.next_id("run");
        self.runs
            .lock()
            .await
            .push((thread_id.to_string(), params));
        Ok(self.stream_next_round(thread_id, &run_id).await)
    }

    async fn submit_tool_outputs_stream(
        &self,
        thread_id: &str,
        run_id: &str,
        tool_outputs: Vec<ToolOutputParam>,
    ) -> Result<RunEventStream, AssistantError> {
        self.ensure_thread(thread_id).await?;
        self.submissions.lock().await.push(ToolOutputSubmission {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
            tool_outputs,
        });
        Ok(self.stream_next_round(thread_id, run_id).await)
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<RunObject, AssistantError> {
        self.cancellations
            .lock()
            .await
            .push((thread_id.to_string(), run_id.to_string()));
        Ok(run_object(thread_id, run_id, RunStatus::Cancelling))
    }
}
