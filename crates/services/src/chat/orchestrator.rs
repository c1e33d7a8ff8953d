//! Drives one streamed run to its end
//!
//! A run alternates between streaming text and pausing on tool calls. The
//! orchestrator relays text deltas to the sink in arrival order, answers
//! each pause by dispatching the pending calls and resubmitting their
//! outputs, and keeps going on the resumed stream until the run finishes.

use super::errors::ChatError;
use super::models::{ChatStreamEvent, RunOutcome};
use super::tools::{legal_search_tool_definition, ToolDispatcher};
use assistant_providers::{
    AssistantError, AssistantProvider, CreateRunParams, RunEventStream, RunObject, RunStatus,
    RunStreamEvent,
};
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

/// How one event stream ended
enum StreamEnd {
    Finished(RunOutcome),
    /// The run paused on tool calls
    ToolCalls(RunObject),
}

pub struct RunOrchestrator {
    provider: Arc<dyn AssistantProvider>,
    dispatcher: Arc<ToolDispatcher>,
    assistant_id: String,
    max_tool_rounds: usize,
}

impl RunOrchestrator {
    pub fn new(
        provider: Arc<dyn AssistantProvider>,
        dispatcher: Arc<ToolDispatcher>,
        assistant_id: String,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            assistant_id,
            max_tool_rounds,
        }
    }

    /// Run the assistant on `thread_id` until the run finishes
    ///
    /// Stops early with `ClientDisconnected` once `sink` is closed and with
    /// `ToolRoundLimitExceeded` when the run keeps pausing; both cancel the
    /// upstream run when its id is known.
    pub async fn run(
        &self,
        thread_id: &str,
        sink: &mpsc::Sender<ChatStreamEvent>,
    ) -> Result<RunOutcome, ChatError> {
        let mut run_id: Option<String> = None;
        let result = self.drive(thread_id, sink, &mut run_id).await;

        if matches!(
            result,
            Err(ChatError::ClientDisconnected) | Err(ChatError::ToolRoundLimitExceeded(_))
        ) {
            self.cancel_run(thread_id, run_id.as_deref()).await;
        }
        result
    }

    async fn drive(
        &self,
        thread_id: &str,
        sink: &mpsc::Sender<ChatStreamEvent>,
        run_id: &mut Option<String>,
    ) -> Result<RunOutcome, ChatError> {
        let params = CreateRunParams::new(self.assistant_id.as_str())
            .with_tools(vec![legal_search_tool_definition()]);
        let mut stream =
            unless_disconnected(sink, self.provider.create_run_stream(thread_id, params)).await??;
        let mut tool_rounds = 0;

        loop {
            let run = match self.consume(&mut stream, sink, run_id).await? {
                StreamEnd::Finished(outcome) => return Ok(outcome),
                StreamEnd::ToolCalls(run) => run,
            };

            if run.pending_tool_calls().is_empty() {
                tracing::error!(
                    thread_id = %thread_id,
                    run_id = %run.id,
                    "Run paused without any tool calls"
                );
                self.cancel_run(thread_id, Some(&run.id)).await;
                return Err(ChatError::Upstream(AssistantError::InvalidResponse(format!(
                    "run {} requires action but lists no tool calls",
                    run.id
                ))));
            }

            tool_rounds += 1;
            if tool_rounds > self.max_tool_rounds {
                tracing::error!(
                    thread_id = %thread_id,
                    run_id = %run.id,
                    max_tool_rounds = self.max_tool_rounds,
                    "Run exceeded the tool round limit"
                );
                return Err(ChatError::ToolRoundLimitExceeded(self.max_tool_rounds));
            }

            let calls = run.pending_tool_calls();
            tracing::info!(
                thread_id = %thread_id,
                run_id = %run.id,
                round = tool_rounds,
                calls = calls.len(),
                "Run requires tool outputs"
            );
            let outputs = unless_disconnected(sink, self.dispatcher.dispatch_all(calls)).await?;

            stream = unless_disconnected(
                sink,
                self.provider
                    .submit_tool_outputs_stream(thread_id, &run.id, outputs),
            )
            .await??;
        }
    }

    /// Consume one event stream up to its end or its next pause
    async fn consume(
        &self,
        stream: &mut RunEventStream,
        sink: &mpsc::Sender<ChatStreamEvent>,
        run_id: &mut Option<String>,
    ) -> Result<StreamEnd, ChatError> {
        loop {
            let Some(event) = unless_disconnected(sink, stream.next()).await? else {
                tracing::warn!(run_id = ?run_id, "Run stream ended without a terminal event");
                return Ok(StreamEnd::Finished(RunOutcome::Completed {
                    run_id: run_id.clone(),
                }));
            };

            match event? {
                RunStreamEvent::TextDelta(Some(text)) if !text.is_empty() => {
                    if sink.send(ChatStreamEvent::TextDelta(text)).await.is_err() {
                        return Err(ChatError::ClientDisconnected);
                    }
                }
                RunStreamEvent::TextDelta(_) => {
                    tracing::trace!("Skipping message delta without text");
                }
                RunStreamEvent::RunStatusChanged(run) => {
                    tracing::trace!(run_id = %run.id, status = %run.status, "Run status changed");
                    *run_id = Some(run.id);
                }
                RunStreamEvent::RequiresAction(run) => {
                    *run_id = Some(run.id.clone());
                    return Ok(StreamEnd::ToolCalls(run));
                }
                RunStreamEvent::RunFinished(run) => {
                    return Ok(StreamEnd::Finished(outcome_of(run)));
                }
                RunStreamEvent::Lifecycle(name) => {
                    tracing::trace!(event = %name, "Ignoring run lifecycle event");
                }
                RunStreamEvent::Done => {
                    tracing::warn!(run_id = ?run_id, "Run stream closed without a terminal event");
                    return Ok(StreamEnd::Finished(RunOutcome::Completed {
                        run_id: run_id.clone(),
                    }));
                }
            }
        }
    }

    async fn cancel_run(&self, thread_id: &str, run_id: Option<&str>) {
        let Some(run_id) = run_id else {
            return;
        };

        match self.provider.cancel_run(thread_id, run_id).await {
            Ok(run) => {
                tracing::info!(thread_id = %thread_id, run_id = %run_id, status = %run.status, "Cancelled run");
            }
            Err(e) => {
                tracing::warn!(thread_id = %thread_id, run_id = %run_id, error = %e, "Failed to cancel run");
            }
        }
    }
}

fn outcome_of(run: RunObject) -> RunOutcome {
    match run.status {
        RunStatus::Completed => RunOutcome::Completed {
            run_id: Some(run.id),
        },
        status => {
            let message = run
                .last_error
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Run ended with status {status}"));
            RunOutcome::Failed {
                run_id: run.id,
                status,
                message,
            }
        }
    }
}

/// Await `fut` unless the receiving side of `sink` goes away first
async fn unless_disconnected<F: Future>(
    sink: &mpsc::Sender<ChatStreamEvent>,
    fut: F,
) -> Result<F::Output, ChatError> {
    tokio::select! {
        biased;
        _ = sink.closed() => Err(ChatError::ClientDisconnected),
        output = fut => Ok(output),
    }
}
