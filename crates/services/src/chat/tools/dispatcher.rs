use super::{LegalTool, ToolParseError};
use crate::search::SearchServiceTrait;
use assistant_providers::{ToolCall, ToolOutputParam};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Maximum consecutive failures before logging error instead of warning
pub const MAX_CONSECUTIVE_TOOL_FAILURES: u32 = 3;

/// Executes the tool calls of a paused run
///
/// Every call gets an output. Failures become `ERROR: ...` outputs that the
/// model can read and react to, so a run is never left waiting.
pub struct ToolDispatcher {
    search_service: Arc<dyn SearchServiceTrait>,
    /// Consecutive failures per tool name, for retry-aware logging
    failure_counts: RwLock<HashMap<String, u32>>,
}

impl ToolDispatcher {
    pub fn new(search_service: Arc<dyn SearchServiceTrait>) -> Self {
        Self {
            search_service,
            failure_counts: RwLock::new(HashMap::new()),
        }
    }

    /// Execute one call and produce its output
    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutputParam {
        let tool_name = call.function.name.as_str();
        let result = match LegalTool::from_call(call) {
            Ok(tool) => self.execute(tool).await,
            Err(ToolParseError::UnknownTool(name)) => {
                tracing::warn!(tool = %name, call_id = %call.id, "Model requested an unknown tool");
                Err(format!("ERROR: {}", ToolParseError::UnknownTool(name)))
            }
            Err(e) => Err(format!("ERROR: {e}")),
        };

        let output = match result {
            Ok(output) => {
                self.reset_failure_count(tool_name);
                output
            }
            Err(error_output) => {
                let failures = self.increment_failure_count(tool_name);
                self.log_tool_error(tool_name, &call.id, &error_output, failures);
                error_output
            }
        };

        ToolOutputParam {
            tool_call_id: call.id.clone(),
            output,
        }
    }

    /// Execute every call of a pause concurrently
    ///
    /// Returns exactly one output per distinct call id, in request order.
    pub async fn dispatch_all(&self, calls: &[ToolCall]) -> Vec<ToolOutputParam> {
        let mut seen = HashSet::new();
        let unique: Vec<&ToolCall> = calls
            .iter()
            .filter(|call| seen.insert(call.id.as_str()))
            .collect();
        if unique.len() < calls.len() {
            tracing::warn!(
                requested = calls.len(),
                unique = unique.len(),
                "Duplicate tool call ids in one pause"
            );
        }

        join_all(unique.into_iter().map(|call| self.dispatch(call))).await
    }

    async fn execute(&self, tool: LegalTool) -> Result<String, String> {
        tracing::debug!(tool = tool.name(), "Executing tool");
        match tool {
            LegalTool::LegalSearch { query } => self
                .search_service
                .search_formatted(&query)
                .await
                .map_err(|e| format!("ERROR: Legal search failed: {e}")),
        }
    }

    fn reset_failure_count(&self, tool_name: &str) {
        if let Ok(mut counts) = self.failure_counts.write() {
            counts.remove(tool_name);
        }
    }

    fn increment_failure_count(&self, tool_name: &str) -> u32 {
        if let Ok(mut counts) = self.failure_counts.write() {
            let count = counts.entry(tool_name.to_string()).or_insert(0);
            *count += 1;
            *count
        } else {
            1
        }
    }

    fn log_tool_error(&self, tool_name: &str, call_id: &str, output: &str, failure_count: u32) {
        if failure_count > MAX_CONSECUTIVE_TOOL_FAILURES {
            tracing::error!(
                tool = %tool_name,
                call_id = %call_id,
                failures = failure_count,
                error = %output,
                "Tool failed after {} attempts. Error fed back to the assistant.",
                MAX_CONSECUTIVE_TOOL_FAILURES,
            );
        } else {
            tracing::warn!(
                tool = %tool_name,
                call_id = %call_id,
                attempt = failure_count,
                error = %output,
                "Tool failed, feeding error back to the assistant",
            );
        }
    }

    #[cfg(test)]
    fn failure_count(&self, tool_name: &str) -> u32 {
        self.failure_counts
            .read()
            .map(|counts| counts.get(tool_name).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}
