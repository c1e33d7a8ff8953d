//! Tools the assistant may call mid-run
//!
//! The set of tools is closed: every requested call is parsed into a
//! [`LegalTool`] before anything is executed, and calls that do not parse
//! are answered with an error output instead.

pub mod dispatcher;

pub use dispatcher::{ToolDispatcher, MAX_CONSECUTIVE_TOOL_FAILURES};

use assistant_providers::{FunctionDefinition, ToolCall, ToolDefinition};
use serde::Deserialize;

pub const LEGAL_SEARCH_TOOL_NAME: &str = "legal_search";

const LEGAL_SEARCH_DESCRIPTION: &str = "Search trusted Norwegian legal sources (Lovdata, \
Regjeringen, Domstolene, Stortinget) for statutes, regulations, preparatory works and case \
law. Use it whenever the answer depends on current Norwegian law.";

/// Function definition sent with every run
pub fn legal_search_tool_definition() -> ToolDefinition {
    ToolDefinition::function(FunctionDefinition {
        name: LEGAL_SEARCH_TOOL_NAME.to_string(),
        description: Some(LEGAL_SEARCH_DESCRIPTION.to_string()),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search terms, preferably in Norwegian"
                }
            },
            "required": ["query"],
            "additionalProperties": false
        }),
    })
}

/// A tool call the dispatcher knows how to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegalTool {
    LegalSearch { query: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolParseError {
    #[error("Unknown tool requested")]
    UnknownTool(String),
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },
}

#[derive(Deserialize)]
struct LegalSearchArgs {
    query: String,
}

impl LegalTool {
    pub fn from_call(call: &ToolCall) -> Result<Self, ToolParseError> {
        match call.function.name.as_str() {
            LEGAL_SEARCH_TOOL_NAME => {
                let args: LegalSearchArgs = serde_json::from_str(&call.function.arguments)
                    .map_err(|e| ToolParseError::InvalidArguments {
                        tool: LEGAL_SEARCH_TOOL_NAME,
                        reason: e.to_string(),
                    })?;

                let query = args.query.trim();
                if query.is_empty() {
                    return Err(ToolParseError::InvalidArguments {
                        tool: LEGAL_SEARCH_TOOL_NAME,
                        reason: "query must not be empty".to_string(),
                    });
                }

                Ok(LegalTool::LegalSearch {
                    query: query.to_string(),
                })
            }
            other => Err(ToolParseError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LegalTool::LegalSearch { .. } => LEGAL_SEARCH_TOOL_NAME,
        }
    }
}
