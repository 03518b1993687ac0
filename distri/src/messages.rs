//! Internal message representation.
//!
//! [`DistriMessage`] decouples the SDK's streaming model from the wire
//! [`Message`](distri_a2a::Message) shape: it keeps the richer role set and
//! first-class tool call/result parts that A2A flattens into `data` parts.
//! Conversion in both directions lives in [`crate::codec`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Role of an internal message. Wider than the wire's `user`/`agent` pair;
/// `System` and `Tool` collapse to `user` on the way out (irreversibly).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistriRole {
    System,
    Assistant,
    User,
    Tool,
}

/// A conversational message in the internal representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistriMessage {
    pub id: String,
    pub role: DistriRole,
    pub parts: Vec<DistriPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_final: Option<bool>,
}

impl DistriMessage {
    pub fn new(role: DistriRole, parts: Vec<DistriPart>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            parts,
            created_at: Some(Utc::now()),
            step_id: None,
            is_final: None,
        }
    }

    /// Concatenated text content of all text parts, newline-joined.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                DistriPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All tool calls carried by this message.
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                DistriPart::ToolCall { tool_call } => Some(tool_call),
                _ => None,
            })
            .collect()
    }

    /// All tool results carried by this message.
    pub fn tool_results(&self) -> Vec<&ToolResult> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                DistriPart::ToolResult { tool_result } => Some(tool_result),
                _ => None,
            })
            .collect()
    }
}

/// Content part union of the internal representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistriPart {
    /// Plain text.
    Text { text: String },
    /// Image referenced by URL.
    ImageUrl { image: FileUrl },
    /// Image carried inline as base64 bytes.
    ImageBytes { image: FileBytes },
    /// A tool invocation issued by the agent.
    ToolCall { tool_call: ToolCall },
    /// The client-side result of a tool invocation.
    ToolResult { tool_result: ToolResult },
    /// An observation produced while executing code.
    CodeObservation { thought: String, code: String },
    /// A plan summary emitted by a planning agent.
    Plan { plan: String },
    /// Opaque structured payload.
    Data { data: Value },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileUrl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileBytes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Base64-encoded content.
    pub data: String,
}

/// An agent-issued tool invocation. `tool_call_id` is the correlation key
/// joining the call to its result end-to-end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub tool_call_id: String,
    pub tool_name: String,
    pub input: Value,
}

/// The client-executed result for one tool call. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub tool_name: String,
    pub parts: Vec<DistriPart>,
}

impl ToolResult {
    /// A result carrying a single text part.
    pub fn text(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            parts: vec![DistriPart::Text { text: text.into() }],
        }
    }
}

/// Context supplied when encoding an outbound message: which thread it belongs
/// to and which task/run it continues. The wire `taskId` is `task_id` falling
/// back to `run_id`.
#[derive(Debug, Clone, Default)]
pub struct InvokeContext {
    pub thread_id: String,
    pub run_id: Option<String>,
    pub task_id: Option<String>,
}

impl InvokeContext {
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: None,
            task_id: None,
        }
    }

    /// The task id to stamp on outbound messages.
    pub fn wire_task_id(&self) -> Option<String> {
        self.task_id.clone().or_else(|| self.run_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn part_serialization_uses_snake_case_tags() {
        let part = DistriPart::ToolCall {
            tool_call: ToolCall {
                tool_call_id: "call-1".into(),
                tool_name: "search".into(),
                input: json!({"query": "rust"}),
            },
        };
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["type"], "tool_call");
        assert_eq!(value["tool_call"]["tool_name"], "search");

        let text: DistriPart =
            serde_json::from_value(json!({"type": "text", "text": "hi"})).unwrap();
        assert_eq!(text, DistriPart::Text { text: "hi".into() });
    }

    #[test]
    fn extractors_filter_by_part_kind() {
        let message = DistriMessage::new(
            DistriRole::Assistant,
            vec![
                DistriPart::Text { text: "one".into() },
                DistriPart::ToolCall {
                    tool_call: ToolCall {
                        tool_call_id: "c1".into(),
                        tool_name: "lookup".into(),
                        input: Value::Null,
                    },
                },
                DistriPart::Text { text: "two".into() },
            ],
        );

        assert_eq!(message.text_content(), "one\ntwo");
        assert_eq!(message.tool_calls().len(), 1);
        assert!(message.tool_results().is_empty());
    }

    #[test]
    fn context_task_id_falls_back_to_run_id() {
        let mut context = InvokeContext::for_thread("thread-1");
        assert_eq!(context.wire_task_id(), None);

        context.run_id = Some("run-9".into());
        assert_eq!(context.wire_task_id().as_deref(), Some("run-9"));

        context.task_id = Some("task-3".into());
        assert_eq!(context.wire_task_id().as_deref(), Some("task-3"));
    }
}
