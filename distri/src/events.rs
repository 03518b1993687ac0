//! Internal streaming event union.
//!
//! Every streaming signal the server can emit has exactly one variant here.
//! The serialized form is `{"type": <snake_case tag>, "data": {…}}`, matching
//! the payloads delivered over SSE and embedded in status-update metadata.
//!
//! [`DistriEvent::event_type`] is an exhaustive match with no wildcard arm:
//! adding a variant fails to compile until it is named there, which is the
//! checkpoint for also teaching the codec's status-update dispatch about it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::ToolCall;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DistriEvent {
    RunStarted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
    },
    RunFinished {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
    },
    RunError {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    PlanStarted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial_plan: Option<bool>,
    },
    PlanFinished {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total_steps: Option<u32>,
    },
    PlanPruned {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        removed_steps: Option<Value>,
    },
    TextMessageStart {
        message_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
        role: crate::messages::DistriRole,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_final: Option<bool>,
    },
    TextMessageContent {
        message_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
        delta: String,
    },
    TextMessageEnd {
        message_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
    },
    ToolCallStart {
        tool_call_id: String,
        tool_call_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_message_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_external: Option<bool>,
    },
    ToolCallArgs {
        tool_call_id: String,
        delta: String,
    },
    ToolCallEnd {
        tool_call_id: String,
    },
    ToolCallResult {
        tool_call_id: String,
        result: String,
    },
    ToolRejected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    ToolCalls {
        tool_calls: Vec<ToolCall>,
    },
    ToolResults {
        results: Vec<ToolResultUpdate>,
    },
    StepStarted {
        step_id: String,
        step_title: String,
        #[serde(default)]
        step_index: u32,
    },
    StepCompleted {
        step_id: String,
        step_title: String,
        #[serde(default)]
        step_index: u32,
    },
    TaskArtifact {
        artifact_id: String,
        artifact_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Value>,
    },
    AgentHandover {
        from_agent: String,
        to_agent: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    FeedbackReceived {
        feedback: String,
    },
    BrowserScreenshot {
        /// Base64-encoded screenshot.
        data: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    BrowserSessionStarted {
        session_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        live_url: Option<String>,
    },
    InlineHookRequested {
        hook_id: String,
        #[serde(default)]
        payload: Value,
    },
}

/// One entry of a `tool_results` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResultUpdate {
    pub tool_call_id: String,
    pub tool_name: String,
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DistriEvent {
    /// The snake_case discriminant this event serializes under.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::RunFinished { .. } => "run_finished",
            Self::RunError { .. } => "run_error",
            Self::PlanStarted { .. } => "plan_started",
            Self::PlanFinished { .. } => "plan_finished",
            Self::PlanPruned { .. } => "plan_pruned",
            Self::TextMessageStart { .. } => "text_message_start",
            Self::TextMessageContent { .. } => "text_message_content",
            Self::TextMessageEnd { .. } => "text_message_end",
            Self::ToolCallStart { .. } => "tool_call_start",
            Self::ToolCallArgs { .. } => "tool_call_args",
            Self::ToolCallEnd { .. } => "tool_call_end",
            Self::ToolCallResult { .. } => "tool_call_result",
            Self::ToolRejected { .. } => "tool_rejected",
            Self::ToolCalls { .. } => "tool_calls",
            Self::ToolResults { .. } => "tool_results",
            Self::StepStarted { .. } => "step_started",
            Self::StepCompleted { .. } => "step_completed",
            Self::TaskArtifact { .. } => "task_artifact",
            Self::AgentHandover { .. } => "agent_handover",
            Self::FeedbackReceived { .. } => "feedback_received",
            Self::BrowserScreenshot { .. } => "browser_screenshot",
            Self::BrowserSessionStarted { .. } => "browser_session_started",
            Self::InlineHookRequested { .. } => "inline_hook_requested",
        }
    }
}
