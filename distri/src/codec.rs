//! Wire ⇄ internal translation.
//!
//! Pure functions mapping A2A protocol objects onto the internal
//! [`DistriMessage`]/[`DistriEvent`] representation and back. The decoding
//! direction is total: structurally valid input never makes these functions
//! fail. Unknown part shapes degrade to text or data parts and unknown
//! status-update types degrade to a logged `run_started` event, so a stream
//! consumer keeps working when the server learns new tricks first.
//!
//! The role mapping is lossy in one direction: A2A only has `agent` and
//! `user`, so the internal `system` and `tool` roles collapse to `user` on
//! encode. Decoding cannot recover them.

use serde_json::{json, Value};
use tracing::warn;

use distri_a2a::{
    FileContent, FileWithBytes, FileWithUri, Message, MessageRole, Part, TaskStatusUpdateEvent,
    MESSAGE_KIND, STATUS_UPDATE_KIND,
};

use crate::agent::ApprovalRequest;
use crate::events::{DistriEvent, ToolResultUpdate};
use crate::messages::{
    DistriMessage, DistriPart, DistriRole, FileBytes, FileUrl, InvokeContext, ToolCall, ToolResult,
};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A decoded element of an agent event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Message(DistriMessage),
    Event(DistriEvent),
}

// ============================================================================
// Messages
// ============================================================================

/// Decode a wire message into the internal representation.
pub fn message_from_a2a(message: &Message) -> DistriMessage {
    let role = match message.role {
        MessageRole::Agent => DistriRole::Assistant,
        MessageRole::User => DistriRole::User,
    };

    DistriMessage {
        id: message.message_id.clone(),
        role,
        parts: message.parts.iter().map(part_from_a2a).collect(),
        created_at: message.created_at,
        step_id: None,
        is_final: None,
    }
}

/// Encode an internal message for the wire, stamping thread/task ids from the
/// invoke context. `system` and `tool` roles collapse to `user` (see module
/// docs).
pub fn message_to_a2a(message: &DistriMessage, context: &InvokeContext) -> Message {
    let role = match message.role {
        DistriRole::Assistant => MessageRole::Agent,
        DistriRole::User | DistriRole::System | DistriRole::Tool => MessageRole::User,
    };

    Message {
        kind: MESSAGE_KIND.to_string(),
        message_id: message.id.clone(),
        role,
        parts: message.parts.iter().map(part_to_a2a).collect(),
        context_id: Some(context.thread_id.clone()),
        task_id: context.wire_task_id(),
        created_at: message.created_at,
        metadata: None,
    }
}

/// Decode one wire part. Data parts are inspected for an embedded `part_type`
/// discriminator; unrecognized discriminators pass through as generic data.
pub fn part_from_a2a(part: &Part) -> DistriPart {
    match part {
        Part::Text { text, .. } => DistriPart::Text { text: text.clone() },
        Part::File { file, .. } => match file {
            FileContent::WithUri(file) => DistriPart::ImageUrl {
                image: FileUrl {
                    mime_type: Some(
                        file.mime_type
                            .clone()
                            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
                    ),
                    url: file.uri.clone(),
                },
            },
            FileContent::WithBytes(file) => DistriPart::ImageBytes {
                image: FileBytes {
                    mime_type: Some(
                        file.mime_type
                            .clone()
                            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
                    ),
                    data: file.bytes.clone(),
                },
            },
        },
        Part::Data { data, .. } => data_part_from_a2a(data),
    }
}

fn data_part_from_a2a(data: &Value) -> DistriPart {
    match data.get("part_type").and_then(Value::as_str) {
        Some("tool_call") => {
            let payload = data.get("tool_call").unwrap_or(data);
            match serde_json::from_value::<ToolCall>(payload.clone()) {
                Ok(tool_call) => DistriPart::ToolCall { tool_call },
                Err(_) => DistriPart::Data { data: data.clone() },
            }
        }
        Some("tool_result") => {
            let payload = data.get("tool_result").unwrap_or(data);
            match tool_result_from_value(payload) {
                Some(tool_result) => DistriPart::ToolResult { tool_result },
                None => DistriPart::Data { data: data.clone() },
            }
        }
        Some("code_observation") => DistriPart::CodeObservation {
            thought: data
                .get("thought")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            code: data
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        Some("plan") => DistriPart::Plan {
            plan: data
                .get("plan")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        _ => DistriPart::Data { data: data.clone() },
    }
}

fn tool_result_from_value(value: &Value) -> Option<ToolResult> {
    let tool_call_id = value.get("tool_call_id")?.as_str()?.to_string();
    let tool_name = value
        .get("tool_name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    // Constituent parts lacking a recognized shape become wrapped data parts.
    let parts = value
        .get("parts")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(part_from_value).collect())
        .unwrap_or_default();
    Some(ToolResult {
        tool_call_id,
        tool_name,
        parts,
    })
}

/// Tolerant part decoding from raw JSON. A value that is not a valid wire
/// part degrades to a text part holding its JSON string — never dropped.
pub fn part_from_value(value: &Value) -> DistriPart {
    match serde_json::from_value::<Part>(value.clone()) {
        Ok(part) => part_from_a2a(&part),
        Err(_) => DistriPart::Text {
            text: value.to_string(),
        },
    }
}

/// Encode one internal part for the wire. Tool calls and results travel as
/// `data` parts with a `part_type` discriminator; a tool result's constituent
/// parts are individually converted.
pub fn part_to_a2a(part: &DistriPart) -> Part {
    match part {
        DistriPart::Text { text } => Part::Text {
            text: text.clone(),
            metadata: None,
        },
        DistriPart::ImageUrl { image } => Part::File {
            file: FileContent::WithUri(FileWithUri {
                uri: image.url.clone(),
                mime_type: image.mime_type.clone(),
                name: None,
            }),
            metadata: None,
        },
        DistriPart::ImageBytes { image } => Part::File {
            file: FileContent::WithBytes(FileWithBytes {
                bytes: image.data.clone(),
                mime_type: image.mime_type.clone(),
                name: None,
            }),
            metadata: None,
        },
        DistriPart::ToolCall { tool_call } => Part::Data {
            data: json!({
                "part_type": "tool_call",
                "tool_call": tool_call,
            }),
            metadata: None,
        },
        DistriPart::ToolResult { tool_result } => {
            let parts: Vec<Part> = tool_result.parts.iter().map(part_to_a2a).collect();
            Part::Data {
                data: json!({
                    "part_type": "tool_result",
                    "tool_result": {
                        "tool_call_id": tool_result.tool_call_id,
                        "tool_name": tool_result.tool_name,
                        "parts": parts,
                    },
                }),
                metadata: None,
            }
        }
        DistriPart::CodeObservation { thought, code } => Part::Data {
            data: json!({
                "part_type": "code_observation",
                "thought": thought,
                "code": code,
            }),
            metadata: None,
        },
        DistriPart::Plan { plan } => Part::Data {
            data: json!({
                "part_type": "plan",
                "plan": plan,
            }),
            metadata: None,
        },
        DistriPart::Data { data } => Part::Data {
            data: data.clone(),
            metadata: None,
        },
    }
}

// ============================================================================
// Status updates
// ============================================================================

/// Decode a status-update event into the internal union.
///
/// Returns `None` when the update carries no `metadata.type` — such updates
/// are task-state bookkeeping, not displayable events. Unrecognized types log
/// a warning and fall back to `run_started` carrying the update's task id, so
/// the consumer never halts on a server-side protocol addition.
pub fn status_update_to_event(update: &TaskStatusUpdateEvent) -> Option<DistriEvent> {
    let metadata = update.metadata.as_ref()?;
    let event_type = metadata.get("type").and_then(Value::as_str)?;

    let text = |key: &str| -> String {
        metadata
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let opt_text = |key: &str| -> Option<String> {
        metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let event = match event_type {
        "run_started" => DistriEvent::RunStarted {
            run_id: opt_text("run_id"),
            task_id: Some(update.task_id.clone()),
        },
        "run_finished" => DistriEvent::RunFinished {
            run_id: opt_text("run_id"),
            task_id: Some(update.task_id.clone()),
        },
        "run_error" => DistriEvent::RunError {
            message: text("message"),
            code: opt_text("code"),
        },
        "plan_started" => DistriEvent::PlanStarted {
            initial_plan: metadata.get("initial_plan").and_then(Value::as_bool),
        },
        "plan_finished" => DistriEvent::PlanFinished {
            total_steps: metadata
                .get("total_steps")
                .and_then(Value::as_u64)
                .map(|n| n as u32),
        },
        "plan_pruned" => DistriEvent::PlanPruned {
            removed_steps: metadata.get("removed_steps").cloned(),
        },
        "text_message_start" => DistriEvent::TextMessageStart {
            message_id: text("message_id"),
            step_id: opt_text("step_id"),
            role: match metadata.get("role").and_then(Value::as_str) {
                Some("assistant") => DistriRole::Assistant,
                _ => DistriRole::User,
            },
            is_final: metadata.get("is_final").and_then(Value::as_bool),
        },
        "text_message_content" => DistriEvent::TextMessageContent {
            message_id: text("message_id"),
            step_id: opt_text("step_id"),
            delta: text("delta"),
        },
        "text_message_end" => DistriEvent::TextMessageEnd {
            message_id: text("message_id"),
            step_id: opt_text("step_id"),
        },
        // Externally executed tools announce themselves with dedicated wire
        // types; internally they are tool-call lifecycle events.
        "tool_execution_start" => DistriEvent::ToolCallStart {
            tool_call_id: text("tool_call_id"),
            tool_call_name: metadata
                .get("tool_call_name")
                .and_then(Value::as_str)
                .unwrap_or("Tool")
                .to_string(),
            parent_message_id: Some(update.task_id.clone()),
            is_external: Some(true),
        },
        "tool_execution_end" => DistriEvent::ToolCallEnd {
            tool_call_id: text("tool_call_id"),
        },
        "tool_call_args" => DistriEvent::ToolCallArgs {
            tool_call_id: text("tool_call_id"),
            delta: text("delta"),
        },
        "tool_call_result" => DistriEvent::ToolCallResult {
            tool_call_id: text("tool_call_id"),
            result: text("result"),
        },
        "tool_rejected" => DistriEvent::ToolRejected {
            tool_call_id: opt_text("tool_call_id"),
            reason: opt_text("reason"),
        },
        "tool_calls" => DistriEvent::ToolCalls {
            tool_calls: metadata
                .get("tool_calls")
                .cloned()
                .and_then(|value| serde_json::from_value::<Vec<ToolCall>>(value).ok())
                .unwrap_or_default(),
        },
        "tool_results" => DistriEvent::ToolResults {
            results: metadata
                .get("results")
                .cloned()
                .and_then(|value| serde_json::from_value::<Vec<ToolResultUpdate>>(value).ok())
                .unwrap_or_default(),
        },
        "step_started" => DistriEvent::StepStarted {
            step_id: text("step_id"),
            step_title: text("step_title"),
            step_index: metadata
                .get("step_index")
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32,
        },
        "step_completed" => DistriEvent::StepCompleted {
            step_id: text("step_id"),
            step_title: text("step_title"),
            step_index: metadata
                .get("step_index")
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32,
        },
        "task_artifact" => DistriEvent::TaskArtifact {
            artifact_id: text("artifact_id"),
            artifact_type: text("artifact_type"),
            content: metadata.get("content").cloned(),
        },
        "agent_handover" => DistriEvent::AgentHandover {
            from_agent: text("from_agent"),
            to_agent: text("to_agent"),
            reason: opt_text("reason"),
        },
        "feedback_received" => DistriEvent::FeedbackReceived {
            feedback: text("feedback"),
        },
        "browser_screenshot" => DistriEvent::BrowserScreenshot {
            data: text("data"),
            url: opt_text("url"),
        },
        "browser_session_started" => DistriEvent::BrowserSessionStarted {
            session_id: text("session_id"),
            live_url: opt_text("live_url"),
        },
        "inline_hook_requested" => DistriEvent::InlineHookRequested {
            hook_id: text("hook_id"),
            payload: metadata.get("payload").cloned().unwrap_or(Value::Null),
        },
        other => {
            warn!(event_type = other, task_id = %update.task_id, "unhandled status-update type, degrading to run_started");
            DistriEvent::RunStarted {
                run_id: opt_text("run_id"),
                task_id: Some(update.task_id.clone()),
            }
        }
    };

    Some(event)
}

// ============================================================================
// Stream decoding
// ============================================================================

/// Decode one raw stream element. Unwraps a `{jsonrpc, result}` envelope,
/// then dispatches on `kind`: messages and status updates decode, anything
/// else (tasks, artifact updates) yields `None` — not displayable, not an
/// error.
pub fn decode_stream_event(value: &Value) -> Option<StreamItem> {
    if value.get("jsonrpc").is_some() {
        if let Some(result) = value.get("result") {
            return decode_stream_event(result);
        }
    }

    match value.get("kind").and_then(Value::as_str) {
        Some(MESSAGE_KIND) => serde_json::from_value::<Message>(value.clone())
            .ok()
            .map(|message| StreamItem::Message(message_from_a2a(&message))),
        Some(STATUS_UPDATE_KIND) => serde_json::from_value::<TaskStatusUpdateEvent>(value.clone())
            .ok()
            .and_then(|update| status_update_to_event(&update))
            .map(StreamItem::Event),
        _ => None,
    }
}

/// Decode a typed streaming result (the SSE path).
pub fn decode_stream_result(
    result: &distri_a2a::SendStreamingMessageResult,
) -> Option<StreamItem> {
    use distri_a2a::SendStreamingMessageResult::*;
    match result {
        Message(message) => Some(StreamItem::Message(message_from_a2a(message))),
        TaskStatusUpdate(update) => status_update_to_event(update).map(StreamItem::Event),
        Task(_) | TaskArtifactUpdate(_) => None,
    }
}

/// Decode an ordered stream capture, dropping non-displayable elements and
/// preserving input order.
pub fn process_stream_data(stream: &[Value]) -> Vec<StreamItem> {
    stream.iter().filter_map(decode_stream_event).collect()
}

/// Decode an ordered message capture, skipping anything that is not a
/// message.
pub fn process_messages_data(data: &[Value]) -> Vec<DistriMessage> {
    data.iter()
        .filter_map(|item| {
            if item.get("kind").and_then(Value::as_str) != Some(MESSAGE_KIND) {
                return None;
            }
            serde_json::from_value::<Message>(item.clone())
                .ok()
                .map(|message| message_from_a2a(&message))
        })
        .collect()
}

// ============================================================================
// Approval payloads
// ============================================================================

/// Extract the nested approval payload from an `approval_request` tool call.
///
/// The agent encodes `{tool_calls, reason}` as the call's JSON input.
/// Malformed input is caught here and yields an empty request, which the
/// façade turns into a synthetic failed-approval result instead of
/// propagating a parse error.
pub fn approval_payload(call: &ToolCall) -> ApprovalRequest {
    let input = match &call.input {
        Value::String(raw) => serde_json::from_str::<Value>(raw).unwrap_or_else(|error| {
            warn!(%error, tool_call_id = %call.tool_call_id, "malformed approval payload");
            Value::Null
        }),
        other => other.clone(),
    };

    ApprovalRequest {
        reason: input
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string),
        tool_calls: input
            .get("tool_calls")
            .cloned()
            .and_then(|value| serde_json::from_value::<Vec<ToolCall>>(value).ok())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distri_a2a::{TaskState, TaskStatus};
    use serde_json::json;
    use std::collections::HashMap;

    fn status_update(metadata: Value) -> TaskStatusUpdateEvent {
        let metadata = serde_json::from_value::<HashMap<String, Value>>(metadata).ok();
        TaskStatusUpdateEvent {
            kind: STATUS_UPDATE_KIND.to_string(),
            task_id: "task-7".into(),
            context_id: "ctx-7".into(),
            status: TaskStatus {
                state: TaskState::Working,
                timestamp: None,
                message: None,
            },
            is_final: false,
            metadata,
        }
    }

    #[test]
    fn user_text_round_trip_preserves_parts_and_role() {
        let wire: Message = serde_json::from_value(json!({
            "kind": "message",
            "messageId": "m-1",
            "role": "user",
            "parts": [
                {"kind": "text", "text": "hello"},
                {"kind": "data", "data": {"part_type": "tool_call", "tool_call": {
                    "tool_call_id": "c1", "tool_name": "search", "input": {"q": "x"}
                }}}
            ]
        }))
        .unwrap();

        let internal = message_from_a2a(&wire);
        assert_eq!(internal.role, DistriRole::User);

        let context = InvokeContext::for_thread("thread-1");
        let back = message_to_a2a(&internal, &context);
        assert_eq!(back.role, MessageRole::User);
        assert_eq!(back.parts, wire.parts);
    }

    #[test]
    fn agent_role_maps_to_assistant_and_back() {
        let wire = Message::text("m-2", MessageRole::Agent, "hi");
        let internal = message_from_a2a(&wire);
        assert_eq!(internal.role, DistriRole::Assistant);

        let back = message_to_a2a(&internal, &InvokeContext::for_thread("t"));
        assert_eq!(back.role, MessageRole::Agent);
    }

    #[test]
    fn system_and_tool_roles_collapse_to_user() {
        for role in [DistriRole::System, DistriRole::Tool] {
            let message = DistriMessage::new(role, vec![DistriPart::Text { text: "x".into() }]);
            let wire = message_to_a2a(&message, &InvokeContext::for_thread("t"));
            assert_eq!(wire.role, MessageRole::User);
        }
    }

    #[test]
    fn file_parts_default_mime_type() {
        let part = Part::File {
            file: FileContent::WithUri(FileWithUri {
                uri: "https://example.com/x".into(),
                mime_type: None,
                name: None,
            }),
            metadata: None,
        };
        match part_from_a2a(&part) {
            DistriPart::ImageUrl { image } => {
                assert_eq!(image.mime_type.as_deref(), Some(DEFAULT_MIME_TYPE));
            }
            other => panic!("expected image_url part, got {other:?}"),
        }
    }

    #[test]
    fn unknown_data_discriminator_passes_through() {
        let part = Part::Data {
            data: json!({"part_type": "shiny_new_thing", "x": 1}),
            metadata: None,
        };
        assert!(matches!(part_from_a2a(&part), DistriPart::Data { .. }));
    }

    #[test]
    fn malformed_part_value_degrades_to_text() {
        let value = json!({"kind": "text"}); // missing required `text`
        match part_from_value(&value) {
            DistriPart::Text { text } => assert!(text.contains("kind")),
            other => panic!("expected text fallback, got {other:?}"),
        }
    }

    #[test]
    fn tool_result_round_trips_through_data_part() {
        let result = ToolResult {
            tool_call_id: "c9".into(),
            tool_name: "read_file".into(),
            parts: vec![DistriPart::Text {
                text: "contents".into(),
            }],
        };
        let wire = part_to_a2a(&DistriPart::ToolResult {
            tool_result: result.clone(),
        });
        match part_from_a2a(&wire) {
            DistriPart::ToolResult { tool_result } => assert_eq!(tool_result, result),
            other => panic!("expected tool_result, got {other:?}"),
        }
    }

    #[test]
    fn context_supplies_task_id_with_run_fallback(){
        let message = DistriMessage::new(DistriRole::User, vec![]);
        let mut context = InvokeContext::for_thread("thread-4");
        context.run_id = Some("run-4".into());

        let wire = message_to_a2a(&message, &context);
        assert_eq!(wire.context_id.as_deref(), Some("thread-4"));
        assert_eq!(wire.task_id.as_deref(), Some("run-4"));
    }

    #[test]
    fn status_update_without_metadata_type_is_not_an_event() {
        assert_eq!(status_update_to_event(&status_update(json!({}))), None);

        let no_metadata = TaskStatusUpdateEvent {
            metadata: None,
            ..status_update(json!({}))
        };
        assert_eq!(status_update_to_event(&no_metadata), None);
    }

    #[test]
    fn known_status_update_types_map_one_to_one() {
        let event = status_update_to_event(&status_update(json!({
            "type": "text_message_content",
            "message_id": "m1",
            "delta": "chunk"
        })))
        .unwrap();
        assert_eq!(
            event,
            DistriEvent::TextMessageContent {
                message_id: "m1".into(),
                step_id: None,
                delta: "chunk".into()
            }
        );

        let event = status_update_to_event(&status_update(json!({
            "type": "tool_execution_start",
            "tool_call_id": "c1",
            "tool_call_name": "browser"
        })))
        .unwrap();
        assert_eq!(
            event,
            DistriEvent::ToolCallStart {
                tool_call_id: "c1".into(),
                tool_call_name: "browser".into(),
                parent_message_id: Some("task-7".into()),
                is_external: Some(true),
            }
        );

        let event = status_update_to_event(&status_update(json!({
            "type": "step_completed",
            "step_id": "s2",
            "step_title": "Research",
            "step_index": 2
        })))
        .unwrap();
        assert!(matches!(event, DistriEvent::StepCompleted { step_index: 2, .. }));
    }

    #[test]
    fn unknown_status_update_type_degrades_to_run_started() {
        let event = status_update_to_event(&status_update(json!({
            "type": "telepathy_established",
            "run_id": "r1"
        })))
        .unwrap();
        assert_eq!(
            event,
            DistriEvent::RunStarted {
                run_id: Some("r1".into()),
                task_id: Some("task-7".into())
            }
        );
    }

    #[test]
    fn stream_decoding_unwraps_jsonrpc_and_drops_unknown_kinds() {
        let stream = vec![
            json!({"jsonrpc": "2.0", "id": "1", "result": {
                "kind": "message", "messageId": "m1", "role": "agent",
                "parts": [{"kind": "text", "text": "hi"}]
            }}),
            json!({"kind": "status-update", "taskId": "t", "contextId": "c",
                   "status": {"state": "working"}, "final": false,
                   "metadata": {"type": "run_finished"}}),
            json!({"kind": "task", "id": "t", "contextId": "c",
                   "status": {"state": "completed"}}),
            json!({"kind": "status-update", "taskId": "t", "contextId": "c",
                   "status": {"state": "working"}, "final": false}),
        ];

        let items = process_stream_data(&stream);
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], StreamItem::Message(m) if m.id == "m1"));
        assert!(matches!(
            &items[1],
            StreamItem::Event(DistriEvent::RunFinished { .. })
        ));
    }

    #[test]
    fn messages_data_keeps_only_messages_in_order() {
        let data = vec![
            json!({"kind": "message", "messageId": "m1", "role": "user", "parts": []}),
            json!({"kind": "status-update", "taskId": "t", "contextId": "c",
                   "status": {"state": "working"}, "final": false}),
            json!({"kind": "message", "messageId": "m2", "role": "agent", "parts": []}),
        ];
        let messages = process_messages_data(&data);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "m1");
        assert_eq!(messages[1].id, "m2");
    }

    #[test]
    fn approval_payload_parses_nested_calls() {
        let call = ToolCall {
            tool_call_id: "a1".into(),
            tool_name: "approval_request".into(),
            input: json!({
                "reason": "writes to disk",
                "tool_calls": [
                    {"tool_call_id": "c1", "tool_name": "write_file", "input": {}}
                ]
            }),
        };
        let request = approval_payload(&call);
        assert_eq!(request.reason.as_deref(), Some("writes to disk"));
        assert_eq!(request.tool_calls.len(), 1);
    }

    #[test]
    fn approval_payload_survives_malformed_input() {
        let call = ToolCall {
            tool_call_id: "a2".into(),
            tool_name: "approval_request".into(),
            input: json!("{not valid json"),
        };
        let request = approval_payload(&call);
        assert_eq!(request.reason, None);
        assert!(request.tool_calls.is_empty());
    }
}
