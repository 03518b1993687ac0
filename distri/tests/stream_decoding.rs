//! End-to-end decoding of a captured agent event stream.

use distri::codec::{process_stream_data, StreamItem};
use distri::events::DistriEvent;
use distri::messages::{DistriPart, DistriRole};
use serde_json::json;

#[test]
fn full_stream_capture_decodes_in_order() {
    let capture = vec![
        json!({"jsonrpc": "2.0", "id": "req-1", "result": {
            "kind": "status-update", "taskId": "task-1", "contextId": "ctx-1",
            "status": {"state": "working"}, "final": false,
            "metadata": {"type": "run_started", "run_id": "run-1"}
        }}),
        json!({"kind": "status-update", "taskId": "task-1", "contextId": "ctx-1",
               "status": {"state": "working"}, "final": false,
               "metadata": {"type": "plan_started", "initial_plan": true}}),
        json!({"kind": "status-update", "taskId": "task-1", "contextId": "ctx-1",
               "status": {"state": "working"}, "final": false,
               "metadata": {"type": "step_started", "step_id": "s1",
                            "step_title": "Research", "step_index": 0}}),
        json!({"kind": "status-update", "taskId": "task-1", "contextId": "ctx-1",
               "status": {"state": "working"}, "final": false,
               "metadata": {"type": "text_message_start", "message_id": "m1",
                            "role": "assistant"}}),
        json!({"kind": "status-update", "taskId": "task-1", "contextId": "ctx-1",
               "status": {"state": "working"}, "final": false,
               "metadata": {"type": "text_message_content", "message_id": "m1",
                            "delta": "Looking that up"}}),
        json!({"kind": "status-update", "taskId": "task-1", "contextId": "ctx-1",
               "status": {"state": "working"}, "final": false,
               "metadata": {"type": "text_message_end", "message_id": "m1"}}),
        // A server-side protocol addition this client has never heard of.
        json!({"kind": "status-update", "taskId": "task-1", "contextId": "ctx-1",
               "status": {"state": "working"}, "final": false,
               "metadata": {"type": "quantum_sync_started"}}),
        json!({"kind": "message", "messageId": "m2", "role": "agent", "parts": [
            {"kind": "text", "text": "Here is the answer."},
            {"kind": "data", "data": {"part_type": "tool_call", "tool_call": {
                "tool_call_id": "c1", "tool_name": "save_notes", "input": {"text": "answer"}
            }}}
        ]}),
        // Task objects are bookkeeping, not displayable stream items.
        json!({"kind": "task", "id": "task-1", "contextId": "ctx-1",
               "status": {"state": "completed"}}),
        json!({"kind": "status-update", "taskId": "task-1", "contextId": "ctx-1",
               "status": {"state": "completed"}, "final": true,
               "metadata": {"type": "run_finished"}}),
    ];

    let items = process_stream_data(&capture);
    assert_eq!(items.len(), 9);

    assert!(matches!(
        &items[0],
        StreamItem::Event(DistriEvent::RunStarted { run_id: Some(run), task_id: Some(task) })
            if run == "run-1" && task == "task-1"
    ));
    assert!(matches!(
        &items[1],
        StreamItem::Event(DistriEvent::PlanStarted {
            initial_plan: Some(true)
        })
    ));
    assert!(matches!(
        &items[2],
        StreamItem::Event(DistriEvent::StepStarted { step_index: 0, .. })
    ));
    assert!(matches!(
        &items[3],
        StreamItem::Event(DistriEvent::TextMessageStart { role: DistriRole::Assistant, .. })
    ));
    assert!(matches!(
        &items[4],
        StreamItem::Event(DistriEvent::TextMessageContent { delta, .. }) if delta == "Looking that up"
    ));
    assert!(matches!(
        &items[5],
        StreamItem::Event(DistriEvent::TextMessageEnd { .. })
    ));
    // Unknown type degraded, not dropped.
    assert!(matches!(
        &items[6],
        StreamItem::Event(DistriEvent::RunStarted { task_id: Some(task), .. }) if task == "task-1"
    ));

    match &items[7] {
        StreamItem::Message(message) => {
            assert_eq!(message.id, "m2");
            assert_eq!(message.role, DistriRole::Assistant);
            assert_eq!(message.text_content(), "Here is the answer.");
            let calls = message.tool_calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].tool_name, "save_notes");
            assert!(matches!(
                &message.parts[1],
                DistriPart::ToolCall { .. }
            ));
        }
        other => panic!("expected message, got {other:?}"),
    }

    assert!(matches!(
        &items[8],
        StreamItem::Event(DistriEvent::RunFinished { .. })
    ));
}
