//! Protocol constants shared across the SDK.

/// Tool name the agent uses to route an approval request through the client.
pub const APPROVAL_REQUEST_TOOL_NAME: &str = "approval_request";

/// `metadata.type` on a message that lists tool calls the client must run.
pub const EXTERNAL_TOOL_CALLS: &str = "external_tool_calls";

/// `metadata.type` on a message carrying a tool result back to the agent.
pub const TOOL_RESPONSE: &str = "tool_response";

/// JSON-RPC method for a blocking or non-blocking message send.
pub const METHOD_SEND_MESSAGE: &str = "message/send";

/// JSON-RPC method for a streamed message send.
pub const METHOD_SEND_STREAMING_MESSAGE: &str = "message/send_streaming";
