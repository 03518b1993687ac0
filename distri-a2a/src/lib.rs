//! # A2A (Agent2Agent) wire-protocol types
//!
//! Serde definitions for the subset of the A2A protocol the Distri SDK talks:
//! messages and their content parts, tasks, streaming status/artifact update
//! events, and the JSON-RPC 2.0 envelopes that carry them over HTTP.
//!
//! These are pure data types. All field names follow the camelCase wire
//! convention of the A2A schema; the structs carry the snake_case Rust names
//! with serde renames.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub mod agent_card;
pub use agent_card::{AgentCapabilities, AgentCard};

// Discriminator values for the `kind` field of streamed objects.
pub const MESSAGE_KIND: &str = "message";
pub const TASK_KIND: &str = "task";
pub const STATUS_UPDATE_KIND: &str = "status-update";
pub const ARTIFACT_UPDATE_KIND: &str = "artifact-update";

/// JSON-RPC version string. MUST be exactly "2.0".
pub const JSONRPC_VERSION: &str = "2.0";

// ============================================================================
// Messages and parts
// ============================================================================

/// Identifies the sender of a message. A2A only distinguishes the client
/// (`user`) from the remote service (`agent`); richer roles on the client side
/// collapse onto these two when encoding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

/// A single message exchanged between the client and an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Object discriminator. Always `"message"`.
    #[serde(default = "default_message_kind")]
    pub kind: String,
    /// Sender-generated unique identifier, typically a UUID.
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub role: MessageRole,
    /// Content parts forming the message body.
    pub parts: Vec<Part>,
    /// Groups related interactions (a conversation thread).
    #[serde(skip_serializing_if = "Option::is_none", rename = "contextId")]
    pub context_id: Option<String>,
    /// Task this message belongs to. Omitted on the first message of a task.
    #[serde(skip_serializing_if = "Option::is_none", rename = "taskId")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "createdAt")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Extension metadata. Distri uses this for tool definitions and
    /// tool-call/tool-response signalling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

fn default_message_kind() -> String {
    MESSAGE_KIND.to_string()
}

impl Message {
    /// Build a plain-text message with the given role.
    pub fn text(message_id: impl Into<String>, role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            kind: MESSAGE_KIND.to_string(),
            message_id: message_id.into(),
            role,
            parts: vec![Part::Text {
                text: text.into(),
                metadata: None,
            }],
            context_id: None,
            task_id: None,
            created_at: None,
            metadata: None,
        }
    }

    /// The value of `metadata.type`, when present.
    pub fn metadata_type(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("type"))
            .and_then(Value::as_str)
    }
}

/// A discriminated union of message/artifact content parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    /// A text segment.
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<HashMap<String, Value>>,
    },
    /// A file, referenced by URI or carried inline as base64 bytes.
    File {
        file: FileContent,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<HashMap<String, Value>>,
    },
    /// An opaque structured payload.
    Data {
        data: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<HashMap<String, Value>>,
    },
}

impl Part {
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Part::Data { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// File content: inline bytes or a URI. Untagged; the presence of `bytes`
/// versus `uri` decides the variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FileContent {
    WithBytes(FileWithBytes),
    WithUri(FileWithUri),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileWithBytes {
    /// Base64-encoded file content.
    pub bytes: String,
    #[serde(skip_serializing_if = "Option::is_none", rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileWithUri {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none", rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ============================================================================
// Tasks
// ============================================================================

/// Lifecycle states of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Canceled,
    Failed,
    Rejected,
    AuthRequired,
    Unknown,
}

/// Status of a task at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    pub state: TaskState,
    /// ISO 8601 datetime string recorded by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

/// A stateful operation between the client and an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Object discriminator. Always `"task"`.
    #[serde(default = "default_task_kind")]
    pub kind: String,
    pub id: String,
    #[serde(rename = "contextId")]
    pub context_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub history: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub artifacts: Vec<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

fn default_task_kind() -> String {
    TASK_KIND.to_string()
}

/// An output produced by an agent during a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    #[serde(rename = "artifactId")]
    pub artifact_id: String,
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

// ============================================================================
// Streaming update events
// ============================================================================

/// Notifies the client of a change in a task's status. Distri servers carry
/// the actual streaming signal in `metadata.type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatusUpdateEvent {
    /// Object discriminator. Always `"status-update"`.
    #[serde(default = "default_status_update_kind")]
    pub kind: String,
    #[serde(rename = "taskId")]
    pub task_id: String,
    #[serde(rename = "contextId")]
    pub context_id: String,
    pub status: TaskStatus,
    /// True on the last event of the stream for this interaction.
    #[serde(rename = "final", default)]
    pub is_final: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

fn default_status_update_kind() -> String {
    STATUS_UPDATE_KIND.to_string()
}

/// Notifies the client that an artifact was generated or updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskArtifactUpdateEvent {
    /// Object discriminator. Always `"artifact-update"`.
    #[serde(default = "default_artifact_update_kind")]
    pub kind: String,
    #[serde(rename = "taskId")]
    pub task_id: String,
    #[serde(rename = "contextId")]
    pub context_id: String,
    pub artifact: Artifact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "lastChunk")]
    pub last_chunk: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

fn default_artifact_update_kind() -> String {
    ARTIFACT_UPDATE_KIND.to_string()
}

// ============================================================================
// Method parameters
// ============================================================================

/// Parameters for `message/send` and `message/send_streaming`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSendParams {
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<MessageSendConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageSendConfiguration {
    /// When true the server waits for the task to complete before replying.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "historyLength")]
    pub history_length: Option<i32>,
    /// Output MIME types the client is prepared to accept.
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        rename = "acceptedOutputModes",
        default
    )]
    pub accepted_output_modes: Vec<String>,
}

/// Input for the task-creation convenience wrapper: a blocking
/// `message/send` whose result must be a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub agent_id: String,
    pub message: Message,
}

// ============================================================================
// JSON-RPC 2.0 envelopes
// ============================================================================

/// A JSON-RPC 2.0 request wrapping one A2A method call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// Client-chosen request id, echoed back in the response.
    pub id: String,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A JSON-RPC 2.0 response: either a result or an error, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponse<T> {
    Success {
        jsonrpc: String,
        #[serde(default)]
        id: Option<Value>,
        result: T,
    },
    Error {
        jsonrpc: String,
        #[serde(default)]
        id: Option<Value>,
        error: JsonRpcError,
    },
}

// ============================================================================
// Method results
// ============================================================================

/// Result of `message/send`: a direct reply or a task object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SendMessageResult {
    Task(Task),
    Message(Message),
}

impl SendMessageResult {
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            SendMessageResult::Message(message) => Some(message),
            SendMessageResult::Task(_) => None,
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            SendMessageResult::Task(task) => Some(task),
            SendMessageResult::Message(_) => None,
        }
    }
}

/// One item of a `message/send_streaming` event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SendStreamingMessageResult {
    TaskStatusUpdate(TaskStatusUpdateEvent),
    TaskArtifactUpdate(TaskArtifactUpdateEvent),
    Task(Task),
    Message(Message),
}
