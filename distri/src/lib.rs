//! # Distri client SDK
//!
//! Rust client for Distri agent services speaking the A2A protocol over
//! JSON-RPC/HTTP, Server-Sent Events, and WebSockets.
//!
//! The crate is organized around four pieces:
//!
//! - [`codec`]: pure, total translation between the A2A wire protocol and the
//!   internal [`DistriMessage`]/[`DistriEvent`] streaming representation.
//! - [`DistriClient`]: HTTP + JSON-RPC client with retrying fetch, streaming
//!   message sends, and per-agent SSE event subscriptions.
//! - [`RealtimeClient`]: WebSocket request/response + pub/sub client with
//!   heartbeat, bounded reconnect, and exactly-once request correlation.
//! - [`Agent`]: invocation façade layering external tool execution and
//!   approval gating on top of the HTTP client.

pub mod agent;
pub mod client;
pub mod codec;
pub mod constants;
pub mod errors;
pub mod events;
pub mod messages;
pub mod realtime;
mod sse;

pub use distri_a2a as a2a;

pub use agent::{Agent, AgentDefinition, ApprovalDecision, ApprovalHandler, ApprovalRequest, ToolHandler, ToolOutcome};
pub use client::{AgentSubscription, DistriClient, DistriClientConfig};
pub use codec::StreamItem;
pub use errors::{DistriError, DistriResult};
pub use events::DistriEvent;
pub use messages::{DistriMessage, DistriPart, DistriRole, InvokeContext, ToolCall, ToolResult};
pub use realtime::{ConnectionStatus, RealtimeClient, RealtimeConfig, RealtimeEvent};
