//! Agent discovery document.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The discovery document describing a remote agent. Served by the Distri
/// server's agent listing endpoints; the SDK consumes only the fields below
/// and round-trips anything else through `metadata`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentCard {
    /// Unique agent name; doubles as the agent id on the Distri API.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    /// Service endpoint URL. May be empty when the agent is only reachable
    /// through the Distri server proxy.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    #[serde(skip_serializing_if = "Option::is_none", rename = "iconUrl")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

/// Optional protocol capabilities advertised by an agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "pushNotifications")]
    pub push_notifications: Option<bool>,
}

impl AgentCard {
    /// Whether the agent advertises streaming support.
    pub fn supports_streaming(&self) -> bool {
        self.capabilities.streaming.unwrap_or(false)
    }
}
