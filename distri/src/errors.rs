//! Error taxonomy for client operations.

use serde_json::Value;

/// Main error type for the Distri SDK.
///
/// Every variant maps to a stable machine-readable code via [`DistriError::code`]
/// so callers can branch without string-matching display text.
#[derive(Debug, thiserror::Error)]
pub enum DistriError {
    /// Transport is unavailable or the connection was closed.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// The server answered with a non-2xx HTTP status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A requested resource does not exist (HTTP 404).
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// A well-formed error at the protocol level (JSON-RPC error member,
    /// realtime error frame, request timeout).
    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        details: Option<Value>,
    },

    /// The user or approval handler denied a tool-execution batch.
    #[error("Tool execution rejected: {reason}")]
    ToolRejected { reason: String },

    /// The agent requested a tool with no registered handler.
    #[error("Tool not found: {tool_name}")]
    ToolNotFound { tool_name: String },

    /// JSON encoding/decoding failure.
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    /// Any other failure.
    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

/// Convenience alias.
pub type DistriResult<T> = std::result::Result<T, DistriError>;

impl DistriError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "CONNECTION_ERROR",
            Self::Api { .. } => "API_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Protocol { .. } => "A2A_PROTOCOL_ERROR",
            Self::ToolRejected { .. } => "TOOL_REJECTED",
            Self::ToolNotFound { .. } => "TOOL_NOT_FOUND",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Structured payload attached to protocol-level errors, when present.
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Protocol { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            details: None,
        }
    }

    pub(crate) fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for DistriError {
    fn from(error: reqwest::Error) -> Self {
        Self::Connection {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for DistriError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            reason: error.to_string(),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for DistriError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Connection {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            DistriError::connection("closed").code(),
            "CONNECTION_ERROR"
        );
        assert_eq!(
            DistriError::Api {
                status: 502,
                message: "bad gateway".into()
            }
            .code(),
            "API_ERROR"
        );
        assert_eq!(DistriError::protocol("timeout").code(), "A2A_PROTOCOL_ERROR");
    }

    #[test]
    fn display_carries_context() {
        let err = DistriError::NotFound {
            resource: "agent weather".into(),
        };
        assert!(err.to_string().contains("agent weather"));
    }
}
