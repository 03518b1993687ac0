//! Agent invocation façade.
//!
//! Wraps [`DistriClient`] message sends with external tool execution: the
//! agent lists tool calls it wants the client to run in message metadata, the
//! façade dispatches them to registered handlers (gated by an approval
//! handler when requested), and sends each result back correlated by
//! `tool_call_id`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};
use uuid::Uuid;

use distri_a2a::{AgentCard, Message, MessageRole, MessageSendParams, SendMessageResult};

use crate::client::DistriClient;
use crate::codec::{self, StreamItem};
use crate::constants::{APPROVAL_REQUEST_TOOL_NAME, EXTERNAL_TOOL_CALLS, TOOL_RESPONSE};
use crate::errors::{DistriError, DistriResult};
use crate::messages::ToolCall;

/// Identity and description of the agent the façade talks to.
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon_url: Option<String>,
}

impl From<&AgentCard> for AgentDefinition {
    fn from(card: &AgentCard) -> Self {
        Self {
            id: card.name.clone(),
            name: card.name.clone(),
            description: card.description.clone(),
            icon_url: card.icon_url.clone(),
        }
    }
}

/// A client-side tool the agent may invoke.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Unique tool name, as announced to the agent.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// JSON Schema of the tool input.
    fn parameters(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn call(&self, input: Value) -> ToolOutcome;
}

/// Result of executing one tool call.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub success: bool,
    pub result: Value,
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn success(result: Value) -> Self {
        Self {
            success: true,
            result,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: Value::Null,
            error: Some(message.into()),
        }
    }
}

/// Decides whether a batch of external tool calls may run.
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    async fn review(&self, request: ApprovalRequest) -> ApprovalDecision;
}

/// The question put to an approval handler.
#[derive(Debug, Clone, Default)]
pub struct ApprovalRequest {
    pub reason: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone)]
pub struct ApprovalDecision {
    pub approved: bool,
    pub reason: Option<String>,
}

impl ApprovalDecision {
    pub fn approve() -> Self {
        Self {
            approved: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
        }
    }
}

/// Tool-call batch decoded from message metadata.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExternalToolCalls {
    pub tool_calls: Vec<ToolCall>,
    pub requires_approval: bool,
    pub reason: Option<String>,
}

/// Decode `metadata.type == "external_tool_calls"` from a wire message.
pub(crate) fn external_tool_calls(message: &Message) -> Option<ExternalToolCalls> {
    let metadata = message.metadata.as_ref()?;
    if metadata.get("type").and_then(Value::as_str) != Some(EXTERNAL_TOOL_CALLS) {
        return None;
    }
    let tool_calls = metadata
        .get("tool_calls")
        .cloned()
        .and_then(|value| serde_json::from_value::<Vec<ToolCall>>(value).ok())
        .unwrap_or_default();
    Some(ExternalToolCalls {
        tool_calls,
        requires_approval: metadata
            .get("requires_approval")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        reason: metadata
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

struct AgentInner {
    definition: AgentDefinition,
    client: Arc<DistriClient>,
    tools: DashMap<String, Arc<dyn ToolHandler>>,
    approval_handler: Option<Arc<dyn ApprovalHandler>>,
}

/// Façade for one logical "send message, run requested tools, stream
/// response" interaction with a remote agent.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

impl Agent {
    pub fn new(definition: AgentDefinition, client: Arc<DistriClient>) -> Self {
        Self {
            inner: Arc::new(AgentInner {
                definition,
                client,
                tools: DashMap::new(),
                approval_handler: None,
            }),
        }
    }

    /// Fetch the agent card and build a façade for it.
    pub async fn create(agent_id: &str, client: Arc<DistriClient>) -> DistriResult<Self> {
        let card = client.get_agent(agent_id).await?;
        Ok(Self::new(AgentDefinition::from(&card), client))
    }

    /// List every agent the server knows about.
    pub async fn list(client: Arc<DistriClient>) -> DistriResult<Vec<Agent>> {
        let cards = client.get_agents().await?;
        Ok(cards
            .iter()
            .map(|card| Self::new(AgentDefinition::from(card), client.clone()))
            .collect())
    }

    /// Install the approval handler consulted before gated tool batches.
    pub fn with_approval_handler(self, handler: Arc<dyn ApprovalHandler>) -> Self {
        let inner = AgentInner {
            definition: self.inner.definition.clone(),
            client: self.inner.client.clone(),
            tools: DashMap::new(),
            approval_handler: Some(handler),
        };
        for entry in self.inner.tools.iter() {
            inner.tools.insert(entry.key().clone(), entry.value().clone());
        }
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.definition.id
    }

    pub fn name(&self) -> &str {
        &self.inner.definition.name
    }

    pub fn description(&self) -> &str {
        &self.inner.definition.description
    }

    pub fn register_tool(&self, tool: Arc<dyn ToolHandler>) {
        self.inner.tools.insert(tool.name().to_string(), tool);
    }

    pub fn register_tools(&self, tools: Vec<Arc<dyn ToolHandler>>) {
        for tool in tools {
            self.register_tool(tool);
        }
    }

    pub fn unregister_tool(&self, tool_name: &str) {
        self.inner.tools.remove(tool_name);
    }

    pub fn has_tool(&self, tool_name: &str) -> bool {
        self.inner.tools.contains_key(tool_name)
    }

    /// Send a message and wait for the reply, executing any external tool
    /// calls the response requests.
    pub async fn invoke(&self, params: MessageSendParams) -> DistriResult<SendMessageResult> {
        let params = self.with_tool_metadata(params);
        let result = self
            .inner
            .client
            .send_message(&self.inner.definition.id, params)
            .await?;

        if let SendMessageResult::Message(message) = &result {
            if let Some(batch) = external_tool_calls(message) {
                self.run_tool_batch(message.context_id.clone(), batch)
                    .await?;
            }
        }
        Ok(result)
    }

    /// Send a message and stream decoded response items. Dropping the stream
    /// abandons it client-side; no cancel signal reaches the server.
    pub async fn invoke_stream(
        &self,
        params: MessageSendParams,
    ) -> DistriResult<ReceiverStream<DistriResult<StreamItem>>> {
        let params = self.with_tool_metadata(params);
        let mut upstream = self
            .inner
            .client
            .send_message_stream(&self.inner.definition.id, params)
            .await?;

        let agent = self.clone();
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            while let Some(item) = upstream.next().await {
                match item {
                    Ok(result) => {
                        if let distri_a2a::SendStreamingMessageResult::Message(message) = &result {
                            if let Some(batch) = external_tool_calls(message) {
                                if let Err(error) = agent
                                    .run_tool_batch(message.context_id.clone(), batch)
                                    .await
                                {
                                    let _ = tx.send(Err(error)).await;
                                    return;
                                }
                            }
                        }
                        if let Some(decoded) = codec::decode_stream_result(&result) {
                            if tx.send(Ok(decoded)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(error) => {
                        let _ = tx.send(Err(error)).await;
                        return;
                    }
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }

    /// Execute one batch of agent-requested tool calls and send the results
    /// back. A denied approval aborts the whole batch before any handler
    /// runs.
    async fn run_tool_batch(
        &self,
        context_id: Option<String>,
        batch: ExternalToolCalls,
    ) -> DistriResult<()> {
        if batch.requires_approval {
            if let Some(handler) = &self.inner.approval_handler {
                let decision = handler
                    .review(ApprovalRequest {
                        reason: batch.reason.clone(),
                        tool_calls: batch.tool_calls.clone(),
                    })
                    .await;
                if !decision.approved {
                    return Err(DistriError::ToolRejected {
                        reason: decision
                            .reason
                            .unwrap_or_else(|| "approval denied".to_string()),
                    });
                }
            }
        }

        for call in &batch.tool_calls {
            let outcome = self.execute_tool(call).await?;
            self.send_tool_response(context_id.clone(), call, &outcome)
                .await?;
        }
        Ok(())
    }

    /// Run a single tool call. The approval-request tool is answered with the
    /// approval outcome itself; everything else needs a registered handler.
    pub async fn execute_tool(&self, call: &ToolCall) -> DistriResult<ToolOutcome> {
        if call.tool_name == APPROVAL_REQUEST_TOOL_NAME {
            let request = codec::approval_payload(call);
            let Some(handler) = &self.inner.approval_handler else {
                return Ok(ToolOutcome::error("no approval handler configured"));
            };
            let decision = handler.review(request).await;
            return Ok(ToolOutcome {
                success: decision.approved,
                result: json!({
                    "approved": decision.approved,
                    "reason": decision.reason,
                }),
                error: if decision.approved {
                    None
                } else {
                    Some("approval denied".to_string())
                },
            });
        }

        let Some(handler) = self
            .inner
            .tools
            .get(&call.tool_name)
            .map(|entry| Arc::clone(entry.value()))
        else {
            return Err(DistriError::ToolNotFound {
                tool_name: call.tool_name.clone(),
            });
        };
        debug!(tool = %call.tool_name, id = %call.tool_call_id, "executing external tool");
        Ok(handler.call(call.input.clone()).await)
    }

    async fn send_tool_response(
        &self,
        context_id: Option<String>,
        call: &ToolCall,
        outcome: &ToolOutcome,
    ) -> DistriResult<()> {
        let mut metadata = HashMap::new();
        metadata.insert("type".to_string(), json!(TOOL_RESPONSE));
        metadata.insert("tool_call_id".to_string(), json!(call.tool_call_id));
        metadata.insert("tool_name".to_string(), json!(call.tool_name));
        metadata.insert("result".to_string(), outcome.result.clone());
        metadata.insert("success".to_string(), json!(outcome.success));
        if let Some(error) = &outcome.error {
            metadata.insert("error".to_string(), json!(error));
        }

        let message = Message {
            context_id,
            metadata: Some(metadata),
            ..Message::text(Uuid::new_v4().to_string(), MessageRole::User, "")
        };

        if let Err(error) = self
            .inner
            .client
            .send_message(
                &self.inner.definition.id,
                MessageSendParams {
                    message,
                    configuration: None,
                    metadata: None,
                },
            )
            .await
        {
            warn!(tool = %call.tool_name, %error, "failed to deliver tool response");
            return Err(error);
        }
        Ok(())
    }

    /// Inject registered tool definitions into outbound request metadata.
    fn with_tool_metadata(&self, mut params: MessageSendParams) -> MessageSendParams {
        let definitions: Vec<Value> = self
            .inner
            .tools
            .iter()
            .map(|entry| {
                json!({
                    "name": entry.value().name(),
                    "description": entry.value().description(),
                    "parameters": entry.value().parameters(),
                })
            })
            .collect();
        if definitions.is_empty() {
            return params;
        }
        params
            .metadata
            .get_or_insert_with(HashMap::new)
            .insert("external_tools".to_string(), Value::Array(definitions));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DistriClientConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_agent() -> Agent {
        let client = Arc::new(
            DistriClient::new(DistriClientConfig::new("http://localhost:1")).unwrap(),
        );
        Agent::new(
            AgentDefinition {
                id: "helper".into(),
                name: "helper".into(),
                description: "test agent".into(),
                icon_url: None,
            },
            client,
        )
    }

    struct EchoTool;

    #[async_trait]
    impl ToolHandler for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        async fn call(&self, input: Value) -> ToolOutcome {
            ToolOutcome::success(json!({ "echo": input }))
        }
    }

    struct CountingApprover {
        approve: bool,
        reviews: AtomicUsize,
    }

    #[async_trait]
    impl ApprovalHandler for CountingApprover {
        async fn review(&self, _request: ApprovalRequest) -> ApprovalDecision {
            self.reviews.fetch_add(1, Ordering::SeqCst);
            if self.approve {
                ApprovalDecision::approve()
            } else {
                ApprovalDecision::deny("not allowed")
            }
        }
    }

    fn message_with_metadata(metadata: Value) -> Message {
        Message {
            metadata: serde_json::from_value(metadata).ok(),
            ..Message::text("m1", MessageRole::Agent, "working on it")
        }
    }

    #[test]
    fn tool_registry_round_trip() {
        let agent = test_agent();
        assert!(!agent.has_tool("echo"));
        agent.register_tool(Arc::new(EchoTool));
        assert!(agent.has_tool("echo"));
        agent.unregister_tool("echo");
        assert!(!agent.has_tool("echo"));
    }

    #[test]
    fn external_tool_calls_decoding() {
        let message = message_with_metadata(json!({
            "type": "external_tool_calls",
            "requires_approval": true,
            "reason": "writes files",
            "tool_calls": [
                {"tool_call_id": "c1", "tool_name": "write_file", "input": {"path": "a"}}
            ]
        }));
        let batch = external_tool_calls(&message).unwrap();
        assert!(batch.requires_approval);
        assert_eq!(batch.reason.as_deref(), Some("writes files"));
        assert_eq!(batch.tool_calls.len(), 1);
        assert_eq!(batch.tool_calls[0].tool_name, "write_file");
    }

    #[test]
    fn non_tool_metadata_is_ignored() {
        let message = message_with_metadata(json!({ "type": "assistant_response" }));
        assert_eq!(external_tool_calls(&message), None);
        let plain = Message::text("m2", MessageRole::Agent, "hi");
        assert_eq!(external_tool_calls(&plain), None);
    }

    #[tokio::test]
    async fn executing_unregistered_tool_is_a_hard_failure() {
        let agent = test_agent();
        let error = agent
            .execute_tool(&ToolCall {
                tool_call_id: "c1".into(),
                tool_name: "missing".into(),
                input: Value::Null,
            })
            .await
            .unwrap_err();
        assert_eq!(error.code(), "TOOL_NOT_FOUND");
    }

    #[tokio::test]
    async fn registered_tool_executes_with_input() {
        let agent = test_agent();
        agent.register_tool(Arc::new(EchoTool));
        let outcome = agent
            .execute_tool(&ToolCall {
                tool_call_id: "c1".into(),
                tool_name: "echo".into(),
                input: json!({ "x": 1 }),
            })
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.result["echo"]["x"], 1);
    }

    #[tokio::test]
    async fn approval_tool_returns_the_decision_not_a_business_result() {
        let approver = Arc::new(CountingApprover {
            approve: true,
            reviews: AtomicUsize::new(0),
        });
        let agent = test_agent().with_approval_handler(approver.clone());

        let outcome = agent
            .execute_tool(&ToolCall {
                tool_call_id: "a1".into(),
                tool_name: APPROVAL_REQUEST_TOOL_NAME.into(),
                input: json!({
                    "reason": "delete files",
                    "tool_calls": [{"tool_call_id": "c1", "tool_name": "rm", "input": {}}]
                }),
            })
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.result["approved"], true);
        assert_eq!(approver.reviews.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn approval_tool_with_malformed_input_fails_synthetically() {
        let approver = Arc::new(CountingApprover {
            approve: false,
            reviews: AtomicUsize::new(0),
        });
        let agent = test_agent().with_approval_handler(approver.clone());

        let outcome = agent
            .execute_tool(&ToolCall {
                tool_call_id: "a2".into(),
                tool_name: APPROVAL_REQUEST_TOOL_NAME.into(),
                input: json!("{broken"),
            })
            .await
            .unwrap();

        // The malformed payload still routes an (empty) request to the
        // handler; denial surfaces as a failed outcome, not an error.
        assert!(!outcome.success);
        assert_eq!(approver.reviews.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn denied_approval_aborts_the_whole_batch() {
        let approver = Arc::new(CountingApprover {
            approve: false,
            reviews: AtomicUsize::new(0),
        });
        let agent = test_agent().with_approval_handler(approver);
        agent.register_tool(Arc::new(EchoTool));

        let error = agent
            .run_tool_batch(
                Some("ctx".into()),
                ExternalToolCalls {
                    tool_calls: vec![ToolCall {
                        tool_call_id: "c1".into(),
                        tool_name: "echo".into(),
                        input: Value::Null,
                    }],
                    requires_approval: true,
                    reason: Some("risky".into()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(error.code(), "TOOL_REJECTED");
    }

    #[test]
    fn tool_metadata_injection() {
        let agent = test_agent();
        agent.register_tool(Arc::new(EchoTool));

        let params = MessageSendParams {
            message: Message::text("m1", MessageRole::User, "run echo"),
            configuration: None,
            metadata: None,
        };
        let enhanced = agent.with_tool_metadata(params);
        let metadata = enhanced.metadata.unwrap();
        assert_eq!(metadata["external_tools"][0]["name"], "echo");
    }
}
