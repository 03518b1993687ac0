//! HTTP + JSON-RPC + SSE client for the Distri server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use distri_a2a::{
    AgentCard, CreateTaskRequest, JsonRpcRequest, JsonRpcResponse, MessageSendConfiguration,
    MessageSendParams, SendMessageResult, SendStreamingMessageResult, Task,
};

use crate::constants::{METHOD_SEND_MESSAGE, METHOD_SEND_STREAMING_MESSAGE};
use crate::errors::{DistriError, DistriResult};
use crate::events::DistriEvent;
use crate::sse::SseParser;

/// Configuration for [`DistriClient`].
#[derive(Debug, Clone)]
pub struct DistriClientConfig {
    /// Server base URL. A trailing slash is stripped.
    pub base_url: String,
    /// API version segment, e.g. `v1`.
    pub api_version: String,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Number of retries after the initial attempt.
    pub retry_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    pub debug: bool,
    /// Default headers; per-request headers take precedence.
    pub headers: HashMap<String, String>,
}

impl DistriClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: "v1".to_string(),
            timeout: Duration::from_millis(30_000),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(1_000),
            debug: false,
            headers: HashMap::new(),
        }
    }
}

/// A live SSE subscription to one agent's event stream.
///
/// Events are fanned out over a broadcast channel; call
/// [`AgentSubscription::events`] once per consumer.
pub struct AgentSubscription {
    agent_id: String,
    sender: broadcast::Sender<DistriEvent>,
    reader: JoinHandle<()>,
}

impl AgentSubscription {
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn events(&self) -> broadcast::Receiver<DistriEvent> {
        self.sender.subscribe()
    }

    fn close(&self) {
        self.reader.abort();
    }
}

impl Drop for AgentSubscription {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Client for the Distri HTTP API: agent discovery, JSON-RPC message sends,
/// task reads, and per-agent SSE subscriptions.
pub struct DistriClient {
    config: DistriClientConfig,
    http: reqwest::Client,
    subscriptions: DashMap<String, Arc<AgentSubscription>>,
    request_counter: AtomicU64,
}

impl DistriClient {
    pub fn new(config: DistriClientConfig) -> DistriResult<Self> {
        let mut default_headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|error| {
                DistriError::Internal {
                    reason: format!("invalid header name '{key}': {error}"),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|error| DistriError::Internal {
                reason: format!("invalid header value for '{key}': {error}"),
            })?;
            default_headers.insert(name, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|error| DistriError::Internal {
                reason: format!("failed to build HTTP client: {error}"),
            })?;

        debug!(base_url = %config.base_url, "distri client initialized");
        Ok(Self {
            config,
            http,
            subscriptions: DashMap::new(),
            request_counter: AtomicU64::new(0),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/api/{}{}",
            self.config.base_url, self.config.api_version, path
        )
    }

    /// Process-unique JSON-RPC request id.
    fn next_request_id(&self) -> String {
        let counter = self.request_counter.fetch_add(1, Ordering::SeqCst);
        format!(
            "req-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            counter
        )
    }

    // ========================================================================
    // REST surface
    // ========================================================================

    /// List all available agents.
    pub async fn get_agents(&self) -> DistriResult<Vec<AgentCard>> {
        let response = self
            .fetch(self.http.get(self.api_url("/agents")), true)
            .await?;
        Self::expect_success(&response, "agents")?;
        Ok(response.json::<Vec<AgentCard>>().await.map_err(wrap_decode)?)
    }

    /// Fetch one agent card. A missing agent is a typed not-found error.
    pub async fn get_agent(&self, agent_id: &str) -> DistriResult<AgentCard> {
        let response = self
            .fetch(
                self.http.get(self.api_url(&format!("/agents/{agent_id}"))),
                true,
            )
            .await?;
        if response.status().as_u16() == 404 {
            return Err(DistriError::NotFound {
                resource: format!("agent {agent_id}"),
            });
        }
        Self::expect_success(&response, "agent")?;
        Ok(response.json::<AgentCard>().await.map_err(wrap_decode)?)
    }

    /// Fetch one task, with the same not-found distinction as [`get_agent`].
    ///
    /// [`get_agent`]: DistriClient::get_agent
    pub async fn get_task(&self, task_id: &str) -> DistriResult<Task> {
        let response = self
            .fetch(
                self.http.get(self.api_url(&format!("/tasks/{task_id}"))),
                true,
            )
            .await?;
        if response.status().as_u16() == 404 {
            return Err(DistriError::NotFound {
                resource: format!("task {task_id}"),
            });
        }
        Self::expect_success(&response, "task")?;
        Ok(response.json::<Task>().await.map_err(wrap_decode)?)
    }

    // ========================================================================
    // JSON-RPC message sends
    // ========================================================================

    /// Send a message to an agent and wait for the reply or task.
    pub async fn send_message(
        &self,
        agent_id: &str,
        params: MessageSendParams,
    ) -> DistriResult<SendMessageResult> {
        self.post_rpc(agent_id, METHOD_SEND_MESSAGE, params).await
    }

    /// Issue a `message/send_streaming` call and return the raw JSON-RPC
    /// result (the server's acknowledgement envelope). Use
    /// [`send_message_stream`](DistriClient::send_message_stream) to consume
    /// the event stream itself.
    pub async fn send_streaming_message(
        &self,
        agent_id: &str,
        params: MessageSendParams,
    ) -> DistriResult<Value> {
        self.post_rpc(agent_id, METHOD_SEND_STREAMING_MESSAGE, params)
            .await
    }

    /// Convenience wrapper: blocking text-mode send whose result must be a
    /// task.
    pub async fn create_task(&self, request: CreateTaskRequest) -> DistriResult<Task> {
        let params = MessageSendParams {
            message: request.message,
            configuration: Some(MessageSendConfiguration {
                blocking: Some(true),
                accepted_output_modes: vec!["text/plain".to_string()],
                ..Default::default()
            }),
            metadata: None,
        };
        match self
            .post_rpc::<SendMessageResult>(&request.agent_id, METHOD_SEND_MESSAGE, params)
            .await?
        {
            SendMessageResult::Task(task) => Ok(task),
            SendMessageResult::Message(_) => Err(DistriError::protocol(
                "expected a task from blocking message/send, got a message",
            )),
        }
    }

    async fn post_rpc<T: DeserializeOwned>(
        &self,
        agent_id: &str,
        method: &str,
        params: MessageSendParams,
    ) -> DistriResult<T> {
        let request = JsonRpcRequest::new(
            self.next_request_id(),
            method,
            serde_json::to_value(&params)?,
        );

        // The fetch layer blindly retries transport failures, including this
        // POST: a send that timed out mid-flight and is retried may execute
        // the agent action twice. Known trade-off; server-side idempotency is
        // out of this client's hands.
        let response = self
            .fetch(
                self.http
                    .post(self.api_url(&format!("/agents/{agent_id}")))
                    .json(&request),
                true,
            )
            .await?;
        Self::expect_success(&response, method)?;

        match response
            .json::<JsonRpcResponse<T>>()
            .await
            .map_err(wrap_decode)?
        {
            JsonRpcResponse::Success { result, .. } => Ok(result),
            JsonRpcResponse::Error { error, .. } => Err(DistriError::Protocol {
                message: error.message,
                details: error.data,
            }),
        }
    }

    /// Send a message and stream the agent's response events as they arrive.
    pub async fn send_message_stream(
        &self,
        agent_id: &str,
        params: MessageSendParams,
    ) -> DistriResult<ReceiverStream<DistriResult<SendStreamingMessageResult>>> {
        let request = JsonRpcRequest::new(
            self.next_request_id(),
            METHOD_SEND_STREAMING_MESSAGE,
            serde_json::to_value(&params)?,
        );

        let response = self
            .fetch(
                self.http
                    .post(self.api_url(&format!("/agents/{agent_id}")))
                    .header("Accept", "text/event-stream")
                    .json(&request),
                false,
            )
            .await?;
        Self::expect_success(&response, METHOD_SEND_STREAMING_MESSAGE)?;
        Self::expect_event_stream(&response)?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut parser = SseParser::new();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(error) => {
                        let _ = tx
                            .send(Err(DistriError::connection(format!(
                                "stream error: {error}"
                            ))))
                            .await;
                        return;
                    }
                };
                for data in parser.push(&chunk) {
                    if tx.send(decode_sse_payload(&data)).await.is_err() {
                        // Consumer dropped the stream; abandonment is
                        // client-side only, no cancel is sent upstream.
                        return;
                    }
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }

    // ========================================================================
    // Agent event subscriptions
    // ========================================================================

    /// Subscribe to an agent's SSE event stream. Idempotent: repeated calls
    /// for the same agent return the same cached handle.
    pub async fn subscribe_to_agent(&self, agent_id: &str) -> DistriResult<Arc<AgentSubscription>> {
        if let Some(existing) = self.subscriptions.get(agent_id) {
            return Ok(Arc::clone(existing.value()));
        }

        let response = self
            .fetch(
                self.http
                    .get(self.api_url(&format!("/agents/{agent_id}/events")))
                    .header("Accept", "text/event-stream"),
                false,
            )
            .await?;
        Self::expect_success(&response, "events")?;
        Self::expect_event_stream(&response)?;

        let (sender, _) = broadcast::channel(256);
        let events = sender.clone();
        let subscription_agent = agent_id.to_string();
        let reader = tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut parser = SseParser::new();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(error) => {
                        warn!(agent_id = %subscription_agent, %error, "agent event stream closed");
                        return;
                    }
                };
                for data in parser.push(&chunk) {
                    match serde_json::from_str::<DistriEvent>(&data) {
                        Ok(event) => {
                            let _ = events.send(event);
                        }
                        // Parse failures are dropped, not fatal to the stream.
                        Err(error) => {
                            warn!(agent_id = %subscription_agent, %error, "dropping unparseable agent event")
                        }
                    }
                }
            }
        });

        let subscription = Arc::new(AgentSubscription {
            agent_id: agent_id.to_string(),
            sender,
            reader,
        });
        self.subscriptions
            .insert(agent_id.to_string(), subscription.clone());
        Ok(subscription)
    }

    /// Close and evict the cached subscription for an agent, if any.
    pub fn unsubscribe_from_agent(&self, agent_id: &str) {
        if let Some((_, subscription)) = self.subscriptions.remove(agent_id) {
            subscription.close();
        }
    }

    /// Close every cached subscription.
    pub fn disconnect(&self) {
        self.subscriptions.retain(|_, subscription| {
            subscription.close();
            false
        });
    }

    // ========================================================================
    // Fetch with retry
    // ========================================================================

    /// Execute a request with a bounded, fixed-delay retry loop. Retries are
    /// blind and transport-level: only send failures retry, and a non-2xx
    /// response returns to the caller untouched. The last attempt's error is
    /// re-thrown when every attempt fails. `with_timeout` is off for
    /// streaming responses, where a per-request deadline would sever the
    /// stream.
    async fn fetch(
        &self,
        request: reqwest::RequestBuilder,
        with_timeout: bool,
    ) -> DistriResult<reqwest::Response> {
        let mut last_error =
            DistriError::connection("request failed before any attempt was made");

        for attempt in 0..=self.config.retry_attempts {
            let Some(mut attempt_request) = request.try_clone() else {
                // Non-cloneable body: single shot.
                return self
                    .send_once(request, with_timeout)
                    .await;
            };
            if with_timeout {
                attempt_request = attempt_request.timeout(self.config.timeout);
            }
            match attempt_request.send().await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    last_error = error.into();
                    if attempt < self.config.retry_attempts {
                        debug!(
                            attempt = attempt + 1,
                            delay_ms = self.config.retry_delay.as_millis() as u64,
                            "request failed, retrying"
                        );
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        Err(last_error)
    }

    async fn send_once(
        &self,
        mut request: reqwest::RequestBuilder,
        with_timeout: bool,
    ) -> DistriResult<reqwest::Response> {
        if with_timeout {
            request = request.timeout(self.config.timeout);
        }
        Ok(request.send().await?)
    }

    fn expect_success(response: &reqwest::Response, what: &str) -> DistriResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(DistriError::Api {
            status: status.as_u16(),
            message: format!(
                "failed to fetch {what}: {}",
                status.canonical_reason().unwrap_or("unknown status")
            ),
        })
    }

    fn expect_event_stream(response: &reqwest::Response) -> DistriResult<()> {
        let content_type = response
            .headers()
            .get("Content-Type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        if content_type.starts_with("text/event-stream") {
            return Ok(());
        }
        Err(DistriError::protocol(format!(
            "expected 'text/event-stream' response, got '{content_type}'"
        )))
    }
}

fn decode_sse_payload(data: &str) -> DistriResult<SendStreamingMessageResult> {
    // Streamed sends arrive as JSON-RPC envelopes; tolerate bare results too.
    match serde_json::from_str::<JsonRpcResponse<SendStreamingMessageResult>>(data) {
        Ok(JsonRpcResponse::Success { result, .. }) => Ok(result),
        Ok(JsonRpcResponse::Error { error, .. }) => Err(DistriError::Protocol {
            message: error.message,
            details: error.data,
        }),
        Err(_) => serde_json::from_str::<SendStreamingMessageResult>(data)
            .map_err(|error| DistriError::Serialization {
                reason: format!("unparseable stream event: {error}"),
            }),
    }
}

fn wrap_decode(error: reqwest::Error) -> DistriError {
    DistriError::Serialization {
        reason: error.to_string(),
    }
}
