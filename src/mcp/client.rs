//! MCP session backed by an rmcp client service.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, CallToolResult, ClientInfo, JsonObject, ProtocolVersion};
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceError, ServiceExt};
use rmcp::transport::{StreamableHttpClientTransport, TokioChildProcess};
use tokio::process::Command;
use tokio::sync::Mutex;

use super::schema::ToolSchema;
use super::transport::{ToolCallOutput, ToolEndpoint, ToolTransport};
use crate::error::AideError;

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type McpRunningService = RunningService<RoleClient, DynClientService>;

/// A live session with one tool server.
///
/// Close it explicitly with [`ToolTransport::close`]; [`with_session`] does so
/// on every exit path.
pub struct McpSession {
    endpoint: String,
    service: Mutex<Option<McpRunningService>>,
    connected: AtomicBool,
}

impl McpSession {
    /// Spawn or dial the endpoint and complete the initialize handshake.
    pub async fn connect(endpoint: &ToolEndpoint) -> Result<Self, AideError> {
        let client_info = ClientInfo {
            protocol_version: ProtocolVersion::LATEST,
            ..Default::default()
        };

        let service = match endpoint {
            ToolEndpoint::Stdio { command, args } => {
                let mut cmd = Command::new(command);
                cmd.args(args);
                let transport = TokioChildProcess::new(cmd).map_err(|e| {
                    AideError::Connection(format!("failed to spawn '{endpoint}': {e}"))
                })?;
                client_info.into_dyn().serve(transport).await
            }
            ToolEndpoint::StreamableHttp { url } => {
                let transport = StreamableHttpClientTransport::from_uri(url.as_str());
                client_info.into_dyn().serve(transport).await
            }
        }
        .map_err(map_client_initialize_error)?;

        tracing::debug!(endpoint = %endpoint, "tool session connected");
        Ok(Self {
            endpoint: endpoint.to_string(),
            service: Mutex::new(Some(service)),
            connected: AtomicBool::new(true),
        })
    }

    /// A session that was never connected. Every operation but `close` fails.
    pub fn detached(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            service: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn not_connected(&self) -> AideError {
        AideError::NotConnected(format!("no live session with {}", self.endpoint))
    }
}

#[async_trait]
impl ToolTransport for McpSession {
    async fn list_tools(&self) -> Result<Vec<ToolSchema>, AideError> {
        let guard = self.service.lock().await;
        let service = guard.as_ref().ok_or_else(|| self.not_connected())?;

        let tools = match service.list_all_tools().await {
            Ok(tools) => tools,
            Err(ServiceError::UnexpectedResponse) => service
                .list_tools(None)
                .await
                .map(|page| page.tools)
                .map_err(|e| map_service_error("list_tools", e))?,
            Err(e) => return Err(map_service_error("list_tools", e)),
        };

        tracing::debug!(count = tools.len(), "listed remote tools");
        Ok(tools
            .into_iter()
            .map(|tool| {
                ToolSchema::from_wire(
                    tool.name.to_string(),
                    tool.description.map(|d| d.to_string()),
                    &serde_json::Value::Object((*tool.input_schema).clone()),
                )
            })
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> Result<ToolCallOutput, AideError> {
        let guard = self.service.lock().await;
        let service = guard.as_ref().ok_or_else(|| self.not_connected())?;

        let result = service
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await
            .map_err(|e| match e {
                ServiceError::McpError(error) => AideError::tool_execution(name, error.message),
                other => map_service_error("call_tool", other),
            })?;

        map_call_result(name, result)
    }

    async fn close(&self) -> Result<(), AideError> {
        self.connected.store(false, Ordering::SeqCst);
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };
        if let Err(e) = service.cancel().await {
            tracing::warn!(endpoint = %self.endpoint, error = %e, "tool session did not shut down cleanly");
        }
        tracing::debug!(endpoint = %self.endpoint, "tool session closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Connect, run `body` against the session, then close it.
///
/// The session is closed whether `body` succeeds or fails. An error from
/// `body` takes priority over an error from closing.
pub async fn with_session<F, Fut, T>(endpoint: &ToolEndpoint, body: F) -> Result<T, AideError>
where
    F: FnOnce(Arc<McpSession>) -> Fut,
    Fut: Future<Output = Result<T, AideError>>,
{
    let session = Arc::new(McpSession::connect(endpoint).await?);
    scoped(session, body).await
}

pub(crate) async fn scoped<S, F, Fut, T>(session: Arc<S>, body: F) -> Result<T, AideError>
where
    S: ToolTransport + ?Sized,
    F: FnOnce(Arc<S>) -> Fut,
    Fut: Future<Output = Result<T, AideError>>,
{
    let outcome = body(Arc::clone(&session)).await;
    let closed = session.close().await;
    match (outcome, closed) {
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(e),
        (Ok(value), Ok(())) => Ok(value),
    }
}

fn map_call_result(name: &str, result: CallToolResult) -> Result<ToolCallOutput, AideError> {
    let content = result
        .content
        .iter()
        .map(|item| match item.as_text() {
            Some(text) => Ok(text.text.clone()),
            None => serde_json::to_string(item).map_err(AideError::from),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if result.is_error.unwrap_or(false) {
        let message = if content.is_empty() {
            "tool returned an error result".to_string()
        } else {
            content.join("\n")
        };
        return Err(AideError::tool_execution(name, message));
    }

    Ok(ToolCallOutput::new(content))
}

fn map_client_initialize_error(error: ClientInitializeError) -> AideError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            AideError::Connection(format!("initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => {
            AideError::Connection(format!("initialize transport error ({context}): {error}"))
        }
        ClientInitializeError::JsonRpcError(error) => AideError::Connection(format!(
            "initialize JSON-RPC error {}: {}",
            error.code.0, error.message
        )),
        other => AideError::Connection(format!("initialize failed: {other}")),
    }
}

fn map_service_error(context: &str, error: ServiceError) -> AideError {
    match error {
        ServiceError::TransportClosed => {
            AideError::NotConnected(format!("{context}: transport closed"))
        }
        ServiceError::Timeout { timeout } => AideError::Timeout(timeout.as_millis() as u64),
        ServiceError::Cancelled { reason } => {
            let suffix = reason.map(|r| format!(" ({r})")).unwrap_or_default();
            AideError::Cancelled(format!("{context}{suffix}"))
        }
        other => AideError::Connection(format!("{context}: {other}")),
    }
}
