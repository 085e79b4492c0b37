//! Direct CDP transport over the browser's debugging WebSocket.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use formpilot_protocols::{DebuggerTransport, TabId, TabInfo, TransportError};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

struct PendingRequest {
    method: String,
    reply: oneshot::Sender<Result<Value, TransportError>>,
}

type PendingMap = Arc<Mutex<HashMap<u64, PendingRequest>>>;

/// Transport that speaks CDP directly to a browser's debugging endpoint.
///
/// One WebSocket carries every command; per-tab traffic is multiplexed
/// with flat session ids from `Target.attachToTarget`. Tab discovery and
/// activation go over the HTTP endpoints next to the socket.
pub struct CdpSocketTransport {
    sink: Arc<tokio::sync::Mutex<WsSink>>,
    pending: PendingMap,
    next_id: AtomicU64,
    sessions: Mutex<HashMap<TabId, String>>,
    http_base: String,
    http: reqwest::Client,
    recv_task: JoinHandle<()>,
}

impl CdpSocketTransport {
    /// Connect to a debugging endpoint, e.g. `http://127.0.0.1:9222`.
    pub async fn connect(http_base: &str) -> Result<Self, TransportError> {
        let http_base = http_base.trim_end_matches('/').to_string();
        let http = reqwest::Client::new();

        let version: Value = http
            .get(format!("{http_base}/json/version"))
            .send()
            .await
            .map_err(|err| TransportError::Connection(err.to_string()))?
            .json()
            .await
            .map_err(|err| TransportError::Connection(err.to_string()))?;
        let ws_url = version
            .get("webSocketDebuggerUrl")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                TransportError::Connection(
                    "version endpoint did not expose webSocketDebuggerUrl".to_string(),
                )
            })?;
        debug!(%ws_url, "connecting to browser debugger socket");

        let (socket, _) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|err| TransportError::Connection(err.to_string()))?;
        let (sink, stream) = socket.split();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let recv_task = tokio::spawn(receive_loop(stream, pending.clone()));

        Ok(Self {
            sink: Arc::new(tokio::sync::Mutex::new(sink)),
            pending,
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
            http_base,
            http,
            recv_task,
        })
    }

    async fn call(
        &self,
        session_id: Option<&str>,
        method: &str,
        params: Value,
    ) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (reply, response) = oneshot::channel();
        self.pending.lock().insert(
            id,
            PendingRequest {
                method: method.to_string(),
                reply,
            },
        );

        let frame = command_frame(id, session_id, method, params).to_string();
        trace!(%method, id, "sending cdp command");
        {
            let mut sink = self.sink.lock().await;
            if let Err(err) = sink.send(Message::Text(frame.into())).await {
                self.pending.lock().remove(&id);
                return Err(TransportError::Connection(err.to_string()));
            }
        }

        match tokio::time::timeout(COMMAND_TIMEOUT, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TransportError::ChannelClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(TransportError::Timeout(method.to_string()))
            }
        }
    }

    async fn fetch_targets(&self) -> Result<Vec<Value>, TransportError> {
        let targets: Vec<Value> = self
            .http
            .get(format!("{}/json/list", self.http_base))
            .send()
            .await
            .map_err(|err| TransportError::Connection(err.to_string()))?
            .json()
            .await
            .map_err(|err| TransportError::Connection(err.to_string()))?;
        Ok(targets)
    }
}

/// The outgoing command envelope. Session-scoped commands carry the flat
/// `sessionId`; empty params are omitted entirely.
fn command_frame(id: u64, session_id: Option<&str>, method: &str, params: Value) -> Value {
    let mut frame = json!({ "id": id, "method": method });
    if !params.is_null() {
        frame["params"] = params;
    }
    if let Some(session_id) = session_id {
        frame["sessionId"] = json!(session_id);
    }
    frame
}

fn page_targets(targets: &[Value]) -> impl Iterator<Item = &Value> {
    targets
        .iter()
        .filter(|target| target.get("type").and_then(Value::as_str) == Some("page"))
}

async fn receive_loop(mut stream: WsStream, pending: PendingMap) {
    while let Some(message) = stream.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                warn!("debugger socket read failed: {err}");
                break;
            }
        };
        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                trace!("ignoring unparseable frame: {err}");
                continue;
            }
        };
        let Some(id) = value.get("id").and_then(Value::as_u64) else {
            trace!(method = ?value.get("method"), "cdp event");
            continue;
        };
        let Some(request) = pending.lock().remove(&id) else {
            continue;
        };
        let result = match value.get("error") {
            Some(error) => {
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown CDP error")
                    .to_string();
                Err(TransportError::Command {
                    method: request.method,
                    message,
                })
            }
            None => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
        };
        let _ = request.reply.send(result);
    }

    // Socket gone: fail every request still waiting on it.
    let drained: Vec<PendingRequest> = {
        let mut pending = pending.lock();
        pending.drain().map(|(_, request)| request).collect()
    };
    for request in drained {
        let _ = request.reply.send(Err(TransportError::ChannelClosed));
    }
    debug!("debugger socket closed");
}

/// Bundled page scripts, baked in at build time. The relay backend loads
/// the same scripts from its extension bundle instead.
fn builtin_resource(path: &str) -> Option<&'static str> {
    match path {
        "pages/extractor.js" => Some(include_str!("../../assets/extractor.js")),
        "pages/overlay-start.js" => Some(include_str!("../../assets/overlay-start.js")),
        "pages/overlay-stop.js" => Some(include_str!("../../assets/overlay-stop.js")),
        _ => None,
    }
}

#[async_trait]
impl DebuggerTransport for CdpSocketTransport {
    async fn active_tab(&self) -> Result<TabId, TransportError> {
        let targets = self.fetch_targets().await?;
        page_targets(&targets)
            .next()
            .and_then(|target| target.get("id").and_then(Value::as_str))
            .map(TabId::new)
            .ok_or_else(|| TransportError::TabNotFound("no page target available".to_string()))
    }

    async fn list_tabs(&self) -> Result<Vec<TabInfo>, TransportError> {
        let targets = self.fetch_targets().await?;
        Ok(page_targets(&targets)
            .enumerate()
            .filter_map(|(index, target)| {
                let id = target.get("id").and_then(Value::as_str)?;
                let info = TabInfo::new(
                    id,
                    target.get("title").and_then(Value::as_str).unwrap_or(""),
                    target.get("url").and_then(Value::as_str).unwrap_or(""),
                );
                // The listing is front-to-back; the first page is focused.
                Some(if index == 0 { info.active() } else { info })
            })
            .collect())
    }

    async fn tab_url(&self, tab: &TabId) -> Result<String, TransportError> {
        let targets = self.fetch_targets().await?;
        targets
            .iter()
            .find(|target| target.get("id").and_then(Value::as_str) == Some(tab.as_str()))
            .and_then(|target| target.get("url").and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| TransportError::TabNotFound(tab.to_string()))
    }

    async fn activate_tab(&self, tab: &TabId) -> Result<(), TransportError> {
        let response = self
            .http
            .get(format!("{}/json/activate/{}", self.http_base, tab.as_str()))
            .send()
            .await
            .map_err(|err| TransportError::Connection(err.to_string()))?;
        if !response.status().is_success() {
            return Err(TransportError::TabNotFound(tab.to_string()));
        }
        Ok(())
    }

    async fn attach(&self, tab: &TabId) -> Result<(), TransportError> {
        let result = self
            .call(
                None,
                "Target.attachToTarget",
                json!({ "targetId": tab.as_str(), "flatten": true }),
            )
            .await?;
        let session_id = result
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                TransportError::Connection("attach response carried no sessionId".to_string())
            })?;
        self.sessions
            .lock()
            .insert(tab.clone(), session_id.to_string());
        Ok(())
    }

    async fn detach(&self, tab: &TabId) -> Result<(), TransportError> {
        let Some(session_id) = self.sessions.lock().remove(tab) else {
            return Ok(());
        };
        self.call(
            None,
            "Target.detachFromTarget",
            json!({ "sessionId": session_id }),
        )
        .await?;
        Ok(())
    }

    async fn send_command(
        &self,
        tab: &TabId,
        method: &str,
        params: Value,
    ) -> Result<Value, TransportError> {
        let session_id = self
            .sessions
            .lock()
            .get(tab)
            .cloned()
            .ok_or_else(|| TransportError::TabNotFound(tab.to_string()))?;
        self.call(Some(&session_id), method, params).await
    }

    async fn fetch_resource(&self, path: &str) -> Result<String, TransportError> {
        builtin_resource(path)
            .map(str::to_string)
            .ok_or_else(|| TransportError::ResourceNotFound(path.to_string()))
    }
}

impl Drop for CdpSocketTransport {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}
