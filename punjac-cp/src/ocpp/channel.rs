//! Protocol channel to the central system
//!
//! A channel delivers one typed request and resolves with its matched
//! response. Request/response correlation runs on OCPP-J message ids, so
//! concurrent outstanding requests from different tasks never cross-deliver.
//!
//! `WsChannel` is the production implementation: WebSocket with the ocpp1.6
//! subprotocol. Reconnection is out of scope; when the socket drops, every
//! waiter resolves to `ConnectionClosed` and the owner decides what to do.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio_tungstenite::{
    connect_async_with_config,
    tungstenite::{
        handshake::client::Request,
        http::{header, Uri},
        protocol::WebSocketConfig,
        Message,
    },
};
use tracing::{debug, error, info, warn};

use super::messages::*;

/// OCPP 1.6 WebSocket subprotocol
const OCPP16_SUBPROTOCOL: &str = "ocpp1.6";

/// The single call-and-wait primitive every orchestration task uses.
///
/// Each task keeps at most one call outstanding at a time.
pub trait ProtocolChannel: Send + Sync + 'static {
    /// Send a request and wait for its matched response
    fn call(&self, call: Call) -> impl Future<Output = Result<CallResult, OcppError>> + Send;
}

impl<C: ProtocolChannel> ProtocolChannel for Arc<C> {
    fn call(&self, call: Call) -> impl Future<Output = Result<CallResult, OcppError>> + Send {
        C::call(self, call)
    }
}

type PendingMap = Arc<RwLock<HashMap<String, oneshot::Sender<Result<CallResult, OcppError>>>>>;

/// WebSocket channel to the central system
pub struct WsChannel {
    outgoing_tx: mpsc::Sender<OcppMessage>,
    pending: PendingMap,
    request_timeout: Duration,
}

impl WsChannel {
    /// Connect to the central system and start the socket tasks
    pub async fn connect(
        csms_url: &str,
        station_id: &str,
        request_timeout: Duration,
    ) -> Result<Self, OcppError> {
        let url = build_ws_url(csms_url, station_id);
        let uri: Uri = url.parse().map_err(|_| OcppError::InvalidFormat)?;

        let request = Request::builder()
            .uri(&url)
            .header(header::SEC_WEBSOCKET_PROTOCOL, OCPP16_SUBPROTOCOL)
            .header(header::HOST, uri.host().unwrap_or("localhost"))
            .body(())
            .map_err(|_| OcppError::InvalidFormat)?;

        let ws_config = WebSocketConfig {
            max_message_size: Some(64 * 1024),
            max_frame_size: Some(16 * 1024),
            ..Default::default()
        };

        let (ws_stream, response) = connect_async_with_config(request, Some(ws_config), false)
            .await
            .map_err(|e| {
                error!("WebSocket connection failed: {}", e);
                OcppError::ConnectionClosed
            })?;

        let accepted_protocol = response
            .headers()
            .get(header::SEC_WEBSOCKET_PROTOCOL)
            .and_then(|v| v.to_str().ok());

        if accepted_protocol != Some(OCPP16_SUBPROTOCOL) {
            warn!(
                "Central system did not accept the ocpp1.6 subprotocol, got: {:?}",
                accepted_protocol
            );
        }

        info!("WebSocket connected to {}", url);

        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<OcppMessage>(64);
        let pending: PendingMap = Arc::new(RwLock::new(HashMap::new()));

        // Writer task: drain the outgoing queue onto the socket
        tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                let bytes = match msg.to_bytes() {
                    Ok(b) => b,
                    Err(e) => {
                        error!("Failed to serialize message: {}", e);
                        continue;
                    }
                };

                debug!("Sending: {}", String::from_utf8_lossy(&bytes));

                if let Err(e) = ws_tx
                    .send(Message::Text(
                        String::from_utf8_lossy(&bytes).into_owned().into(),
                    ))
                    .await
                {
                    error!("Failed to send WebSocket message: {}", e);
                    break;
                }
            }
        });

        // Reader task: correlate responses to waiters, refuse incoming calls
        let reader_pending = pending.clone();
        let reply_tx = outgoing_tx.clone();
        tokio::spawn(async move {
            while let Some(msg) = ws_rx.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        debug!("Received: {}", text);
                        dispatch(text.as_bytes(), &reader_pending, &reply_tx).await;
                    }
                    Ok(Message::Close(_)) => {
                        info!("WebSocket closed by central system");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            // Socket is gone; fail anyone still waiting
            let mut waiters = reader_pending.write().await;
            for (_, tx) in waiters.drain() {
                let _ = tx.send(Err(OcppError::ConnectionClosed));
            }
        });

        Ok(Self {
            outgoing_tx,
            pending,
            request_timeout,
        })
    }
}

/// Route one received frame
async fn dispatch(bytes: &[u8], pending: &PendingMap, reply_tx: &mpsc::Sender<OcppMessage>) {
    match OcppMessage::parse(bytes) {
        Ok(OcppMessage::CallResult(result)) => {
            match pending.write().await.remove(&result.message_id) {
                Some(tx) => {
                    let _ = tx.send(Ok(result));
                }
                None => warn!("Response for unknown request {}", result.message_id),
            }
        }
        Ok(OcppMessage::CallError(err)) => {
            match pending.write().await.remove(&err.message_id) {
                Some(tx) => {
                    let _ = tx.send(Err(OcppError::RemoteError {
                        code: err.error_code,
                        description: err.error_description,
                        details: err.error_details,
                    }));
                }
                None => warn!("Error for unknown request {}", err.message_id),
            }
        }
        Ok(OcppMessage::Call(call)) => {
            // This charge point only initiates requests
            warn!("Refusing {} request from central system", call.action);
            let refusal = CallError::new(
                call.message_id,
                ErrorCode::NotImplemented,
                "Charge point does not handle remote commands",
            );
            let _ = reply_tx.send(OcppMessage::CallError(refusal)).await;
        }
        Err(e) => warn!("Failed to parse OCPP message: {}", e),
    }
}

impl ProtocolChannel for WsChannel {
    async fn call(&self, call: Call) -> Result<CallResult, OcppError> {
        let message_id = call.message_id.clone();
        let (response_tx, response_rx) = oneshot::channel();

        {
            let mut pending = self.pending.write().await;
            pending.insert(message_id.clone(), response_tx);
        }

        if self.outgoing_tx.send(OcppMessage::Call(call)).await.is_err() {
            self.pending.write().await.remove(&message_id);
            return Err(OcppError::ConnectionClosed);
        }

        match tokio::time::timeout(self.request_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(OcppError::ConnectionClosed),
            Err(_) => {
                self.pending.write().await.remove(&message_id);
                Err(OcppError::Timeout)
            }
        }
    }
}

/// Build the full charge point WebSocket URL
pub fn build_ws_url(base_url: &str, station_id: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), station_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_ws_url() {
        let url = build_ws_url("ws://localhost:8180/steve/websocket/CentralSystemService", "EK3-001");
        assert_eq!(
            url,
            "ws://localhost:8180/steve/websocket/CentralSystemService/EK3-001"
        );

        let url = build_ws_url("ws://localhost:9000/", "CP_3");
        assert_eq!(url, "ws://localhost:9000/CP_3");
    }

    #[tokio::test]
    async fn test_dispatch_resolves_waiter() {
        let pending: PendingMap = Arc::new(RwLock::new(HashMap::new()));
        let (reply_tx, _reply_rx) = mpsc::channel(4);
        let (tx, rx) = oneshot::channel();
        pending.write().await.insert("msg-1".to_string(), tx);

        dispatch(br#"[3, "msg-1", {"currentTime": "2026-02-01T10:00:00Z"}]"#, &pending, &reply_tx).await;

        let result = rx.await.unwrap().unwrap();
        assert_eq!(result.message_id, "msg-1");
        assert!(pending.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_maps_call_error_to_remote_error() {
        let pending: PendingMap = Arc::new(RwLock::new(HashMap::new()));
        let (reply_tx, _reply_rx) = mpsc::channel(4);
        let (tx, rx) = oneshot::channel();
        pending.write().await.insert("msg-2".to_string(), tx);

        dispatch(
            br#"[4, "msg-2", "InternalError", "boom", {}]"#,
            &pending,
            &reply_tx,
        )
        .await;

        match rx.await.unwrap() {
            Err(OcppError::RemoteError { code, .. }) => {
                assert_eq!(code, ErrorCode::InternalError);
            }
            other => panic!("Expected RemoteError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_refuses_incoming_calls() {
        let pending: PendingMap = Arc::new(RwLock::new(HashMap::new()));
        let (reply_tx, mut reply_rx) = mpsc::channel(4);

        dispatch(br#"[2, "msg-3", "Heartbeat", {}]"#, &pending, &reply_tx).await;

        match reply_rx.recv().await {
            Some(OcppMessage::CallError(err)) => {
                assert_eq!(err.message_id, "msg-3");
                assert_eq!(err.error_code, ErrorCode::NotImplemented);
            }
            other => panic!("Expected CallError reply, got {:?}", other),
        }
    }
}
