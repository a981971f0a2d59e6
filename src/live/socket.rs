use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use reqwest::Url;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::packet::{EnginePacket, SocketPacket, DEFAULT_NAMESPACE};
use super::{Callbacks, ConnectCallback, EventCallback, PushChannel};
use crate::config::AdminSettings;
use crate::error::{AdminError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;

/// Name of the application event the server broadcasts
pub const EVENT_NAME: &str = "event";

/// Consecutive failed connection attempts before giving up.
const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Base delay between reconnection attempts (exponential backoff).
const RECONNECT_BASE_DELAY_MS: u64 = 1_000;

/// Maximum delay between reconnection attempts.
const MAX_RECONNECT_DELAY_MS: u64 = 30_000;

/// How a single websocket session ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// Local shutdown was requested
    Shutdown,
    /// Server sent a namespace DISCONNECT; it does not want us back
    Disconnected,
}

/// Build the websocket URL of the Socket.IO endpoint from the HTTP base URL
pub fn socket_url(host: &str, path: &str) -> Result<String> {
    let mut url = Url::parse(host)
        .map_err(|e| AdminError::Protocol(format!("invalid host '{}': {}", host, e)))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(AdminError::Protocol(format!(
                "unsupported scheme '{}' for live events",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| AdminError::Protocol(format!("cannot switch '{}' to {}", host, scheme)))?;

    let path = if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    };
    url.set_path(&path);
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url.to_string())
}

/// Socket.IO client over the websocket transport only
pub struct SocketIoChannel {
    url: String,
    callbacks: Callbacks,
    shutdown_tx: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SocketIoChannel {
    pub fn new(settings: &AdminSettings) -> Result<Self> {
        Ok(Self::with_url(socket_url(&settings.host, &settings.socket_path)?))
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            callbacks: Callbacks::default(),
            shutdown_tx: None,
            task: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wait until the connection task stops (server disconnect or retries exhausted)
    pub async fn closed(&mut self) {
        if let Some(task) = self.task.as_mut() {
            if let Err(e) = task.await {
                error!("Live event task failed: {}", e);
            }
            self.task = None;
        }
    }

    async fn connection_loop(url: String, callbacks: Callbacks, mut shutdown_rx: mpsc::Receiver<()>) {
        let mut failures = 0u32;

        loop {
            match Self::run_connection(&url, &callbacks, &mut shutdown_rx, &mut failures).await {
                Ok(SessionEnd::Shutdown) => {
                    info!("Live events stopped");
                    break;
                }
                Ok(SessionEnd::Disconnected) => {
                    info!("Server closed the live event namespace");
                    break;
                }
                Err(e) => {
                    failures += 1;
                    warn!("Live event connection lost: {}", e);

                    if failures >= MAX_RECONNECT_ATTEMPTS {
                        error!(
                            "Live event reconnection failed after {} attempts",
                            MAX_RECONNECT_ATTEMPTS
                        );
                        break;
                    }

                    let delay = Self::calculate_backoff_delay(failures);
                    debug!("Reconnecting in {:?}", delay);

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = shutdown_rx.recv() => break,
                    }
                }
            }
        }
    }

    fn calculate_backoff_delay(failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(6);
        let delay = RECONNECT_BASE_DELAY_MS.saturating_mul(1 << exponent);
        Duration::from_millis(delay.min(MAX_RECONNECT_DELAY_MS))
    }

    async fn run_connection(
        url: &str,
        callbacks: &Callbacks,
        shutdown_rx: &mut mpsc::Receiver<()>,
        failures: &mut u32,
    ) -> Result<SessionEnd> {
        info!("Connecting to live events at {}", url);
        let (ws_stream, _) = connect_async(url).await?;
        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(SessionEnd::Shutdown);
                }
                msg = read.next() => {
                    if let Some(end) = Self::handle_message(msg, &mut write, callbacks, failures).await? {
                        return Ok(end);
                    }
                }
            }
        }
    }

    async fn handle_message(
        msg: Option<std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>,
        write: &mut WsWrite,
        callbacks: &Callbacks,
        failures: &mut u32,
    ) -> Result<Option<SessionEnd>> {
        match msg {
            None => Err(AdminError::Protocol("connection closed".to_string())),
            Some(Err(e)) => Err(e.into()),
            Some(Ok(Message::Text(text))) => {
                Self::handle_frame(text.as_str(), write, callbacks, failures).await
            }
            Some(Ok(Message::Ping(data))) => {
                write.send(Message::Pong(data)).await?;
                Ok(None)
            }
            Some(Ok(Message::Close(_))) => {
                Err(AdminError::Protocol("connection closed by server".to_string()))
            }
            Some(Ok(_)) => Ok(None),
        }
    }

    async fn handle_frame(
        frame: &str,
        write: &mut WsWrite,
        callbacks: &Callbacks,
        failures: &mut u32,
    ) -> Result<Option<SessionEnd>> {
        debug!("engine.io <- {}", frame);

        match EnginePacket::parse(frame)? {
            EnginePacket::Open(info) => {
                debug!(
                    "Handshake sid={} ping_interval={}ms",
                    info.sid, info.ping_interval
                );
                let connect = EnginePacket::Message(SocketPacket::connect(DEFAULT_NAMESPACE).encode());
                write.send(Message::Text(connect.encode().into())).await?;
            }
            EnginePacket::Ping(data) => {
                write
                    .send(Message::Text(EnginePacket::Pong(data).encode().into()))
                    .await?;
            }
            EnginePacket::Close => {
                return Err(AdminError::Protocol("engine.io close".to_string()));
            }
            EnginePacket::Message(payload) => {
                return Self::handle_packet(&payload, callbacks, failures);
            }
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {}
        }
        Ok(None)
    }

    fn handle_packet(
        payload: &str,
        callbacks: &Callbacks,
        failures: &mut u32,
    ) -> Result<Option<SessionEnd>> {
        let packet = match SocketPacket::parse(payload) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("Skipping socket.io packet: {}", e);
                return Ok(None);
            }
        };

        if packet.namespace() != DEFAULT_NAMESPACE {
            debug!("Ignoring packet for namespace {}", packet.namespace());
            return Ok(None);
        }

        match packet {
            SocketPacket::Connect { .. } => {
                *failures = 0;
                info!("Connected to live events");
                callbacks.fire_connect();
            }
            SocketPacket::Event { name, args, .. } if name == EVENT_NAME => {
                let payload = args.into_iter().next().unwrap_or_default();
                callbacks.fire_event(&payload);
            }
            SocketPacket::Event { name, .. } => {
                debug!("Ignoring '{}' event", name);
            }
            SocketPacket::Ack { id, .. } => {
                debug!("Ignoring ack {}", id);
            }
            SocketPacket::Disconnect { .. } => {
                return Ok(Some(SessionEnd::Disconnected));
            }
            SocketPacket::ConnectError { data, .. } => {
                let reason = data.map(|d| d.to_string()).unwrap_or_default();
                return Err(AdminError::Protocol(format!(
                    "connection refused by server {}",
                    reason
                )));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl PushChannel for SocketIoChannel {
    fn on_connect(&mut self, callback: ConnectCallback) {
        self.callbacks.connect.push(callback);
    }

    fn on_event(&mut self, callback: EventCallback) {
        self.callbacks.event.push(callback);
    }

    async fn connect(&mut self) -> Result<()> {
        if self.task.is_some() {
            return Ok(());
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);

        let url = self.url.clone();
        let callbacks = self.callbacks.clone();
        self.task = Some(tokio::spawn(Self::connection_loop(url, callbacks, shutdown_rx)));
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        self.closed().await;
    }
}
