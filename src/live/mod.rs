//! Live event feed.
//!
//! The server pushes an `event` message for every change it commits. The
//! feed appends each one to the events surface as a compact JSON line. The
//! channel behind it owns the connection: handshakes, heartbeats and
//! reconnection all happen there.

pub mod packet;
mod socket;

pub use socket::{socket_url, SocketIoChannel, EVENT_NAME};

use async_trait::async_trait;
use log::error;
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;
use crate::view::{append_event, Surface};

pub const CONNECTED_NOTICE: &str = "Connected to live events\n";

pub type ConnectCallback = Arc<dyn Fn() + Send + Sync>;
pub type EventCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Minimal push-channel interface so the transport can be swapped
#[async_trait]
pub trait PushChannel: Send {
    fn on_connect(&mut self, callback: ConnectCallback);
    fn on_event(&mut self, callback: EventCallback);
    async fn connect(&mut self) -> Result<()>;
    async fn disconnect(&mut self);
}

/// Registered callbacks, snapshotted when the channel connects
#[derive(Clone, Default)]
pub struct Callbacks {
    pub connect: Vec<ConnectCallback>,
    pub event: Vec<EventCallback>,
}

impl Callbacks {
    pub fn fire_connect(&self) {
        for callback in &self.connect {
            callback();
        }
    }

    pub fn fire_event(&self, payload: &Value) {
        for callback in &self.event {
            callback(payload);
        }
    }
}

pub struct LiveFeed;

impl LiveFeed {
    /// Wire a channel's callbacks to the event log surface
    pub fn attach(channel: &mut dyn PushChannel, surface: Arc<dyn Surface>) {
        let log = Arc::clone(&surface);
        channel.on_connect(Arc::new(move || log.append_text(CONNECTED_NOTICE)));

        let log = surface;
        channel.on_event(Arc::new(move |payload: &Value| append_event(log.as_ref(), payload)));
    }

    /// Attach and connect in one step
    pub async fn start(channel: &mut dyn PushChannel, surface: Arc<dyn Surface>) -> Result<()> {
        Self::attach(channel, surface);
        channel.connect().await.map_err(|e| {
            error!("Failed to start live events: {}", e);
            e
        })
    }
}
