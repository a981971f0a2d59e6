#![cfg(feature = "live")]

use futures::{SinkExt, StreamExt};
use srms_admin::live::{LiveFeed, PushChannel, SocketIoChannel};
use srms_admin::view::{MemorySurface, Surface};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

const OPEN: &str = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

async fn wait_for_lines(surface: &MemorySurface, lines: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while surface.text().lines().count() < lines {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("live events did not arrive in time");
}

/// Minimal Socket.IO server: handshake, one heartbeat, then a few events.
/// Reports every text frame the client sent.
async fn serve_once(listener: TcpListener, frames_tx: oneshot::Sender<Vec<String>>) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
    let mut received = Vec::new();

    ws.send(Message::Text(OPEN.into())).await.unwrap();

    // Namespace connect request
    if let Some(Ok(Message::Text(text))) = ws.next().await {
        received.push(text.as_str().to_string());
    }
    ws.send(Message::Text(r#"40{"sid":"wZX3oN0bSVIhsaknAAAI"}"#.into()))
        .await
        .unwrap();

    ws.send(Message::Text("2".into())).await.unwrap();
    if let Some(Ok(Message::Text(text))) = ws.next().await {
        received.push(text.as_str().to_string());
    }

    ws.send(Message::Text(r#"42["event",{"table_id":2,"status":"seated"}]"#.into()))
        .await
        .unwrap();
    ws.send(Message::Text(r#"42["chat","ignored"]"#.into()))
        .await
        .unwrap();
    ws.send(Message::Text(r#"42["event",{"type":"menu.deleted","id":4}]"#.into()))
        .await
        .unwrap();

    let _ = frames_tx.send(received);

    // Hold the socket open until the client closes it
    while let Some(Ok(msg)) = ws.next().await {
        if msg.is_close() {
            break;
        }
    }
}

#[tokio::test]
async fn events_are_appended_after_connect_notice() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (frames_tx, frames_rx) = oneshot::channel();
    tokio::spawn(serve_once(listener, frames_tx));

    let url = format!("ws://{}/socket.io/?EIO=4&transport=websocket", addr);
    let mut channel = SocketIoChannel::with_url(url);
    let surface = MemorySurface::new();
    LiveFeed::start(&mut channel, Arc::new(surface.clone()) as Arc<dyn Surface>)
        .await
        .unwrap();

    wait_for_lines(&surface, 3).await;
    assert_eq!(
        surface.text(),
        "Connected to live events\n\
         {\"table_id\":2,\"status\":\"seated\"}\n\
         {\"type\":\"menu.deleted\",\"id\":4}\n"
    );

    let frames = frames_rx.await.unwrap();
    assert_eq!(frames, vec!["40".to_string(), "3".to_string()]);

    channel.disconnect().await;
}

#[tokio::test]
async fn server_disconnect_ends_the_feed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text(OPEN.into())).await.unwrap();
        let _ = ws.next().await;
        ws.send(Message::Text(r#"40{"sid":"abc"}"#.into())).await.unwrap();
        ws.send(Message::Text("41".into())).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    });

    let url = format!("ws://{}/socket.io/?EIO=4&transport=websocket", addr);
    let mut channel = SocketIoChannel::with_url(url);
    let surface = MemorySurface::new();
    LiveFeed::start(&mut channel, Arc::new(surface.clone()) as Arc<dyn Surface>)
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), channel.closed())
        .await
        .expect("feed should stop after a server disconnect");
    assert_eq!(surface.text(), "Connected to live events\n");
}
