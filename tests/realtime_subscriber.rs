//! Realtime subscriber tests against a local websocket server speaking the
//! channel protocol.

mod common;

use common::{make_snapshot, snapshot_row};
use futures_util::{SinkExt, StreamExt};
use oracle::config::StoreConfig;
use oracle::snapshot::SystemSnapshot;
use oracle::store::{FeedStatus, RealtimeConfig, RealtimeSubscriber};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

const TOPIC: &str = "realtime:public:system_snapshots";

async fn start_listener() -> (TcpListener, RealtimeConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let mut config = RealtimeConfig::from_store(&StoreConfig {
        url: format!("http://127.0.0.1:{}", port),
        api_key: "anon-key".to_string(),
        ..StoreConfig::default()
    })
    .unwrap();
    config.reconnect_delay = Duration::from_millis(50);
    (listener, config)
}

/// Accept one client and complete the channel join.
async fn accept_joined(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();

    let join = loop {
        match socket.next().await.unwrap().unwrap() {
            Message::Text(text) => break serde_json::from_str::<Value>(text.as_str()).unwrap(),
            _ => continue,
        }
    };
    assert_eq!(join["event"], "phx_join");
    assert_eq!(join["topic"], TOPIC);
    assert_eq!(join["payload"]["config"]["postgres_changes"][0]["event"], "INSERT");

    let reply = json!({
        "topic": TOPIC,
        "event": "phx_reply",
        "payload": {"status": "ok", "response": {}},
        "ref": join["ref"],
    });
    socket.send(Message::Text(reply.to_string().into())).await.unwrap();
    socket
}

fn insert_frame(snapshot: &SystemSnapshot) -> Message {
    let frame = json!({
        "topic": TOPIC,
        "event": "postgres_changes",
        "payload": {
            "data": {
                "schema": "public",
                "table": "system_snapshots",
                "type": "INSERT",
                "record": snapshot_row(snapshot),
            },
            "ids": [1],
        },
        "ref": null,
    });
    Message::Text(frame.to_string().into())
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<SystemSnapshot>) -> SystemSnapshot {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no snapshot delivered")
        .expect("callback dropped")
}

#[tokio::test]
async fn test_insert_is_delivered_to_callback() {
    let (listener, config) = start_listener().await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let subscription = RealtimeSubscriber::new(config).subscribe(Box::new(move |snapshot: SystemSnapshot| {
        let _ = tx.send(snapshot);
    }));

    let mut socket = accept_joined(&listener).await;
    socket.send(insert_frame(&make_snapshot("snap-rt", 5))).await.unwrap();

    let delivered = recv(&mut rx).await;
    assert_eq!(delivered.id, "snap-rt");
    assert_eq!(delivered.agents.len(), 1);

    subscription.shutdown().await;
}

#[tokio::test]
async fn test_updates_and_other_tables_are_ignored() {
    let (listener, config) = start_listener().await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let subscription = RealtimeSubscriber::new(config).subscribe(Box::new(move |snapshot: SystemSnapshot| {
        let _ = tx.send(snapshot);
    }));

    let mut socket = accept_joined(&listener).await;
    let update = json!({
        "topic": TOPIC,
        "event": "postgres_changes",
        "payload": {"data": {"type": "UPDATE", "record": snapshot_row(&make_snapshot("upd", 1))}},
    });
    let other = json!({
        "topic": "realtime:public:agent_logs",
        "event": "postgres_changes",
        "payload": {"data": {"type": "INSERT", "record": snapshot_row(&make_snapshot("other", 2))}},
    });
    socket.send(Message::Text(update.to_string().into())).await.unwrap();
    socket.send(Message::Text(other.to_string().into())).await.unwrap();
    socket.send(Message::Text("not json".to_string().into())).await.unwrap();
    socket.send(insert_frame(&make_snapshot("wanted", 3))).await.unwrap();

    assert_eq!(recv(&mut rx).await.id, "wanted");
    assert!(rx.try_recv().is_err());

    subscription.shutdown().await;
}

#[tokio::test]
async fn test_no_delivery_after_unsubscribe() {
    let (listener, config) = start_listener().await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let subscription = RealtimeSubscriber::new(config).subscribe(Box::new(move |snapshot: SystemSnapshot| {
        let _ = tx.send(snapshot);
    }));

    let mut socket = accept_joined(&listener).await;
    socket.send(insert_frame(&make_snapshot("before", 1))).await.unwrap();
    assert_eq!(recv(&mut rx).await.id, "before");

    subscription.unsubscribe();
    subscription.unsubscribe();
    assert!(!subscription.is_active());

    // The client may already be gone; either way nothing reaches the callback.
    let _ = socket.send(insert_frame(&make_snapshot("after", 2))).await;
    subscription.shutdown().await;

    // The callback (and its sender) has been released.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_reconnects_after_server_close() {
    let (listener, config) = start_listener().await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let subscription = RealtimeSubscriber::new(config).subscribe(Box::new(move |snapshot: SystemSnapshot| {
        let _ = tx.send(snapshot);
    }));

    let mut first = accept_joined(&listener).await;
    first.close(None).await.unwrap();
    drop(first);

    let mut second = accept_joined(&listener).await;
    second.send(insert_frame(&make_snapshot("after-reconnect", 9))).await.unwrap();
    assert_eq!(recv(&mut rx).await.id, "after-reconnect");
    assert_eq!(*subscription.status().borrow(), FeedStatus::Joined);

    subscription.shutdown().await;
}

#[tokio::test]
async fn test_join_rejection_triggers_reconnect() {
    let (listener, config) = start_listener().await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let subscription = RealtimeSubscriber::new(config).subscribe(Box::new(move |snapshot: SystemSnapshot| {
        let _ = tx.send(snapshot);
    }));

    {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _join = socket.next().await.unwrap().unwrap();
        let reply = json!({
            "topic": TOPIC,
            "event": "phx_reply",
            "payload": {"status": "error", "response": {"reason": "unauthorized"}},
            "ref": "1",
        });
        socket.send(Message::Text(reply.to_string().into())).await.unwrap();
    }

    let mut socket = accept_joined(&listener).await;
    socket.send(insert_frame(&make_snapshot("second-try", 4))).await.unwrap();
    assert_eq!(recv(&mut rx).await.id, "second-try");

    subscription.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_endpoint_reports_down() {
    let (listener, config) = start_listener().await;
    drop(listener);

    let subscription =
        RealtimeSubscriber::new(config).subscribe(Box::new(|_: SystemSnapshot| {}));
    let mut status = subscription.status();

    tokio::time::timeout(Duration::from_secs(5), status.wait_for(|s| *s == FeedStatus::Down))
        .await
        .expect("feed never reported down")
        .unwrap();
    // Still retrying in the background.
    assert!(subscription.is_active());

    subscription.shutdown().await;
}
