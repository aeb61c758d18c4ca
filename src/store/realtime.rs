//! Realtime snapshot feed over the Phoenix channel protocol.
//!
//! The store pushes row inserts as `postgres_changes` events on a channel
//! joined with an INSERT filter for the snapshot table. The subscriber keeps
//! the socket alive with heartbeats and re-opens it after a fixed delay when
//! it drops, until the subscription is cancelled.

use super::{FeedStatus, SnapshotCallback, SnapshotSink, StoreError, Subscription};
use crate::config::StoreConfig;
use crate::snapshot::SystemSnapshot;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const PHOENIX_VSN: &str = "1.0.0";
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// Connection parameters for the realtime feed.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Full websocket URL including `apikey` and `vsn` query parameters
    pub socket_url: String,
    pub api_key: String,
    pub schema: String,
    pub table: String,
    pub reconnect_delay: Duration,
    pub heartbeat_interval: Duration,
}

impl RealtimeConfig {
    /// Derive the websocket endpoint from the store's HTTP URL.
    pub fn from_store(config: &StoreConfig) -> Result<Self, StoreError> {
        let base = config.url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            return Err(StoreError::Configuration(format!(
                "store URL must start with http:// or https://, got '{}'",
                config.url
            )));
        };

        Ok(Self {
            socket_url: format!(
                "{}/realtime/v1/websocket?apikey={}&vsn={}",
                ws_base, config.api_key, PHOENIX_VSN
            ),
            api_key: config.api_key.clone(),
            schema: "public".to_string(),
            table: config.snapshot_table.clone(),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_seconds),
            heartbeat_interval: HEARTBEAT_INTERVAL,
        })
    }

    /// Channel topic for the snapshot table.
    pub fn topic(&self) -> String {
        format!("realtime:{}:{}", self.schema, self.table)
    }
}

/// Opens and maintains the realtime websocket for one subscription.
pub struct RealtimeSubscriber {
    config: RealtimeConfig,
}

impl RealtimeSubscriber {
    pub fn new(config: RealtimeConfig) -> Self {
        Self { config }
    }

    /// Start delivering inserted snapshots to `on_insert`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(self, on_insert: SnapshotCallback) -> Subscription {
        let config = self.config;
        Subscription::spawn(on_insert, move |sink| run(config, sink))
    }
}

async fn run(config: RealtimeConfig, sink: SnapshotSink) {
    tracing::info!(topic = %config.topic(), "Realtime subscriber started");

    loop {
        let result = tokio::select! {
            _ = sink.closed() => break,
            result = session(&config, &sink) => result,
        };

        match result {
            Ok(()) => break,
            Err(e) => {
                sink.set_status(FeedStatus::Down);
                metrics::counter!("oracle_fetch_failures_total", "kind" => e.kind()).increment(1);
                tracing::warn!(
                    error = %e,
                    delay_seconds = config.reconnect_delay.as_secs(),
                    "Realtime connection dropped, reconnecting"
                );
            }
        }

        tokio::select! {
            _ = sink.closed() => break,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }

    tracing::info!("Realtime subscriber stopped");
}

/// One websocket connection. Returns `Ok` only when the subscription was
/// cancelled; any transport or channel failure is an error.
async fn session(config: &RealtimeConfig, sink: &SnapshotSink) -> Result<(), StoreError> {
    let (socket, _) = connect_async(config.socket_url.as_str())
        .await
        .map_err(|e| StoreError::Realtime(format!("connect failed: {}", e)))?;
    let (mut write, mut read) = socket.split();

    let topic = config.topic();
    let mut next_ref: u64 = 1;
    write
        .send(Message::Text(join_message(config, next_ref).into()))
        .await
        .map_err(|e| StoreError::Realtime(format!("join failed: {}", e)))?;

    let mut heartbeat = tokio::time::interval(config.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // First tick completes immediately.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = sink.closed() => {
                let _ = write.send(Message::Close(None)).await;
                return Ok(());
            }
            _ = heartbeat.tick() => {
                next_ref += 1;
                write
                    .send(Message::Text(heartbeat_message(next_ref).into()))
                    .await
                    .map_err(|e| StoreError::Realtime(format!("heartbeat failed: {}", e)))?;
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => match parse_frame(text.as_str(), &topic) {
                    ChannelEvent::Insert(snapshot) => {
                        tracing::debug!(
                            snapshot_id = %snapshot.id,
                            timestamp = %snapshot.timestamp,
                            "Realtime snapshot received"
                        );
                        if !sink.deliver(*snapshot) {
                            return Ok(());
                        }
                    }
                    ChannelEvent::Joined => {
                        sink.set_status(FeedStatus::Joined);
                        tracing::info!(topic = %topic, "Realtime channel joined");
                    }
                    ChannelEvent::JoinRejected(reason) => {
                        return Err(StoreError::Realtime(format!("join rejected: {}", reason)));
                    }
                    ChannelEvent::Closed(reason) => {
                        return Err(StoreError::Realtime(format!("channel closed: {}", reason)));
                    }
                    ChannelEvent::Malformed(reason) => {
                        tracing::warn!(error = %reason, "Ignoring undecodable realtime record");
                    }
                    ChannelEvent::Ignored => {}
                },
                Some(Ok(Message::Close(_))) | None => {
                    return Err(StoreError::Realtime("connection closed by server".to_string()));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(StoreError::Realtime(e.to_string())),
            }
        }
    }
}

/// Decoded meaning of one inbound channel frame.
#[derive(Debug)]
pub(crate) enum ChannelEvent {
    Insert(Box<SystemSnapshot>),
    Joined,
    JoinRejected(String),
    Closed(String),
    Malformed(String),
    Ignored,
}

#[derive(Deserialize)]
struct Frame {
    topic: String,
    event: String,
    #[serde(default)]
    payload: Value,
}

pub(crate) fn join_message(config: &RealtimeConfig, msg_ref: u64) -> String {
    json!({
        "topic": config.topic(),
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": {"ack": false, "self": false},
                "presence": {"key": ""},
                "postgres_changes": [{
                    "event": "INSERT",
                    "schema": config.schema,
                    "table": config.table,
                }],
            },
            "access_token": config.api_key,
        },
        "ref": msg_ref.to_string(),
        "join_ref": msg_ref.to_string(),
    })
    .to_string()
}

pub(crate) fn heartbeat_message(msg_ref: u64) -> String {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": msg_ref.to_string(),
    })
    .to_string()
}

pub(crate) fn parse_frame(text: &str, topic: &str) -> ChannelEvent {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => return ChannelEvent::Malformed(e.to_string()),
    };
    if frame.topic != topic {
        return ChannelEvent::Ignored;
    }

    match frame.event.as_str() {
        "postgres_changes" => {
            let data = &frame.payload["data"];
            if data["type"].as_str() != Some("INSERT") {
                return ChannelEvent::Ignored;
            }
            decode_record(data["record"].clone())
        }
        // Legacy realtime servers send the change type as the event name.
        "INSERT" => decode_record(frame.payload["record"].clone()),
        "phx_reply" => match frame.payload["status"].as_str() {
            Some("ok") => ChannelEvent::Joined,
            _ => ChannelEvent::JoinRejected(frame.payload["response"].to_string()),
        },
        "phx_error" => ChannelEvent::Closed("channel error".to_string()),
        "phx_close" => ChannelEvent::Closed("closed by server".to_string()),
        _ => ChannelEvent::Ignored,
    }
}

fn decode_record(record: Value) -> ChannelEvent {
    if record.is_null() {
        return ChannelEvent::Malformed("insert event without record".to_string());
    }
    match SystemSnapshot::from_row(record) {
        Ok(snapshot) => ChannelEvent::Insert(Box::new(snapshot)),
        Err(e) => ChannelEvent::Malformed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RealtimeConfig {
        RealtimeConfig::from_store(&StoreConfig {
            url: "https://abc.supabase.co/".to_string(),
            api_key: "anon-key".to_string(),
            ..StoreConfig::default()
        })
        .unwrap()
    }

    const TOPIC: &str = "realtime:public:system_snapshots";

    #[test]
    fn test_socket_url_from_https() {
        let config = config();
        assert_eq!(
            config.socket_url,
            "wss://abc.supabase.co/realtime/v1/websocket?apikey=anon-key&vsn=1.0.0"
        );
        assert_eq!(config.topic(), TOPIC);
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_socket_url_from_http() {
        let config = RealtimeConfig::from_store(&StoreConfig {
            url: "http://127.0.0.1:54321".to_string(),
            api_key: "k".to_string(),
            ..StoreConfig::default()
        })
        .unwrap();
        assert!(config.socket_url.starts_with("ws://127.0.0.1:54321/realtime/v1/websocket"));
    }

    #[test]
    fn test_socket_url_rejects_unknown_scheme() {
        let result = RealtimeConfig::from_store(&StoreConfig {
            url: "ftp://abc".to_string(),
            ..StoreConfig::default()
        });
        assert!(matches!(result, Err(StoreError::Configuration(_))));
    }

    #[test]
    fn test_join_message_filters_inserts_on_snapshot_table() {
        let message: Value = serde_json::from_str(&join_message(&config(), 1)).unwrap();
        assert_eq!(message["event"], "phx_join");
        assert_eq!(message["topic"], TOPIC);
        assert_eq!(message["ref"], "1");
        let change = &message["payload"]["config"]["postgres_changes"][0];
        assert_eq!(change["event"], "INSERT");
        assert_eq!(change["table"], "system_snapshots");
    }

    #[test]
    fn test_heartbeat_message_shape() {
        let message: Value = serde_json::from_str(&heartbeat_message(7)).unwrap();
        assert_eq!(message["topic"], "phoenix");
        assert_eq!(message["event"], "heartbeat");
        assert_eq!(message["ref"], "7");
    }

    #[test]
    fn test_parse_postgres_changes_insert() {
        let frame = json!({
            "topic": TOPIC,
            "event": "postgres_changes",
            "payload": {
                "data": {
                    "type": "INSERT",
                    "schema": "public",
                    "table": "system_snapshots",
                    "record": {
                        "id": 12,
                        "snapshot_id": "snapshot-12",
                        "timestamp": "2025-01-15T10:30:00Z",
                        "state": {"agents": []}
                    }
                },
                "ids": [1]
            },
            "ref": null
        });
        match parse_frame(&frame.to_string(), TOPIC) {
            ChannelEvent::Insert(snapshot) => assert_eq!(snapshot.id, "snapshot-12"),
            other => panic!("expected insert, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ignores_updates_and_other_topics() {
        let update = json!({
            "topic": TOPIC,
            "event": "postgres_changes",
            "payload": {"data": {"type": "UPDATE", "record": {}}}
        });
        assert!(matches!(parse_frame(&update.to_string(), TOPIC), ChannelEvent::Ignored));

        let heartbeat_reply = json!({
            "topic": "phoenix",
            "event": "phx_reply",
            "payload": {"status": "ok", "response": {}}
        });
        assert!(matches!(
            parse_frame(&heartbeat_reply.to_string(), TOPIC),
            ChannelEvent::Ignored
        ));
    }

    #[test]
    fn test_parse_join_replies() {
        let ok = json!({"topic": TOPIC, "event": "phx_reply", "payload": {"status": "ok", "response": {}}});
        assert!(matches!(parse_frame(&ok.to_string(), TOPIC), ChannelEvent::Joined));

        let rejected = json!({
            "topic": TOPIC,
            "event": "phx_reply",
            "payload": {"status": "error", "response": {"reason": "unauthorized"}}
        });
        match parse_frame(&rejected.to_string(), TOPIC) {
            ChannelEvent::JoinRejected(reason) => assert!(reason.contains("unauthorized")),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_malformed_record() {
        let frame = json!({
            "topic": TOPIC,
            "event": "postgres_changes",
            "payload": {"data": {"type": "INSERT", "record": {"snapshot_id": "no-timestamp"}}}
        });
        assert!(matches!(
            parse_frame(&frame.to_string(), TOPIC),
            ChannelEvent::Malformed(_)
        ));
        assert!(matches!(parse_frame("not json", TOPIC), ChannelEvent::Malformed(_)));
    }
}
