use crate::phoenix::EVENT_JOIN;
use crate::{ChangeFeed, FeedScope, FeedSignal, PhoenixMessage, RealtimeFeed};

use es_config::RealtimeConfig;
use es_core::{AccessToken, ChangeKind, EntityKind};

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

#[test]
fn test_socket_url_maps_scheme() {
    assert_eq!(
        RealtimeFeed::socket_url("https://proj.example.co/", "anon"),
        "wss://proj.example.co/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
    );
    assert_eq!(
        RealtimeFeed::socket_url("http://127.0.0.1:54321", "anon"),
        "ws://127.0.0.1:54321/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
    );
}

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    (listener, url)
}

/// Accept one client and read frames until its channel join arrives.
async fn accept_join(listener: &TcpListener) -> (WebSocketStream<TcpStream>, PhoenixMessage) {
    let (tcp, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(tcp).await.unwrap();
    loop {
        let Some(Ok(Message::Text(text))) = ws.next().await else {
            panic!("client left before joining");
        };
        let frame = PhoenixMessage::decode(&text).unwrap();
        if frame.event == EVENT_JOIN {
            return (ws, frame);
        }
    }
}

fn reply(join: &PhoenixMessage, status: &str) -> Message {
    Message::text(
        json!({
            "topic": join.topic,
            "event": "phx_reply",
            "ref": join.reference,
            "payload": {"status": status, "response": {"reason": "bad token"}},
        })
        .to_string(),
    )
}

fn change(topic: &str) -> Message {
    Message::text(
        json!({
            "topic": topic,
            "event": "postgres_changes",
            "ref": null,
            "payload": {"data": {
                "type": "UPDATE",
                "table": "scans",
                "schema": "public",
                "commit_timestamp": "2026-03-01T10:00:00Z",
                "record": {"id": "a", "status": "running"},
                "old_record": {"id": "a"},
            }},
        })
        .to_string(),
    )
}

fn feed(url: &str) -> RealtimeFeed {
    RealtimeFeed::new(url, "anon", &RealtimeConfig::default())
}

#[tokio::test]
async fn given_joined_channel_when_change_pushed_then_stream_yields_it() {
    // Given
    let (listener, url) = listen().await;
    let server = tokio::spawn(async move {
        let (mut ws, join) = accept_join(&listener).await;
        ws.send(reply(&join, "ok")).await.unwrap();
        ws.send(change(&join.topic)).await.unwrap();
        while ws.next().await.is_some() {}
        join
    });

    // When
    let mut stream = feed(&url)
        .open(&AccessToken::new("jwt-1"), &FeedScope::table(EntityKind::Scan))
        .await
        .unwrap();
    let signal = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap();

    // Then
    let Some(FeedSignal::Change(record)) = signal else {
        panic!("expected a change");
    };
    assert_eq!(record.kind, ChangeKind::Update);
    assert_eq!(record.record["status"], json!("running"));

    drop(stream);
    let join = server.await.unwrap();
    assert_eq!(join.payload["access_token"], json!("jwt-1"));
}

#[tokio::test]
async fn given_join_refused_when_opened_then_error() {
    let (listener, url) = listen().await;
    tokio::spawn(async move {
        let (mut ws, join) = accept_join(&listener).await;
        ws.send(reply(&join, "error")).await.unwrap();
        while ws.next().await.is_some() {}
    });

    let result = feed(&url)
        .open(&AccessToken::new("expired"), &FeedScope::table(EntityKind::Scan))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn given_server_closes_socket_when_streaming_then_dropped_signal() {
    // Given
    let (listener, url) = listen().await;
    tokio::spawn(async move {
        let (mut ws, join) = accept_join(&listener).await;
        ws.send(reply(&join, "ok")).await.unwrap();
        ws.close(None).await.unwrap();
    });
    let mut stream = feed(&url)
        .open(&AccessToken::new("jwt-1"), &FeedScope::table(EntityKind::Scan))
        .await
        .unwrap();

    // When
    let signal = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap();

    // Then
    assert!(matches!(signal, Some(FeedSignal::Dropped { .. })));
}

#[tokio::test]
async fn given_nothing_listening_when_opened_then_connect_error() {
    let (listener, url) = listen().await;
    drop(listener);

    let result = feed(&url)
        .open(&AccessToken::new("jwt-1"), &FeedScope::table(EntityKind::Scan))
        .await;

    assert!(result.is_err());
}
