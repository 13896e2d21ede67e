use crate::{ChangeFeed, FeedError, FeedResult, FeedScope, FeedSignal, FeedStream, Inbound, PhoenixMessage};

use es_config::RealtimeConfig;
use es_core::AccessToken;

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const JOIN_REF: &str = "1";
const JOIN_TIMEOUT_SECS: u64 = 10;

/// Change feed over the hosted realtime websocket.
///
/// Each open stream owns one socket and one channel; a background task keeps
/// the heartbeat going and forwards matching changes until the stream is
/// dropped or the socket fails.
pub struct RealtimeFeed {
    socket_url: String,
    heartbeat: Duration,
    buffer: usize,
}

impl RealtimeFeed {
    pub fn new(base_url: &str, anon_key: &str, config: &RealtimeConfig) -> Self {
        Self {
            socket_url: Self::socket_url(base_url, anon_key),
            heartbeat: Duration::from_secs(config.heartbeat_interval_secs),
            buffer: config.channel_buffer,
        }
    }

    /// `{ws(s)}://host/realtime/v1/websocket?apikey=...&vsn=1.0.0`
    pub fn socket_url(base_url: &str, anon_key: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!("{base}/realtime/v1/websocket?apikey={anon_key}&vsn=1.0.0")
    }

    async fn join(socket: &mut Socket, scope: &FeedScope, token: &AccessToken) -> FeedResult<()> {
        let join = PhoenixMessage::join(scope, token, JOIN_REF);
        socket.send(Message::text(join.encode()?)).await?;

        while let Some(frame) = socket.next().await {
            let Message::Text(text) = frame? else {
                continue;
            };
            match PhoenixMessage::decode(&text)?.classify()? {
                Inbound::Reply {
                    reference, ok, reason,
                } if reference.as_deref() == Some(JOIN_REF) => {
                    return if ok {
                        Ok(())
                    } else {
                        Err(FeedError::join_rejected(
                            reason.unwrap_or_else(|| "join refused".to_string()),
                        ))
                    };
                }
                Inbound::ChannelError(reason) => return Err(FeedError::join_rejected(reason)),
                Inbound::Closed => return Err(FeedError::transport("channel closed during join")),
                _ => {}
            }
        }

        Err(FeedError::transport("socket closed during join"))
    }
}

#[async_trait]
impl ChangeFeed for RealtimeFeed {
    async fn open(&self, token: &AccessToken, scope: &FeedScope) -> FeedResult<FeedStream> {
        let (mut socket, _response) = timeout(
            Duration::from_secs(JOIN_TIMEOUT_SECS),
            connect_async(self.socket_url.as_str()),
        )
        .await
        .map_err(|_| FeedError::timeout(JOIN_TIMEOUT_SECS, "websocket handshake"))?
        .map_err(|e| FeedError::connect(e.to_string()))?;

        timeout(
            Duration::from_secs(JOIN_TIMEOUT_SECS),
            Self::join(&mut socket, scope, token),
        )
        .await
        .map_err(|_| FeedError::timeout(JOIN_TIMEOUT_SECS, "channel join"))??;

        info!("Joined change feed {}", scope.topic());

        let (sender, stream) = FeedStream::channel(self.buffer);
        tokio::spawn(run_socket(socket, sender, scope.clone(), self.heartbeat));
        Ok(stream)
    }
}

async fn run_socket(
    mut socket: Socket,
    sender: mpsc::Sender<FeedSignal>,
    scope: FeedScope,
    heartbeat: Duration,
) {
    let topic = scope.topic();
    let mut interval = tokio::time::interval(heartbeat);
    interval.tick().await;
    let mut next_ref: u64 = 2;

    let reason = loop {
        tokio::select! {
            _ = sender.closed() => {
                let leave = PhoenixMessage::leave(&topic, &next_ref.to_string());
                if let Ok(text) = leave.encode() {
                    let _ = socket.send(Message::text(text)).await;
                }
                let _ = socket.close(None).await;
                debug!("Left change feed {}", topic);
                return;
            }
            _ = interval.tick() => {
                let beat = PhoenixMessage::heartbeat(&next_ref.to_string());
                next_ref += 1;
                match beat.encode() {
                    Ok(text) => {
                        if let Err(e) = socket.send(Message::text(text)).await {
                            break format!("heartbeat failed: {e}");
                        }
                    }
                    Err(e) => break e.to_string(),
                }
            }
            frame = socket.next() => match frame {
                None => break "socket closed".to_string(),
                Some(Err(e)) => break e.to_string(),
                Some(Ok(Message::Close(_))) => break "server closed socket".to_string(),
                Some(Ok(Message::Text(text))) => {
                    match PhoenixMessage::decode(&text).and_then(|m| m.classify()) {
                        Ok(Inbound::Change(record)) => {
                            if !scope.matches(&record) {
                                continue;
                            }
                            match sender.try_send(FeedSignal::Change(record)) {
                                Ok(()) => {}
                                Err(TrySendError::Full(_)) => break "subscriber buffer full".to_string(),
                                Err(TrySendError::Closed(_)) => return,
                            }
                        }
                        Ok(Inbound::ChannelError(reason)) => break reason,
                        Ok(Inbound::Closed) => break "channel closed".to_string(),
                        Ok(Inbound::Reply { ok: false, reason, .. }) => {
                            warn!("Change feed {} refused a push: {:?}", topic, reason);
                        }
                        Ok(_) => {}
                        Err(e) => warn!("Ignoring malformed realtime frame: {}", e),
                    }
                }
                Some(Ok(_)) => {}
            }
        }
    };

    warn!("Change feed {} dropped: {}", topic, reason);
    let _ = sender.try_send(FeedSignal::Dropped { reason });
}
