//! Phoenix channel frames (`vsn=1.0.0`, JSON objects) as spoken by the
//! realtime websocket.

use crate::{FeedError, FeedResult, FeedScope};

use es_core::{AccessToken, ChangeKind, ChangeRecord, EntityKind};

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const PHOENIX_TOPIC: &str = "phoenix";
pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_POSTGRES_CHANGES: &str = "postgres_changes";
pub const EVENT_SYSTEM: &str = "system";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

/// Classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Change(ChangeRecord),
    Reply {
        reference: Option<String>,
        ok: bool,
        reason: Option<String>,
    },
    /// Channel-level failure; the subscription is gone.
    ChannelError(String),
    Closed,
    Ignored,
}

impl PhoenixMessage {
    pub fn join(scope: &FeedScope, token: &AccessToken, reference: &str) -> Self {
        let mut change = json!({
            "event": "*",
            "schema": "public",
            "table": scope.table.table(),
        });
        if let Some(filter) = scope.filter.as_ref().and_then(|f| f.to_feed_filter()) {
            change["filter"] = Value::String(filter);
        }

        Self {
            topic: scope.topic(),
            event: EVENT_JOIN.to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": [change],
                },
                "access_token": token.as_str(),
            }),
            reference: Some(reference.to_string()),
        }
    }

    pub fn leave(topic: &str, reference: &str) -> Self {
        Self {
            topic: topic.to_string(),
            event: EVENT_LEAVE.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    pub fn heartbeat(reference: &str) -> Self {
        Self {
            topic: PHOENIX_TOPIC.to_string(),
            event: EVENT_HEARTBEAT.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    pub fn encode(&self) -> FeedResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> FeedResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn classify(&self) -> FeedResult<Inbound> {
        match self.event.as_str() {
            EVENT_POSTGRES_CHANGES => Ok(Inbound::Change(self.change_record()?)),
            EVENT_REPLY => {
                let ok = self.payload.get("status").and_then(Value::as_str) == Some("ok");
                let reason = self
                    .payload
                    .get("response")
                    .and_then(|r| r.get("reason"))
                    .and_then(Value::as_str)
                    .map(String::from);
                Ok(Inbound::Reply {
                    reference: self.reference.clone(),
                    ok,
                    reason,
                })
            }
            EVENT_ERROR => Ok(Inbound::ChannelError(
                self.payload
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or("channel error")
                    .to_string(),
            )),
            EVENT_SYSTEM
                if self.payload.get("status").and_then(Value::as_str) == Some("error") =>
            {
                Ok(Inbound::ChannelError(
                    self.payload
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("subscription error")
                        .to_string(),
                ))
            }
            EVENT_CLOSE => Ok(Inbound::Closed),
            _ => Ok(Inbound::Ignored),
        }
    }

    fn change_record(&self) -> FeedResult<ChangeRecord> {
        let data = self
            .payload
            .get("data")
            .ok_or_else(|| FeedError::protocol("postgres_changes frame without data"))?;

        let kind = ChangeKind::from_str(data_str(data, "type")?)
            .map_err(|e| FeedError::protocol(e.to_string()))?;
        let table = EntityKind::from_str(data_str(data, "table")?)
            .map_err(|e| FeedError::protocol(e.to_string()))?;
        let commit_timestamp = data
            .get("commit_timestamp")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(ChangeRecord {
            kind,
            table,
            record: data.get("record").cloned().unwrap_or(Value::Null),
            old_record: data.get("old_record").cloned().unwrap_or(Value::Null),
            commit_timestamp,
        })
    }
}

fn data_str<'a>(data: &'a Value, key: &str) -> FeedResult<&'a str> {
    data.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| FeedError::protocol(format!("postgres_changes frame without {key}")))
}
