//! Phoenix channel frames spoken by the hosted realtime socket (`vsn=1.0.0`).

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::{AccessToken, BookmarkChange, UserId};
use crate::outbound::hosted::dto::{BookmarkRowDto, DeletedRowDto};

const SCHEMA: &str = "public";
const TABLE: &str = "bookmarks";
const PHOENIX_TOPIC: &str = "phoenix";

pub(crate) const EVENT_JOIN: &str = "phx_join";
pub(crate) const EVENT_LEAVE: &str = "phx_leave";
pub(crate) const EVENT_REPLY: &str = "phx_reply";
pub(crate) const EVENT_ERROR: &str = "phx_error";
pub(crate) const EVENT_CLOSE: &str = "phx_close";
pub(crate) const EVENT_HEARTBEAT: &str = "heartbeat";
pub(crate) const EVENT_CHANGES: &str = "postgres_changes";
pub(crate) const EVENT_ACCESS_TOKEN: &str = "access_token";

/// One channel frame in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PhoenixMessage {
    pub(crate) topic: String,
    pub(crate) event: String,
    #[serde(default)]
    pub(crate) payload: Value,
    #[serde(rename = "ref", default)]
    pub(crate) reference: Option<String>,
}

/// Outcome of a `phx_reply` addressed to a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReplyStatus {
    Ok,
    Error(String),
}

/// Monotonic message reference counter.
#[derive(Debug, Default)]
pub(crate) struct RefCounter(u64);

impl RefCounter {
    pub(crate) fn next(&mut self) -> String {
        self.0 += 1;
        self.0.to_string()
    }
}

/// Channel topic for one owner's subscription.
pub(crate) fn channel_topic(owner: &UserId) -> String {
    format!("realtime:{TABLE}:{owner}")
}

/// Join request subscribing to inserts and updates of `owner`'s rows and to
/// every delete. Deleted rows only carry their primary key, so the delete
/// listener cannot be filtered by owner.
pub(crate) fn join_message(
    topic: &str,
    owner: &UserId,
    token: &AccessToken,
    reference: String,
) -> PhoenixMessage {
    let owner_filter = format!("user_id=eq.{owner}");
    PhoenixMessage {
        topic: topic.to_owned(),
        event: EVENT_JOIN.to_owned(),
        payload: json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "INSERT", "schema": SCHEMA, "table": TABLE, "filter": owner_filter },
                    { "event": "UPDATE", "schema": SCHEMA, "table": TABLE, "filter": owner_filter },
                    { "event": "DELETE", "schema": SCHEMA, "table": TABLE },
                ],
            },
            "access_token": token.expose(),
        }),
        reference: Some(reference),
    }
}

pub(crate) fn heartbeat_message(reference: String) -> PhoenixMessage {
    PhoenixMessage {
        topic: PHOENIX_TOPIC.to_owned(),
        event: EVENT_HEARTBEAT.to_owned(),
        payload: json!({}),
        reference: Some(reference),
    }
}

/// Re-authorise a joined channel with a refreshed access token.
pub(crate) fn access_token_message(
    topic: &str,
    token: &AccessToken,
    reference: String,
) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic.to_owned(),
        event: EVENT_ACCESS_TOKEN.to_owned(),
        payload: json!({ "access_token": token.expose() }),
        reference: Some(reference),
    }
}

pub(crate) fn leave_message(topic: &str, reference: String) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic.to_owned(),
        event: EVENT_LEAVE.to_owned(),
        payload: json!({}),
        reference: Some(reference),
    }
}

impl PhoenixMessage {
    /// Status of a reply to the request sent with `reference`, if this frame
    /// is that reply.
    pub(crate) fn reply_to(&self, reference: &str) -> Option<ReplyStatus> {
        if self.event != EVENT_REPLY || self.reference.as_deref() != Some(reference) {
            return None;
        }
        match self.payload.get("status").and_then(Value::as_str) {
            Some("ok") => Some(ReplyStatus::Ok),
            _ => {
                let detail = self
                    .payload
                    .get("response")
                    .map(Value::to_string)
                    .unwrap_or_else(|| "no response".to_owned());
                Some(ReplyStatus::Error(detail))
            }
        }
    }

    /// Whether the server closed or errored the channel.
    pub(crate) fn ends_channel(&self, topic: &str) -> bool {
        self.topic == topic && (self.event == EVENT_CLOSE || self.event == EVENT_ERROR)
    }

    /// Decode a row change delivered on `topic`.
    ///
    /// Returns `Ok(None)` for frames that are not row changes (replies,
    /// presence, system notices).
    pub(crate) fn into_change(self, topic: &str) -> Result<Option<BookmarkChange>, String> {
        if self.topic != topic || self.event != EVENT_CHANGES {
            return Ok(None);
        }
        let data = self
            .payload
            .get("data")
            .ok_or_else(|| "postgres_changes frame without data".to_owned())?;
        let kind = data.get("type").and_then(Value::as_str).unwrap_or_default();
        match kind {
            "INSERT" | "UPDATE" => {
                let record = data
                    .get("record")
                    .cloned()
                    .ok_or_else(|| format!("{kind} without record"))?;
                let row: BookmarkRowDto =
                    serde_json::from_value(record).map_err(|err| err.to_string())?;
                let bookmark = row.into_domain()?;
                Ok(Some(if kind == "INSERT" {
                    BookmarkChange::Inserted(bookmark)
                } else {
                    BookmarkChange::Updated(bookmark)
                }))
            }
            "DELETE" => {
                let old = data
                    .get("old_record")
                    .cloned()
                    .ok_or_else(|| "DELETE without old_record".to_owned())?;
                let row: DeletedRowDto =
                    serde_json::from_value(old).map_err(|err| err.to_string())?;
                Ok(Some(BookmarkChange::Deleted {
                    id: row.id.into_domain()?,
                }))
            }
            other => Err(format!("unknown change type {other:?}")),
        }
    }
}
