//! Wire messages exchanged on `/ws`.
//!
//! Both directions are JSON objects tagged by `type` with camelCase fields.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Bookmark, BookmarkId, Error, ErrorCode, ListChange};

/// Messages sent to the browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The snapshot is being fetched.
    Loading,
    /// Full list, newest first. Always sent once after `loading`.
    Snapshot { bookmarks: Vec<Bookmark> },
    /// A row to show at the head of the list.
    Inserted { bookmark: Bookmark },
    /// A listed row changed in place.
    Updated { bookmark: Bookmark },
    /// A listed row was removed.
    Deleted { id: BookmarkId },
    /// A failure to show inline; the connection stays open.
    #[serde(rename_all = "camelCase")]
    Error {
        code: ErrorCode,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_id: Option<String>,
    },
}

impl ServerMessage {
    /// Message announcing a visible list change; `None` for ignored ones.
    pub fn for_change(change: ListChange) -> Option<Self> {
        match change {
            ListChange::Prepended(bookmark) => Some(Self::Inserted { bookmark }),
            ListChange::Replaced(bookmark) => Some(Self::Updated { bookmark }),
            ListChange::Removed(id) => Some(Self::Deleted { id }),
            ListChange::Ignored(_) => None,
        }
    }
}

impl From<&Error> for ServerMessage {
    fn from(error: &Error) -> Self {
        Self::Error {
            code: error.code(),
            message: error.message().to_owned(),
            trace_id: error.trace_id().map(str::to_owned),
        }
    }
}

/// Requests sent by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Submit the add form. Missing fields read as empty and fail
    /// validation.
    #[serde(rename_all = "camelCase")]
    Add {
        trace_id: Uuid,
        #[serde(default)]
        title: String,
        #[serde(default)]
        url: String,
    },
    /// Delete one listed bookmark.
    #[serde(rename_all = "camelCase")]
    Delete { trace_id: Uuid, id: String },
}

impl ClientMessage {
    /// Correlation id echoed in any resulting `error`.
    pub fn trace_id(&self) -> Uuid {
        match self {
            Self::Add { trace_id, .. } | Self::Delete { trace_id, .. } => *trace_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IgnoreReason, UserId};
    use chrono::{TimeZone, Utc};
    use insta::assert_json_snapshot;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn bookmark() -> Bookmark {
        Bookmark {
            id: BookmarkId::new("42").expect("id"),
            title: "The Book".into(),
            url: "https://doc.rust-lang.org/book/".into(),
            created_at: Utc
                .with_ymd_and_hms(2026, 1, 5, 9, 0, 0)
                .single()
                .expect("timestamp"),
            user_id: UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("owner"),
        }
    }

    #[rstest]
    fn snapshot_lists_rows(bookmark: Bookmark) {
        assert_json_snapshot!(ServerMessage::Snapshot { bookmarks: vec![bookmark] }, @r#"
        {
          "type": "snapshot",
          "bookmarks": [
            {
              "id": "42",
              "title": "The Book",
              "url": "https://doc.rust-lang.org/book/",
              "createdAt": "2026-01-05T09:00:00Z",
              "userId": "3fa85f64-5717-4562-b3fc-2c963f66afa6"
            }
          ]
        }
        "#);
    }

    #[rstest]
    fn loading_and_deleted_are_compact() {
        assert_json_snapshot!(ServerMessage::Loading, @r#"
        {
          "type": "loading"
        }
        "#);
        let id = BookmarkId::new("42").expect("id");
        assert_json_snapshot!(ServerMessage::Deleted { id }, @r#"
        {
          "type": "deleted",
          "id": "42"
        }
        "#);
    }

    #[rstest]
    fn errors_carry_the_trace_id() {
        let error = Error::invalid_request("Please enter a valid URL.")
            .with_trace_id("00000000-0000-0000-0000-000000000000");
        assert_json_snapshot!(ServerMessage::from(&error), @r#"
        {
          "type": "error",
          "code": "invalid_request",
          "message": "Please enter a valid URL.",
          "traceId": "00000000-0000-0000-0000-000000000000"
        }
        "#);
    }

    #[rstest]
    fn visible_changes_map_to_messages(bookmark: Bookmark) {
        assert_eq!(
            ServerMessage::for_change(ListChange::Prepended(bookmark.clone())),
            Some(ServerMessage::Inserted {
                bookmark: bookmark.clone()
            })
        );
        assert_eq!(
            ServerMessage::for_change(ListChange::Replaced(bookmark.clone())),
            Some(ServerMessage::Updated { bookmark })
        );
        assert_eq!(
            ServerMessage::for_change(ListChange::Ignored(IgnoreReason::Duplicate)),
            None
        );
    }

    #[rstest]
    fn parses_client_requests() {
        let add: ClientMessage = serde_json::from_value(json!({
            "type": "add",
            "traceId": Uuid::nil(),
            "title": "Docs",
            "url": "docs.rs"
        }))
        .expect("add request");
        assert_eq!(
            add,
            ClientMessage::Add {
                trace_id: Uuid::nil(),
                title: "Docs".into(),
                url: "docs.rs".into()
            }
        );

        let delete: ClientMessage = serde_json::from_value(json!({
            "type": "delete",
            "traceId": Uuid::nil(),
            "id": "42"
        }))
        .expect("delete request");
        assert_eq!(delete.trace_id(), Uuid::nil());
    }

    #[rstest]
    fn rejects_unknown_request_types() {
        let result = serde_json::from_value::<ClientMessage>(json!({
            "type": "rename",
            "traceId": Uuid::nil()
        }));
        assert!(result.is_err());
    }
}
