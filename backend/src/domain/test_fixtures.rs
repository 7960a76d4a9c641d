//! Shared builders for domain unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::{AccessToken, AuthSession, Bookmark, BookmarkId, RefreshToken, User, UserId};

pub(crate) const OWNER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
pub(crate) const OTHER_ID: &str = "9b2f1c44-1d7e-4f3a-8a55-0c2b6f1e7d10";

pub(crate) fn owner() -> UserId {
    UserId::new(OWNER_ID).expect("fixture owner id")
}

pub(crate) fn other_owner() -> UserId {
    UserId::new(OTHER_ID).expect("fixture owner id")
}

pub(crate) fn owner_user() -> User {
    User::new(owner()).with_email("ada@example.com")
}

pub(crate) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Bookmark `id` owned by `user_id`, created `minutes` after the fixture epoch.
pub(crate) fn bookmark_for(id: &str, minutes: i64, user_id: UserId) -> Bookmark {
    Bookmark {
        id: BookmarkId::new(id).expect("fixture bookmark id"),
        title: format!("Bookmark {id}"),
        url: format!("https://{id}.example.com"),
        created_at: epoch() + Duration::minutes(minutes),
        user_id,
    }
}

pub(crate) fn bookmark(id: &str, minutes: i64) -> Bookmark {
    bookmark_for(id, minutes, owner())
}

pub(crate) fn id(raw: &str) -> BookmarkId {
    BookmarkId::new(raw).expect("fixture bookmark id")
}

pub(crate) fn owner_session() -> AuthSession {
    AuthSession {
        user: owner_user(),
        access_token: AccessToken::new("access-token"),
        refresh_token: Some(RefreshToken::new("refresh-token")),
        expires_at: None,
    }
}
