//! Wire payloads exchanged with the hosted data and auth APIs.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{AccessToken, AuthSession, Bookmark, BookmarkId, RefreshToken, User, UserId};

/// Primary keys arrive as text (UUID) or as integers (identity columns).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RowIdDto {
    Text(String),
    Number(i64),
}

impl RowIdDto {
    pub(crate) fn into_domain(self) -> Result<BookmarkId, String> {
        let raw = match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        };
        BookmarkId::new(raw).map_err(|err| err.to_string())
    }
}

/// One row of the bookmarks table.
#[derive(Debug, Deserialize)]
pub(crate) struct BookmarkRowDto {
    id: RowIdDto,
    title: String,
    url: String,
    created_at: DateTime<Utc>,
    user_id: String,
}

impl BookmarkRowDto {
    pub(crate) fn into_domain(self) -> Result<Bookmark, String> {
        Ok(Bookmark {
            id: self.id.into_domain()?,
            title: self.title,
            url: self.url,
            created_at: self.created_at,
            user_id: UserId::new(&self.user_id).map_err(|err| err.to_string())?,
        })
    }
}

/// Primary-key-only record carried by delete notifications.
#[derive(Debug, Deserialize)]
pub(crate) struct DeletedRowDto {
    pub(crate) id: RowIdDto,
}

pub(crate) fn decode_rows(body: &[u8]) -> Result<Vec<Bookmark>, String> {
    let rows: Vec<BookmarkRowDto> =
        serde_json::from_slice(body).map_err(|err| format!("invalid bookmark rows: {err}"))?;
    rows.into_iter().map(BookmarkRowDto::into_domain).collect()
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadataDto {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

/// Account record from `/auth/v1/user` and token responses.
#[derive(Debug, Deserialize)]
pub(crate) struct UserDto {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<UserMetadataDto>,
}

impl UserDto {
    pub(crate) fn into_domain(self) -> Result<User, String> {
        let metadata = self.user_metadata.unwrap_or_default();
        Ok(User {
            id: UserId::new(&self.id).map_err(|err| err.to_string())?,
            email: self.email,
            full_name: metadata.full_name,
            avatar_url: metadata.avatar_url,
        })
    }
}

/// Response of the password and refresh token grants.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponseDto {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserDto,
}

impl TokenResponseDto {
    /// Build the session; `expires_at` wins over `expires_in` when both are
    /// present.
    pub(crate) fn into_session(self, now: DateTime<Utc>) -> Result<AuthSession, String> {
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(epoch_seconds), _) => Utc.timestamp_opt(epoch_seconds, 0).single(),
            (None, Some(seconds)) => Some(now + Duration::seconds(seconds)),
            (None, None) => None,
        };
        Ok(AuthSession {
            user: self.user.into_domain()?,
            access_token: AccessToken::new(self.access_token),
            refresh_token: self.refresh_token.map(RefreshToken::new),
            expires_at,
        })
    }
}

/// Extract a readable message from an auth or data API error body.
///
/// GoTrue uses `msg`, `error_description` or `message`; PostgREST uses
/// `message`.
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["msg", "error_description", "message"]
        .into_iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const OWNER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    #[rstest]
    #[case(r#""b0c1""#, "b0c1")]
    #[case("42", "42")]
    fn row_ids_accept_text_and_integers(#[case] raw: &str, #[case] expected: &str) {
        let body = format!(
            r#"[{{"id":{raw},"title":"Rust","url":"https://rust-lang.org",
                 "created_at":"2026-01-05T09:00:00.123456+00:00","user_id":"{OWNER}"}}]"#
        );
        let rows = decode_rows(body.as_bytes()).expect("rows decode");
        assert_eq!(rows[0].id.as_ref(), expected);
        assert_eq!(rows[0].user_id.as_ref(), OWNER);
    }

    #[rstest]
    fn rows_with_invalid_owner_fail() {
        let body = br#"[{"id":1,"title":"t","url":"u","created_at":"2026-01-05T09:00:00Z","user_id":"nope"}]"#;
        assert!(decode_rows(body).is_err());
    }

    #[rstest]
    fn token_response_reads_metadata_and_expiry() {
        let body = format!(
            r#"{{"access_token":"a","token_type":"bearer","expires_in":3600,
                 "refresh_token":"r","user":{{"id":"{OWNER}","email":"ada@example.com",
                 "user_metadata":{{"full_name":"Ada","avatar_url":"https://img/a.png"}}}}}}"#
        );
        let dto: TokenResponseDto = serde_json::from_str(&body).expect("decode");
        let now = Utc
            .with_ymd_and_hms(2026, 1, 5, 9, 0, 0)
            .single()
            .expect("ts");
        let session = dto.into_session(now).expect("session");
        assert_eq!(session.user.display_label(), "Ada");
        assert_eq!(session.expires_at, Some(now + Duration::hours(1)));
        assert_eq!(
            session.refresh_token.map(|t| t.expose().to_owned()),
            Some("r".into())
        );
    }

    #[rstest]
    #[case(br#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#.as_slice(), Some("Invalid login credentials"))]
    #[case(br#"{"code":"42501","message":"permission denied"}"#.as_slice(), Some("permission denied"))]
    #[case(b"<html>".as_slice(), None)]
    fn extracts_error_messages(#[case] body: &[u8], #[case] expected: Option<&str>) {
        assert_eq!(error_message(body).as_deref(), expected);
    }
}
