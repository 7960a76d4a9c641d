//! Bookmark records, the add-form draft and live change notifications.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use super::UserId;

/// Message shown when either form field is blank.
pub const MISSING_FIELDS_MESSAGE: &str = "Both URL and title are required.";
/// Message shown when the normalised URL does not parse.
pub const INVALID_URL_MESSAGE: &str = "Please enter a valid URL.";
/// Message shown when the insert call fails.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save bookmark. Please try again.";

/// Backend-assigned bookmark identifier.
///
/// Opaque to the application: rows may carry UUIDs or integers, both are
/// kept as text and only compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookmarkId(String);

/// Raised when a bookmark id is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("bookmark id must not be empty")]
pub struct EmptyBookmarkId;

impl BookmarkId {
    /// Validate and wrap an identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, EmptyBookmarkId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(EmptyBookmarkId);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for BookmarkId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<BookmarkId> for String {
    fn from(value: BookmarkId) -> Self {
        value.0
    }
}

impl TryFrom<String> for BookmarkId {
    type Error = EmptyBookmarkId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A saved link owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Backend-assigned identifier.
    #[schema(value_type = String, example = "42")]
    pub id: BookmarkId,
    /// Title as entered.
    pub title: String,
    /// Normalised URL as entered.
    pub url: String,
    /// Backend-assigned creation time; drives newest-first ordering.
    pub created_at: DateTime<Utc>,
    /// Owner.
    #[schema(value_type = String)]
    pub user_id: UserId,
}

/// Reasons the add form rejects input before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BookmarkFormError {
    /// Title or URL was blank.
    #[error("{}", MISSING_FIELDS_MESSAGE)]
    MissingFields,
    /// The normalised URL is not an absolute URL.
    #[error("{}", INVALID_URL_MESSAGE)]
    InvalidUrl,
}

/// Validated add-form input.
///
/// # Examples
/// ```
/// use bookmark_backend::domain::BookmarkDraft;
///
/// let draft = BookmarkDraft::parse("Rust", "rust-lang.org").unwrap();
/// assert_eq!(draft.url(), "https://rust-lang.org");
/// assert!(BookmarkDraft::parse("", "rust-lang.org").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkDraft {
    title: String,
    url: String,
}

impl BookmarkDraft {
    /// Apply the form rules: both fields required, then prefix `https://`
    /// unless the URL already starts with `http`, then require the result
    /// to parse as an absolute URL.
    pub fn parse(title: &str, url: &str) -> Result<Self, BookmarkFormError> {
        let title = title.trim();
        let url = url.trim();
        if title.is_empty() || url.is_empty() {
            return Err(BookmarkFormError::MissingFields);
        }

        let normalised = if url.starts_with("http") {
            url.to_owned()
        } else {
            format!("https://{url}")
        };
        Url::parse(&normalised).map_err(|_| BookmarkFormError::InvalidUrl)?;

        Ok(Self {
            title: title.to_owned(),
            url: normalised,
        })
    }

    /// Trimmed title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Normalised URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Attach the owner to produce an insert payload.
    pub fn owned_by(self, user_id: UserId) -> NewBookmark {
        NewBookmark {
            title: self.title,
            url: self.url,
            user_id,
        }
    }
}

/// Insert payload sent to the bookmarks table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBookmark {
    /// Title.
    pub title: String,
    /// Normalised URL.
    pub url: String,
    /// Owner.
    pub user_id: UserId,
}

/// One live notification from the change feed.
///
/// Inserts and updates carry the full row. Deletes carry only the primary
/// key because the feed cannot filter deleted rows by owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkChange {
    /// A row was inserted.
    Inserted(Bookmark),
    /// A row was updated.
    Updated(Bookmark),
    /// A row was deleted.
    Deleted {
        /// Primary key of the removed row.
        id: BookmarkId,
    },
}
