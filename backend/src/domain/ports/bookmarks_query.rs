//! Driving port for reading the owner's bookmarks.

use async_trait::async_trait;

use crate::domain::{AuthSession, Bookmark, Error};

/// Snapshot read used by the dashboard and the JSON API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookmarksQuery: Send + Sync {
    /// Every bookmark owned by the session user, newest first.
    async fn list_bookmarks(&self, session: &AuthSession) -> Result<Vec<Bookmark>, Error>;
}
