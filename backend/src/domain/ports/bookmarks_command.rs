//! Driving port for bookmark mutations.
//!
//! HTTP and WebSocket adapters call this port with raw form input; the
//! implementation owns validation so every entry point applies the same
//! rules and messages.

use async_trait::async_trait;

use crate::domain::{AuthSession, Bookmark, BookmarkId, Error};

/// Add and delete use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookmarksCommand: Send + Sync {
    /// Validate the form input and insert one bookmark for the session
    /// owner. Invalid input fails with `invalid_request` before any network
    /// call.
    async fn add_bookmark(
        &self,
        session: &AuthSession,
        title: &str,
        url: &str,
    ) -> Result<Bookmark, Error>;

    /// Delete the owner's bookmark with `id`.
    async fn delete_bookmark(&self, session: &AuthSession, id: &BookmarkId) -> Result<(), Error>;
}
