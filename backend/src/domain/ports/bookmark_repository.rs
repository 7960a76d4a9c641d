//! Driven port for the hosted bookmarks table.

use async_trait::async_trait;

use crate::domain::{AuthSession, Bookmark, BookmarkId, NewBookmark};

use super::define_port_error;

define_port_error! {
    /// Failures raised by bookmark table adapters.
    pub enum BookmarkRepositoryError {
        /// The data API could not be reached or timed out.
        Connection { message: String } =>
            ServiceUnavailable: "bookmark store unreachable: {message}",
        /// The data API no longer accepts the session's access token.
        Unauthorized { message: String } =>
            Unauthorized: "bookmark store refused the session: {message}",
        /// The data API answered with another non-success status.
        Rejected { status: u16, message: String } =>
            InternalError: "bookmark store rejected the request ({status}): {message}",
        /// The response body did not decode into bookmark rows.
        Decode { message: String } =>
            InternalError: "bookmark store returned malformed rows: {message}",
    }
}

/// Row-level access to bookmarks. Every call is scoped to the session owner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// All of the owner's bookmarks, newest first.
    async fn list_for_owner(
        &self,
        session: &AuthSession,
    ) -> Result<Vec<Bookmark>, BookmarkRepositoryError>;

    /// Insert one row and return it with its backend-assigned id and
    /// timestamp.
    async fn insert(
        &self,
        session: &AuthSession,
        bookmark: &NewBookmark,
    ) -> Result<Bookmark, BookmarkRepositoryError>;

    /// Delete the owner's row with `id`. Deleting a missing row succeeds.
    async fn delete(
        &self,
        session: &AuthSession,
        id: &BookmarkId,
    ) -> Result<(), BookmarkRepositoryError>;
}
