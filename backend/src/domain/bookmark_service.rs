//! Bookmark use-cases backed by the [`BookmarkRepository`] port.
//!
//! Validation runs before the repository is touched, so rejected form input
//! never reaches the network. Repository failures are logged with their
//! detail and surfaced to clients as fixed, generic messages. Nothing is
//! retried.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use super::ports::{BookmarkRepository, BookmarkRepositoryError, BookmarksCommand, BookmarksQuery};
use super::{
    AuthSession, Bookmark, BookmarkDraft, BookmarkFormError, BookmarkId, Error, SAVE_FAILED_MESSAGE,
};

/// Message surfaced when a delete call fails.
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete bookmark. Please try again.";
/// Message surfaced when the snapshot fetch fails.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to load bookmarks.";

/// Implements [`BookmarksCommand`] and [`BookmarksQuery`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use bookmark_backend::domain::BookmarkService;
/// use bookmark_backend::outbound::memory::InMemoryBackend;
///
/// let service = BookmarkService::new(Arc::new(InMemoryBackend::default()));
/// # let _ = service;
/// ```
pub struct BookmarkService<R> {
    repository: Arc<R>,
}

impl<R> BookmarkService<R> {
    /// Build the service over a repository adapter.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R> Clone for BookmarkService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

pub(crate) fn form_error(error: BookmarkFormError) -> Error {
    let code = match error {
        BookmarkFormError::MissingFields => "missing_fields",
        BookmarkFormError::InvalidUrl => "invalid_url",
    };
    Error::invalid_request(error.to_string()).with_details(json!({ "code": code }))
}

fn surface(error: &BookmarkRepositoryError, message: &str) -> Error {
    Error::backend_failure(error.code(), message)
}

#[async_trait]
impl<R> BookmarksCommand for BookmarkService<R>
where
    R: BookmarkRepository + 'static,
{
    async fn add_bookmark(
        &self,
        session: &AuthSession,
        title: &str,
        url: &str,
    ) -> Result<Bookmark, Error> {
        let draft = BookmarkDraft::parse(title, url).map_err(form_error)?;
        let payload = draft.owned_by(session.owner().clone());
        let saved = self
            .repository
            .insert(session, &payload)
            .await
            .map_err(|error| {
                warn!(owner = %session.owner(), %error, "bookmark insert failed");
                surface(&error, SAVE_FAILED_MESSAGE)
            })?;
        debug!(owner = %session.owner(), id = %saved.id, "bookmark inserted");
        Ok(saved)
    }

    async fn delete_bookmark(&self, session: &AuthSession, id: &BookmarkId) -> Result<(), Error> {
        self.repository.delete(session, id).await.map_err(|error| {
            warn!(owner = %session.owner(), %id, %error, "bookmark delete failed");
            surface(&error, DELETE_FAILED_MESSAGE)
        })
    }
}

#[async_trait]
impl<R> BookmarksQuery for BookmarkService<R>
where
    R: BookmarkRepository + 'static,
{
    async fn list_bookmarks(&self, session: &AuthSession) -> Result<Vec<Bookmark>, Error> {
        self.repository
            .list_for_owner(session)
            .await
            .map_err(|error| {
                warn!(owner = %session.owner(), %error, "bookmark fetch failed");
                surface(&error, FETCH_FAILED_MESSAGE)
            })
    }
}

#[cfg(test)]
#[path = "bookmark_service_tests.rs"]
mod tests;
