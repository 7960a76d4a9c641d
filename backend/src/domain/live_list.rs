//! Live bookmark list: a snapshot reconciled with the owner's change feed.
//!
//! The feed is subscribed before the snapshot is fetched so no change
//! committed during the fetch is lost. Changes that also appear in the
//! snapshot are absorbed by [`BookmarkList`]'s id-based duplicate
//! suppression.

use std::future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ports::{BookmarkRepository, ChangeFeed, ChangeSubscription, LiveBookmarks};
use super::{
    AccessToken, AuthSession, Bookmark, BookmarkId, BookmarkList, Error, FETCH_FAILED_MESSAGE,
    ListChange,
};

/// Message surfaced when the change feed cannot be joined or ends.
pub const LIVE_UNAVAILABLE_MESSAGE: &str = "Live updates are unavailable.";

/// One connection's reconciled list plus its change subscription.
///
/// Degraded starts are not fatal: without a subscription the list is
/// static, and without a snapshot it starts empty. Either case queues a
/// notice for the client.
#[derive(Debug)]
pub struct LiveBookmarkList {
    list: BookmarkList,
    subscription: Option<ChangeSubscription>,
    notices: Vec<Error>,
}

impl LiveBookmarkList {
    /// Assemble a list from an already fetched snapshot and an optional
    /// subscription.
    pub fn new(list: BookmarkList, subscription: Option<ChangeSubscription>) -> Self {
        Self {
            list,
            subscription,
            notices: Vec::new(),
        }
    }

    /// Current entries, newest first.
    pub fn entries(&self) -> &[Bookmark] {
        self.list.entries()
    }

    /// Underlying list state.
    pub fn list(&self) -> &BookmarkList {
        &self.list
    }

    /// Whether changes are still being received.
    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    /// Queue a client-facing notice.
    pub fn push_notice(&mut self, notice: Error) {
        self.notices.push(notice);
    }

    /// Drain queued notices.
    pub fn take_notices(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.notices)
    }

    /// Wait for the next feed change and apply it.
    ///
    /// Returns `None` once when the feed ends; the list is then static and
    /// later calls never resolve. Cancel safe.
    pub async fn next_change(&mut self) -> Option<ListChange> {
        let Some(subscription) = self.subscription.as_mut() else {
            return future::pending().await;
        };
        match subscription.next_change().await {
            Some(change) => Some(self.list.apply(change)),
            None => {
                debug!(owner = %self.list.owner(), "change feed ended");
                self.subscription = None;
                None
            }
        }
    }

    /// Apply a row returned by a local insert ahead of its feed echo.
    pub fn apply_local_insert(&mut self, bookmark: Bookmark) -> ListChange {
        self.list.insert(bookmark)
    }

    /// Remove a row deleted locally ahead of its feed echo.
    pub fn remove_local(&mut self, id: &BookmarkId) -> ListChange {
        self.list.remove(id)
    }

    /// Keep the feed authorised after the session's tokens were refreshed.
    pub fn renew(&self, token: &AccessToken) {
        if let Some(subscription) = self.subscription.as_ref() {
            subscription.renew(token);
        }
    }

    /// Release the subscription. No change is observed afterwards.
    pub fn close(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

/// Implements [`LiveBookmarks`] over the change feed and repository ports.
pub struct LiveBookmarksService<R> {
    feed: Arc<dyn ChangeFeed>,
    repository: Arc<R>,
}

impl<R> LiveBookmarksService<R> {
    /// Build the service.
    pub fn new(feed: Arc<dyn ChangeFeed>, repository: Arc<R>) -> Self {
        Self { feed, repository }
    }
}

#[async_trait(?Send)]
impl<R> LiveBookmarks for LiveBookmarksService<R>
where
    R: BookmarkRepository + 'static,
{
    async fn open(&self, session: &AuthSession) -> Result<LiveBookmarkList, Error> {
        let owner = session.owner();
        let mut notices = Vec::new();

        let subscription = match self.feed.subscribe(session).await {
            Ok(subscription) => Some(subscription),
            Err(error) => {
                warn!(%owner, %error, "change feed subscription failed");
                notices.push(Error::backend_failure(
                    error.code(),
                    LIVE_UNAVAILABLE_MESSAGE,
                ));
                None
            }
        };

        let list = match self.repository.list_for_owner(session).await {
            Ok(rows) => BookmarkList::from_snapshot(owner.clone(), rows),
            Err(error) => {
                warn!(%owner, %error, "bookmark snapshot fetch failed");
                notices.push(Error::backend_failure(error.code(), FETCH_FAILED_MESSAGE));
                BookmarkList::new(owner.clone())
            }
        };
        debug!(%owner, entries = list.len(), live = subscription.is_some(), "live list opened");

        let mut live = LiveBookmarkList::new(list, subscription);
        for notice in notices {
            live.push_notice(notice);
        }
        Ok(live)
    }
}
