//! Driving port for opening a live, reconciled bookmark list.

use async_trait::async_trait;

use crate::domain::{AuthSession, Error, LiveBookmarkList};

/// Opens the per-connection live list used by the WebSocket adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait(?Send)]
pub trait LiveBookmarks: Send + Sync {
    /// Subscribe to the owner's changes, then load the snapshot.
    async fn open(&self, session: &AuthSession) -> Result<LiveBookmarkList, Error>;
}
