//! Shared WebSocket adapter state.
//!
//! The upgrade handler resolves the cookie session through `sessions`; each
//! connection then drives `live` and `bookmarks` with that explicit session
//! and re-validates it through `sessions` while open.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use url::{Origin, Url};

use crate::domain::ports::{BookmarksCommand, LiveBookmarks, SessionService};

/// Port implementations handed to [`WsState::new`].
#[derive(Clone)]
pub struct WsStatePorts {
    pub sessions: Arc<dyn SessionService>,
    pub live: Arc<dyn LiveBookmarks>,
    pub bookmarks: Arc<dyn BookmarksCommand>,
}

/// Dependency bundle for the `/ws` upgrade handler and its sessions.
#[derive(Clone)]
pub struct WsState {
    pub sessions: Arc<dyn SessionService>,
    pub live: Arc<dyn LiveBookmarks>,
    pub bookmarks: Arc<dyn BookmarksCommand>,
    pub clock: Arc<dyn Clock>,
    allowed_origins: Vec<Origin>,
}

impl WsState {
    /// Construct state accepting upgrades from `allowed_origins` only.
    pub fn new(ports: WsStatePorts, allowed_origins: &[Url]) -> Self {
        let WsStatePorts {
            sessions,
            live,
            bookmarks,
        } = ports;
        Self {
            sessions,
            live,
            bookmarks,
            clock: Arc::new(DefaultClock),
            allowed_origins: allowed_origins.iter().map(Url::origin).collect(),
        }
    }

    /// Whether browsers on `origin` may open the socket.
    ///
    /// Scheme, host and port must all match a configured origin.
    pub fn allows(&self, origin: &Url) -> bool {
        let origin = origin.origin();
        origin.is_tuple() && self.allowed_origins.contains(&origin)
    }
}
