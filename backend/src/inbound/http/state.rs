//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see driving ports, so
//! they can be tested against mocks without network access.

use std::sync::Arc;

use crate::domain::ports::{BookmarksCommand, BookmarksQuery, SessionService};

/// Default page unauthenticated browsers are sent to.
pub const DEFAULT_ENTRY_PATH: &str = "/";

/// Port implementations handed to [`HttpState::new`].
#[derive(Clone)]
pub struct HttpStatePorts {
    pub sessions: Arc<dyn SessionService>,
    pub bookmarks: Arc<dyn BookmarksCommand>,
    pub bookmarks_query: Arc<dyn BookmarksQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub sessions: Arc<dyn SessionService>,
    pub bookmarks: Arc<dyn BookmarksCommand>,
    pub bookmarks_query: Arc<dyn BookmarksQuery>,
    entry_path: String,
}

impl HttpState {
    /// Construct state from the port bundle, redirecting signed-out
    /// browsers to [`DEFAULT_ENTRY_PATH`].
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            sessions,
            bookmarks,
            bookmarks_query,
        } = ports;
        Self {
            sessions,
            bookmarks,
            bookmarks_query,
            entry_path: DEFAULT_ENTRY_PATH.to_owned(),
        }
    }

    /// Override the entry page used for sign-in redirects.
    #[must_use]
    pub fn with_entry_path(mut self, path: impl Into<String>) -> Self {
        self.entry_path = path.into();
        self
    }

    /// Page signed-out browsers and signed-out sessions are sent to.
    pub fn entry_path(&self) -> &str {
        &self.entry_path
    }
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
