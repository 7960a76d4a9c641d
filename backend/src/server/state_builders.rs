//! Builders wiring domain services over the selected backend adapters.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::info;
use url::Url;

use crate::domain::ports::{
    AuthGateway, BookmarkRepository, BookmarksCommand, BookmarksQuery, ChangeFeed, LiveBookmarks,
    SessionService,
};
use crate::domain::{AuthSessionService, BookmarkService, LiveBookmarksService};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::inbound::ws::state::{WsState, WsStatePorts};
use crate::outbound::hosted::{
    HostedAuthGateway, HostedBackendConfig, HostedBookmarkRepository, HostedChangeFeed,
    HostedConfigError,
};
use crate::outbound::memory::InMemoryBackend;

/// Driving ports shared by the HTTP and WebSocket adapters.
#[derive(Clone)]
pub struct ServicePorts {
    pub sessions: Arc<dyn SessionService>,
    pub bookmarks: Arc<dyn BookmarksCommand>,
    pub bookmarks_query: Arc<dyn BookmarksQuery>,
    pub live: Arc<dyn LiveBookmarks>,
}

impl ServicePorts {
    /// Services over the hosted backend when configured, otherwise over a
    /// fresh in-memory backend.
    pub fn from_backend(backend: Option<&HostedBackendConfig>) -> Result<Self, HostedConfigError> {
        match backend {
            Some(config) => Self::hosted(config),
            None => {
                info!("no hosted backend configured; using the in-memory backend");
                Ok(Self::in_memory(Arc::new(InMemoryBackend::default())))
            }
        }
    }

    /// Services over the hosted data, auth and realtime APIs.
    pub fn hosted(config: &HostedBackendConfig) -> Result<Self, HostedConfigError> {
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        let auth = Arc::new(HostedAuthGateway::new(config, clock.clone())?);
        let repository = Arc::new(HostedBookmarkRepository::new(config)?);
        let feed: Arc<dyn ChangeFeed> = Arc::new(HostedChangeFeed::new(config)?);
        Ok(Self::over(auth, repository, feed, clock))
    }

    /// Services sharing one in-memory backend for auth, rows and changes.
    pub fn in_memory(backend: Arc<InMemoryBackend>) -> Self {
        let feed: Arc<dyn ChangeFeed> = backend.clone();
        Self::over(backend.clone(), backend, feed, Arc::new(DefaultClock))
    }

    fn over<G, R>(
        auth: Arc<G>,
        repository: Arc<R>,
        feed: Arc<dyn ChangeFeed>,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        G: AuthGateway + 'static,
        R: BookmarkRepository + 'static,
    {
        let bookmarks = Arc::new(BookmarkService::new(repository.clone()));
        Self {
            sessions: Arc::new(AuthSessionService::new(auth, clock)),
            bookmarks: bookmarks.clone(),
            bookmarks_query: bookmarks,
            live: Arc::new(LiveBookmarksService::new(feed, repository)),
        }
    }
}

pub(super) fn build_http_state(ports: &ServicePorts, entry_path: &str) -> web::Data<HttpState> {
    let state = HttpState::new(HttpStatePorts {
        sessions: ports.sessions.clone(),
        bookmarks: ports.bookmarks.clone(),
        bookmarks_query: ports.bookmarks_query.clone(),
    })
    .with_entry_path(entry_path);
    web::Data::new(state)
}

pub(super) fn build_ws_state(ports: &ServicePorts, allowed_origins: &[Url]) -> web::Data<WsState> {
    web::Data::new(WsState::new(
        WsStatePorts {
            sessions: ports.sessions.clone(),
            live: ports.live.clone(),
            bookmarks: ports.bookmarks.clone(),
        },
        allowed_origins,
    ))
}
