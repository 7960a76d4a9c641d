//! HTTP server configuration object.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use url::Url;

use crate::inbound::http::state::DEFAULT_ENTRY_PATH;

use super::state_builders::ServicePorts;

/// Everything [`create_server`](super::create_server) needs to listen.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) ports: ServicePorts,
    pub(crate) entry_path: String,
    pub(crate) allowed_origins: Vec<Url>,
}

impl ServerConfig {
    /// Construct a configuration with the default entry path and no allowed
    /// WebSocket origins.
    #[must_use]
    pub fn new(
        key: Key,
        cookie_secure: bool,
        same_site: SameSite,
        bind_addr: SocketAddr,
        ports: ServicePorts,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            ports,
            entry_path: DEFAULT_ENTRY_PATH.to_owned(),
            allowed_origins: Vec::new(),
        }
    }

    /// Page signed-out browsers are redirected to.
    #[must_use]
    pub fn with_entry_path(mut self, path: impl Into<String>) -> Self {
        self.entry_path = path.into();
        self
    }

    /// Origins allowed to open the live list socket.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<Url>) -> Self {
        self.allowed_origins = origins;
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
