//! Application settings loaded via OrthoConfig.
//!
//! Every value can come from the command line or a `BOOKMARKS_*`
//! environment variable. Leaving the hosted backend URL unset runs the
//! service against the in-memory backend.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::inbound::http::state::DEFAULT_ENTRY_PATH;
use crate::outbound::hosted::{HostedBackendConfig, HostedConfigError};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

/// Reasons the settings cannot be turned into a running server.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid bind address {value}: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid hosted backend URL {value}: {source}")]
    BackendUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("BOOKMARKS_BACKEND_API_KEY must be set when a backend URL is configured")]
    MissingApiKey,
    #[error("request timeout must be at least one second")]
    ZeroTimeout,
    #[error("invalid allowed origin {value}: {source}")]
    Origin {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("entry path must start with '/', got {0}")]
    EntryPath(String),
    #[error(transparent)]
    Hosted(#[from] HostedConfigError),
}

/// Process configuration.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BOOKMARKS")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Hosted backend project URL.
    pub backend_url: Option<String>,
    /// Public (anon) API key of the hosted backend.
    pub backend_api_key: Option<String>,
    /// Timeout applied to every outbound HTTP call.
    pub request_timeout_secs: Option<u64>,
    /// Where signed-out browsers are sent.
    pub entry_path: Option<String>,
    /// Comma-separated origins allowed to open the live list socket.
    pub allowed_origins: Option<String>,
}

impl AppSettings {
    /// Listen address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| SettingsError::BindAddr {
            value: raw.to_owned(),
            source,
        })
    }

    pub fn request_timeout(&self) -> Result<Duration, SettingsError> {
        match self
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
        {
            0 => Err(SettingsError::ZeroTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    pub fn entry_path(&self) -> Result<String, SettingsError> {
        let path = self
            .entry_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .unwrap_or(DEFAULT_ENTRY_PATH);
        if path.starts_with('/') {
            Ok(path.to_owned())
        } else {
            Err(SettingsError::EntryPath(path.to_owned()))
        }
    }

    pub fn allowed_origins(&self) -> Result<Vec<Url>, SettingsError> {
        self.allowed_origins
            .as_deref()
            .unwrap_or(DEFAULT_ALLOWED_ORIGINS)
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                Url::parse(origin).map_err(|source| SettingsError::Origin {
                    value: origin.to_owned(),
                    source,
                })
            })
            .collect()
    }

    /// Hosted backend connection, or `None` to use the in-memory backend.
    pub fn hosted_backend(&self) -> Result<Option<HostedBackendConfig>, SettingsError> {
        let Some(raw) = self.backend_url.as_deref().map(str::trim) else {
            return Ok(None);
        };
        let url = Url::parse(raw).map_err(|source| SettingsError::BackendUrl {
            value: raw.to_owned(),
            source,
        })?;
        let key = self
            .backend_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(SettingsError::MissingApiKey)?;
        let config = HostedBackendConfig::new(url, key, self.request_timeout()?)?;
        Ok(Some(config))
    }
}
