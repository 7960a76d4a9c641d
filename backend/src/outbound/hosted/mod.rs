//! Adapters for the hosted backend-as-a-service.
//!
//! The data API (PostgREST) and auth API (GoTrue) are reached with
//! `reqwest`; the realtime socket (Phoenix channels) with `awc`. All three
//! share one project URL and public API key.

mod auth;
mod dto;
mod realtime;
mod rest;

use std::time::Duration;

use url::Url;

pub use auth::HostedAuthGateway;
pub use realtime::HostedChangeFeed;
pub use rest::HostedBookmarkRepository;

const REST_BOOKMARKS_PATH: &str = "rest/v1/bookmarks";
const AUTH_PATH: &str = "auth/v1/";
const REALTIME_PATH: &str = "realtime/v1/websocket";
const REALTIME_PROTOCOL_VERSION: &str = "1.0.0";

/// Raised while preparing the hosted adapters.
#[derive(Debug, thiserror::Error)]
pub enum HostedConfigError {
    /// The URL scheme is neither `http` nor `https`.
    #[error("hosted backend URL must use http or https, got {0}")]
    UnsupportedScheme(String),
    /// The URL cannot carry a path.
    #[error("hosted backend URL cannot be a base: {0}")]
    NotABase(String),
    /// An endpoint URL could not be derived from the project URL.
    #[error("invalid hosted endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Connection settings shared by every hosted adapter.
#[derive(Debug, Clone)]
pub struct HostedBackendConfig {
    base_url: Url,
    api_key: String,
    timeout: Duration,
}

impl HostedBackendConfig {
    /// Validate the project URL and capture the key and request timeout.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use bookmark_backend::outbound::hosted::HostedBackendConfig;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://demo.supabase.co").unwrap();
    /// let config = HostedBackendConfig::new(url, "anon", Duration::from_secs(10)).unwrap();
    /// assert_eq!(
    ///     config.realtime_url().unwrap().as_str(),
    ///     "wss://demo.supabase.co/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
    /// );
    /// ```
    pub fn new(
        mut base_url: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, HostedConfigError> {
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(HostedConfigError::UnsupportedScheme(
                base_url.scheme().to_owned(),
            ));
        }
        if base_url.cannot_be_a_base() {
            return Err(HostedConfigError::NotABase(base_url.to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        base_url.set_query(None);
        base_url.set_fragment(None);
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            timeout,
        })
    }

    /// Public (anon) API key sent with every call.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn bookmarks_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(REST_BOOKMARKS_PATH)
    }

    pub(crate) fn auth_url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(AUTH_PATH)?.join(endpoint)
    }

    /// Realtime socket URL with the `ws`/`wss` scheme matching the project
    /// URL's `http`/`https` scheme.
    pub fn realtime_url(&self) -> Result<Url, url::ParseError> {
        let mut url = self.base_url.join(REALTIME_PATH)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // Both are special schemes, so the swap cannot fail.
        let _ = url.set_scheme(scheme);
        url.query_pairs_mut()
            .append_pair("apikey", &self.api_key)
            .append_pair("vsn", REALTIME_PROTOCOL_VERSION);
        Ok(url)
    }
}

/// Collapse whitespace and truncate a response body for log and error
/// messages.
pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
