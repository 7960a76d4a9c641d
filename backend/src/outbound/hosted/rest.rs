//! Reqwest-backed adapter for the hosted bookmarks table.
//!
//! Every call carries the project key and the session's bearer token; every
//! filter includes the owner so the adapter never relies on row-level
//! security alone.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use tracing::debug;

use super::dto::{decode_rows, error_message};
use super::{HostedBackendConfig, HostedConfigError, body_preview};
use crate::domain::ports::{BookmarkRepository, BookmarkRepositoryError};
use crate::domain::{AuthSession, Bookmark, BookmarkId, NewBookmark};

/// PostgREST implementation of [`BookmarkRepository`].
pub struct HostedBookmarkRepository {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl HostedBookmarkRepository {
    /// Build an adapter with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &HostedBackendConfig) -> Result<Self, HostedConfigError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: config.bookmarks_url()?,
            api_key: config.api_key().to_owned(),
        })
    }

    fn authorised(&self, builder: RequestBuilder, session: &AuthSession) -> RequestBuilder {
        builder
            .header("apikey", self.api_key.as_str())
            .bearer_auth(session.access_token.expose())
            .header(ACCEPT, "application/json")
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, BookmarkRepositoryError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl BookmarkRepository for HostedBookmarkRepository {
    async fn list_for_owner(
        &self,
        session: &AuthSession,
    ) -> Result<Vec<Bookmark>, BookmarkRepositoryError> {
        let request = self
            .authorised(self.client.get(self.endpoint.clone()), session)
            .query(&[
                ("select", "*".to_owned()),
                ("user_id", eq(session.owner().as_ref())),
                ("order", "created_at.desc".to_owned()),
            ]);
        let body = self.execute(request).await?;
        let rows = decode_rows(&body).map_err(BookmarkRepositoryError::decode)?;
        debug!(owner = %session.owner(), rows = rows.len(), "bookmarks fetched");
        Ok(rows)
    }

    async fn insert(
        &self,
        session: &AuthSession,
        bookmark: &NewBookmark,
    ) -> Result<Bookmark, BookmarkRepositoryError> {
        let request = self
            .authorised(self.client.post(self.endpoint.clone()), session)
            .header("Prefer", "return=representation")
            .json(&[bookmark]);
        let body = self.execute(request).await?;
        decode_rows(&body)
            .map_err(BookmarkRepositoryError::decode)?
            .into_iter()
            .next()
            .ok_or_else(|| BookmarkRepositoryError::decode("insert returned no row"))
    }

    async fn delete(
        &self,
        session: &AuthSession,
        id: &BookmarkId,
    ) -> Result<(), BookmarkRepositoryError> {
        let request = self
            .authorised(self.client.delete(self.endpoint.clone()), session)
            .query(&[
                ("id", eq(id.as_ref())),
                ("user_id", eq(session.owner().as_ref())),
            ]);
        self.execute(request).await?;
        debug!(owner = %session.owner(), %id, "bookmark delete accepted");
        Ok(())
    }
}

fn map_transport_error(error: reqwest::Error) -> BookmarkRepositoryError {
    BookmarkRepositoryError::connection(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> BookmarkRepositoryError {
    let message = error_message(body).unwrap_or_else(|| body_preview(body));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BookmarkRepositoryError::unauthorized(message)
        }
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            BookmarkRepositoryError::connection(format!("status {}: {message}", status.as_u16()))
        }
        _ => BookmarkRepositoryError::rejected(status.as_u16(), message),
    }
}
