//! Reqwest-backed adapter for the hosted auth API.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::json;
use tracing::debug;

use super::dto::{TokenResponseDto, UserDto, error_message};
use super::{HostedBackendConfig, HostedConfigError, body_preview};
use crate::domain::ports::{AuthGateway, AuthGatewayError};
use crate::domain::{AccessToken, AuthSession, Credentials, RefreshToken, User};

/// Which call a failing status belongs to; the auth API reuses 400 for
/// both bad passwords and dead refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthCall {
    PasswordGrant,
    RefreshGrant,
    Other,
}

/// GoTrue implementation of [`AuthGateway`].
pub struct HostedAuthGateway {
    client: Client,
    password_grant: Url,
    refresh_grant: Url,
    user: Url,
    logout: Url,
    api_key: String,
    clock: Arc<dyn Clock>,
}

impl HostedAuthGateway {
    /// Build an adapter with the configured request timeout. `clock` turns
    /// relative token lifetimes into expiry instants.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        config: &HostedBackendConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, HostedConfigError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            password_grant: config.auth_url("token?grant_type=password")?,
            refresh_grant: config.auth_url("token?grant_type=refresh_token")?,
            user: config.auth_url("user")?,
            logout: config.auth_url("logout")?,
            api_key: config.api_key().to_owned(),
            clock,
        })
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", self.api_key.as_str())
            .header(ACCEPT, "application/json")
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        call: AuthCall,
    ) -> Result<Vec<u8>, AuthGatewayError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(call, status, body.as_ref()));
        }
        Ok(body.to_vec())
    }

    async fn token_grant(
        &self,
        url: &Url,
        body: serde_json::Value,
        call: AuthCall,
    ) -> Result<AuthSession, AuthGatewayError> {
        let request = self.request(self.client.post(url.clone())).json(&body);
        let body = self.execute(request, call).await?;
        let dto: TokenResponseDto = serde_json::from_slice(&body)
            .map_err(|err| AuthGatewayError::decode(format!("invalid token response: {err}")))?;
        dto.into_session(self.clock.utc())
            .map_err(AuthGatewayError::decode)
    }
}

#[async_trait]
impl AuthGateway for HostedAuthGateway {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AuthGatewayError> {
        let body = json!({
            "email": credentials.email(),
            "password": credentials.password(),
        });
        self.token_grant(&self.password_grant, body, AuthCall::PasswordGrant)
            .await
    }

    async fn current_user(&self, token: &AccessToken) -> Result<Option<User>, AuthGatewayError> {
        let request = self
            .request(self.client.get(self.user.clone()))
            .bearer_auth(token.expose());
        let body = match self.execute(request, AuthCall::Other).await {
            Ok(body) => body,
            Err(AuthGatewayError::SessionExpired) => return Ok(None),
            Err(error) => return Err(error),
        };
        let dto: UserDto = serde_json::from_slice(&body)
            .map_err(|err| AuthGatewayError::decode(format!("invalid user record: {err}")))?;
        dto.into_domain()
            .map(Some)
            .map_err(AuthGatewayError::decode)
    }

    async fn refresh(&self, token: &RefreshToken) -> Result<AuthSession, AuthGatewayError> {
        let body = json!({ "refresh_token": token.expose() });
        let session = self
            .token_grant(&self.refresh_grant, body, AuthCall::RefreshGrant)
            .await?;
        debug!(owner = %session.owner(), "access token refreshed");
        Ok(session)
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), AuthGatewayError> {
        let request = self
            .request(self.client.post(self.logout.clone()))
            .bearer_auth(token.expose());
        match self.execute(request, AuthCall::Other).await {
            // A token the API no longer accepts is already signed out.
            Ok(_) | Err(AuthGatewayError::SessionExpired) => Ok(()),
            Err(error) => Err(error),
        }
    }
}

fn map_transport_error(error: reqwest::Error) -> AuthGatewayError {
    AuthGatewayError::connection(error.to_string())
}

fn map_status_error(call: AuthCall, status: StatusCode, body: &[u8]) -> AuthGatewayError {
    let message = error_message(body).unwrap_or_else(|| body_preview(body));
    match (call, status) {
        (AuthCall::PasswordGrant, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) => {
            AuthGatewayError::invalid_credentials()
        }
        (AuthCall::RefreshGrant, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED)
        | (
            AuthCall::Other,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND,
        ) => AuthGatewayError::session_expired(),
        (
            _,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT,
        ) => AuthGatewayError::connection(format!("status {}: {message}", status.as_u16())),
        _ => AuthGatewayError::rejected(status.as_u16(), message),
    }
}
