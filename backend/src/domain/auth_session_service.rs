//! Session lifecycle backed by the [`AuthGateway`] port.
//!
//! Cookie tokens are trusted only after the auth API confirms them. An
//! expired or rejected access token is exchanged once through the refresh
//! token; if that fails too the session is treated as signed out.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use super::ports::{AuthGateway, AuthGatewayError, SessionService};
use super::{AuthSession, Credentials, Error, ErrorCode, SessionTokens};

/// Message returned for rejected credentials.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password.";
const SIGN_IN_FAILED_MESSAGE: &str = "Unable to sign in. Please try again.";
const VERIFY_FAILED_MESSAGE: &str = "Unable to verify session.";
const SIGN_OUT_FAILED_MESSAGE: &str = "Unable to sign out cleanly.";

/// Implements [`SessionService`].
pub struct AuthSessionService<G> {
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
}

impl<G> AuthSessionService<G> {
    /// Build the service over an auth gateway and a clock used for token
    /// expiry checks.
    pub fn new(gateway: Arc<G>, clock: Arc<dyn Clock>) -> Self {
        Self { gateway, clock }
    }
}

impl<G> AuthSessionService<G>
where
    G: AuthGateway,
{
    async fn refresh(&self, tokens: &SessionTokens) -> Result<Option<AuthSession>, Error> {
        let Some(refresh_token) = tokens.refresh_token.as_ref() else {
            return Ok(None);
        };
        match self.gateway.refresh(refresh_token).await {
            Ok(session) if session.owner() == &tokens.user_id => {
                debug!(owner = %tokens.user_id, "session refreshed");
                Ok(Some(session))
            }
            Ok(session) => {
                warn!(
                    expected = %tokens.user_id,
                    actual = %session.owner(),
                    "refreshed session belongs to another user"
                );
                Ok(None)
            }
            Err(error) if error.code() == ErrorCode::Unauthorized => Ok(None),
            Err(error) => Err(surface(&error, VERIFY_FAILED_MESSAGE)),
        }
    }
}

fn surface(error: &AuthGatewayError, message: &str) -> Error {
    warn!(%error, "auth gateway call failed");
    Error::backend_failure(error.code(), message)
}

#[async_trait]
impl<G> SessionService for AuthSessionService<G>
where
    G: AuthGateway + 'static,
{
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, Error> {
        match self.gateway.sign_in(credentials).await {
            Ok(session) => {
                info!(owner = %session.owner(), "user signed in");
                Ok(session)
            }
            Err(AuthGatewayError::InvalidCredentials) => {
                Err(Error::unauthorized(INVALID_CREDENTIALS_MESSAGE))
            }
            Err(error) => Err(surface(&error, SIGN_IN_FAILED_MESSAGE)),
        }
    }

    async fn resume(&self, tokens: &SessionTokens) -> Result<Option<AuthSession>, Error> {
        if tokens.is_expired_at(self.clock.utc()) {
            return self.refresh(tokens).await;
        }

        let user = self
            .gateway
            .current_user(&tokens.access_token)
            .await
            .map_err(|error| surface(&error, VERIFY_FAILED_MESSAGE))?;
        match user {
            Some(user) if user.id == tokens.user_id => Ok(Some(AuthSession {
                user,
                access_token: tokens.access_token.clone(),
                refresh_token: tokens.refresh_token.clone(),
                expires_at: tokens.expires_at,
            })),
            Some(user) => {
                warn!(
                    expected = %tokens.user_id,
                    actual = %user.id,
                    "session token belongs to another user"
                );
                Ok(None)
            }
            None => self.refresh(tokens).await,
        }
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), Error> {
        self.gateway
            .sign_out(&session.access_token)
            .await
            .map_err(|error| surface(&error, SIGN_OUT_FAILED_MESSAGE))?;
        info!(owner = %session.owner(), "user signed out");
        Ok(())
    }
}

#[cfg(test)]
#[path = "auth_session_service_tests.rs"]
mod tests;
