//! Driving port for sign-in, session resumption and sign-out.

use async_trait::async_trait;

use crate::domain::{AuthSession, Credentials, Error, SessionTokens};

/// Session lifecycle use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Authenticate with email and password.
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, Error>;

    /// Rebuild a session from cookie tokens. Returns `None` when the tokens
    /// are no longer accepted and cannot be refreshed.
    async fn resume(&self, tokens: &SessionTokens) -> Result<Option<AuthSession>, Error>;

    /// Revoke the session with the auth API.
    async fn sign_out(&self, session: &AuthSession) -> Result<(), Error>;
}
