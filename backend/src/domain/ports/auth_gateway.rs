//! Driven port for the hosted auth API.

use async_trait::async_trait;

use crate::domain::{AccessToken, AuthSession, Credentials, RefreshToken, User};

use super::define_port_error;

define_port_error! {
    /// Failures raised by auth API adapters.
    pub enum AuthGatewayError {
        /// The auth API could not be reached or timed out.
        Connection { message: String } =>
            ServiceUnavailable: "auth service unreachable: {message}",
        /// Email and password were not accepted.
        InvalidCredentials => Unauthorized: "invalid email or password",
        /// The refresh token was not accepted.
        SessionExpired => Unauthorized: "session expired",
        /// The auth API answered with another non-success status.
        Rejected { status: u16, message: String } =>
            InternalError: "auth service rejected the request ({status}): {message}",
        /// The response body did not decode.
        Decode { message: String } =>
            InternalError: "auth service returned a malformed payload: {message}",
    }
}

/// Password sign-in, token validation and sign-out against the auth API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange credentials for a session.
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AuthGatewayError>;

    /// Resolve the user behind `token`; `None` when the token is no longer
    /// accepted.
    async fn current_user(&self, token: &AccessToken) -> Result<Option<User>, AuthGatewayError>;

    /// Exchange a refresh token for a new session.
    async fn refresh(&self, token: &RefreshToken) -> Result<AuthSession, AuthGatewayError>;

    /// Revoke the session behind `token`.
    async fn sign_out(&self, token: &AccessToken) -> Result<(), AuthGatewayError>;
}
