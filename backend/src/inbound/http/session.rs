//! Cookie session access for HTTP and WebSocket handlers.
//!
//! The encrypted cookie holds the hosted backend's tokens. Handlers turn
//! them into an explicit [`AuthSession`] with [`SessionContext::resolve`]
//! and pass that value to every port call.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use chrono::DateTime;
use futures_util::future::LocalBoxFuture;
use tracing::{debug, warn};

use crate::domain::ports::SessionService;
use crate::domain::{AccessToken, AuthSession, Error, RefreshToken, SessionTokens, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const ACCESS_TOKEN_KEY: &str = "access_token";
pub(crate) const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub(crate) const EXPIRES_AT_KEY: &str = "expires_at";

/// Message for requests that need a signed-in user.
pub const LOGIN_REQUIRED_MESSAGE: &str = "login required";

/// Newtype over the Actix session exposing token persistence.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap an Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store the session's tokens in the cookie.
    pub fn persist(&self, session: &AuthSession) -> Result<(), Error> {
        let tokens = session.tokens();
        self.insert(USER_ID_KEY, tokens.user_id.as_ref())?;
        self.insert(ACCESS_TOKEN_KEY, tokens.access_token.expose())?;
        match &tokens.refresh_token {
            Some(token) => self.insert(REFRESH_TOKEN_KEY, token.expose())?,
            None => {
                self.0.remove(REFRESH_TOKEN_KEY);
            }
        }
        match tokens.expires_at {
            Some(expiry) => self.insert(EXPIRES_AT_KEY, expiry.timestamp())?,
            None => {
                self.0.remove(EXPIRES_AT_KEY);
            }
        }
        self.0.renew();
        Ok(())
    }

    /// Tokens stored in the cookie, if a complete set is present.
    ///
    /// A cookie with an unparseable owner id is treated as signed out.
    pub fn tokens(&self) -> Result<Option<SessionTokens>, Error> {
        let Some(raw_id) = self.get::<String>(USER_ID_KEY)? else {
            return Ok(None);
        };
        let Some(access) = self.get::<String>(ACCESS_TOKEN_KEY)? else {
            return Ok(None);
        };
        let user_id = match UserId::new(raw_id) {
            Ok(id) => id,
            Err(error) => {
                warn!(%error, "discarding session with an invalid user id");
                return Ok(None);
            }
        };
        let refresh_token = self
            .get::<String>(REFRESH_TOKEN_KEY)?
            .map(RefreshToken::new);
        let expires_at = self
            .get::<i64>(EXPIRES_AT_KEY)?
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        Ok(Some(SessionTokens {
            user_id,
            access_token: AccessToken::new(access),
            refresh_token,
            expires_at,
        }))
    }

    /// Drop every value and expire the cookie.
    pub fn purge(&self) {
        self.0.purge();
    }

    /// Resolve the signed-in user for this request.
    ///
    /// Refreshed tokens are written back to the cookie; tokens the auth API
    /// no longer accepts clear the cookie and yield `None`.
    pub async fn resolve(
        &self,
        sessions: &dyn SessionService,
    ) -> Result<Option<AuthSession>, Error> {
        let Some(tokens) = self.tokens()? else {
            return Ok(None);
        };
        match sessions.resume(&tokens).await? {
            Some(session) => {
                if session.tokens() != tokens {
                    debug!(user_id = %session.owner(), "persisting refreshed tokens");
                    self.persist(&session)?;
                }
                Ok(Some(session))
            }
            None => {
                debug!(user_id = %tokens.user_id, "stored session no longer valid");
                self.purge();
                Ok(None)
            }
        }
    }

    /// Resolve the signed-in user or fail with `401 Unauthorized`.
    pub async fn require(&self, sessions: &dyn SessionService) -> Result<AuthSession, Error> {
        self.resolve(sessions)
            .await?
            .ok_or_else(|| Error::unauthorized(LOGIN_REQUIRED_MESSAGE))
    }

    fn insert<T: serde::Serialize>(&self, key: &str, value: T) -> Result<(), Error> {
        self.0
            .insert(key, value)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        self.0
            .get::<T>(key)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
