//! Sign-in credentials and the explicit authenticated session value.
//!
//! Every port call that touches the hosted backend receives an
//! [`AuthSession`]; nothing reads ambient session state.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use super::{User, UserId};

/// Validation failures for sign-in input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    /// Email was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Password was empty.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated email and password.
///
/// ## Invariants
/// - `email` is trimmed and non-empty.
/// - `password` is non-empty and kept verbatim.
///
/// # Examples
/// ```
/// use bookmark_backend::domain::Credentials;
///
/// let creds = Credentials::try_from_parts(" ada@example.com ", "hunter2").unwrap();
/// assert_eq!(creds.email(), "ada@example.com");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Validate raw form or JSON input.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CredentialsValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email: email.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email address.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password as typed.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

macro_rules! secret_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(Zeroizing<String>);

        impl $name {
            /// Wrap a raw token.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(Zeroizing::new(raw.into()))
            }

            /// Borrow the token for an outbound request header.
            pub fn expose(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "(<redacted>)"))
            }
        }
    };
}

secret_token! {
    /// Bearer token presented to the data, auth and realtime APIs.
    AccessToken
}

secret_token! {
    /// Long-lived token exchanged for a new access token.
    RefreshToken
}

/// Tokens persisted in the encrypted session cookie between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    /// Owner the tokens were issued to.
    pub user_id: UserId,
    /// Current access token.
    pub access_token: AccessToken,
    /// Refresh token, when the auth API issued one.
    pub refresh_token: Option<RefreshToken>,
    /// Access token expiry, when known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionTokens {
    /// Whether the stored access token is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

/// Authenticated session resolved for one request or WebSocket connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Signed-in user.
    pub user: User,
    /// Bearer token for hosted backend calls.
    pub access_token: AccessToken,
    /// Token used to renew `access_token`.
    pub refresh_token: Option<RefreshToken>,
    /// Expiry reported by the auth API, when known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    /// Owner id every bookmark read and write is scoped to.
    pub fn owner(&self) -> &UserId {
        &self.user.id
    }

    /// Whether the access token is past its reported expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }

    /// Tokens to persist in the session cookie.
    pub fn tokens(&self) -> SessionTokens {
        SessionTokens {
            user_id: self.user.id.clone(),
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", CredentialsValidationError::EmptyEmail)]
    #[case("  ", "pw", CredentialsValidationError::EmptyEmail)]
    #[case("ada@example.com", "", CredentialsValidationError::EmptyPassword)]
    fn rejects_blank_input(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: CredentialsValidationError,
    ) {
        let err = Credentials::try_from_parts(email, password).expect_err("invalid input");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn password_whitespace_is_preserved() {
        let creds = Credentials::try_from_parts("ada@example.com", " pw ").expect("valid input");
        assert_eq!(creds.password(), " pw ");
    }

    #[rstest]
    fn debug_output_hides_secrets() {
        let creds = Credentials::try_from_parts("ada@example.com", "hunter2").expect("valid");
        let token = AccessToken::new("eyJhbGciOi");
        let rendered = format!("{creds:?} {token:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("eyJhbGciOi"));
    }

    #[rstest]
    fn expiry_is_inclusive() {
        let now = Utc
            .with_ymd_and_hms(2026, 1, 5, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        let mut session = AuthSession {
            user: User::new(UserId::random()),
            access_token: AccessToken::new("a"),
            refresh_token: None,
            expires_at: Some(now),
        };
        assert!(session.is_expired_at(now));
        session.expires_at = Some(now + Duration::seconds(1));
        assert!(!session.is_expired_at(now));
        session.expires_at = None;
        assert!(!session.is_expired_at(now));
    }
}
