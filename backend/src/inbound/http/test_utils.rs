//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::{HttpResponse, web};
use std::sync::Arc;

use crate::domain::ports::{MockBookmarksCommand, MockBookmarksQuery, MockSessionService};
use crate::domain::{AccessToken, AuthSession, Error, RefreshToken, User, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

pub const OWNER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

/// Session middleware with a fresh key and the `Secure` flag off so plain
/// HTTP test requests carry the cookie.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// The `session` cookie set by `res`.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Session for the fixture owner.
pub fn owner_session() -> AuthSession {
    AuthSession {
        user: User::new(UserId::new(OWNER_ID).expect("owner id"))
            .with_email("ada@example.com")
            .with_full_name("Ada Lovelace"),
        access_token: AccessToken::new("access-token"),
        refresh_token: Some(RefreshToken::new("refresh-token")),
        expires_at: None,
    }
}

/// Path of the route installed by [`seed_session`].
pub const SEED_SESSION_PATH: &str = "/test/seed-session";

/// Handler that signs the fixture owner in.
pub async fn seed_session(session: SessionContext) -> Result<HttpResponse, Error> {
    session.persist(&owner_session())?;
    Ok(HttpResponse::NoContent().finish())
}

/// Session service that accepts the seeded cookie any number of times.
pub fn resuming_sessions() -> MockSessionService {
    let mut sessions = MockSessionService::new();
    sessions
        .expect_resume()
        .times(0..)
        .returning(|_| Ok(Some(owner_session())));
    sessions
}

/// State over mocked ports.
pub fn http_state(
    sessions: MockSessionService,
    bookmarks: MockBookmarksCommand,
    bookmarks_query: MockBookmarksQuery,
) -> web::Data<HttpState> {
    web::Data::new(HttpState::new(HttpStatePorts {
        sessions: Arc::new(sessions),
        bookmarks: Arc::new(bookmarks),
        bookmarks_query: Arc::new(bookmarks_query),
    }))
}
