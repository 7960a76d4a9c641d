//! Shared wiring for integration tests driving the full application against
//! the in-memory backend.

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::web;
use bookmark_backend::inbound::http::health::HealthState;
use bookmark_backend::outbound::memory::InMemoryBackend;
use bookmark_backend::server::{AppDependencies, SESSION_COOKIE_NAME, ServerConfig, ServicePorts};
use url::Url;

pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Application dependencies over `backend`, with insecure cookies so plain
/// HTTP test requests carry them.
pub fn dependencies(backend: Arc<InMemoryBackend>) -> AppDependencies {
    let config = ServerConfig::new(
        Key::generate(),
        false,
        SameSite::Lax,
        "127.0.0.1:0".parse().expect("bind addr"),
        ServicePorts::in_memory(backend),
    )
    .with_allowed_origins(vec![Url::parse(ALLOWED_ORIGIN).expect("origin")]);
    let health = web::Data::new(HealthState::new());
    health.mark_ready();
    AppDependencies::from_config(health, &config)
}

/// The session cookie set by `res`, if any.
pub fn set_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
}

/// Replace `jar` with any cookie `res` set.
pub fn track_cookie<B>(jar: &mut Option<Cookie<'static>>, res: &ServiceResponse<B>) {
    if let Some(cookie) = set_cookie(res) {
        *jar = Some(cookie);
    }
}

/// `Location` header of a redirect.
pub fn location<B>(res: &ServiceResponse<B>) -> &str {
    res.headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("ascii location")
}
