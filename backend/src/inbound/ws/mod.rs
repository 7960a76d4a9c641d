//! WebSocket inbound adapter streaming the live bookmark list.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list, signed-in session)
//! - run one live list per connection, closing it once the session ends
//! - translate list changes and command results into wire messages

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use tracing::{debug, error, warn};
use url::Url;

use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod state;

use state::WsState;

/// Upgrade `/ws` for a signed-in browser on an allowed origin.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    session: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origins = req.headers().get_all(ORIGIN);
    let origin = origins.next().ok_or_else(|| {
        warn!("WebSocket upgrade without an Origin header");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origins.next().is_some() {
        warn!("WebSocket upgrade with several Origin headers");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(&state, origin)?;

    let auth = session.require(state.sessions.as_ref()).await?;
    let (response, ws_session, messages) = actix_ws::handle(&req, stream).map_err(|err| {
        error!(error = %err, "WebSocket upgrade failed");
        actix_web::error::ErrorBadRequest("WebSocket upgrade failed")
    })?;
    debug!(user_id = %auth.owner(), "live list connection opened");

    let connection = session::Connection::new(
        auth,
        session::ConnectionPorts {
            sessions: state.sessions.clone(),
            live: state.live.clone(),
            bookmarks: state.bookmarks.clone(),
            clock: state.clock.clone(),
        },
    );
    actix_web::rt::spawn(connection.run(ws_session, messages));
    Ok(response)
}

fn validate_origin(state: &WsState, header: &HeaderValue) -> actix_web::Result<()> {
    let raw = header.to_str().map_err(|err| {
        warn!(error = %err, "Origin header is not valid text");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;
    let origin = Url::parse(raw).map_err(|err| {
        warn!(error = %err, origin = raw, "Origin header is not a URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;
    if state.allows(&origin) {
        Ok(())
    } else {
        warn!(
            origin = raw,
            "rejected WebSocket upgrade from a disallowed origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}
