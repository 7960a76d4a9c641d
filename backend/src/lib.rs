//! Bookmark manager backend.
//!
//! A session-authenticated web service over a hosted backend: dashboard and
//! form routes, a JSON API and a live bookmark list streamed over
//! WebSocket.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI.
pub use doc::ApiDoc;
pub use middleware::Trace;
