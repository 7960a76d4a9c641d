//! OpenAPI document for the HTTP surface.
//!
//! Served through Swagger UI in debug builds. The live list WebSocket is not
//! described here; its wire messages live in [`crate::inbound::ws::messages`].

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Bookmark, Error, ErrorCode, User};
use crate::inbound::http::auth::LoginRequest;
use crate::inbound::http::bookmarks::BookmarkForm;
use crate::inbound::http::dashboard::{BookmarkView, DashboardUser, DashboardView};

/// Registers the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Encrypted session cookie issued by POST /login or POST /api/v1/login.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Bookmark manager API",
        description = "Dashboard, bookmark forms and JSON endpoints over a hosted backend."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login_form,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::current_user,
        crate::inbound::http::dashboard::dashboard,
        crate::inbound::http::bookmarks::add_bookmark_form,
        crate::inbound::http::bookmarks::delete_bookmark_form,
        crate::inbound::http::bookmarks::list_bookmarks,
        crate::inbound::http::bookmarks::create_bookmark,
        crate::inbound::http::bookmarks::delete_bookmark,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Bookmark,
        BookmarkForm,
        BookmarkView,
        DashboardUser,
        DashboardView,
        Error,
        ErrorCode,
        LoginRequest,
        User,
    )),
    tags(
        (name = "auth", description = "Sign-in, sign-out and the current user"),
        (name = "bookmarks", description = "Saved links of the signed-in user"),
        (name = "dashboard", description = "Dashboard view model"),
        (name = "health", description = "Readiness and liveness probes")
    )
)]
pub struct ApiDoc;
