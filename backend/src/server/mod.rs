//! Server construction and middleware wiring.

mod config;
mod settings;
mod state_builders;

pub use config::ServerConfig;
pub use settings::{AppSettings, SettingsError};
pub use state_builders::ServicePorts;

use state_builders::{build_http_state, build_ws_state};

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::auth::{current_user, login, login_form, logout};
use crate::inbound::http::bookmarks::{
    add_bookmark_form, create_bookmark, delete_bookmark, delete_bookmark_form, list_bookmarks,
};
use crate::inbound::http::dashboard::dashboard;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::HttpState;
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;

/// Name of the encrypted session cookie.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Shared state and cookie settings for one application instance.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub http_state: web::Data<HttpState>,
    pub ws_state: web::Data<WsState>,
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

impl AppDependencies {
    /// Derive adapter state from the server configuration.
    pub fn from_config(health_state: web::Data<HealthState>, config: &ServerConfig) -> Self {
        Self {
            health_state,
            http_state: build_http_state(&config.ports, &config.entry_path),
            ws_state: build_ws_state(&config.ports, &config.allowed_origins),
            key: config.key.clone(),
            cookie_secure: config.cookie_secure,
            same_site: config.same_site,
        }
    }
}

/// Assemble the application: session cookies and trace ids around every
/// page, form, JSON and WebSocket route.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE_NAME.into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let api = web::scope("/api/v1")
        .service(login)
        .service(current_user)
        .service(list_bookmarks)
        .service(create_bookmark)
        .service(delete_bookmark);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(session)
        .wrap(Trace)
        .service(api)
        .service(dashboard)
        .service(add_bookmark_form)
        .service(delete_bookmark_form)
        .service(login_form)
        .service(logout)
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Bind an Actix HTTP server for `config` and mark `health_state` ready.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let deps = AppDependencies::from_config(health_state.clone(), &config);
    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(config.bind_addr)?
        .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::memory::InMemoryBackend;
    use rstest::{fixture, rstest};
    use std::sync::Arc;

    #[fixture]
    fn health_state() -> web::Data<HealthState> {
        web::Data::new(HealthState::new())
    }

    #[fixture]
    fn config() -> ServerConfig {
        ServerConfig::new(
            Key::generate(),
            false,
            SameSite::Lax,
            "127.0.0.1:0".parse().expect("bind addr"),
            ServicePorts::in_memory(Arc::new(InMemoryBackend::default())),
        )
    }

    #[rstest]
    #[actix_rt::test]
    async fn create_server_marks_ready(health_state: web::Data<HealthState>, config: ServerConfig) {
        assert!(!health_state.is_ready(), "state should start unready");

        let _server = create_server(health_state.clone(), config).expect("server should bind");

        assert!(
            health_state.is_ready(),
            "server creation should mark readiness"
        );
    }

    #[rstest]
    #[actix_rt::test]
    async fn probes_answer_without_a_session(
        health_state: web::Data<HealthState>,
        config: ServerConfig,
    ) {
        use actix_web::test;

        health_state.mark_ready();
        let app = test::init_service(build_app(AppDependencies::from_config(
            health_state,
            &config,
        )))
        .await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/health/ready").to_request(),
        )
        .await;
        assert!(res.status().is_success());
        assert!(res.headers().contains_key("trace-id"));
    }
}
