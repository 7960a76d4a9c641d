//! Backend entry-point: loads settings, wires adapters and runs the server.

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use bookmark_backend::inbound::http::health::HealthState;
use bookmark_backend::inbound::http::session_config::fingerprint::key_fingerprint;
use bookmark_backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use bookmark_backend::server::{AppSettings, ServerConfig, ServicePorts, create_server};

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        cookie_secure = session.cookie_secure,
        "session key loaded"
    );

    let backend = settings.hosted_backend()?;
    let ports = ServicePorts::from_backend(backend.as_ref())?;
    let config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        settings.bind_addr()?,
        ports,
    )
    .with_entry_path(settings.entry_path()?)
    .with_allowed_origins(settings.allowed_origins()?);
    let bind_addr = config.bind_addr();

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)
        .wrap_err_with(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, hosted = backend.is_some(), "server listening");
    server.await.wrap_err("server terminated")
}
