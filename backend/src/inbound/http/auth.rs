//! Sign-in and sign-out handlers.
//!
//! ```text
//! POST /login          email=...&password=...
//! POST /logout
//! POST /api/v1/login   {"email":"ada@example.com","password":"..."}
//! GET  /api/v1/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::{AuthSession, Credentials, CredentialsValidationError, Error, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bookmarks::DASHBOARD_PATH;
use crate::inbound::http::dashboard::see_other;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Sign-in fields, accepted as a form or as JSON.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl TryFrom<&LoginRequest> for Credentials {
    type Error = CredentialsValidationError;

    fn try_from(value: &LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn map_credentials_error(err: CredentialsValidationError) -> Error {
    let (field, code) = match err {
        CredentialsValidationError::EmptyEmail => ("email", "empty_email"),
        CredentialsValidationError::EmptyPassword => ("password", "empty_password"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

async fn establish(
    state: &HttpState,
    session: &SessionContext,
    request: &LoginRequest,
) -> ApiResult<AuthSession> {
    let credentials = Credentials::try_from(request).map_err(map_credentials_error)?;
    let auth = state.sessions.sign_in(&credentials).await?;
    session.persist(&auth)?;
    info!(user_id = %auth.owner(), "signed in");
    Ok(auth)
}

/// Sign in from the entry page form.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in; to the dashboard", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Blank email or password", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Auth API unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "loginForm",
    security([])
)]
#[post("/login")]
pub async fn login_form(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<LoginRequest>,
) -> ApiResult<HttpResponse> {
    establish(&state, &session, &form).await?;
    Ok(see_other(DASHBOARD_PATH))
}

/// Sign in and return the user.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = User, headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Blank email or password", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Auth API unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<User>> {
    let auth = establish(&state, &session, &payload).await?;
    Ok(web::Json(auth.user))
}

/// Sign out and clear the cookie.
///
/// The cookie is cleared even when the auth API cannot be reached.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Signed out; to the entry page")),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(state: web::Data<HttpState>, session: SessionContext) -> HttpResponse {
    match session.resolve(state.sessions.as_ref()).await {
        Ok(Some(auth)) => {
            if let Err(error) = state.sessions.sign_out(&auth).await {
                warn!(user_id = %auth.owner(), %error, "remote sign-out failed");
            } else {
                info!(user_id = %auth.owner(), "signed out");
            }
        }
        Ok(None) => {}
        Err(error) => warn!(%error, "session unresolved during sign-out"),
    }
    session.purge();
    see_other(state.entry_path())
}

/// The signed-in user.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<User>> {
    let auth = session.require(state.sessions.as_ref()).await?;
    Ok(web::Json(auth.user))
}
