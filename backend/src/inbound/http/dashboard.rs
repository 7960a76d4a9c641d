//! Dashboard page model.
//!
//! ```text
//! GET /dashboard
//! ```
//!
//! Signed-out browsers are redirected to the entry page. A failed bookmark
//! fetch is logged and rendered as an empty list so the page still loads.

use actix_web::{HttpResponse, get, http::header, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use url::Url;
use utoipa::ToSchema;

use crate::domain::{Bookmark, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons";

/// Signed-in user as shown in the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardUser {
    pub id: String,
    /// Full name, else email, else id.
    pub label: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for DashboardUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            label: user.display_label().to_owned(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// One rendered bookmark card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkView {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Host without a leading `www.`; the raw URL when it does not parse.
    pub domain: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    /// Creation date such as `Jan 5, 2026`.
    pub created_on: String,
    pub favicon_url: String,
}

impl From<&Bookmark> for BookmarkView {
    fn from(bookmark: &Bookmark) -> Self {
        let domain = display_domain(&bookmark.url);
        Self {
            id: bookmark.id.to_string(),
            title: bookmark.title.clone(),
            url: bookmark.url.clone(),
            favicon_url: favicon_url(&domain),
            domain,
            created_at: bookmark.created_at,
            created_on: bookmark.created_at.format("%b %-d, %Y").to_string(),
        }
    }
}

/// Everything the dashboard page renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub user: DashboardUser,
    /// Newest first.
    pub bookmarks: Vec<BookmarkView>,
    /// Drives the "N saved" badge.
    pub count: usize,
}

impl DashboardView {
    /// Build the page model for `user`.
    ///
    /// # Examples
    /// ```
    /// use bookmark_backend::domain::{User, UserId};
    /// use bookmark_backend::inbound::http::dashboard::DashboardView;
    ///
    /// let user = User::new(UserId::random()).with_email("ada@example.com");
    /// let view = DashboardView::new(&user, &[]);
    /// assert_eq!(view.user.label, "ada@example.com");
    /// assert_eq!(view.count, 0);
    /// ```
    pub fn new(user: &User, bookmarks: &[Bookmark]) -> Self {
        Self {
            user: DashboardUser::from(user),
            bookmarks: bookmarks.iter().map(BookmarkView::from).collect(),
            count: bookmarks.len(),
        }
    }
}

fn display_domain(raw: &str) -> String {
    Url::parse(raw)
        .ok()
        .and_then(|url| {
            url.host_str()
                .map(|host| host.strip_prefix("www.").unwrap_or(host).to_owned())
        })
        .unwrap_or_else(|| raw.to_owned())
}

fn favicon_url(domain: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(domain.as_bytes()).collect();
    format!("{FAVICON_SERVICE}?domain={encoded}&sz=32")
}

/// `303 See Other` to `location`.
pub(crate) fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_owned()))
        .finish()
}

/// Dashboard for the signed-in user.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard page model", body = DashboardView),
        (status = 303, description = "Not signed in; redirect to the entry page"),
        (status = 503, description = "Auth API unavailable", body = crate::domain::Error)
    ),
    tags = ["dashboard"],
    operation_id = "dashboard"
)]
#[get("/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let Some(auth) = session.resolve(state.sessions.as_ref()).await? else {
        return Ok(see_other(state.entry_path()));
    };
    let bookmarks = state
        .bookmarks_query
        .list_bookmarks(&auth)
        .await
        .unwrap_or_else(|error| {
            warn!(user_id = %auth.owner(), %error, "dashboard rendered without bookmarks");
            Vec::new()
        });
    Ok(HttpResponse::Ok().json(DashboardView::new(&auth.user, &bookmarks)))
}
