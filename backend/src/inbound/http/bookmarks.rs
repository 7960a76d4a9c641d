//! Bookmark endpoints.
//!
//! ```text
//! POST   /bookmarks                  title=...&url=...
//! POST   /bookmarks/{id}/delete
//! GET    /api/v1/bookmarks
//! POST   /api/v1/bookmarks           {"title":"...","url":"..."}
//! DELETE /api/v1/bookmarks/{id}
//! ```
//!
//! Form routes answer with redirects for a plain HTML form; the JSON routes
//! answer with the error envelope. Validation happens behind
//! [`BookmarksCommand`](crate::domain::ports::BookmarksCommand) so both share
//! the same messages.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Bookmark, BookmarkId, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dashboard::see_other;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Where form submissions land after success.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Add form fields. Missing fields read as empty and fail validation.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct BookmarkForm {
    pub title: String,
    pub url: String,
}

fn parse_id(raw: String) -> Result<BookmarkId, Error> {
    BookmarkId::new(raw).map_err(|_| Error::invalid_request("bookmark id must not be empty"))
}

/// Add a bookmark from the dashboard form.
#[utoipa::path(
    post,
    path = "/bookmarks",
    request_body(content = BookmarkForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Saved; back to the dashboard, or signed out; to the entry page"),
        (status = 400, description = "Validation message for the form", body = Error),
        (status = 503, description = "Save failed", body = Error)
    ),
    tags = ["bookmarks"],
    operation_id = "addBookmarkForm"
)]
#[post("/bookmarks")]
pub async fn add_bookmark_form(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<BookmarkForm>,
) -> ApiResult<HttpResponse> {
    let Some(auth) = session.resolve(state.sessions.as_ref()).await? else {
        return Ok(see_other(state.entry_path()));
    };
    state
        .bookmarks
        .add_bookmark(&auth, &form.title, &form.url)
        .await?;
    Ok(see_other(DASHBOARD_PATH))
}

/// Delete a bookmark from the dashboard.
#[utoipa::path(
    post,
    path = "/bookmarks/{id}/delete",
    params(("id" = String, Path, description = "Bookmark id")),
    responses(
        (status = 303, description = "Deleted; back to the dashboard, or signed out; to the entry page"),
        (status = 503, description = "Delete failed", body = Error)
    ),
    tags = ["bookmarks"],
    operation_id = "deleteBookmarkForm"
)]
#[post("/bookmarks/{id}/delete")]
pub async fn delete_bookmark_form(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let Some(auth) = session.resolve(state.sessions.as_ref()).await? else {
        return Ok(see_other(state.entry_path()));
    };
    let id = parse_id(path.into_inner())?;
    state.bookmarks.delete_bookmark(&auth, &id).await?;
    Ok(see_other(DASHBOARD_PATH))
}

/// The signed-in user's bookmarks, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/bookmarks",
    responses(
        (status = 200, description = "Bookmarks", body = [Bookmark]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 503, description = "Fetch failed", body = Error)
    ),
    tags = ["bookmarks"],
    operation_id = "listBookmarks"
)]
#[get("/bookmarks")]
pub async fn list_bookmarks(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Bookmark>>> {
    let auth = session.require(state.sessions.as_ref()).await?;
    let bookmarks = state.bookmarks_query.list_bookmarks(&auth).await?;
    Ok(web::Json(bookmarks))
}

/// Add a bookmark.
#[utoipa::path(
    post,
    path = "/api/v1/bookmarks",
    request_body = BookmarkForm,
    responses(
        (status = 201, description = "Saved row", body = Bookmark),
        (status = 400, description = "Invalid title or URL", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 503, description = "Save failed", body = Error)
    ),
    tags = ["bookmarks"],
    operation_id = "createBookmark"
)]
#[post("/bookmarks")]
pub async fn create_bookmark(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<BookmarkForm>,
) -> ApiResult<HttpResponse> {
    let auth = session.require(state.sessions.as_ref()).await?;
    let saved = state
        .bookmarks
        .add_bookmark(&auth, &payload.title, &payload.url)
        .await?;
    Ok(HttpResponse::Created().json(saved))
}

/// Delete a bookmark. Deleting an id that is not listed succeeds.
#[utoipa::path(
    delete,
    path = "/api/v1/bookmarks/{id}",
    params(("id" = String, Path, description = "Bookmark id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not signed in", body = Error),
        (status = 503, description = "Delete failed", body = Error)
    ),
    tags = ["bookmarks"],
    operation_id = "deleteBookmark"
)]
#[delete("/bookmarks/{id}")]
pub async fn delete_bookmark(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let auth = session.require(state.sessions.as_ref()).await?;
    let id = parse_id(path.into_inner())?;
    state.bookmarks.delete_bookmark(&auth, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "bookmarks_tests.rs"]
mod tests;
