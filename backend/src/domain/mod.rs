//! Domain primitives, aggregates and services.
//!
//! Purpose: define the bookmark manager's types and use-cases independently
//! of HTTP, WebSocket and hosted-backend concerns. Adapters reach the
//! services only through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic error payload.
//! - Bookmark, BookmarkDraft, BookmarkList: the record, its validated form
//!   input and the reconciled newest-first list.
//! - AuthSession, Credentials, SessionTokens: explicit session state.
//! - BookmarkService, AuthSessionService, LiveBookmarksService: use-cases.

pub mod auth;
pub mod auth_session_service;
pub mod bookmark;
pub mod bookmark_list;
pub mod bookmark_service;
pub mod error;
pub mod live_list;
pub mod ports;
pub mod trace_id;
pub mod user;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use self::auth::{
    AccessToken, AuthSession, Credentials, CredentialsValidationError, RefreshToken, SessionTokens,
};
pub use self::auth_session_service::{AuthSessionService, INVALID_CREDENTIALS_MESSAGE};
pub use self::bookmark::{
    Bookmark, BookmarkChange, BookmarkDraft, BookmarkFormError, BookmarkId, EmptyBookmarkId,
    INVALID_URL_MESSAGE, MISSING_FIELDS_MESSAGE, NewBookmark, SAVE_FAILED_MESSAGE,
};
pub use self::bookmark_list::{BookmarkList, IgnoreReason, ListChange};
pub use self::bookmark_service::{BookmarkService, DELETE_FAILED_MESSAGE, FETCH_FAILED_MESSAGE};
pub use self::error::{Error, ErrorCode};
pub use self::live_list::{LIVE_UNAVAILABLE_MESSAGE, LiveBookmarkList, LiveBookmarksService};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{User, UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use bookmark_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::unauthorized("sign in first"))
/// }
/// # assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
