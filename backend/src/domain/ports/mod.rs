//! Ports at the edges of the hexagon.
//!
//! Driven ports (`AuthGateway`, `BookmarkRepository`, `ChangeFeed`) describe
//! what the domain needs from the hosted backend and return typed error
//! enums. Driving ports (`SessionService`, `BookmarksCommand`,
//! `BookmarksQuery`, `LiveBookmarks`) are what inbound adapters call and
//! return the client-facing [`Error`](crate::domain::Error).

mod macros;
pub(crate) use macros::define_port_error;

mod auth_gateway;
mod bookmark_repository;
mod bookmarks_command;
mod bookmarks_query;
mod change_feed;
mod live_bookmarks;
mod session_service;

#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::{AuthGateway, AuthGatewayError};
#[cfg(test)]
pub use bookmark_repository::MockBookmarkRepository;
pub use bookmark_repository::{BookmarkRepository, BookmarkRepositoryError};
pub use bookmarks_command::BookmarksCommand;
#[cfg(test)]
pub use bookmarks_command::MockBookmarksCommand;
pub use bookmarks_query::BookmarksQuery;
#[cfg(test)]
pub use bookmarks_query::MockBookmarksQuery;
#[cfg(test)]
pub use change_feed::MockChangeFeed;
pub use change_feed::{
    ChangeFeed, ChangeFeedError, ChangePublisher, ChangeSubscription, subscription_channel,
};
pub use live_bookmarks::LiveBookmarks;
#[cfg(test)]
pub use live_bookmarks::MockLiveBookmarks;
#[cfg(test)]
pub use session_service::MockSessionService;
pub use session_service::SessionService;
