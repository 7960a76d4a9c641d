//! Realtime change feed over the hosted Phoenix socket.

mod feed;
mod protocol;

pub use feed::HostedChangeFeed;
