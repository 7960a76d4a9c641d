//! Driven port for the hosted realtime change feed.
//!
//! A subscription is a lazy, unbounded and non-restartable stream of
//! [`BookmarkChange`] values for one owner. Adapters feed it through a
//! [`ChangePublisher`]; consumers release it with
//! [`ChangeSubscription::unsubscribe`], after which the adapter observes
//! [`ChangePublisher::closed`] and tears its upstream channel down. A
//! consumer whose session was refreshed hands the new access token over with
//! [`ChangeSubscription::renew`] so the upstream channel stays authorised.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::Stream;
use tokio::sync::{mpsc, watch};

use crate::domain::{AccessToken, AuthSession, BookmarkChange};

use super::define_port_error;

define_port_error! {
    /// Failures raised while opening a change feed subscription.
    pub enum ChangeFeedError {
        /// The realtime endpoint could not be reached.
        Connection { message: String } =>
            ServiceUnavailable: "change feed unreachable: {message}",
        /// The realtime endpoint refused the channel join.
        Rejected { message: String } =>
            InternalError: "change feed refused the subscription: {message}",
    }
}

/// Opens owner-scoped change subscriptions.
///
/// Realtime clients are tied to the worker's event loop, so the returned
/// future is not `Send`.
#[cfg_attr(test, mockall::automock)]
#[async_trait(?Send)]
pub trait ChangeFeed: Send + Sync {
    /// Subscribe to inserts and updates of the session owner's rows and to
    /// every delete on the table.
    async fn subscribe(&self, session: &AuthSession)
    -> Result<ChangeSubscription, ChangeFeedError>;
}

/// Create a connected publisher and subscription pair.
///
/// # Examples
/// ```
/// use bookmark_backend::domain::ports::subscription_channel;
///
/// let (publisher, subscription) = subscription_channel();
/// subscription.unsubscribe();
/// assert!(publisher.is_closed());
/// ```
pub fn subscription_channel() -> (ChangePublisher, ChangeSubscription) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let (renewals, token) = watch::channel(None);
    (
        ChangePublisher { sender, token },
        ChangeSubscription { receiver, renewals },
    )
}

/// Producer half held by a change feed adapter.
#[derive(Debug, Clone)]
pub struct ChangePublisher {
    sender: mpsc::UnboundedSender<BookmarkChange>,
    token: watch::Receiver<Option<AccessToken>>,
}

impl ChangePublisher {
    /// Deliver one change. Returns `false` once the subscription is gone.
    pub fn publish(&self, change: BookmarkChange) -> bool {
        self.sender.send(change).is_ok()
    }

    /// Whether the subscription has been released.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Resolve once the subscription has been released.
    pub async fn closed(&self) {
        self.sender.closed().await;
    }

    /// Latest access token handed over by the consumer, if any.
    pub fn renewed_token(&self) -> Option<AccessToken> {
        self.token.borrow().clone()
    }

    /// Receiver that wakes whenever the consumer renews its token.
    pub fn renewals(&self) -> watch::Receiver<Option<AccessToken>> {
        self.token.clone()
    }
}

/// Consumer half of a change feed subscription.
#[derive(Debug)]
pub struct ChangeSubscription {
    receiver: mpsc::UnboundedReceiver<BookmarkChange>,
    renewals: watch::Sender<Option<AccessToken>>,
}

impl ChangeSubscription {
    /// Wait for the next change; `None` once the feed has ended.
    ///
    /// Cancel safe: dropping the future never loses a change.
    pub async fn next_change(&mut self) -> Option<BookmarkChange> {
        self.receiver.recv().await
    }

    /// Hand a refreshed access token to the adapter.
    pub fn renew(&self, token: &AccessToken) {
        self.renewals.send_replace(Some(token.clone()));
    }

    /// Release the subscription. Consuming `self` guarantees nothing further
    /// is observed through it.
    pub fn unsubscribe(mut self) {
        self.receiver.close();
    }
}

impl Stream for ChangeSubscription {
    type Item = BookmarkChange;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}
