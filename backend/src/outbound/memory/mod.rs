//! In-process stand-in for the hosted backend.
//!
//! Serves the auth, bookmarks table and change feed ports from memory so the
//! service runs without a hosted project and integration tests exercise the
//! full stack. The feed follows the hosted filter rules: inserts and updates
//! reach the row owner's subscribers only, deletes reach every subscriber.
//!
//! Access tokens expire after an hour. A refresh rotates the refresh token
//! but leaves the previous access token usable until it expires. Signing out
//! revokes every token descended from the same sign-in and ends the
//! subscriptions opened with them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::{Clock, DefaultClock};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    AuthGateway, AuthGatewayError, BookmarkRepository, BookmarkRepositoryError, ChangeFeed,
    ChangeFeedError, ChangePublisher, ChangeSubscription, subscription_channel,
};
use crate::domain::{
    AccessToken, AuthSession, Bookmark, BookmarkChange, BookmarkId, Credentials, NewBookmark,
    RefreshToken, User, UserId,
};

/// Email of the account seeded by [`InMemoryBackend::default`].
pub const DEMO_EMAIL: &str = "admin@example.com";
/// Password of the seeded account.
pub const DEMO_PASSWORD: &str = "password";
const DEMO_USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";
const TOKEN_LIFETIME_MINUTES: i64 = 60;
const REFRESH_LIFETIME_DAYS: i64 = 7;

struct Account {
    user: User,
    password: String,
}

struct IssuedTokens {
    /// Shared by every token pair descended from one sign-in.
    family: Uuid,
    user_id: UserId,
    access: String,
    /// `None` once exchanged.
    refresh: Option<String>,
    expires_at: DateTime<Utc>,
}

impl IssuedTokens {
    fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        match self.refresh {
            Some(_) => self.expires_at + Duration::days(REFRESH_LIFETIME_DAYS) <= now,
            None => self.expires_at <= now,
        }
    }
}

struct Subscriber {
    owner: UserId,
    access: AccessToken,
    publisher: ChangePublisher,
}

impl Subscriber {
    fn current_token(&self) -> AccessToken {
        self.publisher
            .renewed_token()
            .unwrap_or_else(|| self.access.clone())
    }
}

#[derive(Default)]
struct Store {
    accounts: Vec<Account>,
    sessions: Vec<IssuedTokens>,
    bookmarks: Vec<Bookmark>,
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl Store {
    fn user_for_access(&self, token: &str, now: DateTime<Utc>) -> Option<&User> {
        let issued = self
            .sessions
            .iter()
            .find(|issued| issued.access == token && issued.expires_at > now)?;
        self.accounts
            .iter()
            .map(|account| &account.user)
            .find(|user| user.id == issued.user_id)
    }

    /// Drop released subscriptions and those whose token was revoked.
    fn prune_subscribers(&mut self) {
        let sessions = &self.sessions;
        self.subscribers.retain(|subscriber| {
            let token = subscriber.current_token();
            !subscriber.publisher.is_closed()
                && sessions
                    .iter()
                    .any(|issued| issued.access == token.expose())
        });
    }

    fn broadcast(&mut self, change: &BookmarkChange) {
        self.prune_subscribers();
        for subscriber in &self.subscribers {
            let visible = match change {
                BookmarkChange::Inserted(row) | BookmarkChange::Updated(row) => {
                    row.user_id == subscriber.owner
                }
                BookmarkChange::Deleted { .. } => true,
            };
            if visible {
                subscriber.publisher.publish(change.clone());
            }
        }
    }
}

/// Memory-backed implementation of [`AuthGateway`], [`BookmarkRepository`]
/// and [`ChangeFeed`].
///
/// # Examples
/// ```
/// use bookmark_backend::outbound::memory::{DEMO_EMAIL, InMemoryBackend};
///
/// let backend = InMemoryBackend::default();
/// # let _ = (backend, DEMO_EMAIL);
/// ```
pub struct InMemoryBackend {
    store: Mutex<Store>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        let demo = UserId::new(DEMO_USER_ID).map(|id| {
            User::new(id)
                .with_email(DEMO_EMAIL)
                .with_full_name("Demo User")
        });
        let backend = Self::new(Arc::new(DefaultClock));
        match demo {
            Ok(user) => backend.with_account(user, DEMO_PASSWORD),
            Err(_) => backend,
        }
    }
}

impl InMemoryBackend {
    /// Empty backend stamping rows with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            clock,
        }
    }

    /// Register an account that can sign in with its email and `password`.
    pub fn with_account(self, user: User, password: impl Into<String>) -> Self {
        let mut store = self.store.into_inner();
        store.accounts.push(Account {
            user,
            password: password.into(),
        });
        Self {
            store: Mutex::new(store),
            clock: self.clock,
        }
    }

    /// Apply an update as if another client edited the row, notifying
    /// subscribers. Returns `false` when no row has that id.
    pub async fn update_title(&self, id: &BookmarkId, title: impl Into<String>) -> bool {
        let mut store = self.store.lock().await;
        let Some(row) = store.bookmarks.iter_mut().find(|row| &row.id == id) else {
            return false;
        };
        row.title = title.into();
        let change = BookmarkChange::Updated(row.clone());
        store.broadcast(&change);
        true
    }

    /// Number of live subscriptions, pruning released and revoked ones
    /// first.
    pub async fn subscriber_count(&self) -> usize {
        let mut store = self.store.lock().await;
        store.prune_subscribers();
        store.subscribers.len()
    }

    /// Issue a token pair, dropping pairs that can no longer be used.
    fn issue(&self, store: &mut Store, user: User, family: Uuid) -> AuthSession {
        let now = self.clock.utc();
        store.sessions.retain(|issued| !issued.is_stale_at(now));
        let issued = IssuedTokens {
            family,
            user_id: user.id.clone(),
            access: Uuid::new_v4().to_string(),
            refresh: Some(Uuid::new_v4().to_string()),
            expires_at: now + Duration::minutes(TOKEN_LIFETIME_MINUTES),
        };
        let session = AuthSession {
            user,
            access_token: AccessToken::new(issued.access.clone()),
            refresh_token: issued.refresh.clone().map(RefreshToken::new),
            expires_at: Some(issued.expires_at),
        };
        store.sessions.push(issued);
        session
    }

    fn authorise<'a>(
        &self,
        store: &'a Store,
        session: &AuthSession,
    ) -> Result<&'a User, BookmarkRepositoryError> {
        store
            .user_for_access(session.access_token.expose(), self.clock.utc())
            .filter(|user| &user.id == session.owner())
            .ok_or_else(|| BookmarkRepositoryError::unauthorized("unknown access token"))
    }
}

#[async_trait]
impl AuthGateway for InMemoryBackend {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AuthGatewayError> {
        let mut store = self.store.lock().await;
        let user = store
            .accounts
            .iter()
            .find(|account| {
                account.user.email.as_deref() == Some(credentials.email())
                    && account.password == credentials.password()
            })
            .map(|account| account.user.clone())
            .ok_or_else(AuthGatewayError::invalid_credentials)?;
        Ok(self.issue(&mut store, user, Uuid::new_v4()))
    }

    async fn current_user(&self, token: &AccessToken) -> Result<Option<User>, AuthGatewayError> {
        let store = self.store.lock().await;
        Ok(store
            .user_for_access(token.expose(), self.clock.utc())
            .cloned())
    }

    async fn refresh(&self, token: &RefreshToken) -> Result<AuthSession, AuthGatewayError> {
        let now = self.clock.utc();
        let mut store = self.store.lock().await;
        let issued = store
            .sessions
            .iter_mut()
            .filter(|issued| !issued.is_stale_at(now))
            .find(|issued| issued.refresh.as_deref() == Some(token.expose()))
            .ok_or_else(AuthGatewayError::session_expired)?;
        issued.refresh = None;
        let (family, user_id) = (issued.family, issued.user_id.clone());
        let user = store
            .accounts
            .iter()
            .map(|account| &account.user)
            .find(|user| user.id == user_id)
            .cloned()
            .ok_or_else(AuthGatewayError::session_expired)?;
        Ok(self.issue(&mut store, user, family))
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), AuthGatewayError> {
        let mut store = self.store.lock().await;
        let family = store
            .sessions
            .iter()
            .find(|issued| issued.access == token.expose())
            .map(|issued| issued.family);
        if let Some(family) = family {
            store.sessions.retain(|issued| issued.family != family);
        }
        store.prune_subscribers();
        debug!("in-memory session revoked");
        Ok(())
    }
}

#[async_trait]
impl BookmarkRepository for InMemoryBackend {
    async fn list_for_owner(
        &self,
        session: &AuthSession,
    ) -> Result<Vec<Bookmark>, BookmarkRepositoryError> {
        let store = self.store.lock().await;
        self.authorise(&store, session)?;
        let mut rows: Vec<_> = store
            .bookmarks
            .iter()
            .rev()
            .filter(|row| &row.user_id == session.owner())
            .cloned()
            .collect();
        // Rows with equal timestamps stay newest-inserted first.
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(
        &self,
        session: &AuthSession,
        bookmark: &NewBookmark,
    ) -> Result<Bookmark, BookmarkRepositoryError> {
        let mut store = self.store.lock().await;
        self.authorise(&store, session)?;
        if &bookmark.user_id != session.owner() {
            return Err(BookmarkRepositoryError::rejected(
                403_u16,
                "row owner does not match the session",
            ));
        }
        store.next_id += 1;
        let id = BookmarkId::new(store.next_id.to_string())
            .map_err(|err| BookmarkRepositoryError::decode(err.to_string()))?;
        let row = Bookmark {
            id,
            title: bookmark.title.clone(),
            url: bookmark.url.clone(),
            created_at: self.clock.utc(),
            user_id: bookmark.user_id.clone(),
        };
        store.bookmarks.push(row.clone());
        store.broadcast(&BookmarkChange::Inserted(row.clone()));
        debug!(id = %row.id, "in-memory bookmark inserted");
        Ok(row)
    }

    async fn delete(
        &self,
        session: &AuthSession,
        id: &BookmarkId,
    ) -> Result<(), BookmarkRepositoryError> {
        let mut store = self.store.lock().await;
        self.authorise(&store, session)?;
        let before = store.bookmarks.len();
        store
            .bookmarks
            .retain(|row| !(&row.id == id && &row.user_id == session.owner()));
        if store.bookmarks.len() != before {
            store.broadcast(&BookmarkChange::Deleted { id: id.clone() });
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl ChangeFeed for InMemoryBackend {
    async fn subscribe(
        &self,
        session: &AuthSession,
    ) -> Result<ChangeSubscription, ChangeFeedError> {
        let mut store = self.store.lock().await;
        if store
            .user_for_access(session.access_token.expose(), self.clock.utc())
            .is_none()
        {
            return Err(ChangeFeedError::rejected("unknown access token"));
        }
        let (publisher, subscription) = subscription_channel();
        store.subscribers.push(Subscriber {
            owner: session.owner().clone(),
            access: session.access_token.clone(),
            publisher,
        });
        Ok(subscription)
    }
}
