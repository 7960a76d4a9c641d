//! Per-connection live list session.
//!
//! One connection owns one [`LiveBookmarkList`]. The loop multiplexes four
//! sources: the heartbeat, the session check, client frames and feed
//! changes. Pings go out every 5 s and a connection is idle after 10 s
//! without client traffic; tests shorten both.
//!
//! The session resolved at upgrade is re-validated every 30 s, when the
//! feed ends and before a command once its access token has expired.
//! Refreshed tokens are adopted and handed to the feed; a signed-out session
//! closes the socket.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use mockable::Clock;
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::ports::{BookmarksCommand, LiveBookmarks, SessionService};
use crate::domain::{
    AuthSession, BookmarkId, Error, LIVE_UNAVAILABLE_MESSAGE, LiveBookmarkList, TraceId,
};
use crate::inbound::ws::messages::{ClientMessage, ServerMessage};

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

#[cfg(not(test))]
const SESSION_CHECK_INTERVAL: Duration = Duration::from_secs(30);
#[cfg(test)]
const SESSION_CHECK_INTERVAL: Duration = Duration::from_millis(40);

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    SessionEnded,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
}

/// Ports one connection drives.
pub(super) struct ConnectionPorts {
    pub(super) sessions: Arc<dyn SessionService>,
    pub(super) live: Arc<dyn LiveBookmarks>,
    pub(super) bookmarks: Arc<dyn BookmarksCommand>,
    pub(super) clock: Arc<dyn Clock>,
}

pub(super) struct Connection {
    auth: AuthSession,
    sessions: Arc<dyn SessionService>,
    live: Arc<dyn LiveBookmarks>,
    bookmarks: Arc<dyn BookmarksCommand>,
    clock: Arc<dyn Clock>,
}

impl Connection {
    pub(super) fn new(auth: AuthSession, ports: ConnectionPorts) -> Self {
        let ConnectionPorts {
            sessions,
            live,
            bookmarks,
            clock,
        } = ports;
        Self {
            auth,
            sessions,
            live,
            bookmarks,
            clock,
        }
    }

    pub(super) async fn run(mut self, mut session: Session, stream: MessageStream) {
        let mut list = match self.open(&mut session).await {
            Ok(list) => list,
            Err(error) => {
                self.shut_down(session, error).await;
                return;
            }
        };
        let outcome = self.serve(&mut session, stream, &mut list).await;
        list.close();
        debug!(user_id = %self.auth.owner(), "live list connection closed");
        self.shut_down(session, outcome).await;
    }

    async fn open(&self, session: &mut Session) -> Result<LiveBookmarkList, SessionError> {
        send(session, &ServerMessage::Loading).await?;
        let mut list = match self.live.open(&self.auth).await {
            Ok(list) => list,
            Err(error) => {
                warn!(user_id = %self.auth.owner(), %error, "live list could not be opened");
                send(session, &ServerMessage::from(&error)).await?;
                return Err(SessionError::StreamClosed);
            }
        };
        let snapshot = ServerMessage::Snapshot {
            bookmarks: list.entries().to_vec(),
        };
        send(session, &snapshot).await?;
        for notice in list.take_notices() {
            send(session, &ServerMessage::from(&notice)).await?;
        }
        Ok(list)
    }

    async fn serve(
        &mut self,
        session: &mut Session,
        mut stream: MessageStream,
        list: &mut LiveBookmarkList,
    ) -> SessionError {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);
        let mut session_check = time::interval_at(
            time::Instant::now() + SESSION_CHECK_INTERVAL,
            SESSION_CHECK_INTERVAL,
        );

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    if Instant::now().duration_since(last_heartbeat) > CLIENT_TIMEOUT {
                        Err(SessionError::HeartbeatTimeout)
                    } else {
                        session.ping(b"").await.map_err(SessionError::Network)
                    }
                }
                _ = session_check.tick() => self.recheck(list).await,
                message = stream.recv() => {
                    self.handle_frame(session, &mut last_heartbeat, list, message).await
                }
                change = list.next_change() => match change {
                    Some(change) => match ServerMessage::for_change(change) {
                        Some(message) => send(session, &message).await,
                        None => Ok(()),
                    },
                    // A revoked session also ends the feed.
                    None => match self.recheck(list).await {
                        Ok(()) => {
                            let notice = Error::service_unavailable(LIVE_UNAVAILABLE_MESSAGE);
                            send(session, &ServerMessage::from(&notice)).await
                        }
                        Err(error) => Err(error),
                    },
                },
            };
            if let Err(error) = result {
                return error;
            }
        }
    }

    /// Re-validate the connection's session, adopting refreshed tokens.
    ///
    /// A failed check is logged and the socket stays open.
    async fn recheck(&mut self, list: &LiveBookmarkList) -> Result<(), SessionError> {
        match self.sessions.resume(&self.auth.tokens()).await {
            Ok(Some(current)) => {
                if current.access_token != self.auth.access_token {
                    debug!(user_id = %current.owner(), "live list session refreshed");
                    list.renew(&current.access_token);
                }
                self.auth = current;
                Ok(())
            }
            Ok(None) => Err(SessionError::SessionEnded),
            Err(error) => {
                warn!(user_id = %self.auth.owner(), %error, "live list session check failed");
                Ok(())
            }
        }
    }

    async fn handle_frame(
        &mut self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        list: &mut LiveBookmarkList,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let message = match message {
            None => return Err(SessionError::StreamClosed),
            Some(Err(error)) => return Err(SessionError::Protocol(error)),
            Some(Ok(message)) => message,
        };
        *last_heartbeat = Instant::now();
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(SessionError::Network),
            Message::Text(text) => {
                let request = serde_json::from_str::<ClientMessage>(&text).map_err(|error| {
                    warn!(%error, "rejected malformed WebSocket payload");
                    SessionError::InvalidPayload
                })?;
                self.handle_request(session, list, request).await
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_request(
        &mut self,
        session: &mut Session,
        list: &mut LiveBookmarkList,
        request: ClientMessage,
    ) -> Result<(), SessionError> {
        if self.auth.is_expired_at(self.clock.utc()) {
            self.recheck(list).await?;
        }
        let trace_id = TraceId::from_uuid(request.trace_id());
        let outcome = TraceId::scope(trace_id, async {
            match request {
                ClientMessage::Add { title, url, .. } => self
                    .bookmarks
                    .add_bookmark(&self.auth, &title, &url)
                    .await
                    .map(|saved| list.apply_local_insert(saved)),
                ClientMessage::Delete { id, .. } => match BookmarkId::new(id) {
                    Ok(id) => self
                        .bookmarks
                        .delete_bookmark(&self.auth, &id)
                        .await
                        .map(|()| list.remove_local(&id)),
                    Err(err) => Err(Error::invalid_request(err.to_string())),
                },
            }
        })
        .await;

        let reply = match outcome {
            Ok(change) => ServerMessage::for_change(change),
            Err(error) => Some(ServerMessage::from(
                &error.with_trace_id(trace_id.to_string()),
            )),
        };
        match reply {
            Some(message) => send(session, &message).await,
            None => Ok(()),
        }
    }

    async fn shut_down(&self, session: Session, error: SessionError) {
        let reason = match error {
            SessionError::HeartbeatTimeout => {
                warn!("WebSocket heartbeat timeout; closing connection");
                Some(CloseReason {
                    code: CloseCode::Normal,
                    description: Some("heartbeat timeout".to_owned()),
                })
            }
            SessionError::Protocol(error) => {
                warn!(%error, "WebSocket protocol error");
                Some(CloseReason {
                    code: CloseCode::Protocol,
                    description: Some("protocol error".to_owned()),
                })
            }
            SessionError::SessionEnded => {
                info!(user_id = %self.auth.owner(), "session ended; closing live list");
                Some(CloseReason {
                    code: CloseCode::Policy,
                    description: Some("session ended".to_owned()),
                })
            }
            SessionError::InvalidPayload => Some(CloseReason {
                code: CloseCode::Policy,
                description: Some("invalid payload".to_owned()),
            }),
            SessionError::ClientClosed(reason) => reason,
            SessionError::Network(error) => {
                warn!(%error, "WebSocket send failed; closing connection");
                return;
            }
            SessionError::StreamClosed => None,
        };
        if let Err(error) = session.close(reason).await {
            debug!(%error, "WebSocket already closed");
        }
    }
}

async fn send(session: &mut Session, message: &ServerMessage) -> Result<(), SessionError> {
    match serde_json::to_string(message) {
        Ok(body) => session.text(body).await.map_err(SessionError::Network),
        Err(error) => {
            warn!(%error, "failed to serialise WebSocket message");
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
