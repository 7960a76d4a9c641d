//! awc-backed implementation of the [`ChangeFeed`] port.
//!
//! Each subscription owns one socket: the channel is joined before
//! `subscribe` returns, then a local task pumps deliveries into the
//! subscription, sends heartbeats, forwards renewed access tokens and leaves
//! the channel once the consumer unsubscribes.

use std::time::Duration;

use actix_codec::Framed;
use async_trait::async_trait;
use awc::BoxedSocket;
use awc::ws::{Codec, Frame, Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};
use url::Url;

use super::protocol::{
    PhoenixMessage, RefCounter, ReplyStatus, access_token_message, channel_topic,
    heartbeat_message, join_message, leave_message,
};
use crate::domain::AuthSession;
use crate::domain::ports::{
    ChangeFeed, ChangeFeedError, ChangePublisher, ChangeSubscription, subscription_channel,
};
use crate::outbound::hosted::{HostedBackendConfig, HostedConfigError};

type Socket = Framed<BoxedSocket, Codec>;

/// Keep-alive interval required by the realtime server.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// Realtime implementation of [`ChangeFeed`].
pub struct HostedChangeFeed {
    socket_url: Url,
    timeout: Duration,
    heartbeat: Duration,
}

impl HostedChangeFeed {
    /// Build a feed for the configured project.
    ///
    /// # Errors
    ///
    /// Returns an error when the realtime URL cannot be derived.
    pub fn new(config: &HostedBackendConfig) -> Result<Self, HostedConfigError> {
        Ok(Self {
            socket_url: config.realtime_url()?,
            timeout: config.timeout(),
            heartbeat: HEARTBEAT_INTERVAL,
        })
    }

    async fn connect(&self) -> Result<Socket, ChangeFeedError> {
        let client = awc::Client::builder().timeout(self.timeout).finish();
        let (_response, socket) = client
            .ws(self.socket_url.as_str())
            .connect()
            .await
            .map_err(|err| ChangeFeedError::connection(err.to_string()))?;
        Ok(socket)
    }

    async fn join(
        &self,
        socket: &mut Socket,
        refs: &mut RefCounter,
        session: &AuthSession,
        topic: &str,
    ) -> Result<(), ChangeFeedError> {
        let reference = refs.next();
        let join = join_message(
            topic,
            session.owner(),
            &session.access_token,
            reference.clone(),
        );
        send(socket, &join)
            .await
            .map_err(ChangeFeedError::connection)?;

        let awaited = tokio::time::timeout(self.timeout, async {
            while let Some(frame) = socket.next().await {
                let frame = frame.map_err(|err| ChangeFeedError::connection(err.to_string()))?;
                let Frame::Text(bytes) = frame else { continue };
                let Ok(message) = serde_json::from_slice::<PhoenixMessage>(&bytes) else {
                    continue;
                };
                match message.reply_to(&reference) {
                    Some(ReplyStatus::Ok) => return Ok(()),
                    Some(ReplyStatus::Error(detail)) => {
                        return Err(ChangeFeedError::rejected(detail));
                    }
                    None => {}
                }
            }
            Err::<(), _>(ChangeFeedError::connection(
                "socket closed before join reply",
            ))
        })
        .await;
        awaited.unwrap_or_else(|_| {
            Err(ChangeFeedError::connection(
                "timed out waiting for join reply",
            ))
        })
    }
}

#[async_trait(?Send)]
impl ChangeFeed for HostedChangeFeed {
    async fn subscribe(
        &self,
        session: &AuthSession,
    ) -> Result<ChangeSubscription, ChangeFeedError> {
        let topic = channel_topic(session.owner());
        let mut socket = self.connect().await?;
        let mut refs = RefCounter::default();
        self.join(&mut socket, &mut refs, session, &topic).await?;
        info!(owner = %session.owner(), %topic, "realtime channel joined");

        let (publisher, subscription) = subscription_channel();
        actix_web::rt::spawn(pump(socket, publisher, topic, refs, self.heartbeat));
        Ok(subscription)
    }
}

async fn send(socket: &mut Socket, message: &PhoenixMessage) -> Result<(), String> {
    let text = serde_json::to_string(message).map_err(|err| err.to_string())?;
    socket
        .send(Message::Text(text.into()))
        .await
        .map_err(|err| err.to_string())
}

async fn pump(
    mut socket: Socket,
    publisher: ChangePublisher,
    topic: String,
    mut refs: RefCounter,
    every: Duration,
) {
    let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
    let mut renewals = publisher.renewals();
    loop {
        tokio::select! {
            () = publisher.closed() => {
                if let Err(error) = send(&mut socket, &leave_message(&topic, refs.next())).await {
                    debug!(%topic, %error, "realtime leave not sent");
                }
                if let Err(error) = socket.send(Message::Close(None)).await {
                    debug!(%topic, %error, "realtime socket already closed");
                }
                debug!(%topic, "realtime channel left");
                break;
            }
            _ = heartbeat.tick() => {
                if let Err(error) = send(&mut socket, &heartbeat_message(refs.next())).await {
                    warn!(%topic, %error, "realtime heartbeat failed");
                    break;
                }
            }
            Ok(()) = renewals.changed() => {
                let renewed = renewals.borrow_and_update().clone();
                if let Some(token) = renewed {
                    let message = access_token_message(&topic, &token, refs.next());
                    if let Err(error) = send(&mut socket, &message).await {
                        warn!(%topic, %error, "realtime token renewal failed");
                        break;
                    }
                    debug!(%topic, "realtime channel token renewed");
                }
            }
            frame = socket.next() => match frame {
                Some(Ok(Frame::Text(bytes))) => {
                    if !deliver(&publisher, &topic, &bytes) {
                        break;
                    }
                }
                Some(Ok(Frame::Ping(payload))) => {
                    if let Err(error) = socket.send(Message::Pong(payload)).await {
                        debug!(%topic, %error, "realtime pong not sent");
                    }
                }
                Some(Ok(Frame::Close(reason))) => {
                    debug!(%topic, ?reason, "realtime socket closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    warn!(%topic, %error, "realtime socket failed");
                    break;
                }
                None => break,
            },
        }
    }
    // Dropping the publisher ends the subscription stream.
}

/// Forward one text frame. Returns `false` when the channel has ended.
fn deliver(publisher: &ChangePublisher, topic: &str, bytes: &[u8]) -> bool {
    let message = match serde_json::from_slice::<PhoenixMessage>(bytes) {
        Ok(message) => message,
        Err(error) => {
            warn!(%topic, %error, "undecodable realtime frame");
            return true;
        }
    };
    if message.ends_channel(topic) {
        warn!(%topic, event = %message.event, "realtime channel ended by server");
        return false;
    }
    match message.into_change(topic) {
        Ok(Some(change)) => publisher.publish(change),
        Ok(None) => true,
        Err(error) => {
            warn!(%topic, %error, "malformed change delivery");
            true
        }
    }
}
