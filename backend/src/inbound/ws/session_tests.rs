//! Live list WebSocket session tests against a real server.

use std::sync::atomic::{AtomicUsize, Ordering};

use actix_codec::Framed;
use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, dev::ServerHandle, http::header, web};
use awc::{BoxedSocket, ws::Codec, ws::Frame};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use url::Url;
use uuid::Uuid;

use super::*;
use crate::domain::ports::{
    ChangePublisher, MockBookmarksCommand, MockLiveBookmarks, MockSessionService,
    subscription_channel,
};
use crate::domain::test_fixtures::{bookmark, id};
use crate::domain::{AccessToken, Bookmark, BookmarkChange, BookmarkList};
use crate::inbound::http::test_utils::{
    SEED_SESSION_PATH, owner_session, resuming_sessions, seed_session,
};
use crate::inbound::ws;
use crate::inbound::ws::state::{WsState, WsStatePorts};

type Socket = Framed<BoxedSocket, Codec>;

const ORIGIN: &str = "http://localhost:3000";

struct Harness {
    base: String,
    handle: ServerHandle,
}

impl Harness {
    fn start(live: MockLiveBookmarks, bookmarks: MockBookmarksCommand) -> Self {
        Self::start_with(resuming_sessions(), live, bookmarks)
    }

    fn start_with(
        sessions: MockSessionService,
        live: MockLiveBookmarks,
        bookmarks: MockBookmarksCommand,
    ) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let origin = Url::parse(ORIGIN).expect("origin");
        let state = WsState::new(
            WsStatePorts {
                sessions: Arc::new(sessions),
                live: Arc::new(live),
                bookmarks: Arc::new(bookmarks),
            },
            &[origin],
        );
        let key = Key::generate();
        let server = HttpServer::new(move || {
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                        .cookie_name("session".to_owned())
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::new(state.clone()))
                .route(SEED_SESSION_PATH, web::get().to(seed_session))
                .service(ws::ws_entry)
        })
        .workers(1)
        .listen(listener)
        .expect("bind test server")
        .disable_signals()
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        Self {
            base: format!("http://{addr}"),
            handle,
        }
    }

    async fn connect(&self) -> Socket {
        let client = awc::Client::default();
        let seeded = client
            .get(format!("{}{SEED_SESSION_PATH}", self.base))
            .send()
            .await
            .expect("seed session");
        let cookie = seeded.cookie("session").expect("session cookie");
        let (_resp, socket) = client
            .ws(format!("{}/ws", self.base))
            .set_header(header::ORIGIN, ORIGIN)
            .cookie(cookie)
            .connect()
            .await
            .expect("websocket connect");
        socket
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        drop(self.handle.stop(false));
    }
}

fn live_with(snapshot: Vec<Bookmark>) -> (MockLiveBookmarks, ChangePublisher) {
    let (publisher, subscription) = subscription_channel();
    let mut live = MockLiveBookmarks::new();
    live.expect_open().times(1).return_once(move |session| {
        let list = BookmarkList::from_snapshot(session.owner().clone(), snapshot);
        Ok(LiveBookmarkList::new(list, Some(subscription)))
    });
    (live, publisher)
}

async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json frame"),
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

async fn send_json(socket: &mut Socket, value: Value) {
    socket
        .send(awc::ws::Message::Text(value.to_string().into()))
        .await
        .expect("send text");
}

/// Sessions that resolve the upgrade, then answer later checks with `then`.
fn sessions_after_upgrade(then: Option<AuthSession>, upgrade: AuthSession) -> MockSessionService {
    let calls = AtomicUsize::new(0);
    let mut sessions = MockSessionService::new();
    sessions.expect_resume().times(1..).returning(move |_| {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(Some(upgrade.clone()))
        } else {
            Ok(then.clone())
        }
    });
    sessions
}

async fn close_reason(socket: &mut Socket) -> CloseReason {
    tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(frame) = socket.next().await {
            match frame.expect("frame") {
                Frame::Ping(_) | Frame::Pong(_) => continue,
                Frame::Close(reason) => return reason,
                other => panic!("unexpected frame before close: {other:?}"),
            }
        }
        None
    })
    .await
    .expect("close frame within timeout")
    .expect("close reason")
}

async fn opened(socket: &mut Socket) -> Value {
    assert_eq!(next_json(socket).await["type"], "loading");
    let snapshot = next_json(socket).await;
    assert_eq!(snapshot["type"], "snapshot");
    snapshot
}

#[actix_rt::test]
async fn streams_snapshot_then_visible_changes() {
    let (live, publisher) = live_with(vec![bookmark("b2", 2), bookmark("b1", 1)]);
    let harness = Harness::start(live, MockBookmarksCommand::new());
    let mut socket = harness.connect().await;

    let snapshot = opened(&mut socket).await;
    let ids: Vec<_> = snapshot["bookmarks"]
        .as_array()
        .expect("rows")
        .iter()
        .map(|row| row["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("b2"), json!("b1")]);

    publisher.publish(BookmarkChange::Inserted(bookmark("b2", 2)));
    publisher.publish(BookmarkChange::Inserted(bookmark("b3", 3)));
    publisher.publish(BookmarkChange::Deleted { id: id("missing") });
    publisher.publish(BookmarkChange::Deleted { id: id("b2") });

    let inserted = next_json(&mut socket).await;
    assert_eq!(inserted["type"], "inserted");
    assert_eq!(inserted["bookmark"]["id"], "b3");
    assert_eq!(
        next_json(&mut socket).await,
        json!({"type": "deleted", "id": "b2"})
    );
}

#[actix_rt::test]
async fn local_add_is_shown_once() {
    let (live, publisher) = live_with(Vec::new());
    let mut bookmarks = MockBookmarksCommand::new();
    bookmarks
        .expect_add_bookmark()
        .withf(|_, title, url| title == "Docs" && url == "docs.rs")
        .times(1)
        .returning(|_, _, _| Ok(bookmark("b9", 9)));
    let harness = Harness::start(live, bookmarks);
    let mut socket = harness.connect().await;
    opened(&mut socket).await;

    send_json(
        &mut socket,
        json!({"type": "add", "traceId": Uuid::nil(), "title": "Docs", "url": "docs.rs"}),
    )
    .await;
    let inserted = next_json(&mut socket).await;
    assert_eq!(inserted["type"], "inserted");
    assert_eq!(inserted["bookmark"]["id"], "b9");

    // The feed echo is absorbed; the next frame is the later delete.
    publisher.publish(BookmarkChange::Inserted(bookmark("b9", 9)));
    publisher.publish(BookmarkChange::Deleted { id: id("b9") });
    assert_eq!(
        next_json(&mut socket).await,
        json!({"type": "deleted", "id": "b9"})
    );
}

#[actix_rt::test]
async fn failed_commands_reply_with_an_error_frame() {
    let (live, _publisher) = live_with(Vec::new());
    let mut bookmarks = MockBookmarksCommand::new();
    bookmarks
        .expect_add_bookmark()
        .times(1)
        .returning(|_, _, _| Err(Error::invalid_request("Both URL and title are required.")));
    let harness = Harness::start(live, bookmarks);
    let mut socket = harness.connect().await;
    opened(&mut socket).await;

    let trace_id = Uuid::new_v4();
    send_json(
        &mut socket,
        json!({"type": "add", "traceId": trace_id, "url": "docs.rs"}),
    )
    .await;
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["code"], "invalid_request");
    assert_eq!(reply["message"], "Both URL and title are required.");
    assert_eq!(reply["traceId"], trace_id.to_string());
}

#[actix_rt::test]
async fn local_delete_removes_the_row() {
    let (live, _publisher) = live_with(vec![bookmark("b1", 1)]);
    let mut bookmarks = MockBookmarksCommand::new();
    bookmarks
        .expect_delete_bookmark()
        .withf(|_, id| id.as_ref() == "b1")
        .times(1)
        .returning(|_, _| Ok(()));
    let harness = Harness::start(live, bookmarks);
    let mut socket = harness.connect().await;
    opened(&mut socket).await;

    send_json(
        &mut socket,
        json!({"type": "delete", "traceId": Uuid::nil(), "id": "b1"}),
    )
    .await;
    assert_eq!(
        next_json(&mut socket).await,
        json!({"type": "deleted", "id": "b1"})
    );
}

#[actix_rt::test]
async fn ended_feed_is_reported() {
    let (live, publisher) = live_with(Vec::new());
    let harness = Harness::start(live, MockBookmarksCommand::new());
    let mut socket = harness.connect().await;
    opened(&mut socket).await;

    drop(publisher);
    let notice = next_json(&mut socket).await;
    assert_eq!(notice["type"], "error");
    assert_eq!(notice["code"], "service_unavailable");
    assert_eq!(notice["message"], LIVE_UNAVAILABLE_MESSAGE);
}

#[actix_rt::test]
async fn degraded_open_sends_notices_after_the_snapshot() {
    let mut live = MockLiveBookmarks::new();
    live.expect_open().times(1).return_once(|session| {
        let mut list = LiveBookmarkList::new(BookmarkList::new(session.owner().clone()), None);
        list.push_notice(Error::service_unavailable(LIVE_UNAVAILABLE_MESSAGE));
        Ok(list)
    });
    let harness = Harness::start(live, MockBookmarksCommand::new());
    let mut socket = harness.connect().await;

    let snapshot = opened(&mut socket).await;
    assert_eq!(snapshot["bookmarks"], json!([]));
    let notice = next_json(&mut socket).await;
    assert_eq!(notice["message"], LIVE_UNAVAILABLE_MESSAGE);
}

#[actix_rt::test]
async fn closes_on_malformed_json() {
    let (live, _publisher) = live_with(Vec::new());
    let harness = Harness::start(live, MockBookmarksCommand::new());
    let mut socket = harness.connect().await;
    opened(&mut socket).await;

    socket
        .send(awc::ws::Message::Text("not-json".into()))
        .await
        .expect("send text");
    loop {
        match socket.next().await.expect("response frame").expect("frame") {
            Frame::Ping(_) | Frame::Pong(_) => continue,
            Frame::Close(reason) => {
                assert_eq!(reason.expect("reason").code, CloseCode::Policy);
                break;
            }
            other => panic!("expected close frame, got {other:?}"),
        }
    }
}

#[actix_rt::test]
async fn closes_after_timeout_without_client_messages() {
    let (live, _publisher) = live_with(Vec::new());
    let harness = Harness::start(live, MockBookmarksCommand::new());
    let mut socket = harness.connect().await;
    opened(&mut socket).await;
    tokio::time::sleep(CLIENT_TIMEOUT + HEARTBEAT_INTERVAL * 3).await;

    let reason = close_reason(&mut socket).await;
    assert_eq!(reason.code, CloseCode::Normal);
    assert_eq!(reason.description.as_deref(), Some("heartbeat timeout"));
}

#[actix_rt::test]
async fn signed_out_upgrades_are_refused() {
    let mut live = MockLiveBookmarks::new();
    live.expect_open().never();
    let harness = Harness::start(live, MockBookmarksCommand::new());

    let result = awc::Client::default()
        .ws(format!("{}/ws", harness.base))
        .set_header(header::ORIGIN, ORIGIN)
        .connect()
        .await;
    assert!(
        result.is_err(),
        "upgrade without a session cookie must fail"
    );
}

#[actix_rt::test]
async fn signed_out_sessions_close_the_socket() {
    let (live, publisher) = live_with(Vec::new());
    let harness = Harness::start_with(
        sessions_after_upgrade(None, owner_session()),
        live,
        MockBookmarksCommand::new(),
    );
    let mut socket = harness.connect().await;
    opened(&mut socket).await;

    let reason = close_reason(&mut socket).await;
    assert_eq!(reason.code, CloseCode::Policy);
    assert_eq!(reason.description.as_deref(), Some("session ended"));
    assert!(publisher.is_closed(), "the feed subscription is released");
}

#[actix_rt::test]
async fn expired_sessions_are_refreshed_before_commands() {
    let expired = AuthSession {
        expires_at: Some(chrono::Utc::now() - chrono::Duration::minutes(1)),
        ..owner_session()
    };
    let renewed = AuthSession {
        access_token: AccessToken::new("renewed"),
        expires_at: Some(chrono::Utc::now() + chrono::Duration::hours(1)),
        ..owner_session()
    };
    let (live, publisher) = live_with(Vec::new());
    let mut bookmarks = MockBookmarksCommand::new();
    bookmarks
        .expect_add_bookmark()
        .withf(|session, _, _| session.access_token.expose() == "renewed")
        .times(1)
        .returning(|_, _, _| Ok(bookmark("b9", 9)));
    let harness = Harness::start_with(
        sessions_after_upgrade(Some(renewed), expired),
        live,
        bookmarks,
    );
    let mut socket = harness.connect().await;
    opened(&mut socket).await;

    send_json(
        &mut socket,
        json!({"type": "add", "traceId": Uuid::nil(), "title": "Docs", "url": "docs.rs"}),
    )
    .await;
    let inserted = next_json(&mut socket).await;
    assert_eq!(inserted["type"], "inserted");
    assert_eq!(publisher.renewed_token(), Some(AccessToken::new("renewed")));
}
