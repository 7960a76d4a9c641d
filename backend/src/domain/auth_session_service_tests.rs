//! Tests for session sign-in, resumption and sign-out.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::MockAuthGateway;
use crate::domain::test_fixtures::{epoch, other_owner, owner, owner_session, owner_user};
use crate::domain::{AccessToken, RefreshToken, User};

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

fn make_service(gateway: MockAuthGateway) -> AuthSessionService<MockAuthGateway> {
    AuthSessionService::new(
        Arc::new(gateway),
        Arc::new(FixtureClock { utc_now: epoch() }),
    )
}

#[fixture]
fn tokens() -> SessionTokens {
    SessionTokens {
        user_id: owner(),
        access_token: AccessToken::new("stale"),
        refresh_token: Some(RefreshToken::new("refresh")),
        expires_at: Some(epoch() + Duration::hours(1)),
    }
}

fn refreshed_session() -> AuthSession {
    AuthSession {
        access_token: AccessToken::new("fresh"),
        ..owner_session()
    }
}

#[tokio::test]
async fn sign_in_maps_rejected_credentials() {
    let mut gateway = MockAuthGateway::new();
    gateway
        .expect_sign_in()
        .times(1)
        .return_once(|_| Err(AuthGatewayError::invalid_credentials()));
    let creds = Credentials::try_from_parts("ada@example.com", "wrong").expect("creds");

    let error = make_service(gateway)
        .sign_in(&creds)
        .await
        .expect_err("sign in fails");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), INVALID_CREDENTIALS_MESSAGE);
}

#[tokio::test]
async fn sign_in_hides_transport_detail() {
    let mut gateway = MockAuthGateway::new();
    gateway
        .expect_sign_in()
        .times(1)
        .return_once(|_| Err(AuthGatewayError::connection("dns failure at 10.0.0.1")));
    let creds = Credentials::try_from_parts("ada@example.com", "pw").expect("creds");

    let error = make_service(gateway)
        .sign_in(&creds)
        .await
        .expect_err("sign in fails");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert!(!error.message().contains("10.0.0.1"));
}

#[rstest]
#[tokio::test]
async fn resume_accepts_confirmed_tokens(tokens: SessionTokens) {
    let mut gateway = MockAuthGateway::new();
    gateway
        .expect_current_user()
        .times(1)
        .return_once(|_| Ok(Some(owner_user())));
    gateway.expect_refresh().times(0);

    let session = make_service(gateway)
        .resume(&tokens)
        .await
        .expect("resume succeeds")
        .expect("session present");
    assert_eq!(session.owner(), &owner());
    assert_eq!(session.access_token.expose(), "stale");
}

#[rstest]
#[tokio::test]
async fn resume_refreshes_rejected_access_tokens(tokens: SessionTokens) {
    let mut gateway = MockAuthGateway::new();
    gateway
        .expect_current_user()
        .times(1)
        .return_once(|_| Ok(None));
    gateway
        .expect_refresh()
        .withf(|token| token.expose() == "refresh")
        .times(1)
        .return_once(|_| Ok(refreshed_session()));

    let session = make_service(gateway)
        .resume(&tokens)
        .await
        .expect("resume succeeds")
        .expect("session present");
    assert_eq!(session.access_token.expose(), "fresh");
}

#[rstest]
#[tokio::test]
async fn resume_skips_verification_for_expired_tokens(mut tokens: SessionTokens) {
    tokens.expires_at = Some(epoch() - Duration::minutes(1));
    let mut gateway = MockAuthGateway::new();
    gateway.expect_current_user().times(0);
    gateway
        .expect_refresh()
        .times(1)
        .return_once(|_| Ok(refreshed_session()));

    let session = make_service(gateway)
        .resume(&tokens)
        .await
        .expect("resume succeeds");
    assert!(session.is_some());
}

#[rstest]
#[tokio::test]
async fn resume_without_refresh_token_signs_out(mut tokens: SessionTokens) {
    tokens.refresh_token = None;
    let mut gateway = MockAuthGateway::new();
    gateway
        .expect_current_user()
        .times(1)
        .return_once(|_| Ok(None));

    let session = make_service(gateway)
        .resume(&tokens)
        .await
        .expect("resume succeeds");
    assert!(session.is_none());
}

#[rstest]
#[tokio::test]
async fn resume_treats_expired_refresh_as_signed_out(tokens: SessionTokens) {
    let mut gateway = MockAuthGateway::new();
    gateway
        .expect_current_user()
        .times(1)
        .return_once(|_| Ok(None));
    gateway
        .expect_refresh()
        .times(1)
        .return_once(|_| Err(AuthGatewayError::session_expired()));

    let session = make_service(gateway)
        .resume(&tokens)
        .await
        .expect("resume succeeds");
    assert!(session.is_none());
}

#[rstest]
#[tokio::test]
async fn resume_rejects_tokens_for_another_user(tokens: SessionTokens) {
    let mut gateway = MockAuthGateway::new();
    gateway
        .expect_current_user()
        .times(1)
        .return_once(|_| Ok(Some(User::new(other_owner()))));

    let session = make_service(gateway)
        .resume(&tokens)
        .await
        .expect("resume succeeds");
    assert!(session.is_none());
}

#[rstest]
#[tokio::test]
async fn resume_propagates_outages(tokens: SessionTokens) {
    let mut gateway = MockAuthGateway::new();
    gateway
        .expect_current_user()
        .times(1)
        .return_once(|_| Err(AuthGatewayError::connection("timeout")));

    let error = make_service(gateway)
        .resume(&tokens)
        .await
        .expect_err("resume fails");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn sign_out_revokes_the_access_token() {
    let mut gateway = MockAuthGateway::new();
    gateway
        .expect_sign_out()
        .withf(|token| token.expose() == "access-token")
        .times(1)
        .return_once(|_| Ok(()));

    make_service(gateway)
        .sign_out(&owner_session())
        .await
        .expect("sign out succeeds");
}
