//! Tests for the bookmark use-cases.

use std::sync::Arc;

use super::*;
use crate::domain::ports::MockBookmarkRepository;
use crate::domain::test_fixtures::{bookmark, id, owner, owner_session};
use crate::domain::{ErrorCode, INVALID_URL_MESSAGE, MISSING_FIELDS_MESSAGE};
use rstest::rstest;

fn make_service(repo: MockBookmarkRepository) -> BookmarkService<MockBookmarkRepository> {
    BookmarkService::new(Arc::new(repo))
}

#[rstest]
#[case("", "example.com", MISSING_FIELDS_MESSAGE)]
#[case("Example", "  ", MISSING_FIELDS_MESSAGE)]
#[case("Example", "bad url", INVALID_URL_MESSAGE)]
#[tokio::test]
async fn invalid_input_never_reaches_the_repository(
    #[case] title: &str,
    #[case] url: &str,
    #[case] message: &str,
) {
    let mut repo = MockBookmarkRepository::new();
    repo.expect_insert().times(0);

    let error = make_service(repo)
        .add_bookmark(&owner_session(), title, url)
        .await
        .expect_err("validation fails");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.message(), message);
}

#[tokio::test]
async fn add_sends_normalised_payload_for_the_owner() {
    let mut repo = MockBookmarkRepository::new();
    repo.expect_insert()
        .withf(|_, payload| {
            payload.title == "Rust"
                && payload.url == "https://rust-lang.org"
                && payload.user_id == owner()
        })
        .times(1)
        .return_once(|_, _| Ok(bookmark("b1", 1)));

    let saved = make_service(repo)
        .add_bookmark(&owner_session(), " Rust ", "rust-lang.org")
        .await
        .expect("insert succeeds");
    assert_eq!(saved.id, id("b1"));
}

#[rstest]
#[case(
    BookmarkRepositoryError::connection("timeout"),
    ErrorCode::ServiceUnavailable
)]
#[case(
    BookmarkRepositoryError::rejected(500_u16, "boom"),
    ErrorCode::ServiceUnavailable
)]
#[case(
    BookmarkRepositoryError::decode("bad row"),
    ErrorCode::ServiceUnavailable
)]
#[case(
    BookmarkRepositoryError::unauthorized("jwt expired"),
    ErrorCode::Unauthorized
)]
#[tokio::test]
async fn insert_failures_surface_the_generic_save_message(
    #[case] failure: BookmarkRepositoryError,
    #[case] code: ErrorCode,
) {
    let mut repo = MockBookmarkRepository::new();
    repo.expect_insert()
        .times(1)
        .return_once(move |_, _| Err(failure));

    let error = make_service(repo)
        .add_bookmark(&owner_session(), "Rust", "https://rust-lang.org")
        .await
        .expect_err("insert fails");
    assert_eq!(error.code(), code);
    assert_eq!(error.message(), SAVE_FAILED_MESSAGE);
}

#[tokio::test]
async fn delete_forwards_the_id() {
    let mut repo = MockBookmarkRepository::new();
    repo.expect_delete()
        .withf(|_, target| target == &id("b2"))
        .times(1)
        .return_once(|_, _| Ok(()));

    make_service(repo)
        .delete_bookmark(&owner_session(), &id("b2"))
        .await
        .expect("delete succeeds");
}

#[tokio::test]
async fn delete_failures_are_reported_without_detail() {
    let mut repo = MockBookmarkRepository::new();
    repo.expect_delete()
        .times(1)
        .return_once(|_, _| Err(BookmarkRepositoryError::decode("secret detail")));

    let error = make_service(repo)
        .delete_bookmark(&owner_session(), &id("b2"))
        .await
        .expect_err("delete fails");
    assert_eq!(error.message(), DELETE_FAILED_MESSAGE);
}

#[tokio::test]
async fn list_returns_repository_rows() {
    let mut repo = MockBookmarkRepository::new();
    repo.expect_list_for_owner()
        .times(1)
        .return_once(|_| Ok(vec![bookmark("b2", 2), bookmark("b1", 1)]));

    let rows = make_service(repo)
        .list_bookmarks(&owner_session())
        .await
        .expect("list succeeds");
    assert_eq!(rows.len(), 2);
}
