//! The space surface: the root list, lazy child expansion, and pushed
//! metadata.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use alcove_client::{ClientError, Session};
use alcove_directory::{DirectoryError, SyncConfig};
use alcove_live::ListEdit;
use alcove_testkit::{fixtures, ScriptedDirectory};
use assert_matches::assert_matches;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

fn start_session() -> (Arc<ScriptedDirectory>, Session) {
    let _ = tracing_subscriber::fmt::try_init();
    let directory = Arc::new(ScriptedDirectory::new());
    let session = Session::start(directory.clone(), SyncConfig::default())
        .expect("a scripted directory never fails to subscribe");
    (directory, session)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn joined_spaces_flow_into_the_root_list() {
    let (directory, session) = start_session();

    directory
        .joined_spaces_script()
        .push_batch(vec![ListEdit::Append {
            values: vec![fixtures::space(1, 2), fixtures::space(2, 0)],
        }])
        .await;
    settle().await;

    let roots = session.spaces().snapshot();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots.items()[0].children_count, 2);
    assert!(session.spaces().open_spaces().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expand_subscribes_and_fills_the_children() {
    let (directory, session) = start_session();
    let space = fixtures::room_id(1);
    let script = directory.space_script(&space);
    script.script_page(
        vec![ListEdit::Append {
            values: vec![fixtures::space_room(10), fixtures::space_room(11)],
        }],
        true,
    );

    let children = session.spaces().expand(&space).await.unwrap();
    settle().await;

    assert_eq!(children.snapshot().len(), 2);
    assert!(children.pagination_status().is_exhausted());
    assert_eq!(script.page_requests(), vec![100]);
    assert_eq!(session.spaces().open_spaces(), vec![space.clone()]);
    assert!(session.spaces().children_state(&space).unwrap().is_loaded());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expand_is_memoized_across_callers() {
    let (directory, session) = start_session();
    let space = fixtures::room_id(1);
    let script = directory.space_script(&space);
    script.script_page(
        vec![ListEdit::Append {
            values: vec![fixtures::space_room(10)],
        }],
        false,
    );

    let (first, second) = tokio::join!(
        session.spaces().expand(&space),
        session.spaces().expand(&space)
    );
    let first = first.unwrap();
    let second = second.unwrap();
    settle().await;

    // One subscription, one fill, shared by both callers.
    assert_eq!(script.page_requests().len(), 1);
    assert_eq!(first.snapshot().len(), 1);
    assert_eq!(first.snapshot().seq(), second.snapshot().seq());

    let third = session.spaces().expand(&space).await.unwrap();
    assert_eq!(script.page_requests().len(), 1);
    assert_eq!(third.snapshot().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn meta_updates_flow_after_open() {
    let (directory, session) = start_session();
    let space = fixtures::room_id(3);

    session.spaces().open(&space).unwrap();
    let mut meta = session.spaces().meta(&space).unwrap();
    assert!(meta.borrow().is_none());

    directory
        .push_space_meta(&space, Some(fixtures::space(3, 5)))
        .await;
    meta.changed().await.unwrap();
    let updated = meta.borrow_and_update().clone().unwrap();
    assert_eq!(updated.id, space);
    assert_eq!(updated.children_count, 5);

    // Reopening is a no-op; the node and its feed survive.
    session.spaces().open(&space).unwrap();
    assert_eq!(session.spaces().open_spaces(), vec![space.clone()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unopened_space_is_unknown() {
    let (_directory, session) = start_session();
    let stranger = fixtures::room_id(9);

    assert_matches!(
        session.spaces().meta(&stranger),
        Err(ClientError::UnknownSpace(id)) if id == stranger
    );
    assert_matches!(
        session.spaces().children_state(&stranger),
        Err(ClientError::UnknownSpace(_))
    );

    // Expanding is how a space becomes known.
    session.spaces().expand(&stranger).await.unwrap();
    assert!(session.spaces().meta(&stranger).is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_first_fill_leaves_the_children_usable() {
    let (directory, session) = start_session();
    let space = fixtures::room_id(4);
    let script = directory.space_script(&space);
    script.fail_next_page(DirectoryError::Backend("listing unavailable".into()));

    // The expansion itself still succeeds; only the first fill failed.
    let children = session.spaces().expand(&space).await.unwrap();
    settle().await;
    assert!(children.snapshot().is_empty());
    assert!(!children.pagination_status().is_exhausted());

    script.script_page(
        vec![ListEdit::Append {
            values: vec![fixtures::space_room(40)],
        }],
        true,
    );
    assert!(children.paginate().await.unwrap());
    settle().await;
    assert_eq!(children.snapshot().len(), 1);
    assert!(children.pagination_status().is_exhausted());
    assert_eq!(script.page_requests().len(), 2);

    // Live pushes keep landing on the expanded list.
    script
        .push_batch(vec![ListEdit::PushBack {
            value: fixtures::space_room(41),
        }])
        .await;
    settle().await;
    assert_eq!(children.snapshot().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_stops_expanded_children() {
    let (directory, session) = start_session();
    let space = fixtures::room_id(6);
    let script = directory.space_script(&space);
    script.script_page(
        vec![ListEdit::Append {
            values: vec![fixtures::space_room(60)],
        }],
        false,
    );

    let children = session.spaces().expand(&space).await.unwrap();
    settle().await;
    assert_eq!(children.snapshot().len(), 1);

    session.shutdown();
    settle().await;

    script
        .push_batch(vec![ListEdit::PushBack {
            value: fixtures::space_room(61),
        }])
        .await;
    directory
        .push_space_meta(&space, Some(fixtures::space(6, 1)))
        .await;
    settle().await;

    assert_eq!(children.snapshot().len(), 1);
    assert!(session.spaces().meta(&space).unwrap().borrow().is_none());
}
