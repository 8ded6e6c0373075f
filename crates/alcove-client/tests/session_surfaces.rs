//! Session-level flows over a scripted directory: the joined-rooms list,
//! the connection watch, and shared member loads.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use alcove_client::{ClientError, Session};
use alcove_directory::{DirectoryError, RoomFilter, SyncConfig, SyncState};
use alcove_live::{ListEdit, ProjectionEvent};
use alcove_testkit::{fixtures, ScriptedDirectory};
use assert_matches::assert_matches;
use futures::future::join_all;

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
async fn room_list_flows_into_snapshots() {
    let (directory, session) = start_session();
    let mut rooms = session.room_list().watch();

    directory
        .rooms()
        .list()
        .push_batch(vec![ListEdit::Append {
            values: vec![
                fixtures::room_summary(1),
                fixtures::direct_room_summary(2, 4),
            ],
        }])
        .await;
    rooms.changed().await.unwrap();

    let snapshot = rooms.borrow_and_update().clone();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.items()[0].id, fixtures::room_id(1));
    assert_eq!(snapshot.items()[1].unread_notifications, 4);
    assert_eq!(session.room_list().snapshot().seq(), snapshot.seq());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn filter_reaches_the_directory_and_the_list_follows() {
    let (directory, session) = start_session();
    let rooms = directory.rooms();

    rooms
        .list()
        .push_batch(vec![ListEdit::Append {
            values: vec![
                fixtures::room_summary(1),
                fixtures::direct_room_summary(2, 0),
            ],
        }])
        .await;
    settle().await;
    assert_eq!(session.room_list().snapshot().len(), 2);

    session
        .room_list()
        .set_filter(RoomFilter::Direct)
        .await
        .unwrap();
    assert_eq!(rooms.filter(), RoomFilter::Direct);
    assert_eq!(rooms.filter_calls(), 1);

    // The directory answers a filter change by resetting the list to the
    // matching rooms.
    rooms
        .list()
        .push_batch(vec![ListEdit::Reset {
            values: vec![fixtures::direct_room_summary(2, 0)],
        }])
        .await;
    settle().await;

    let snapshot = session.room_list().snapshot();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.items()[0].is_direct);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejected_batch_is_healed_by_replay() {
    let (directory, session) = start_session();
    let rooms = directory.rooms();
    rooms.list().set_canonical(vec![
        fixtures::room_summary(1),
        fixtures::room_summary(2),
    ]);

    let mut events = session.room_list().events();

    // An edit that cannot apply to an empty list.
    rooms
        .list()
        .push_batch(vec![ListEdit::Remove { index: 9 }])
        .await;

    assert_matches!(
        events.recv().await.unwrap(),
        ProjectionEvent::Rejected { .. }
    );
    // The service answers with a replay request and the canonical list
    // lands as the next batch.
    assert_matches!(events.recv().await.unwrap(), ProjectionEvent::Applied { .. });

    assert_eq!(rooms.list().reset_requests(), 1);
    let healed = session.room_list().snapshot();
    assert!(!healed.is_desynced());
    assert_eq!(healed.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn replay_survives_a_lagged_outcome_feed() {
    let _ = tracing_subscriber::fmt::try_init();
    let directory = Arc::new(ScriptedDirectory::new());
    // A one-slot outcome channel makes any backlog overwrite the rejection.
    let config = SyncConfig {
        event_channel_capacity: 1,
        ..SyncConfig::default()
    };
    let session = Session::start(directory.clone(), config)
        .expect("a scripted directory never fails to subscribe");
    let rooms = directory.rooms();
    rooms.list().set_canonical(vec![
        fixtures::room_summary(1),
        fixtures::room_summary(2),
    ]);

    // Park the first replay mid-flight and make it fail once released, so
    // the rejection stays unhealed while further outcomes pile up.
    let reset_gate = rooms.list().hold_next_reset();
    rooms
        .list()
        .fail_next_reset(DirectoryError::Backend("replay unavailable".into()));
    rooms
        .list()
        .push_batch(vec![ListEdit::Remove { index: 9 }])
        .await;
    settle().await;
    assert_eq!(rooms.list().reset_requests(), 1);
    assert!(session.room_list().snapshot().is_desynced());

    // Two applied batches while the listener is parked: the second evicts
    // the first from the one-slot channel, so the listener wakes to a lag.
    rooms
        .list()
        .push_batch(vec![ListEdit::PushBack {
            value: fixtures::room_summary(3),
        }])
        .await;
    rooms
        .list()
        .push_batch(vec![ListEdit::PushBack {
            value: fixtures::room_summary(4),
        }])
        .await;
    settle().await;

    reset_gate.notify_one();
    settle().await;

    // The lag made the listener consult the snapshot and replay again.
    assert_eq!(rooms.list().reset_requests(), 2);
    let healed = session.room_list().snapshot();
    assert!(!healed.is_desynced());
    assert_eq!(healed.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn connection_state_is_mirrored() {
    let (directory, session) = start_session();
    let mut connection = session.connection();
    assert_eq!(session.sync_state(), SyncState::Idle);

    directory.push_connection(SyncState::Running).await;
    connection.changed().await.unwrap();
    assert!(session.sync_state().is_running());

    directory.push_connection(SyncState::Error).await;
    connection.changed().await.unwrap();
    assert_eq!(*connection.borrow(), SyncState::Error);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn member_walk_is_shared_across_callers() {
    let (directory, session) = start_session();
    let room = fixtures::room_id(1);
    // Three pager chunks at the default chunk size.
    directory.set_members(&room, (0..2500).map(fixtures::member).collect());

    let handle = session.members(&room);
    assert!(handle.state().is_loading());
    assert!(Arc::ptr_eq(&handle, &session.members(&room)));

    let loads = join_all((0..4).map(|_| {
        let members = session.members(&room);
        async move { members.load().await }
    }))
    .await;
    for outcome in loads {
        assert_eq!(outcome.unwrap().len(), 2500);
    }

    assert_eq!(directory.pager_opens(&room), 1);
    assert!(handle.state().is_loaded());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_member_walk_is_retried() {
    let (directory, session) = start_session();
    let room = fixtures::room_id(5);

    // Nothing scripted for the room yet: the walk fails and the failure
    // is held, not retried behind the caller's back.
    let members = session.members(&room);
    let err = members.load().await.unwrap_err();
    assert_matches!(err, ClientError::Directory(DirectoryError::UnknownRoom(_)));
    assert!(members.state().is_failed());

    directory.set_members(&room, vec![fixtures::member(1)]);
    let recovered = members.load().await.unwrap();
    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].user_id, fixtures::user_id(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_freezes_every_surface() {
    let (directory, session) = start_session();
    directory
        .rooms()
        .list()
        .push_batch(vec![ListEdit::PushBack {
            value: fixtures::room_summary(1),
        }])
        .await;
    settle().await;
    assert_eq!(session.room_list().snapshot().len(), 1);

    session.shutdown();
    settle().await;

    directory
        .rooms()
        .list()
        .push_batch(vec![ListEdit::PushBack {
            value: fixtures::room_summary(2),
        }])
        .await;
    directory.push_connection(SyncState::Running).await;
    settle().await;

    assert_eq!(session.room_list().snapshot().len(), 1);
    assert_eq!(session.sync_state(), SyncState::Idle);
}
