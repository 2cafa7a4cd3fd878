//! Tests for the session state machine.

use std::sync::Arc;
use std::time::Duration;

use strictly_arena::{
    AUTOMATED_PARTICIPANT, HubHandle, HubMessage, InMemoryDirectory, Mode, NotificationHub,
    Outcome, Session, SessionErrorKind, SessionFilter, SessionRegistry, SessionService, Status,
    SubscriberHandle,
};
use strictly_rules::{Board, Cell, FirstFreePolicy, HeuristicPolicy, Mark, MovePolicy};

/// Policy that always answers with an occupied cell.
#[derive(Debug)]
struct IllegalPolicy;

impl MovePolicy for IllegalPolicy {
    fn choose_move(&self, _board: &Board, _own: Mark, _opponent: Mark) -> Cell {
        Cell::new(0, 0)
    }
}

struct Fixture {
    service: SessionService,
    directory: Arc<InMemoryDirectory>,
    hub: HubHandle,
    alice: String,
    bob: String,
}

fn fixture_with(policy: Arc<dyn MovePolicy>) -> Fixture {
    let directory = Arc::new(InMemoryDirectory::new());
    let hub = NotificationHub::spawn();
    let service = SessionService::new(
        Arc::new(SessionRegistry::new()),
        directory.clone(),
        policy,
        hub.clone(),
    );
    let alice = directory.register("Alice").id().clone();
    let bob = directory.register("Bob").id().clone();
    Fixture {
        service,
        directory,
        hub,
        alice,
        bob,
    }
}

fn fixture() -> Fixture {
    fixture_with(Arc::new(HeuristicPolicy))
}

/// Creates a two-human session with Alice as X and Bob as O.
fn started(f: &Fixture) -> String {
    let session = f.service.create_session(&f.alice, "PVP").expect("create");
    f.service
        .join_session(session.id(), &f.bob)
        .expect("join")
        .id()
        .clone()
}

#[tokio::test]
async fn test_create_two_human_waits_for_second_participant() {
    let f = fixture();
    let session = f.service.create_session(&f.alice, "PVP").expect("create");

    assert_eq!(session.mode(), &Mode::TwoHuman);
    assert_eq!(session.status(), &Status::AwaitingSecondParticipant);
    assert_eq!(session.mark_of(&f.alice), Some(Mark::X));
    assert_eq!(session.player_o(), &None);
}

#[tokio::test]
async fn test_create_automated_starts_in_progress() {
    let f = fixture();
    let session = f.service.create_session(&f.alice, "PVC").expect("create");

    assert_eq!(session.status(), &Status::InProgress);
    assert_eq!(session.turn(), &Some(Mark::X));
    assert_eq!(session.player_o().as_deref(), Some(AUTOMATED_PARTICIPANT));
}

#[tokio::test]
async fn test_create_rejects_unknown_creator_and_mode() {
    let f = fixture();

    let err = f.service.create_session("stranger", "PVP").unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::UnknownParticipant);

    let err = f.service.create_session(&f.alice, "BATTLE_ROYALE").unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::InvalidMode);
}

#[tokio::test]
async fn test_join_seats_second_participant() {
    let f = fixture();
    let id = started(&f);
    let session = f.service.get_session(&id).expect("get");

    assert_eq!(session.status(), &Status::InProgress);
    assert_eq!(session.turn(), &Some(Mark::X));
    assert_eq!(session.mark_of(&f.bob), Some(Mark::O));
}

#[tokio::test]
async fn test_join_errors() {
    let f = fixture();

    let err = f.service.join_session("missing", &f.bob).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::NotFound);

    let waiting = f.service.create_session(&f.alice, "PVP").expect("create");
    let err = f.service.join_session(waiting.id(), "stranger").unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::UnknownParticipant);

    let id = started(&f);
    let err = f.service.join_session(&id, &f.bob).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::InvalidState);

    let automated = f.service.create_session(&f.alice, "PVC").expect("create");
    let err = f.service.join_session(automated.id(), &f.bob).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::InvalidState);
}

#[tokio::test]
async fn test_creator_cannot_join_own_session() {
    let f = fixture();
    let waiting = f.service.create_session(&f.alice, "PVP").expect("create");

    let err = f.service.join_session(waiting.id(), &f.alice).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::InvalidState);

    // The session is still open for a real second participant.
    let session = f.service.get_session(waiting.id()).expect("get");
    assert_eq!(session.status(), &Status::AwaitingSecondParticipant);
    assert_eq!(session.player_o(), &None);

    let session = f.service.join_session(waiting.id(), &f.bob).expect("join");
    assert_eq!(session.mark_of(&f.bob), Some(Mark::O));
}

#[tokio::test]
async fn test_turn_alternates() {
    let f = fixture();
    let id = started(&f);

    let session = f.service.make_move(&id, &f.alice, 1, 1).expect("move");
    assert_eq!(session.turn(), &Some(Mark::O));

    let session = f.service.make_move(&id, &f.bob, 0, 0).expect("move");
    assert_eq!(session.turn(), &Some(Mark::X));
}

#[tokio::test]
async fn test_move_rejections() {
    let f = fixture();

    let err = f.service.make_move("missing", &f.alice, 0, 0).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::NotFound);

    let waiting = f.service.create_session(&f.alice, "PVP").expect("create");
    let err = f.service.make_move(waiting.id(), &f.alice, 0, 0).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::InvalidState);

    let id = started(&f);
    let carol = f.directory.register("Carol").id().clone();
    let err = f.service.make_move(&id, &carol, 0, 0).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::NotParticipant);

    let err = f.service.make_move(&id, &f.bob, 0, 0).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::NotYourTurn);

    let err = f.service.make_move(&id, &f.alice, 3, 0).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::InvalidMove);

    f.service.make_move(&id, &f.alice, 0, 0).expect("move");
    let err = f.service.make_move(&id, &f.bob, 0, 0).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::InvalidMove);

    // Rejections leave the record untouched.
    let session = f.service.get_session(&id).expect("get");
    assert_eq!(session.turn(), &Some(Mark::O));
}

#[tokio::test]
async fn test_win_finishes_session_for_good() {
    let f = fixture();
    let id = started(&f);

    for (actor, row, col) in [
        (&f.alice, 0, 0),
        (&f.bob, 1, 0),
        (&f.alice, 0, 1),
        (&f.bob, 1, 1),
        (&f.alice, 0, 2),
    ] {
        f.service.make_move(&id, actor, row, col).expect("move");
    }

    let session = f.service.get_session(&id).expect("get");
    assert_eq!(session.status(), &Status::Finished);
    assert_eq!(session.outcome(), &Some(Outcome::Winner(Mark::X)));

    for (actor, row, col) in [(&f.alice, 2, 2), (&f.bob, 2, 2), (&f.bob, 9, 9)] {
        let err = f.service.make_move(&id, actor, row, col).unwrap_err();
        assert_eq!(err.kind(), SessionErrorKind::InvalidState);
    }
}

#[tokio::test]
async fn test_draw_finishes_session() {
    let f = fixture();
    let id = started(&f);

    // X O X / X O O / O X X
    for (actor, row, col) in [
        (&f.alice, 0, 0),
        (&f.bob, 0, 1),
        (&f.alice, 0, 2),
        (&f.bob, 1, 1),
        (&f.alice, 1, 0),
        (&f.bob, 1, 2),
        (&f.alice, 2, 1),
        (&f.bob, 2, 0),
        (&f.alice, 2, 2),
    ] {
        f.service.make_move(&id, actor, row, col).expect("move");
    }

    let session = f.service.get_session(&id).expect("get");
    assert_eq!(session.status(), &Status::Finished);
    assert_eq!(session.outcome(), &Some(Outcome::Draw));
    assert_eq!(session.turn(), &None);
}

#[tokio::test]
async fn test_automated_reply_is_folded_in() {
    let f = fixture();
    let session = f.service.create_session(&f.alice, "PVC").expect("create");

    let session = f.service.make_move(session.id(), &f.alice, 0, 0).expect("move");

    let marks = session
        .board()
        .rows()
        .iter()
        .flatten()
        .filter(|sq| sq.mark().is_some())
        .count();
    assert_eq!(marks, 2, "human move and automated reply");
    assert_eq!(session.turn(), &Some(Mark::X));
    assert_eq!(session.status(), &Status::InProgress);

    let stored = f.service.get_session(session.id()).expect("get");
    assert_eq!(stored.board(), session.board());
}

#[tokio::test]
async fn test_automated_game_always_ends_with_human_or_finished() {
    let f = fixture_with(Arc::new(FirstFreePolicy));
    let session = f.service.create_session(&f.alice, "PVC").expect("create");
    let id = session.id().clone();

    // Human plays the last free cell each turn; the policy plays the first.
    for _ in 0..5 {
        let current = f.service.get_session(&id).expect("get");
        if !current.is_in_progress() {
            break;
        }
        let cell = strictly_rules::available_cells(current.board())
            .last()
            .expect("free cell while in progress");
        let after = f.service.make_move(&id, &f.alice, cell.row, cell.col).expect("move");
        assert!(after.turn() == &Some(Mark::X) || *after.status() == Status::Finished);
    }

    let session = f.service.get_session(&id).expect("get");
    assert_eq!(session.status(), &Status::Finished);
}

#[tokio::test]
async fn test_illegal_automated_reply_is_dropped() {
    let f = fixture_with(Arc::new(IllegalPolicy));
    let session = f.service.create_session(&f.alice, "PVC").expect("create");

    let session = f.service.make_move(session.id(), &f.alice, 0, 0).expect("move");
    assert_eq!(session.turn(), &Some(Mark::O));
    assert_eq!(session.status(), &Status::InProgress);

    let err = f.service.make_move(session.id(), &f.alice, 1, 1).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::NotYourTurn);
}

#[tokio::test]
async fn test_automated_seat_cannot_be_driven_from_outside() {
    let f = fixture_with(Arc::new(IllegalPolicy));
    let session = f.service.create_session(&f.alice, "PVC").expect("create");
    let session = f.service.make_move(session.id(), &f.alice, 0, 0).expect("move");
    assert_eq!(session.turn(), &Some(Mark::O));

    let err = f
        .service
        .make_move(session.id(), AUTOMATED_PARTICIPANT, 1, 1)
        .unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::NotParticipant);

    let stored = f.service.get_session(session.id()).expect("get");
    assert_eq!(stored.board(), session.board());
}

#[tokio::test]
async fn test_list_sessions_enriches_creator() {
    let f = fixture();
    f.service.create_session(&f.alice, "PVP").expect("create");
    f.service.create_session(&f.bob, "PVC").expect("create");

    let all = f.service.list_sessions(&SessionFilter::default());
    assert_eq!(all.len(), 2);

    let automated = f
        .service
        .list_sessions(&SessionFilter::new(Some(Mode::VsAutomated), None, 0, 0));
    assert_eq!(automated.len(), 1);
    assert_eq!(automated[0].created_by.player_id, f.bob);
    assert_eq!(automated[0].created_by.name, "Bob");
    assert_eq!(automated[0].status, Status::InProgress);
}

#[tokio::test]
async fn test_list_sessions_tolerates_unresolved_creator() {
    // The service resolves creators through its own directory; a session
    // created elsewhere has a creator it cannot resolve.
    let registry = Arc::new(SessionRegistry::new());
    registry
        .create(Session::open(
            "orphan".to_string(),
            "gone".to_string(),
            Mode::TwoHuman,
        ))
        .expect("create");
    let service = SessionService::new(
        registry,
        Arc::new(InMemoryDirectory::new()),
        Arc::new(HeuristicPolicy),
        NotificationHub::spawn(),
    );

    let listed = service.list_sessions(&SessionFilter::default());
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].game_id, "orphan");
    assert!(listed[0].created_by.player_id.is_empty());
    assert!(listed[0].created_by.name.is_empty());
}

#[tokio::test]
async fn test_accepted_move_is_published() {
    let f = fixture();
    let id = started(&f);

    let (handle, mut rx) = SubscriberHandle::channel(8);
    f.hub.subscribe(id.clone(), handle);

    f.service.make_move(&id, &f.alice, 2, 2).expect("move");

    let payload = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("published in time")
        .expect("channel open");
    let message: HubMessage = serde_json::from_str(&payload).expect("valid json");
    match message {
        HubMessage::State(snapshot) => {
            assert_eq!(snapshot.game_id, id);
            assert_eq!(snapshot.current_turn, Some(Mark::O));
            assert_eq!(snapshot.status, Status::InProgress);
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_move_is_not_published() {
    let f = fixture();
    let id = started(&f);

    let (handle, mut rx) = SubscriberHandle::channel(8);
    f.hub.subscribe(id.clone(), handle);

    f.service.make_move(&id, &f.bob, 0, 0).unwrap_err();
    // Round-trip through the hub so every earlier command has been handled.
    assert_eq!(f.hub.subscriber_count(&id).await, 1);
    assert!(rx.try_recv().is_err());
}

/// Checks that a stored record is internally consistent.
fn assert_consistent(session: &Session) {
    let count = |mark: Mark| {
        session
            .board()
            .rows()
            .iter()
            .flatten()
            .filter(|sq| sq.mark() == Some(mark))
            .count()
    };
    let (xs, os) = (count(Mark::X), count(Mark::O));
    assert!(xs == os || xs == os + 1, "X={xs} O={os}");

    let finished = *session.status() == Status::Finished;
    assert_eq!(finished, session.outcome().is_some());
    assert_eq!(finished, session.turn().is_none());

    if !finished {
        let expected = if xs == os { Mark::X } else { Mark::O };
        assert_eq!(session.turn(), &Some(expected));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_moves_never_corrupt_the_record() {
    let f = fixture();
    let ids: Vec<String> = (0..8).map(|_| started(&f)).collect();

    let mut tasks = Vec::new();
    for id in &ids {
        for actor in [f.alice.clone(), f.bob.clone()] {
            let service = f.service.clone();
            let id = id.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                for _ in 0..3 {
                    for row in 0..3 {
                        for col in 0..3 {
                            if let Err(e) = service.make_move(&id, &actor, row, col) {
                                assert!(matches!(
                                    e.kind(),
                                    SessionErrorKind::NotYourTurn
                                        | SessionErrorKind::InvalidMove
                                        | SessionErrorKind::InvalidState
                                ));
                            }
                            if let Ok(session) = service.get_session(&id) {
                                assert_consistent(&session);
                            }
                        }
                    }
                }
            }));
        }
    }

    for task in tasks {
        task.await.expect("task");
    }

    for id in &ids {
        let session = f.service.get_session(id).expect("get");
        assert_consistent(&session);
        assert_ne!(session.status(), &Status::AwaitingSecondParticipant);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_status_filter_holds_while_sessions_finish() {
    let f = fixture();
    let ids: Vec<String> = (0..16).map(|_| started(&f)).collect();
    let in_progress = SessionFilter::new(None, Some(Status::InProgress), 0, 0);

    let writers: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let service = f.service.clone();
            let (alice, bob) = (f.alice.clone(), f.bob.clone());
            tokio::task::spawn_blocking(move || {
                for (actor, row, col) in [
                    (&alice, 0, 0),
                    (&bob, 1, 0),
                    (&alice, 0, 1),
                    (&bob, 1, 1),
                    (&alice, 0, 2),
                ] {
                    service.make_move(&id, actor, row, col).expect("move");
                }
            })
        })
        .collect();

    let reader = {
        let service = f.service.clone();
        let filter = in_progress.clone();
        tokio::task::spawn_blocking(move || {
            let mut previous = usize::MAX;
            for _ in 0..200 {
                let listed = service.registry().list(&filter);
                assert!(listed.iter().all(|s| *s.status() == Status::InProgress));
                // Finishing is one-way, so the in-progress set only shrinks.
                assert!(listed.len() <= previous);
                previous = listed.len();
            }
        })
    };

    for writer in writers {
        writer.await.expect("writer");
    }
    reader.await.expect("reader");

    assert!(f.service.registry().list(&in_progress).is_empty());
    let finished = SessionFilter::new(None, Some(Status::Finished), 0, 0);
    assert_eq!(f.service.registry().list(&finished).len(), ids.len());
}
