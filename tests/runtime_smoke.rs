use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::broadcast;

use rydercup_lineup::{
    core::builder::{BuilderError, BuilderState, LineupBuilder, PublishMode, Rejection},
    op::LineupSnapshot,
    persist::{memory::MemorySink, DraftHandle, LineupSink, PersistError, PersistResult, SessionRecord},
    roster::{Player, SessionFormat},
    runtime::{
        events::LineupEvent,
        handle::{spawn_lineup_builder, RuntimeConfig, RuntimeError},
    },
    types::{FormatKind, PlayerId, Side},
};

fn player(id: PlayerId, hcp: f64, side: Side) -> Player {
    Player::new(id, "Player", format!("{id}"), hcp, side)
}

fn builder() -> LineupBuilder {
    let a = vec![player(1, 3.0, Side::A), player(2, 11.0, Side::A), player(3, 18.0, Side::A)];
    let b = vec![player(11, 5.0, Side::B), player(12, 9.0, Side::B), player(13, 16.0, Side::B)];
    LineupBuilder::initialize(2, a, b, SessionFormat::new(FormatKind::Singles, 1, 3, 1.0), None)
        .expect("initialize")
        .with_seed(17)
}

struct SharedSink {
    inner: Arc<Mutex<MemorySink>>,
    delay: Duration,
}

impl SharedSink {
    fn new(delay: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemorySink::new())),
            delay,
        }
    }
}

impl LineupSink for SharedSink {
    fn persist_draft(&mut self, snapshot: &LineupSnapshot, previous: Option<&DraftHandle>) -> PersistResult<DraftHandle> {
        std::thread::sleep(self.delay);
        self.inner.lock().expect("lock").persist_draft(snapshot, previous)
    }

    fn publish_lineup(&mut self, snapshot: &LineupSnapshot) -> PersistResult<SessionRecord> {
        std::thread::sleep(self.delay);
        self.inner.lock().expect("lock").publish_lineup(snapshot)
    }
}

async fn next_event(sub: &mut broadcast::Receiver<LineupEvent>) -> LineupEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("event timeout")
            .expect("event");
        if !matches!(event, LineupEvent::FairnessChanged { .. }) {
            return event;
        }
    }
}

#[tokio::test]
async fn runtime_edits_emit_ordered_events() {
    let handle = spawn_lineup_builder(builder(), Box::new(MemorySink::new()), RuntimeConfig::default());
    let mut sub = handle.subscribe();

    handle.assign(1, Side::A, 1).await.expect("assign");
    handle.assign(1, Side::B, 11).await.expect("assign");
    handle.assign(2, Side::A, 2).await.expect("assign");
    handle.assign(2, Side::B, 12).await.expect("assign");
    handle.swap((1, Side::A, 1), (2, Side::A, 2)).await.expect("swap");
    handle.clear_slot(2).await.expect("clear");
    handle.undo().await.expect("undo");

    assert_eq!(
        next_event(&mut sub).await,
        LineupEvent::Assigned {
            slot_id: 1,
            side: Side::A,
            player: 1
        }
    );
    for _ in 0..3 {
        assert!(matches!(next_event(&mut sub).await, LineupEvent::Assigned { .. }));
    }
    assert_eq!(next_event(&mut sub).await, LineupEvent::Swapped { slot_a: 1, slot_b: 2 });
    assert_eq!(next_event(&mut sub).await, LineupEvent::Cleared { slot_id: Some(2) });
    assert_eq!(next_event(&mut sub).await, LineupEvent::Undone);

    let slots = handle.slots().await.expect("slots");
    assert_eq!(slots[0].side_a, vec![2]);
    assert_eq!(slots[1].side_a, vec![1]);
    let fairness = handle.fairness().await.expect("fairness");
    assert_eq!(fairness.incomplete_count(), 1);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn fairness_follows_every_accepted_edit() {
    let handle = spawn_lineup_builder(builder(), Box::new(MemorySink::new()), RuntimeConfig::default());
    let mut sub = handle.subscribe();

    handle.assign(1, Side::A, 1).await.expect("assign");
    let _ = sub.recv().await.expect("assigned");
    match sub.recv().await.expect("fairness") {
        LineupEvent::FairnessChanged { overall, warnings } => {
            assert_eq!(overall, None);
            assert_eq!(warnings, 4);
        }
        other => panic!("unexpected event {other:?}"),
    }

    let err = handle.assign(1, Side::A, 2).await.expect_err("slot full");
    assert!(matches!(
        err,
        RuntimeError::Builder(BuilderError::Rejected(Rejection::SlotFull { slot_id: 1, side: Side::A }))
    ));
    assert!(sub.try_recv().is_err());

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn draft_then_publish_through_blocking_sink() {
    let sink = SharedSink::new(Duration::from_millis(20));
    let store = Arc::clone(&sink.inner);
    let handle = spawn_lineup_builder(builder(), Box::new(sink), RuntimeConfig::default());
    let mut sub = handle.subscribe();

    handle.auto_fill().await.expect("auto fill");
    assert_eq!(next_event(&mut sub).await, LineupEvent::AutoFilled);

    let draft = handle.save_draft().await.expect("save");
    assert_eq!(draft, DraftHandle { draft_id: 1, revision: 1 });
    assert_eq!(next_event(&mut sub).await, LineupEvent::DraftSaved { handle: draft.clone() });
    assert_eq!(handle.state().await.expect("state"), BuilderState::Saved(draft));

    let record = handle.publish(PublishMode::RequireComplete).await.expect("publish");
    assert_eq!(next_event(&mut sub).await, LineupEvent::Published { record: record.clone() });
    assert_eq!(handle.state().await.expect("state"), BuilderState::Published(record));

    let slots = handle.slots().await.expect("slots");
    {
        let store = store.lock().expect("lock");
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.sessions()[0].1.slots, slots);
    }

    let err = handle.assign(1, Side::A, 1).await.expect_err("frozen");
    assert!(matches!(
        err,
        RuntimeError::Builder(BuilderError::Rejected(Rejection::Published))
    ));

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn collaborator_failure_reaches_caller_and_keeps_lineup() {
    let sink = SharedSink::new(Duration::ZERO);
    sink.inner.lock().expect("lock").fail_next("session service unavailable");
    let handle = spawn_lineup_builder(builder(), Box::new(sink), RuntimeConfig::default());

    handle.auto_fill().await.expect("auto fill");
    let before = handle.slots().await.expect("slots");

    let err = handle.publish(PublishMode::RequireComplete).await.expect_err("publish fails");
    match err {
        RuntimeError::Builder(BuilderError::Persist(PersistError::Message(msg))) => {
            assert_eq!(msg, "session service unavailable");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(handle.state().await.expect("state"), BuilderState::Editing);
    assert_eq!(handle.slots().await.expect("slots"), before);

    let record = handle.publish(PublishMode::RequireComplete).await.expect("retry");
    assert_eq!(record.session_id, 1);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn incomplete_publish_is_refused_without_override() {
    let handle = spawn_lineup_builder(builder(), Box::new(MemorySink::new()), RuntimeConfig::default());
    handle.assign(1, Side::A, 1).await.expect("assign");

    let err = handle.publish(PublishMode::RequireComplete).await.expect_err("incomplete");
    assert!(matches!(err, RuntimeError::Builder(BuilderError::Incomplete(5))));

    handle.publish(PublishMode::AllowWarnings).await.expect("publish with warnings");
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn closed_runtime_reports_channel_closed() {
    let handle = spawn_lineup_builder(builder(), Box::new(MemorySink::new()), RuntimeConfig::default());
    handle.shutdown().await.expect("shutdown");
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = handle.undo().await.expect_err("closed");
    assert!(matches!(err, RuntimeError::ChannelClosed));
}
