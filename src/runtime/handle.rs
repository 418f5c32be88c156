use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};

use crate::{
    core::builder::{BuilderError, BuilderState, LineupBuilder, PublishMode, Rejection},
    fairness::FairnessScore,
    persist::{DraftHandle, LineupSink, PersistError, PersistResult, SessionRecord},
    roster::MatchSlot,
    types::{PlayerId, Side, SlotId},
};

use super::events::LineupEvent;

/// Errors surfaced by [`LineupHandle`].
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Builder(#[from] BuilderError),
    #[error("runtime channel closed")]
    ChannelClosed,
}

impl From<Rejection> for RuntimeError {
    fn from(value: Rejection) -> Self {
        Self::Builder(BuilderError::Rejected(value))
    }
}

/// Queue sizing for the runtime task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub command_queue_bound: usize,
    pub event_queue_bound: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 64,
            event_queue_bound: 256,
        }
    }
}

/// Cloneable front end to a single-writer lineup builder task.
#[derive(Clone)]
pub struct LineupHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<LineupEvent>,
}

type Reply<T> = oneshot::Sender<T>;
type SharedSink = Arc<Mutex<Box<dyn LineupSink>>>;

enum Command {
    AutoFill {
        resp: Reply<Result<(), Rejection>>,
    },
    AutoBalance {
        max_passes: usize,
        resp: Reply<Result<usize, Rejection>>,
    },
    Assign {
        slot_id: SlotId,
        side: Side,
        player: PlayerId,
        resp: Reply<Result<(), Rejection>>,
    },
    Unassign {
        slot_id: SlotId,
        side: Side,
        player: PlayerId,
        resp: Reply<Result<(), Rejection>>,
    },
    Swap {
        a: (SlotId, Side, PlayerId),
        b: (SlotId, Side, PlayerId),
        resp: Reply<Result<(), Rejection>>,
    },
    ClearSlot {
        slot_id: SlotId,
        resp: Reply<Result<(), Rejection>>,
    },
    ClearAll {
        resp: Reply<Result<(), Rejection>>,
    },
    Undo {
        resp: Reply<Result<(), Rejection>>,
    },
    Redo {
        resp: Reply<Result<(), Rejection>>,
    },
    Fairness {
        resp: Reply<FairnessScore>,
    },
    Slots {
        resp: Reply<Vec<MatchSlot>>,
    },
    State {
        resp: Reply<BuilderState>,
    },
    SaveDraft {
        resp: Reply<Result<DraftHandle, BuilderError>>,
    },
    Publish {
        mode: PublishMode,
        resp: Reply<Result<SessionRecord, BuilderError>>,
    },
    Shutdown {
        resp: Reply<()>,
    },
}

/// Moves `builder` into a task that serializes all edits and collaborator calls.
pub fn spawn_lineup_builder(builder: LineupBuilder, sink: Box<dyn LineupSink>, config: RuntimeConfig) -> LineupHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<LineupEvent>(config.event_queue_bound.max(1));
    let events_tx_loop = events_tx.clone();
    let sink: SharedSink = Arc::new(Mutex::new(sink));

    tokio::spawn(async move {
        let mut builder = builder;
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &mut builder, &sink, &events_tx_loop).await {
                break;
            }
        }
        tracing::debug!(trip_id = builder.trip_id(), "lineup runtime stopped");
    });

    LineupHandle { cmd_tx, events_tx }
}

impl LineupHandle {
    /// Subscribes to edit and lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<LineupEvent> {
        self.events_tx.subscribe()
    }

    pub async fn auto_fill(&self) -> Result<(), RuntimeError> {
        Ok(self.request(|resp| Command::AutoFill { resp }).await??)
    }

    pub async fn auto_balance(&self, max_passes: usize) -> Result<usize, RuntimeError> {
        Ok(self.request(|resp| Command::AutoBalance { max_passes, resp }).await??)
    }

    pub async fn assign(&self, slot_id: SlotId, side: Side, player: PlayerId) -> Result<(), RuntimeError> {
        Ok(self
            .request(|resp| Command::Assign {
                slot_id,
                side,
                player,
                resp,
            })
            .await??)
    }

    pub async fn unassign(&self, slot_id: SlotId, side: Side, player: PlayerId) -> Result<(), RuntimeError> {
        Ok(self
            .request(|resp| Command::Unassign {
                slot_id,
                side,
                player,
                resp,
            })
            .await??)
    }

    pub async fn swap(&self, a: (SlotId, Side, PlayerId), b: (SlotId, Side, PlayerId)) -> Result<(), RuntimeError> {
        Ok(self.request(|resp| Command::Swap { a, b, resp }).await??)
    }

    pub async fn clear_slot(&self, slot_id: SlotId) -> Result<(), RuntimeError> {
        Ok(self.request(|resp| Command::ClearSlot { slot_id, resp }).await??)
    }

    pub async fn clear_all(&self) -> Result<(), RuntimeError> {
        Ok(self.request(|resp| Command::ClearAll { resp }).await??)
    }

    pub async fn undo(&self) -> Result<(), RuntimeError> {
        Ok(self.request(|resp| Command::Undo { resp }).await??)
    }

    pub async fn redo(&self) -> Result<(), RuntimeError> {
        Ok(self.request(|resp| Command::Redo { resp }).await??)
    }

    pub async fn fairness(&self) -> Result<FairnessScore, RuntimeError> {
        self.request(|resp| Command::Fairness { resp }).await
    }

    pub async fn slots(&self) -> Result<Vec<MatchSlot>, RuntimeError> {
        self.request(|resp| Command::Slots { resp }).await
    }

    pub async fn state(&self) -> Result<BuilderState, RuntimeError> {
        self.request(|resp| Command::State { resp }).await
    }

    pub async fn save_draft(&self) -> Result<DraftHandle, RuntimeError> {
        Ok(self.request(|resp| Command::SaveDraft { resp }).await??)
    }

    pub async fn publish(&self, mode: PublishMode) -> Result<SessionRecord, RuntimeError> {
        Ok(self.request(|resp| Command::Publish { mode, resp }).await??)
    }

    /// Stops the runtime task once queued commands ahead of it are handled.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

async fn handle_command(
    cmd: Command,
    builder: &mut LineupBuilder,
    sink: &SharedSink,
    events_tx: &broadcast::Sender<LineupEvent>,
) -> bool {
    match cmd {
        Command::AutoFill { resp } => {
            let res = builder.auto_fill();
            after_edit(&res, builder, events_tx, LineupEvent::AutoFilled);
            let _ = resp.send(res);
        }
        Command::AutoBalance { max_passes, resp } => {
            let res = builder.auto_balance(max_passes);
            if let Ok(moves) = res {
                if moves > 0 {
                    after_edit(&Ok(()), builder, events_tx, LineupEvent::Rebalanced { moves });
                }
            }
            let _ = resp.send(res);
        }
        Command::Assign {
            slot_id,
            side,
            player,
            resp,
        } => {
            let res = builder.assign(slot_id, side, player);
            after_edit(&res, builder, events_tx, LineupEvent::Assigned { slot_id, side, player });
            let _ = resp.send(res);
        }
        Command::Unassign {
            slot_id,
            side,
            player,
            resp,
        } => {
            let res = builder.unassign(slot_id, side, player);
            after_edit(&res, builder, events_tx, LineupEvent::Unassigned { slot_id, side, player });
            let _ = resp.send(res);
        }
        Command::Swap { a, b, resp } => {
            let res = builder.swap(a.0, a.1, a.2, b.0, b.1, b.2);
            after_edit(&res, builder, events_tx, LineupEvent::Swapped { slot_a: a.0, slot_b: b.0 });
            let _ = resp.send(res);
        }
        Command::ClearSlot { slot_id, resp } => {
            let res = builder.clear_slot(slot_id);
            after_edit(&res, builder, events_tx, LineupEvent::Cleared { slot_id: Some(slot_id) });
            let _ = resp.send(res);
        }
        Command::ClearAll { resp } => {
            let res = builder.clear_all();
            after_edit(&res, builder, events_tx, LineupEvent::Cleared { slot_id: None });
            let _ = resp.send(res);
        }
        Command::Undo { resp } => {
            let res = builder.undo();
            after_edit(&res, builder, events_tx, LineupEvent::Undone);
            let _ = resp.send(res);
        }
        Command::Redo { resp } => {
            let res = builder.redo();
            after_edit(&res, builder, events_tx, LineupEvent::Redone);
            let _ = resp.send(res);
        }
        Command::Fairness { resp } => {
            let _ = resp.send(builder.current_fairness().clone());
        }
        Command::Slots { resp } => {
            let _ = resp.send(builder.slots().to_vec());
        }
        Command::State { resp } => {
            let _ = resp.send(builder.state().clone());
        }
        Command::SaveDraft { resp } => {
            let res = save_draft(builder, sink).await;
            if let Ok(handle) = &res {
                let _ = events_tx.send(LineupEvent::DraftSaved { handle: handle.clone() });
            }
            let _ = resp.send(res);
        }
        Command::Publish { mode, resp } => {
            let res = publish(builder, sink, mode).await;
            if let Ok(record) = &res {
                let _ = events_tx.send(LineupEvent::Published { record: record.clone() });
            }
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

fn after_edit<T>(
    res: &Result<T, Rejection>,
    builder: &LineupBuilder,
    events_tx: &broadcast::Sender<LineupEvent>,
    event: LineupEvent,
) {
    if res.is_err() {
        return;
    }
    let fairness = builder.current_fairness();
    let _ = events_tx.send(event);
    let _ = events_tx.send(LineupEvent::FairnessChanged {
        overall: fairness.overall,
        warnings: fairness.warnings.len(),
    });
}

async fn save_draft(builder: &mut LineupBuilder, sink: &SharedSink) -> Result<DraftHandle, BuilderError> {
    let (snapshot, previous) = builder.draft_request()?;
    let handle = with_sink(sink, move |sink| sink.persist_draft(&snapshot, previous.as_ref())).await?;
    builder.mark_saved(handle.clone());
    Ok(handle)
}

async fn publish(builder: &mut LineupBuilder, sink: &SharedSink, mode: PublishMode) -> Result<SessionRecord, BuilderError> {
    let snapshot = builder.publish_request(mode)?;
    let record = with_sink(sink, move |sink| sink.publish_lineup(&snapshot)).await?;
    builder.mark_published(record.clone());
    Ok(record)
}

async fn with_sink<T, F>(sink: &SharedSink, f: F) -> PersistResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn LineupSink) -> PersistResult<T> + Send + 'static,
{
    let sink_ref = Arc::clone(sink);
    let res = tokio::task::spawn_blocking(move || {
        let mut sink = sink_ref.blocking_lock();
        f(&mut **sink)
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))?;
    if let Err(err) = &res {
        tracing::warn!(error = %err, "lineup collaborator call failed");
    }
    res
}
