//! Relay Actor - Snapshot, Classify, Dispatch
//!
//! Sole owner of the snapshot pair. Batches are processed strictly one at a
//! time, so no classification ever sees a half-advanced pair.
//!
//! ```text
//! FsActor --Batch--> RelayActor --Broadcast--> WsActor
//!                   (snapshot → classify → plan)
//! ```

use tokio::sync::mpsc;

use super::messages::{RelayMsg, WsMsg};
use crate::reload::classify::{ChangeSet, RawEvent, classify};
use crate::reload::dispatch::{Dispatch, plan};
use crate::reload::kind::ChunkShapes;
use crate::reload::message::Operations;
use crate::reload::snapshot::{FileSnapshot, SnapshotPair, SnapshotPolicy, take_snapshot};
use crate::reload::url::UrlMapper;

/// Relay Actor - turns event batches into client messages
pub struct RelayActor {
    rx: mpsc::Receiver<RelayMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    snapshots: SnapshotPair,
    mapper: UrlMapper,
    policy: SnapshotPolicy,
    shapes: ChunkShapes,
}

impl RelayActor {
    /// Create a relay starting from `initial`, taken after the watcher was
    /// attached.
    pub fn new(
        rx: mpsc::Receiver<RelayMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
        initial: FileSnapshot,
        mapper: UrlMapper,
        policy: SnapshotPolicy,
        shapes: ChunkShapes,
    ) -> Self {
        Self {
            rx,
            ws_tx,
            snapshots: SnapshotPair::new(initial),
            mapper,
            policy,
            shapes,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                RelayMsg::Batch(events) => {
                    let dispatch = self.process(&events);
                    report(&dispatch);

                    let messages = dispatch.messages();
                    if messages.is_empty() {
                        continue;
                    }
                    if self.ws_tx.send(WsMsg::Broadcast(messages)).await.is_err() {
                        crate::debug!("relay"; "ws actor gone, stopping");
                        break;
                    }
                }
                RelayMsg::Shutdown => {
                    crate::debug!("relay"; "shutting down");
                    break;
                }
            }
        }
    }

    /// Snapshot, classify against the current snapshot, advance the pair.
    fn process(&mut self, events: &[RawEvent]) -> Dispatch {
        let next = take_snapshot(self.mapper.root(), &self.policy);
        let (old, new) = self.snapshots.advance(next);
        crate::debug!("relay"; "snapshot {} -> {} files, {} events", old.len(), new.len(), events.len());

        let changes = classify(old, new, events, &self.mapper);
        log_changes(&changes);
        plan(&changes, &self.shapes)
    }
}

fn log_changes(changes: &ChangeSet) {
    if !crate::logger::is_verbose() {
        return;
    }
    for (kind, record) in changes.iter() {
        crate::debug!(
            "relay";
            "{} {} {}",
            kind.label(),
            record.label(),
            record.stable_url()
        );
    }
}

/// Write the batch outcome to the status line.
fn report(dispatch: &Dispatch) {
    match dispatch {
        Dispatch::Unchanged => crate::logger::status_unchanged("no client-visible changes"),
        Dispatch::Reload { reason } => crate::logger::status_reload(reason),
        Dispatch::Patch { css, js } => {
            let parts: Vec<String> = [("css", css), ("js", js)]
                .into_iter()
                .filter_map(|(label, ops)| ops.as_ref().map(|ops| summarize(label, ops)))
                .collect();
            crate::logger::status_success(&parts.join("; "));
        }
    }
}

/// `css patch: 1 replaced, 2 removed`
fn summarize(label: &str, ops: &Operations) -> String {
    let mut counts = Vec::new();
    if !ops.replace.is_empty() {
        counts.push(format!("{} replaced", ops.replace.len()));
    }
    if !ops.remove.is_empty() {
        counts.push(format!("{} removed", ops.remove.len()));
    }
    format!("{label} patch: {}", counts.join(", "))
}
