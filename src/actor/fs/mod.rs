//! FileSystem Actor
//!
//! Watches the output root and sends debounced event batches to the
//! RelayActor. Implements the "Watcher-First" pattern: the watcher is attached
//! before the initial snapshot, so nothing written in between is lost.
//!
//! Architecture:
//! ```text
//! Watcher → Debouncer (pure timing) → RelayMsg::Batch
//! ```

use std::path::PathBuf;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::RelayMsg;

// Pure timing and buffering.
mod debouncer;
// Shared/page chunk batch pairing.
mod pairing;
// Watch root attach/re-attach lifecycle.
mod watch_roots;

#[cfg(test)]
mod tests;

use debouncer::Debouncer;
pub use pairing::ChunkPairing;
use watch_roots::WatchRoots;

/// How often a missing root is checked for while nothing happens
const ROOT_POLL_MS: u64 = 500;

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    /// Watch-root consistency layer (attach/re-attach root directories)
    watch_roots: WatchRoots,
    /// Channel to send batches to RelayActor
    relay_tx: mpsc::Sender<RelayMsg>,
    /// Debouncer state
    debouncer: Debouncer,
}

impl FsActor {
    /// Create a new FsActor with Watcher-First pattern
    ///
    /// The watcher starts immediately, buffering events while the caller
    /// takes the initial snapshot.
    pub fn new(
        root: PathBuf,
        debounce: Duration,
        relay_tx: mpsc::Sender<RelayMsg>,
    ) -> notify::Result<Self> {
        // Create sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        // A missing root is attached later, once a build creates it
        let mut watch_roots = WatchRoots::new(vec![root]);
        watch_roots.attach_existing(&mut watcher)?;

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            relay_tx,
            debouncer: Debouncer::new(debounce),
        })
    }

    /// Hold back batches where a shared chunk changed without a page chunk.
    pub fn with_pairing(mut self, pairing: ChunkPairing) -> Self {
        crate::debug!("watch"; "shared chunks wait up to {:?} for page chunks", pairing.hold());
        self.debouncer = self.debouncer.with_pairing(pairing);
        self
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let relay_tx = self.relay_tx;
        let mut debouncer = self.debouncer;
        let mut watcher = self.watcher;
        let mut watch_roots = self.watch_roots;

        let (async_tx, mut async_rx) = tokio::sync::mpsc::channel::<notify::Event>(64);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::logger::status_error("watcher error", &e.to_string()),
                }
            }
        });

        let mut idle = idle_wait(&watch_roots);

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration(idle)) => {
                    let rescan = watch_roots.maintain(&mut watcher);
                    idle = idle_wait(&watch_roots);

                    let batch = match debouncer.take_if_ready() {
                        Some(batch) => batch,
                        None if rescan => Vec::new(),
                        None => continue,
                    };

                    crate::debug!("watch"; "batch of {} events", batch.len());
                    if relay_tx.send(RelayMsg::Batch(batch)).await.is_err() {
                        break; // RelayActor shut down
                    }
                }
            }
        }
    }
}

/// Sleep while no batch is pending: long when every root is watched, short
/// while waiting for a root to appear.
fn idle_wait(watch_roots: &WatchRoots) -> Duration {
    if watch_roots.is_complete() {
        Duration::from_secs(86400)
    } else {
        Duration::from_millis(ROOT_POLL_MS)
    }
}
