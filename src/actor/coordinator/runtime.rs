use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::fs::FsActor;
use crate::actor::messages::{RelayMsg, WsMsg};
use crate::actor::relay::RelayActor;
use crate::actor::ws::WsActor;

/// Grace period for the ws actor to close its clients
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Run all actors concurrently.
pub(super) async fn run_actors(
    fs: FsActor,
    relay: RelayActor,
    ws: WsActor,
    relay_tx: mpsc::Sender<RelayMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let mut fs_handle = tokio::spawn(async move { fs.run().await });
    let mut relay_handle = tokio::spawn(async move { relay.run().await });
    let ws_handle = tokio::spawn(async move { ws.run().await });

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    } else {
        tokio::select! {
            _ = &mut fs_handle => {}
            _ = &mut relay_handle => {}
        }
    }

    // the watcher has no shutdown message; its loop only ends with the relay
    fs_handle.abort();

    let _ = relay_tx.send(RelayMsg::Shutdown).await;
    let _ = ws_tx.send(WsMsg::Shutdown).await;

    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, relay_handle).await;
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, ws_handle).await;
}
