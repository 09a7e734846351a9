use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Watch-root consistency manager.
///
/// Build tools often wipe the output directory before writing into it, which
/// kills the watch on it. This re-attaches roots once they are back.
pub(super) struct WatchRoots {
    desired: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            desired: paths,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        for path in &self.desired {
            if !path.is_dir() {
                crate::log!("watch"; "{} does not exist yet, waiting for it", path.display());
                continue;
            }
            watcher.watch(path, RecursiveMode::Recursive)?;
            self.attached.insert(path.clone());
        }

        Ok(())
    }

    /// Every desired root has a live watch.
    pub(super) fn is_complete(&self) -> bool {
        self.attached.len() == self.desired.len()
    }

    /// Drop stale handles and re-attach recreated roots.
    ///
    /// Returns `true` when a root was re-attached: files written before the
    /// watch came back produced no events, so the caller must rescan.
    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) -> bool {
        self.attached.retain(|path| {
            let alive = path.is_dir();
            if !alive {
                let _ = watcher.unwatch(path);
                crate::debug!("watch"; "watch root vanished: {}", path.display());
            }
            alive
        });

        let mut reattached = false;
        for path in &self.desired {
            if self.attached.contains(path) || !path.is_dir() {
                continue;
            }

            if watcher.watch(path, RecursiveMode::Recursive).is_ok() {
                self.attached.insert(path.clone());
                crate::debug!("watch"; "re-attached watch: {}", path.display());
                reattached = true;
            }
        }
        reattached
    }
}
