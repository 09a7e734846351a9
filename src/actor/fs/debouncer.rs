use std::path::Path;
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};

use super::pairing::ChunkPairing;
use crate::reload::classify::{FsEventKind, RawEvent};

/// Pure debouncer: one pending buffer, one quiet-window deadline.
/// No global state access.
pub(super) struct Debouncer {
    /// Events in arrival order
    pub(super) pending: Vec<RawEvent>,
    pub(super) last_event: Option<Instant>,
    window: Duration,
    pairing: Option<ChunkPairing>,
}

impl Debouncer {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            pending: Vec::new(),
            last_event: None,
            window,
            pairing: None,
        }
    }

    pub(super) fn with_pairing(mut self, pairing: ChunkPairing) -> Self {
        self.pairing = Some(pairing);
        self
    }

    /// Quiet time the pending batch needs: the window, plus the pairing hold
    /// while a shared chunk waits for its page chunks.
    fn quiet_needed(&self) -> Duration {
        match &self.pairing {
            Some(pairing) if pairing.awaits_page(&self.pending) => self.window + pairing.hold(),
            _ => self.window,
        }
    }

    /// Append a notify event and restart the quiet window.
    ///
    /// Metadata-only modifications and editor temp files are dropped.
    /// Renames become a remove of the old path and an add of the new one.
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        let kinds: &[FsEventKind] = match event.kind {
            EventKind::Create(_) => &[FsEventKind::Add],
            EventKind::Remove(_) => &[FsEventKind::Remove],
            // mtime/atime/chmod noise
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => &[FsEventKind::Remove],
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => &[FsEventKind::Add],
            // paths are [from, to]
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                &[FsEventKind::Remove, FsEventKind::Add]
            }
            EventKind::Modify(_) | EventKind::Any => &[FsEventKind::Change],
            EventKind::Access(_) | EventKind::Other => return,
        };

        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        let mut accepted = false;
        for (i, path) in event.paths.iter().enumerate() {
            if is_temp_file(path) {
                continue;
            }
            let kind = kinds.get(i).or(kinds.last()).copied().unwrap_or(FsEventKind::Change);
            crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
            self.pending.push(RawEvent::new(path.clone(), kind));
            accepted = true;
        }

        if accepted {
            self.last_event = Some(Instant::now());
        }
    }

    /// Hand over the pending batch once the quiet window has passed.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<RawEvent>> {
        if !self.is_ready() {
            return None;
        }

        self.last_event = None;
        Some(std::mem::take(&mut self.pending))
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };

        !self.pending.is_empty() && last_event.elapsed() >= self.quiet_needed()
    }

    /// Precise sleep duration until the batch can be taken, capped at `idle`.
    pub(super) fn sleep_duration(&self, idle: Duration) -> Duration {
        let Some(last_event) = self.last_event else {
            return idle;
        };

        self.quiet_needed()
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
}
