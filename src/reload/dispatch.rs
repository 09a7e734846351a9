//! Dispatch policy: from a classified batch to wire messages.
//!
//! A batch either patches or reloads as a whole. Any forcing condition turns
//! the entire batch into a single `reload`.
//!
//! Shared chunk removals and replaces are always patched: the client only
//! swaps preload hints for them. Keeping a shared chunk in the same batch as
//! the page chunks that import it is the batcher's job.

use super::classify::{ChangeRecord, ChangeSet};
use super::kind::{ChunkShape, ChunkShapes};
use super::message::{HotReloadMessage, Operations, UrlReplace};

/// What a batch turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing worth sending (empty batch, or adds only).
    Unchanged,
    /// Full reload for every client.
    Reload { reason: String },
    /// Granular updates; `None` means that kind is not sent.
    Patch {
        css: Option<Operations>,
        js: Option<Operations>,
    },
}

impl Dispatch {
    /// Messages to broadcast, css before js.
    pub fn messages(&self) -> Vec<HotReloadMessage> {
        match self {
            Self::Unchanged => Vec::new(),
            Self::Reload { .. } => vec![HotReloadMessage::Reload],
            Self::Patch { css, js } => {
                let css = css.clone().map(|operations| HotReloadMessage::Css { operations });
                let js = js.clone().map(|operations| HotReloadMessage::Js { operations });
                css.into_iter().chain(js).collect()
            }
        }
    }
}

/// Decide how `changes` reach the clients.
pub fn plan(changes: &ChangeSet, shapes: &ChunkShapes) -> Dispatch {
    if let Some(reason) = forcing_reason(changes, shapes) {
        return Dispatch::Reload { reason };
    }

    let mut css = Operations::default();
    for record in &changes.css {
        push(&mut css, record);
    }

    let mut js = Operations::default();
    for record in &changes.js {
        push(&mut js, record);
    }

    let css = (!css.is_empty()).then_some(css);
    let js = (!js.is_empty()).then_some(js);
    if css.is_none() && js.is_none() {
        Dispatch::Unchanged
    } else {
        Dispatch::Patch { css, js }
    }
}

fn push(ops: &mut Operations, record: &ChangeRecord) {
    match record {
        ChangeRecord::Add { .. } => {}
        ChangeRecord::Remove { url, .. } => ops.remove.push(url.clone()),
        ChangeRecord::Replace {
            old_url, new_url, ..
        } => ops.replace.push(UrlReplace::new(old_url, new_url)),
    }
}

/// First condition that forces a full reload, if any.
fn forcing_reason(changes: &ChangeSet, shapes: &ChunkShapes) -> Option<String> {
    if let Some(record) = changes.other.iter().find(|r| !r.is_add()) {
        return Some(format!("{} {}", record.label(), record.url()));
    }

    changes.js.iter().find_map(|record| {
        match (record, shapes.shape_of(record.stable_url())) {
            (ChangeRecord::Remove { url, .. }, ChunkShape::Page) => {
                Some(format!("page chunk removed {url}"))
            }
            (ChangeRecord::Remove { url, .. }, ChunkShape::Unknown) => {
                Some(format!("script removed {url}"))
            }
            (ChangeRecord::Replace { new_url, .. }, ChunkShape::Unknown) => {
                Some(format!("script replaced {new_url}"))
            }
            _ => None,
        }
    })
}
