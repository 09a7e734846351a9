use std::time::Duration;

use crate::reload::classify::RawEvent;
use crate::reload::kind::{AssetKind, ChunkShape, ChunkShapes};
use crate::reload::url::UrlMapper;

/// Keeps shared chunks in the same batch as the page chunks importing them.
///
/// Bundlers write a rebuilt shared chunk and the page entries that import it
/// in no fixed order. A batch holding shared chunk events but no page chunk
/// event gets `hold` more quiet time before it is handed over.
#[derive(Debug, Clone)]
pub struct ChunkPairing {
    mapper: UrlMapper,
    shapes: ChunkShapes,
    hold: Duration,
}

impl ChunkPairing {
    pub fn new(mapper: UrlMapper, shapes: ChunkShapes, hold: Duration) -> Self {
        Self {
            mapper,
            shapes,
            hold,
        }
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    /// A shared chunk changed and no page chunk did (yet).
    pub fn awaits_page(&self, events: &[RawEvent]) -> bool {
        let mut shared = false;
        for event in events {
            let Some((stable, url)) = self.mapper.locate(&event.path) else {
                continue;
            };
            if AssetKind::from_url(&url) != AssetKind::Js {
                continue;
            }
            match self.shapes.shape_of(&stable) {
                ChunkShape::Page => return false,
                ChunkShape::Shared => shared = true,
                ChunkShape::Unknown => {}
            }
        }
        shared
    }
}
