//! Asset kinds and JS chunk shapes.
//!
//! Both drive dispatch policy only; nothing here is persisted.

use regex::Regex;

use super::url::{PatternError, StableUrl};

/// Per-page bundle, e.g. `pages/home/home.page-a1b2c3d4.js`.
pub const DEFAULT_PAGE_PATTERN: &str = r"\.page\.m?js$";

/// Common chunks emitted by split-by-module bundling.
pub const DEFAULT_SHARED_PATTERN: &str = r"^(chunk|shared|vendors?|lib)([-.~].*)?\.m?js$";

/// Asset category, derived from the URL's file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Css,
    Js,
    Other,
}

impl AssetKind {
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let name = path.rsplit('/').next().unwrap_or(path);
        let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());

        match ext.as_deref() {
            Some("css") => Self::Css,
            Some("js" | "mjs" | "cjs") => Self::Js,
            _ => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Other => "other",
        }
    }
}

/// How a JS file relates to pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkShape {
    /// Entry bundle of a single page.
    Page,
    /// Code shared between pages.
    Shared,
    /// Neither convention matched.
    Unknown,
}

impl ChunkShape {
    pub fn label(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Shared => "shared",
            Self::Unknown => "unknown",
        }
    }
}

/// File-name conventions for page and shared chunks.
#[derive(Debug, Clone)]
pub struct ChunkShapes {
    page: Regex,
    shared: Regex,
}

impl ChunkShapes {
    pub fn new(page: &str, shared: &str) -> Result<Self, PatternError> {
        let compile =
            |p: &str| Regex::new(p).map_err(|e| PatternError::Invalid(p.to_string(), e));
        Ok(Self {
            page: compile(page)?,
            shared: compile(shared)?,
        })
    }

    /// Shape of a chunk, judged on its stable file name. Page wins over shared.
    pub fn shape_of(&self, stable: &StableUrl) -> ChunkShape {
        let name = stable.file_name();
        if self.page.is_match(name) {
            ChunkShape::Page
        } else if self.shared.is_match(name) {
            ChunkShape::Shared
        } else {
            ChunkShape::Unknown
        }
    }
}

impl Default for ChunkShapes {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_PATTERN, DEFAULT_SHARED_PATTERN)
            .expect("default chunk patterns are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_kind_from_url() {
        assert_eq!(AssetKind::from_url("/public/style.css"), AssetKind::Css);
        assert_eq!(AssetKind::from_url("/public/STYLE.CSS?v=1"), AssetKind::Css);
        assert_eq!(AssetKind::from_url("/public/app.js"), AssetKind::Js);
        assert_eq!(AssetKind::from_url("/public/app.mjs#x"), AssetKind::Js);
        assert_eq!(AssetKind::from_url("/public/photo.png"), AssetKind::Other);
        assert_eq!(AssetKind::from_url("/public/fonts/inter.woff2"), AssetKind::Other);
        assert_eq!(AssetKind::from_url("/public/LICENSE"), AssetKind::Other);
        assert_eq!(AssetKind::from_url("/public.css/readme"), AssetKind::Other);
    }

    #[test]
    fn test_chunk_shapes_default() {
        let shapes = ChunkShapes::default();
        let shape = |s: &str| shapes.shape_of(&StableUrl::from(s));

        assert_eq!(shape("/public/pages/home/home.page.js"), ChunkShape::Page);
        assert_eq!(shape("/public/chunk-c1.js"), ChunkShape::Shared);
        assert_eq!(shape("/public/chunk.js"), ChunkShape::Shared);
        assert_eq!(shape("/public/lib-preact.js"), ChunkShape::Shared);
        assert_eq!(shape("/public/vendors~main.js"), ChunkShape::Shared);
        assert_eq!(shape("/public/analytics.js"), ChunkShape::Unknown);
        assert_eq!(shape("/public/chunky.js"), ChunkShape::Unknown);
    }

    #[test]
    fn test_chunk_shapes_custom() {
        let shapes = ChunkShapes::new(r"^entry-", r"^common\.js$").unwrap();
        assert_eq!(
            shapes.shape_of(&StableUrl::from("/entry-home.js")),
            ChunkShape::Page
        );
        assert_eq!(
            shapes.shape_of(&StableUrl::from("/common.js")),
            ChunkShape::Shared
        );
    }

    #[test]
    fn test_chunk_shapes_invalid() {
        assert!(ChunkShapes::new("(", DEFAULT_SHARED_PATTERN).is_err());
    }
}
