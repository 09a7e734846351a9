//! `livepatch snapshot`: print the comparable view of the output root.
//!
//! One line per file: kind, URL and, when a hash was stripped, the stable
//! URL. Handy for checking `hash_pattern` against real build output.

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::LivepatchConfig;
use crate::reload::kind::{AssetKind, ChunkShapes};
use crate::reload::snapshot::take_snapshot;
use crate::reload::url::UrlMapper;

pub fn print_snapshot(config: &LivepatchConfig) -> Result<()> {
    let mapper = config.url_mapper()?;
    let shapes = config.chunk_shapes()?;
    let root = mapper.root();

    if !root.is_dir() {
        crate::log!("watch"; "{} does not exist yet", root.display());
        return Ok(());
    }

    let snapshot = take_snapshot(root, &config.snapshot_policy());
    for path in snapshot.iter() {
        if let Some(line) = describe(&mapper, &shapes, path) {
            println!("{line}");
        }
    }

    crate::log!("watch"; "{} files under {}", snapshot.len(), root.display());
    Ok(())
}

fn describe(mapper: &UrlMapper, shapes: &ChunkShapes, path: &std::path::Path) -> Option<String> {
    let (stable, url) = mapper.locate(path)?;
    let kind = AssetKind::from_url(&url);

    let label = match kind {
        AssetKind::Js => format!("js:{}", shapes.shape_of(&stable).label()),
        _ => kind.label().to_string(),
    };

    let mut line = format!("{label:<10} {url}");
    if stable.as_str() != url {
        line.push_str(&format!(" {} {}", "→".dimmed(), stable.as_str().dimmed()));
    }
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::url::HashPattern;
    use std::path::Path;

    #[test]
    fn test_describe_hashed_page_chunk() {
        let mapper = UrlMapper::new("/out", "/public/", HashPattern::default());
        let line = describe(
            &mapper,
            &ChunkShapes::default(),
            Path::new("/out/home.page-a1b2c3d4.js"),
        )
        .unwrap();

        assert!(line.starts_with("js:page"));
        assert!(line.contains("/public/home.page-a1b2c3d4.js"));
        assert!(line.contains("/public/home.page.js"));
    }

    #[test]
    fn test_describe_unhashed() {
        let mapper = UrlMapper::new("/out", "/", HashPattern::default());
        let line = describe(&mapper, &ChunkShapes::default(), Path::new("/out/robots.txt")).unwrap();
        assert_eq!(line, "other      /robots.txt");
    }

    #[test]
    fn test_describe_outside_root() {
        let mapper = UrlMapper::new("/out", "/", HashPattern::default());
        assert!(describe(&mapper, &ChunkShapes::default(), Path::new("/elsewhere/a.css")).is_none());
    }
}
