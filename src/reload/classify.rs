//! Change Classification
//!
//! Pure diff of two snapshots plus the raw event batch that separated them.
//! No actor machinery, no I/O.
//!
//! Records are keyed by stable URL, so a file whose name changed only in its
//! hash segment collapses into a single `Replace`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::kind::AssetKind;
use super::snapshot::FileSnapshot;
use super::url::{StableUrl, UrlMapper};

// =============================================================================
// Raw events
// =============================================================================

/// Filesystem event kind after the watcher has mapped notify's taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Add,
    Remove,
    Change,
}

impl FsEventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Change => "change",
        }
    }
}

/// One debounced filesystem event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

impl RawEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

// =============================================================================
// Change records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeRecord {
    Add {
        stable_url: StableUrl,
        url: String,
    },
    Remove {
        stable_url: StableUrl,
        url: String,
    },
    Replace {
        stable_url: StableUrl,
        old_url: String,
        new_url: String,
    },
}

impl ChangeRecord {
    pub fn stable_url(&self) -> &StableUrl {
        match self {
            Self::Add { stable_url, .. }
            | Self::Remove { stable_url, .. }
            | Self::Replace { stable_url, .. } => stable_url,
        }
    }

    /// The URL a client sees after the change (new URL for a replace).
    pub fn url(&self) -> &str {
        match self {
            Self::Add { url, .. } | Self::Remove { url, .. } => url,
            Self::Replace { new_url, .. } => new_url,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, Self::Add { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Replace { .. } => "replace",
        }
    }
}

/// Records of one batch, partitioned by asset kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub css: Vec<ChangeRecord>,
    pub js: Vec<ChangeRecord>,
    pub other: Vec<ChangeRecord>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.css.is_empty() && self.js.is_empty() && self.other.is_empty()
    }

    pub fn len(&self) -> usize {
        self.css.len() + self.js.len() + self.other.len()
    }

    /// All records with their kind, css first.
    pub fn iter(&self) -> impl Iterator<Item = (AssetKind, &ChangeRecord)> {
        self.css
            .iter()
            .map(|r| (AssetKind::Css, r))
            .chain(self.js.iter().map(|r| (AssetKind::Js, r)))
            .chain(self.other.iter().map(|r| (AssetKind::Other, r)))
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Diff `old` against `new` and fold in the raw `batch`.
///
/// `classify(s, s, &[], m)` is always empty.
pub fn classify(
    old: &FileSnapshot,
    new: &FileSnapshot,
    batch: &[RawEvent],
    mapper: &UrlMapper,
) -> ChangeSet {
    let old_index = index(old, mapper);
    let new_index = index(new, mapper);
    let mut records: BTreeMap<StableUrl, ChangeRecord> = BTreeMap::new();

    for path in old.difference(new) {
        let Some((stable_url, url)) = mapper.locate(path) else {
            continue;
        };
        let record = match new_index.get(&stable_url) {
            Some(new_url) => ChangeRecord::Replace {
                stable_url: stable_url.clone(),
                old_url: url,
                new_url: new_url.clone(),
            },
            None => ChangeRecord::Remove {
                stable_url: stable_url.clone(),
                url,
            },
        };
        records.insert(stable_url, record);
    }

    for path in new.difference(old) {
        let Some((stable_url, url)) = mapper.locate(path) else {
            continue;
        };
        if matches!(records.get(&stable_url), Some(ChangeRecord::Replace { .. })) {
            continue;
        }
        let record = match old_index.get(&stable_url) {
            Some(old_url) => ChangeRecord::Replace {
                stable_url: stable_url.clone(),
                old_url: old_url.clone(),
                new_url: url,
            },
            None => ChangeRecord::Add {
                stable_url: stable_url.clone(),
                url,
            },
        };
        records.insert(stable_url, record);
    }

    // A path that exists on both sides yet produced an event was rewritten in
    // place (plain write, rename-over or delete-then-recreate).
    for event in batch {
        if !(old.contains(&event.path) && new.contains(&event.path)) {
            continue;
        }
        let Some((stable_url, url)) = mapper.locate(&event.path) else {
            continue;
        };
        records.insert(
            stable_url.clone(),
            ChangeRecord::Replace {
                stable_url,
                old_url: url.clone(),
                new_url: url,
            },
        );
    }

    let mut set = ChangeSet::default();
    for record in records.into_values() {
        match AssetKind::from_url(record.url()) {
            AssetKind::Css => set.css.push(record),
            AssetKind::Js => set.js.push(record),
            AssetKind::Other => set.other.push(record),
        }
    }
    set
}

/// Stable URL -> URL for every mappable path. Later paths win on collision.
fn index(snapshot: &FileSnapshot, mapper: &UrlMapper) -> FxHashMap<StableUrl, String> {
    snapshot
        .iter()
        .filter_map(|path: &Path| mapper.locate(path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::url::HashPattern;

    const ROOT: &str = "/srv/dist/public";

    fn mapper() -> UrlMapper {
        UrlMapper::new(ROOT, "/public/", HashPattern::default())
    }

    fn snap(names: &[&str]) -> FileSnapshot {
        FileSnapshot::from_paths(names.iter().map(|n| Path::new(ROOT).join(n)))
    }

    fn event(name: &str, kind: FsEventKind) -> RawEvent {
        RawEvent::new(Path::new(ROOT).join(name), kind)
    }

    fn replace(stable: &str, old: &str, new: &str) -> ChangeRecord {
        ChangeRecord::Replace {
            stable_url: StableUrl::from(stable),
            old_url: old.to_string(),
            new_url: new.to_string(),
        }
    }

    #[test]
    fn test_identical_snapshots_are_empty() {
        for names in [
            &[][..],
            &["a.css"][..],
            &["style-aaa111.css", "app-abcdef12.js", "img/photo.png"][..],
        ] {
            let s = snap(names);
            assert!(classify(&s, &s, &[], &mapper()).is_empty());
        }
    }

    #[test]
    fn test_hash_change_css_replace() {
        let old = snap(&["style-aaa111.css"]);
        let new = snap(&["style-bbb222.css"]);
        let batch = [
            event("style-aaa111.css", FsEventKind::Remove),
            event("style-bbb222.css", FsEventKind::Add),
        ];

        let set = classify(&old, &new, &batch, &mapper());

        assert_eq!(
            set.css,
            vec![replace(
                "/public/style.css",
                "/public/style-aaa111.css",
                "/public/style-bbb222.css"
            )]
        );
        assert!(set.js.is_empty());
        assert!(set.other.is_empty());
    }

    #[test]
    fn test_hash_change_yields_exactly_one_record() {
        let old = snap(&["pages/home/home.page-a1b2c3d4.js", "style-aaa111.css"]);
        let new = snap(&["pages/home/home.page-e5f6a7b8.js", "style-aaa111.css"]);

        let set = classify(&old, &new, &[], &mapper());

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.js,
            vec![replace(
                "/public/pages/home/home.page.js",
                "/public/pages/home/home.page-a1b2c3d4.js",
                "/public/pages/home/home.page-e5f6a7b8.js",
            )]
        );
    }

    #[test]
    fn test_other_remove() {
        let old = snap(&["photo-9f8e7d6c.png"]);
        let new = snap(&[]);

        let set = classify(&old, &new, &[], &mapper());

        assert_eq!(
            set.other,
            vec![ChangeRecord::Remove {
                stable_url: StableUrl::from("/public/photo.png"),
                url: "/public/photo-9f8e7d6c.png".to_string(),
            }]
        );
    }

    #[test]
    fn test_new_file_is_add() {
        let old = snap(&["a.css"]);
        let new = snap(&["a.css", "chunk-1234abcd.js"]);

        let set = classify(&old, &new, &[], &mapper());

        assert_eq!(set.js.len(), 1);
        assert!(set.js[0].is_add());
        assert_eq!(set.js[0].stable_url().as_str(), "/public/chunk.js");
    }

    #[test]
    fn test_in_place_write_is_self_replace() {
        let s = snap(&["favicon.ico", "theme.css"]);
        let batch = [event("theme.css", FsEventKind::Change)];

        let set = classify(&s, &s, &batch, &mapper());

        assert_eq!(
            set.css,
            vec![replace("/public/theme.css", "/public/theme.css", "/public/theme.css")]
        );
        assert!(set.other.is_empty());
    }

    #[test]
    fn test_delete_then_recreate_is_self_replace() {
        let s = snap(&["app.js"]);
        let batch = [
            event("app.js", FsEventKind::Remove),
            event("app.js", FsEventKind::Add),
        ];

        let set = classify(&s, &s, &batch, &mapper());

        assert_eq!(set.js, vec![replace("/public/app.js", "/public/app.js", "/public/app.js")]);
    }

    #[test]
    fn test_events_for_unlisted_paths_are_ignored() {
        let s = snap(&["app.js"]);
        let batch = [
            event("app.js.map", FsEventKind::Change),
            event("manifest.json", FsEventKind::Change),
            event("pages", FsEventKind::Add),
        ];
        assert!(classify(&s, &s, &batch, &mapper()).is_empty());

        let outside = RawEvent::new("/srv/dist/server/index.js", FsEventKind::Change);
        assert!(classify(&s, &s, &[outside], &mapper()).is_empty());
    }

    #[test]
    fn test_in_place_write_overrides_diff_record() {
        // stale `style-aaa111.css` lingers next to the rewritten one
        let old = snap(&["style-aaa111.css", "style-bbb222.css"]);
        let new = snap(&["style-bbb222.css"]);
        let batch = [event("style-bbb222.css", FsEventKind::Change)];

        let set = classify(&old, &new, &batch, &mapper());

        assert_eq!(
            set.css,
            vec![replace(
                "/public/style.css",
                "/public/style-bbb222.css",
                "/public/style-bbb222.css"
            )]
        );
    }

    #[test]
    fn test_short_hashes_with_custom_pattern() {
        let pattern = HashPattern::new(r"(?P<hash>-[a-z0-9]{1,8})\.[a-z]+$").unwrap();
        let mapper = UrlMapper::new(ROOT, "/public/", pattern);
        let old = snap(&["home.page-h1.js", "chunk-c1.js"]);
        let new = snap(&["home.page-h2.js", "chunk-c1.js"]);

        let set = classify(&old, &new, &[], &mapper);

        assert_eq!(
            set.js,
            vec![replace(
                "/public/home.page.js",
                "/public/home.page-h1.js",
                "/public/home.page-h2.js"
            )]
        );
        assert!(set.css.is_empty() && set.other.is_empty());
    }

    #[test]
    fn test_partition_and_order() {
        let old = snap(&["b-aaaaaa11.css", "a-aaaaaa11.css", "z.js", "logo.svg"]);
        let new = snap(&["b-bbbbbb22.css", "a-bbbbbb22.css", "logo.svg"]);

        let set = classify(&old, &new, &[], &mapper());

        let stables: Vec<_> = set.iter().map(|(_, r)| r.stable_url().as_str()).collect();
        assert_eq!(stables, vec!["/public/a.css", "/public/b.css", "/public/z.js"]);
        let kinds: Vec<_> = set.iter().map(|(k, r)| (k, r.label())).collect();
        assert_eq!(
            kinds,
            vec![
                (AssetKind::Css, "replace"),
                (AssetKind::Css, "replace"),
                (AssetKind::Js, "remove"),
            ]
        );
    }
}
