//! Point-in-time listings of the watched output tree.
//!
//! A snapshot is the *comparable* view of the tree: source maps and build
//! metadata may sit on disk but never appear in it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

/// Sorted set of absolute file paths. Never mutated after it is taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSnapshot {
    paths: BTreeSet<PathBuf>,
}

impl FileSnapshot {
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// Paths in `self` that are not in `other`, in sorted order.
    pub fn difference<'a>(&'a self, other: &'a FileSnapshot) -> impl Iterator<Item = &'a Path> {
        self.paths.difference(&other.paths).map(PathBuf::as_path)
    }
}

/// Which files are left out of the comparable view.
#[derive(Debug, Clone, Default)]
pub struct SnapshotPolicy {
    /// Root-relative paths of build metadata (e.g. `manifest.json`).
    metadata: Vec<PathBuf>,
}

impl SnapshotPolicy {
    pub fn new<I, P>(metadata: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            metadata: metadata.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let is_map = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".map"));
        if is_map {
            return true;
        }

        path.strip_prefix(root)
            .is_ok_and(|rel| self.metadata.iter().any(|m| m == rel))
    }
}

/// List every regular file under `root`.
///
/// A missing root, or any entry that cannot be read, simply contributes
/// nothing: a rebuild in progress may remove paths under our feet.
pub fn take_snapshot(root: &Path, policy: &SnapshotPolicy) -> FileSnapshot {
    if !root.is_dir() {
        return FileSnapshot::default();
    }

    let paths = WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path())
        .filter(|path| !policy.is_excluded(root, path))
        .collect();

    FileSnapshot { paths }
}

/// The previous and current snapshot, advanced together.
///
/// Owned by a single writer (the relay actor). `advance` replaces both
/// halves in one step, so readers never see a half-updated pair.
#[derive(Debug, Clone)]
pub struct SnapshotPair {
    previous: FileSnapshot,
    current: FileSnapshot,
}

impl SnapshotPair {
    pub fn new(initial: FileSnapshot) -> Self {
        Self {
            previous: initial.clone(),
            current: initial,
        }
    }

    /// Make `next` current and return `(previous, current)`.
    pub fn advance(&mut self, next: FileSnapshot) -> (&FileSnapshot, &FileSnapshot) {
        self.previous = std::mem::replace(&mut self.current, next);
        (&self.previous, &self.current)
    }

    pub fn previous(&self) -> &FileSnapshot {
        &self.previous
    }

    pub fn current(&self) -> &FileSnapshot {
        &self.current
    }
}
