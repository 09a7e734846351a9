//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! root = "dist/public"        # Output root (relative to livepatch.toml)
//! url_prefix = "/public/"     # Public URL the root is served under
//! debounce_ms = 50            # Quiet window before a batch is processed
//! pair_hold_ms = 250          # Extra wait for page chunks after a shared chunk (0 = off)
//! exclude = ["manifest.json", ".vite/manifest.json"]
//! ```
//!
//! `hash_pattern` is a regex matched against file names; its `hash` group is
//! cut out to form the stable URL.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::reload::url::DEFAULT_HASH_PATTERN;

/// Output root watching and URL mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Watched output root. Absolute after loading.
    pub root: PathBuf,

    /// URL prefix the root is served under.
    pub url_prefix: String,

    /// Quiet window in milliseconds.
    pub debounce_ms: u64,

    /// Extra quiet time a batch with shared chunks but no page chunk waits.
    pub pair_hold_ms: u64,

    /// Content-hash regex with a `hash` capture group.
    pub hash_pattern: String,

    /// Root-relative build metadata left out of snapshots.
    pub exclude: Vec<PathBuf>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("dist/public"),
            url_prefix: "/public/".into(),
            debounce_ms: 50,
            pair_hold_ms: 250,
            hash_pattern: DEFAULT_HASH_PATTERN.into(),
            exclude: vec![
                PathBuf::from("manifest.json"),
                PathBuf::from(".vite/manifest.json"),
            ],
        }
    }
}
