//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads from any thread.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

use crate::config::LivepatchConfig;

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<LivepatchConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(LivepatchConfig::default()));

#[inline]
pub fn cfg() -> Arc<LivepatchConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: LivepatchConfig) -> Arc<LivepatchConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
