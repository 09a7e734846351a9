//! `[client]` section configuration.
//!
//! Rendered into the browser agent and used by `livepatch tail`.
//!
//! ```toml
//! [client]
//! base_delay_ms = 1000        # First reconnect delay, doubled per attempt
//! max_retries = 15
//! grace_ms = 50               # Old element lingers this long after a swap
//! unmount_hook = "__livepatchUnmount"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::backoff::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_RETRIES, ReconnectPolicy};
use crate::client::patch::{DEFAULT_GRACE_MS, DEFAULT_UNMOUNT_HOOK, PatchPlanner};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_delay_ms: u64,
    pub max_retries: u32,
    pub grace_ms: u64,
    pub unmount_hook: String,
}

impl ClientConfig {
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_retries: self.max_retries,
        }
    }

    pub fn patch_planner(&self) -> PatchPlanner {
        PatchPlanner::new(Duration::from_millis(self.grace_ms), self.unmount_hook.as_str())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            grace_ms: DEFAULT_GRACE_MS,
            unmount_hook: DEFAULT_UNMOUNT_HOOK.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_client_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.client.reconnect_policy(), ReconnectPolicy::default());
        assert_eq!(config.client.unmount_hook, "__livepatchUnmount");
    }

    #[test]
    fn test_client_policy() {
        let config = test_parse_config("[client]\nbase_delay_ms = 250\nmax_retries = 3");
        let policy = config.client.reconnect_policy();
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.max_retries, 3);
    }
}
