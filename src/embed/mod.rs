//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - The browser agent served at `/livepatch.js`
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{LIVEPATCH_JS, LivepatchVars};
//!
//! let js = LIVEPATCH_JS.render(&LivepatchVars::from_config(&config, 35729));
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};
    use crate::client::backoff::MAX_DELAY;
    use crate::config::LivepatchConfig;

    /// Path the script server answers on.
    pub const LIVEPATCH_JS_PATH: &str = "/livepatch.js";

    /// Variables for livepatch.js.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct LivepatchVars {
        pub ws_port: u16,
        pub base_delay_ms: u64,
        pub max_retries: u32,
        pub max_delay_ms: u128,
        pub grace_ms: u64,
        pub unmount_hook: String,
    }

    impl LivepatchVars {
        pub fn from_config(config: &LivepatchConfig, ws_port: u16) -> Self {
            let client = &config.client;
            Self {
                ws_port,
                base_delay_ms: client.base_delay_ms,
                max_retries: client.max_retries,
                max_delay_ms: MAX_DELAY.as_millis(),
                grace_ms: client.grace_ms,
                unmount_hook: client.unmount_hook.clone(),
            }
        }
    }

    impl TemplateVars for LivepatchVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__LIVEPATCH_WS_PORT__", &self.ws_port.to_string())
                .replace("__LIVEPATCH_BASE_DELAY__", &self.base_delay_ms.to_string())
                .replace("__LIVEPATCH_MAX_RETRIES__", &self.max_retries.to_string())
                .replace("__LIVEPATCH_MAX_DELAY__", &self.max_delay_ms.to_string())
                .replace("__LIVEPATCH_GRACE__", &self.grace_ms.to_string())
                .replace(
                    "__LIVEPATCH_UNMOUNT_HOOK__",
                    &serde_json::to_string(&self.unmount_hook)
                        .unwrap_or_else(|_| "\"__livepatchUnmount\"".into()),
                )
        }
    }

    /// Browser agent with connection settings injected.
    pub const LIVEPATCH_JS: Template<LivepatchVars> =
        Template::new(include_str!("serve/livepatch.js"));

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_render_injects_settings() {
            let vars = LivepatchVars::from_config(&LivepatchConfig::default(), 35800);
            let js = LIVEPATCH_JS.render(&vars);

            assert!(js.contains("35800"));
            assert!(js.contains("const MAX_DELAY = 3600000;"));
            assert!(js.contains("\"__livepatchUnmount\""));
            assert!(!js.contains("__LIVEPATCH_"));
        }
    }
}
