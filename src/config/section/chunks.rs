//! `[chunks]` section configuration.
//!
//! File-name conventions telling page entry chunks apart from shared ones.
//! Both are regexes matched against the stable file name.
//!
//! ```toml
//! [chunks]
//! page_pattern = '\.page\.m?js$'
//! shared_pattern = '^(chunk|shared|vendors?|lib)([-.~].*)?\.m?js$'
//! ```

use serde::{Deserialize, Serialize};

use crate::reload::kind::{DEFAULT_PAGE_PATTERN, DEFAULT_SHARED_PATTERN};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunksConfig {
    pub page_pattern: String,
    pub shared_pattern: String,
}

impl Default for ChunksConfig {
    fn default() -> Self {
        Self {
            page_pattern: DEFAULT_PAGE_PATTERN.into(),
            shared_pattern: DEFAULT_SHARED_PATTERN.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_chunks_override() {
        let config = test_parse_config("[chunks]\npage_pattern = '^entry-'");
        assert_eq!(config.chunks.page_pattern, "^entry-");
        assert_eq!(
            config.chunks.shared_pattern,
            crate::reload::kind::DEFAULT_SHARED_PATTERN
        );
    }
}
