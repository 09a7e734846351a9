//! Live Reload Message Protocol
//!
//! JSON messages exchanged over the WebSocket between the relay and browser
//! agents.
//!
//! # Message Types
//!
//! - `reload`: full page reload
//! - `css`: stylesheet removals and replacements
//! - `js`: module script and preload removals and replacements
//! - `server-reloaded`: inbound only, the app server restarted

use serde::{Deserialize, Serialize};

/// Message sent (or received) over WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HotReloadMessage {
    /// Full page reload
    Reload,

    /// Stylesheet patch
    Css { operations: Operations },

    /// Module script patch
    Js { operations: Operations },

    /// Backend restarted; relay turns this into a `reload` broadcast
    ServerReloaded,
}

/// Removals and replacements for one asset kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operations {
    #[serde(default)]
    pub remove: Vec<String>,
    #[serde(default)]
    pub replace: Vec<UrlReplace>,
}

impl Operations {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.replace.is_empty()
    }

    pub fn len(&self) -> usize {
        self.remove.len() + self.replace.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlReplace {
    pub old_url: String,
    pub new_url: String,
}

impl UrlReplace {
    pub fn new(old_url: impl Into<String>, new_url: impl Into<String>) -> Self {
        Self {
            old_url: old_url.into(),
            new_url: new_url.into(),
        }
    }
}

impl HotReloadMessage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reload => "reload",
            Self::Css { .. } => "css",
            Self::Js { .. } => "js",
            Self::ServerReloaded => "server-reloaded",
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    /// Parse from JSON string, `None` for anything malformed or unknown
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_envelope() {
        assert_eq!(HotReloadMessage::Reload.to_json(), r#"{"type":"reload"}"#);
        assert_eq!(
            HotReloadMessage::ServerReloaded.to_json(),
            r#"{"type":"server-reloaded"}"#
        );
    }

    #[test]
    fn test_css_envelope() {
        let msg = HotReloadMessage::Css {
            operations: Operations {
                remove: vec!["/public/old.css".to_string()],
                replace: vec![UrlReplace::new(
                    "/public/style-aaa111.css",
                    "/public/style-bbb222.css",
                )],
            },
        };
        assert_eq!(
            msg.to_json(),
            r#"{"type":"css","operations":{"remove":["/public/old.css"],"replace":[{"oldUrl":"/public/style-aaa111.css","newUrl":"/public/style-bbb222.css"}]}}"#
        );
    }

    #[test]
    fn test_parse_inbound() {
        assert_eq!(
            HotReloadMessage::from_json(r#"{"type":"server-reloaded"}"#),
            Some(HotReloadMessage::ServerReloaded)
        );

        let js = HotReloadMessage::from_json(
            r#"{"type":"js","operations":{"replace":[{"oldUrl":"/a.js","newUrl":"/b.js"}]}}"#,
        );
        assert_eq!(
            js,
            Some(HotReloadMessage::Js {
                operations: Operations {
                    remove: vec![],
                    replace: vec![UrlReplace::new("/a.js", "/b.js")],
                }
            })
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(HotReloadMessage::from_json("hello"), None);
        assert_eq!(HotReloadMessage::from_json(r#"{"type":"ping"}"#), None);
        assert_eq!(HotReloadMessage::from_json(r#"{"kind":"reload"}"#), None);
        assert_eq!(HotReloadMessage::from_json(""), None);
    }
}
