//! DOM patch planning for `css` and `js` messages.
//!
//! The planner never touches a document. It looks at a [`PageView`] (which
//! stylesheet links, module scripts and modulepreload links the page has)
//! and returns the [`DomAction`]s the browser agent performs, in order.

use std::time::Duration;

use crate::reload::message::Operations;

/// Default delay before an old element is removed after its replacement
/// was inserted.
pub const DEFAULT_GRACE_MS: u64 = 50;

/// Default global the agent calls before swapping page code.
pub const DEFAULT_UNMOUNT_HOOK: &str = "__livepatchUnmount";

/// Asset references currently present in a document, as attribute values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageView {
    /// `<link rel="stylesheet" href>`
    pub stylesheets: Vec<String>,
    /// `<script type="module" src>`
    pub module_scripts: Vec<String>,
    /// `<link rel="modulepreload" href>`
    pub module_preloads: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomAction {
    /// Insert a stylesheet link right after the one with href `after`.
    InsertStylesheet { after: String, href: String },
    RemoveStylesheet { href: String, delay: Duration },
    InsertPreload { after: String, href: String },
    RemovePreload { href: String, delay: Duration },
    /// Call `window[name]()` if defined, then delete it.
    CallUnmountHook { name: String },
    /// Insert a module script right after the one with src `after`. A load
    /// failure reloads the page.
    InsertModuleScript { after: String, src: String },
    RemoveModuleScript { src: String, delay: Duration },
}

/// What the agent does with a `js` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Apply(Vec<DomAction>),
    Reload { reason: String },
}

/// `href` refers to `url`: exact, or `url` followed by a cache-busting query.
pub fn href_matches(href: &str, url: &str) -> bool {
    href == url || href.contains(&format!("{url}?"))
}

fn find<'a>(refs: &'a [String], url: &str) -> Option<&'a str> {
    refs.iter().map(String::as_str).find(|href| href_matches(href, url))
}

#[derive(Debug, Clone)]
pub struct PatchPlanner {
    grace: Duration,
    unmount_hook: String,
}

impl PatchPlanner {
    pub fn new(grace: Duration, unmount_hook: impl Into<String>) -> Self {
        Self {
            grace,
            unmount_hook: unmount_hook.into(),
        }
    }

    /// Stylesheet updates. Links the page does not have are skipped.
    pub fn plan_css(&self, ops: &Operations, page: &PageView) -> Vec<DomAction> {
        let mut actions = Vec::new();

        for url in &ops.remove {
            if let Some(href) = find(&page.stylesheets, url) {
                actions.push(DomAction::RemoveStylesheet {
                    href: href.to_string(),
                    delay: Duration::ZERO,
                });
            }
        }

        for replace in &ops.replace {
            if let Some(href) = find(&page.stylesheets, &replace.old_url) {
                actions.push(DomAction::InsertStylesheet {
                    after: href.to_string(),
                    href: replace.new_url.clone(),
                });
                actions.push(DomAction::RemoveStylesheet {
                    href: href.to_string(),
                    delay: self.grace,
                });
            }
        }

        actions
    }

    /// Module updates, acting only on what this page references.
    ///
    /// Removing a script the page runs cannot be patched and reloads.
    /// Entries the page does not reference are no-ops.
    pub fn plan_js(&self, ops: &Operations, page: &PageView) -> PatchOutcome {
        let mut actions = Vec::new();

        for url in &ops.remove {
            if let Some(src) = find(&page.module_scripts, url) {
                return PatchOutcome::Reload {
                    reason: format!("running script removed: {src}"),
                };
            }
            if let Some(href) = find(&page.module_preloads, url) {
                actions.push(DomAction::RemovePreload {
                    href: href.to_string(),
                    delay: Duration::ZERO,
                });
            }
        }

        let mut unmounted = false;
        for replace in &ops.replace {
            if let Some(href) = find(&page.module_preloads, &replace.old_url) {
                actions.push(DomAction::InsertPreload {
                    after: href.to_string(),
                    href: replace.new_url.clone(),
                });
                actions.push(DomAction::RemovePreload {
                    href: href.to_string(),
                    delay: self.grace,
                });
            }

            let Some(src) = find(&page.module_scripts, &replace.old_url) else {
                continue;
            };
            if !unmounted {
                actions.push(DomAction::CallUnmountHook {
                    name: self.unmount_hook.clone(),
                });
                unmounted = true;
            }
            actions.push(DomAction::InsertModuleScript {
                after: src.to_string(),
                src: replace.new_url.clone(),
            });
            actions.push(DomAction::RemoveModuleScript {
                src: src.to_string(),
                delay: self.grace,
            });
        }

        PatchOutcome::Apply(actions)
    }
}

impl Default for PatchPlanner {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_GRACE_MS), DEFAULT_UNMOUNT_HOOK)
    }
}
