use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ShellConfig;
use crate::href::{HrefError, HrefResolver};

pub const DASHBOARD_TAB_ID: &str = "dashboard";
pub const DEFAULT_NEW_TAB_LABEL: &str = "Nova aba";
pub const DEFAULT_DASHBOARD_LABEL: &str = "Painel Principal";
pub const DEFAULT_DASHBOARD_HREF: &str = "/pages/admin.html";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn dashboard() -> Self {
        Self(DASHBOARD_TAB_ID.to_string())
    }

    pub fn numbered(counter: u64) -> Self {
        Self(format!("tab-{counter}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_dashboard(&self) -> bool {
        self.0 == DASHBOARD_TAB_ID
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabRecord {
    pub id: TabId,
    /// Normalized destination, the dedup key.
    pub href: String,
    pub label: String,
    pub locked: bool,
}

/// The pinned root tab registered at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultTab {
    pub href: String,
    pub label: String,
    /// Used when `href` does not normalize.
    pub fallback_href: String,
}

impl DefaultTab {
    pub fn new(href: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            label: label.into(),
            fallback_href: DEFAULT_DASHBOARD_HREF.to_string(),
        }
    }

    pub fn with_fallback(mut self, fallback_href: impl Into<String>) -> Self {
        self.fallback_href = fallback_href.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Not manageable as a tab; the caller performs a full top-level navigation.
    Navigate { href: String },
    /// A tab already existed for the destination and is now active.
    Activated { id: TabId },
    /// A new tab was registered and activated.
    Created { record: TabRecord, iframe_src: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseOutcome {
    pub removed: TabRecord,
    /// Set when the closed tab was active and another tab took over.
    pub activated: Option<TabId>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryInvariantError {
    #[error("href {href} maps to unknown tab {id}")]
    DanglingHref { href: String, id: TabId },
    #[error("order references unknown tab {0}")]
    DanglingOrder(TabId),
    #[error("order lists tab {0} more than once")]
    DuplicateOrder(TabId),
    #[error("active tab {0} is not registered")]
    DanglingActive(TabId),
    #[error("no tab is active")]
    NoActiveTab,
}

/// Open tabs of one admin shell. Owns no DOM; callers render from the returned outcomes.
#[derive(Debug, Clone)]
pub struct TabRegistry {
    resolver: HrefResolver,
    new_tab_label: String,
    tabs: HashMap<TabId, TabRecord>,
    href_to_id: HashMap<String, TabId>,
    order: Vec<TabId>,
    active_id: Option<TabId>,
    counter: u64,
}

impl TabRegistry {
    pub fn new(resolver: HrefResolver, default_tab: DefaultTab) -> Self {
        let dashboard_href = resolver
            .normalize(&default_tab.href)
            .or_else(|_| resolver.normalize(&default_tab.fallback_href))
            .unwrap_or_else(|_| DEFAULT_DASHBOARD_HREF.to_string());
        let label = non_blank_or(&default_tab.label, DEFAULT_DASHBOARD_LABEL);

        let mut registry = Self {
            resolver,
            new_tab_label: DEFAULT_NEW_TAB_LABEL.to_string(),
            tabs: HashMap::new(),
            href_to_id: HashMap::new(),
            order: Vec::new(),
            active_id: None,
            counter: 0,
        };

        let id = TabId::dashboard();
        registry.href_to_id.insert(dashboard_href.clone(), id.clone());
        registry.tabs.insert(
            id.clone(),
            TabRecord {
                id: id.clone(),
                href: dashboard_href,
                label,
                locked: true,
            },
        );
        registry.set_active(&id);
        registry
    }

    /// Registry for a shell page at `location`. The page's own path becomes the dashboard
    /// href, so links back to it re-activate the dashboard instead of nesting the shell.
    pub fn for_shell(location: &str, config: &ShellConfig) -> Result<Self, HrefError> {
        let resolver = HrefResolver::new(location, config.tab_path_prefixes.clone())?;
        let dashboard = DefaultTab::new(resolver.base().path(), config.default_tab_label.as_str())
            .with_fallback(config.default_tab_href.as_str());
        Ok(Self::new(resolver, dashboard).with_new_tab_label(&config.new_tab_label))
    }

    pub fn with_new_tab_label(mut self, label: &str) -> Self {
        self.new_tab_label = non_blank_or(label, DEFAULT_NEW_TAB_LABEL);
        self
    }

    pub fn resolver(&self) -> &HrefResolver {
        &self.resolver
    }

    pub fn open(&mut self, href: &str, label: &str) -> OpenOutcome {
        let resolved = match self.resolver.resolve(href) {
            Ok(resolved) => resolved,
            Err(error) => {
                tracing::warn!(href, %error, "admin tab href is malformed; navigating directly");
                return OpenOutcome::Navigate {
                    href: href.to_string(),
                };
            }
        };

        if !self.resolver.is_tab_eligible(&resolved) {
            tracing::debug!(href = %resolved.key, "href outside admin tab namespace");
            return OpenOutcome::Navigate {
                href: resolved.navigation_target().to_string(),
            };
        }

        if let Some(existing) = self.href_to_id.get(&resolved.key).cloned() {
            if self.tabs.contains_key(&existing) {
                self.set_active(&existing);
                tracing::debug!(tab_id = %existing, href = %resolved.key, "re-activated existing tab");
                return OpenOutcome::Activated { id: existing };
            }
        }

        let iframe_src = match self.resolver.iframe_src(href) {
            Ok(src) => src,
            Err(error) => {
                tracing::warn!(href, %error, "could not build iframe src; navigating directly");
                return OpenOutcome::Navigate {
                    href: href.to_string(),
                };
            }
        };

        self.counter += 1;
        let id = TabId::numbered(self.counter);
        let record = TabRecord {
            id: id.clone(),
            href: resolved.key.clone(),
            label: non_blank_or(label, &self.new_tab_label),
            locked: false,
        };

        self.tabs.insert(id.clone(), record.clone());
        self.href_to_id.insert(resolved.key, id.clone());
        self.order.push(id.clone());
        self.set_active(&id);
        tracing::debug!(tab_id = %id, href = %record.href, "opened admin tab");

        OpenOutcome::Created { record, iframe_src }
    }

    pub fn close(&mut self, id: &TabId) -> Option<CloseOutcome> {
        let locked = self.tabs.get(id)?.locked;
        if locked {
            tracing::debug!(tab_id = %id, "refusing to close locked tab");
            return None;
        }

        let removed = self.tabs.remove(id)?;
        if self.href_to_id.get(&removed.href) == Some(id) {
            self.href_to_id.remove(&removed.href);
        }
        self.order.retain(|entry| entry != id);

        let mut activated = None;
        if self.active_id.as_ref() == Some(id) {
            self.active_id = None;
            let fallback = self
                .order
                .last()
                .filter(|candidate| self.tabs.contains_key(*candidate))
                .cloned()
                .unwrap_or_else(TabId::dashboard);
            if self.set_active(&fallback) {
                activated = Some(fallback);
            }
        }

        tracing::debug!(tab_id = %id, next_active = ?activated, "closed admin tab");
        Some(CloseOutcome { removed, activated })
    }

    pub fn set_active(&mut self, id: &TabId) -> bool {
        if !self.tabs.contains_key(id) {
            return false;
        }
        self.order.retain(|entry| entry != id);
        self.order.push(id.clone());
        self.active_id = Some(id.clone());
        true
    }

    pub fn active_id(&self) -> Option<&TabId> {
        self.active_id.as_ref()
    }

    pub fn active(&self) -> Option<&TabRecord> {
        self.active_id.as_ref().and_then(|id| self.tabs.get(id))
    }

    pub fn get(&self, id: &TabId) -> Option<&TabRecord> {
        self.tabs.get(id)
    }

    pub fn id_for_href(&self, href: &str) -> Option<&TabId> {
        let key = self.resolver.normalize(href).ok()?;
        self.href_to_id.get(&key)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Tabs from least to most recently activated.
    pub fn iter_mru(&self) -> impl Iterator<Item = &TabRecord> {
        self.order.iter().filter_map(|id| self.tabs.get(id))
    }

    pub fn order(&self) -> &[TabId] {
        &self.order
    }

    pub fn check_invariants(&self) -> Result<(), RegistryInvariantError> {
        for (href, id) in &self.href_to_id {
            if !self.tabs.contains_key(id) {
                return Err(RegistryInvariantError::DanglingHref {
                    href: href.clone(),
                    id: id.clone(),
                });
            }
        }
        for (index, id) in self.order.iter().enumerate() {
            if !self.tabs.contains_key(id) {
                return Err(RegistryInvariantError::DanglingOrder(id.clone()));
            }
            if self.order[..index].contains(id) {
                return Err(RegistryInvariantError::DuplicateOrder(id.clone()));
            }
        }
        match self.active_id.as_ref() {
            Some(active) if !self.tabs.contains_key(active) => {
                Err(RegistryInvariantError::DanglingActive(active.clone()))
            }
            Some(_) => Ok(()),
            None => Err(RegistryInvariantError::NoActiveTab),
        }
    }
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
