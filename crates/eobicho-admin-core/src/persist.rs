use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{DEFAULT_NEW_TAB_LABEL, TabRegistry};

pub const DEFAULT_STORAGE_KEY: &str = "admin-tab-state";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTab {
    pub href: String,
    #[serde(default)]
    pub label: String,
}

/// Open tabs saved across page loads of the admin shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTabState {
    pub tabs: Vec<PersistedTab>,
    #[serde(default)]
    pub active_href: Option<String>,
    #[serde(default)]
    pub timestamp: u64,
}

impl PersistedTab {
    /// One saved entry. Entries without a usable href are dropped; a missing label
    /// becomes the new-tab label.
    fn from_saved(entry: &Value) -> Option<Self> {
        let href = entry.get("href")?.as_str()?.trim();
        if href.is_empty() {
            return None;
        }
        let label = entry
            .get("label")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(DEFAULT_NEW_TAB_LABEL);
        Some(Self {
            href: href.to_string(),
            label: label.to_string(),
        })
    }
}

impl PersistedTabState {
    /// Payloads without a `tabs` array, or with no usable entry, are treated as "nothing
    /// saved". Bad entries are skipped individually.
    pub fn decode(raw: &str) -> Option<Self> {
        let value = serde_json::from_str::<Value>(raw).ok()?;
        let tabs = value
            .get("tabs")?
            .as_array()?
            .iter()
            .filter_map(PersistedTab::from_saved)
            .collect::<Vec<_>>();
        if tabs.is_empty() {
            return None;
        }
        let active_href = value
            .get("activeHref")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(ToString::to_string);
        let timestamp = value.get("timestamp").and_then(Value::as_u64).unwrap_or(0);
        Some(Self {
            tabs,
            active_href,
            timestamp,
        })
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl TabRegistry {
    /// Unlocked tabs in MRU order; the active href only when a dynamic tab is in front.
    pub fn snapshot(&self, timestamp: u64) -> PersistedTabState {
        let tabs = self
            .iter_mru()
            .filter(|tab| !tab.locked && !tab.href.is_empty())
            .map(|tab| PersistedTab {
                href: tab.href.clone(),
                label: tab.label.clone(),
            })
            .collect();
        let active_href = self
            .active()
            .filter(|tab| !tab.locked)
            .map(|tab| tab.href.clone());
        PersistedTabState {
            tabs,
            active_href,
            timestamp,
        }
    }
}

pub trait TabStateStore {
    type Error;

    fn load_tab_state(&self) -> Result<Option<PersistedTabState>, Self::Error>;
    fn persist_tab_state(&self, state: &PersistedTabState) -> Result<(), Self::Error>;
}
