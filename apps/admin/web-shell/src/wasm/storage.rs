use super::*;

/// `localStorage`-backed tab session. Storage failures (private mode, quota) are reported
/// to the caller, which logs and carries on.
pub(super) struct LocalStorageTabStore {
    key: String,
}

impl LocalStorageTabStore {
    pub(super) fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }

    fn storage() -> Result<web_sys::Storage, String> {
        let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
        window
            .local_storage()
            .map_err(|_| "localStorage access was denied".to_string())?
            .ok_or_else(|| "localStorage is unavailable".to_string())
    }
}

impl TabStateStore for LocalStorageTabStore {
    type Error = String;

    fn load_tab_state(&self) -> Result<Option<PersistedTabState>, Self::Error> {
        let raw = Self::storage()?
            .get_item(&self.key)
            .map_err(|_| format!("failed to read {}", self.key))?;
        Ok(raw.as_deref().and_then(PersistedTabState::decode))
    }

    fn persist_tab_state(&self, state: &PersistedTabState) -> Result<(), Self::Error> {
        let encoded = state
            .encode()
            .map_err(|error| format!("failed to encode tab state: {error}"))?;
        Self::storage()?
            .set_item(&self.key, &encoded)
            .map_err(|_| format!("failed to write {}", self.key))
    }
}

pub(super) fn now_unix_ms() -> u64 {
    let now = js_sys::Date::now();
    if !now.is_finite() || now.is_sign_negative() {
        return 0;
    }
    now.floor().min(u64::MAX as f64) as u64
}
