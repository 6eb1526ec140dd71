use serde::Deserialize;
use thiserror::Error;

use crate::href::DEFAULT_TAB_PATH_PREFIXES;
use crate::layout::{FRAME_CLEARANCE, MIN_PANEL_HEIGHT, TAB_SCROLL_MARGIN};
use crate::measure::{MODAL_SELECTOR, MODAL_SHELL_SELECTOR};
use crate::persist::DEFAULT_STORAGE_KEY;
use crate::registry::{DEFAULT_DASHBOARD_HREF, DEFAULT_DASHBOARD_LABEL, DEFAULT_NEW_TAB_LABEL};

/// Page global holding optional JSON overrides, read before the shell boots.
pub const CONFIG_GLOBAL: &str = "__EO_BICHO_ADMIN_TABS__";

const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_PERSIST_TABS: bool = true;

#[derive(Debug, Clone, PartialEq)]
pub struct ShellConfig {
    pub tab_path_prefixes: Vec<String>,
    pub storage_key: String,
    pub persist_tabs: bool,
    pub modal_selector: String,
    pub modal_shell_selector: String,
    pub min_panel_height: f64,
    pub frame_clearance: f64,
    pub tab_scroll_margin: f64,
    pub new_tab_label: String,
    pub default_tab_label: String,
    pub default_tab_href: String,
    pub log_filter: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid admin tab config JSON: {0}")]
    Json(String),
    #[error("tab_path_prefixes must not be empty")]
    NoTabPrefixes,
    #[error("tab path prefix '{0}' must start and end with '/'")]
    InvalidTabPrefix(String),
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("{field} must be a finite non-negative number, got {value}")]
    InvalidNumber { field: &'static str, value: f64 },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawShellConfig {
    tab_path_prefixes: Option<Vec<String>>,
    storage_key: Option<String>,
    persist_tabs: Option<bool>,
    modal_selector: Option<String>,
    modal_shell_selector: Option<String>,
    min_panel_height: Option<f64>,
    frame_clearance: Option<f64>,
    tab_scroll_margin: Option<f64>,
    new_tab_label: Option<String>,
    default_tab_label: Option<String>,
    default_tab_href: Option<String>,
    log_filter: Option<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            tab_path_prefixes: DEFAULT_TAB_PATH_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            persist_tabs: DEFAULT_PERSIST_TABS,
            modal_selector: MODAL_SELECTOR.to_string(),
            modal_shell_selector: MODAL_SHELL_SELECTOR.to_string(),
            min_panel_height: MIN_PANEL_HEIGHT,
            frame_clearance: FRAME_CLEARANCE,
            tab_scroll_margin: TAB_SCROLL_MARGIN,
            new_tab_label: DEFAULT_NEW_TAB_LABEL.to_string(),
            default_tab_label: DEFAULT_DASHBOARD_LABEL.to_string(),
            default_tab_href: DEFAULT_DASHBOARD_HREF.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ShellConfig {
    /// Defaults overlaid with whatever fields `raw` provides.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let overrides = serde_json::from_str::<RawShellConfig>(raw)
            .map_err(|error| ConfigError::Json(error.to_string()))?;
        let defaults = Self::default();

        let config = Self {
            tab_path_prefixes: overrides
                .tab_path_prefixes
                .map(|prefixes| {
                    prefixes
                        .into_iter()
                        .map(|prefix| prefix.trim().to_string())
                        .filter(|prefix| !prefix.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.tab_path_prefixes),
            storage_key: trimmed_or(overrides.storage_key, defaults.storage_key),
            persist_tabs: overrides.persist_tabs.unwrap_or(defaults.persist_tabs),
            modal_selector: trimmed_or(overrides.modal_selector, defaults.modal_selector),
            modal_shell_selector: trimmed_or(
                overrides.modal_shell_selector,
                defaults.modal_shell_selector,
            ),
            min_panel_height: overrides
                .min_panel_height
                .unwrap_or(defaults.min_panel_height),
            frame_clearance: overrides
                .frame_clearance
                .unwrap_or(defaults.frame_clearance),
            tab_scroll_margin: overrides
                .tab_scroll_margin
                .unwrap_or(defaults.tab_scroll_margin),
            new_tab_label: trimmed_or(overrides.new_tab_label, defaults.new_tab_label),
            default_tab_label: trimmed_or(overrides.default_tab_label, defaults.default_tab_label),
            default_tab_href: trimmed_or(overrides.default_tab_href, defaults.default_tab_href),
            log_filter: trimmed_or(overrides.log_filter, defaults.log_filter),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tab_path_prefixes.is_empty() {
            return Err(ConfigError::NoTabPrefixes);
        }
        if let Some(prefix) = self
            .tab_path_prefixes
            .iter()
            .find(|prefix| !prefix.starts_with('/') || !prefix.ends_with('/'))
        {
            return Err(ConfigError::InvalidTabPrefix(prefix.clone()));
        }

        for (field, value) in [
            ("storageKey", &self.storage_key),
            ("modalSelector", &self.modal_selector),
            ("modalShellSelector", &self.modal_shell_selector),
            ("logFilter", &self.log_filter),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Blank { field });
            }
        }

        for (field, value) in [
            ("minPanelHeight", self.min_panel_height),
            ("frameClearance", self.frame_clearance),
            ("tabScrollMargin", self.tab_scroll_margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidNumber { field, value });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            persist_tabs: false,
            log_filter: "debug".to_string(),
            ..Self::default()
        }
    }
}

fn trimmed_or(value: Option<String>, fallback: String) -> String {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = ShellConfig::from_json("{}").expect("parses");
        assert_eq!(config, ShellConfig::default());
        assert_eq!(
            config.tab_path_prefixes,
            vec!["/pages/admin/".to_string(), "/pages/funcionarios/".to_string()]
        );
        assert_eq!(config.storage_key, "admin-tab-state");
        assert_eq!(config.min_panel_height, 480.0);
    }

    #[test]
    fn overrides_individual_fields() {
        let config = ShellConfig::from_json(
            r#"{
                "tabPathPrefixes": ["/pages/admin/"],
                "persistTabs": false,
                "modalSelector": "dialog[open]",
                "minPanelHeight": 320,
                "newTabLabel": "  Aba  ",
                "logFilter": "debug"
            }"#,
        )
        .expect("parses");
        assert_eq!(config.tab_path_prefixes, vec!["/pages/admin/".to_string()]);
        assert!(!config.persist_tabs);
        assert_eq!(config.modal_selector, "dialog[open]");
        assert_eq!(config.min_panel_height, 320.0);
        assert_eq!(config.new_tab_label, "Aba");
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.modal_shell_selector, ".modal-shell");
    }

    #[test]
    fn blank_strings_fall_back_to_defaults() {
        let config = ShellConfig::from_json(r#"{"storageKey": "   "}"#).expect("parses");
        assert_eq!(config.storage_key, "admin-tab-state");
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            ShellConfig::from_json("[1, 2]"),
            Err(ConfigError::Json(_))
        ));
        assert_eq!(
            ShellConfig::from_json(r#"{"tabPathPrefixes": []}"#),
            Err(ConfigError::NoTabPrefixes)
        );
        assert_eq!(
            ShellConfig::from_json(r#"{"tabPathPrefixes": ["pages/admin"]}"#),
            Err(ConfigError::InvalidTabPrefix("pages/admin".to_string()))
        );
        assert_eq!(
            ShellConfig::from_json(r#"{"frameClearance": -1}"#),
            Err(ConfigError::InvalidNumber {
                field: "frameClearance",
                value: -1.0
            })
        );
    }

    #[test]
    fn test_config_disables_persistence() {
        let config = ShellConfig::for_tests();
        assert!(!config.persist_tabs);
        config.validate().expect("valid");
    }
}
