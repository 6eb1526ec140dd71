pub(crate) const ROOT_SELECTOR: &str = "[data-admin-tabs-root]";
pub(crate) const TAB_LIST_SELECTOR: &str = "[data-admin-tab-list]";
pub(crate) const PANEL_CONTAINER_SELECTOR: &str = "[data-admin-tab-panels]";
pub(crate) const DEFAULT_ITEM_SELECTOR: &str = "[data-tab-item][data-tab-id=\"dashboard\"]";
pub(crate) const DEFAULT_TRIGGER_SELECTOR: &str = "[data-tab-trigger]";
pub(crate) const DEFAULT_PANEL_SELECTOR: &str = "[data-tab-panel][data-tab-id=\"dashboard\"]";

pub(crate) const TRIGGER_ID_PREFIX: &str = "admin-tab-trigger-";
pub(crate) const PANEL_ID_PREFIX: &str = "admin-tab-panel-";

pub(crate) const ADMIN_TABS_GLOBAL: &str = "AdminTabs";

pub(crate) const HIDDEN_CLASS: &str = "hidden";
pub(crate) const MODAL_OPEN_CLASS: &str = "modal-open";
pub(crate) const PANEL_CLASS: &str = "admin-tab-panel hidden";
pub(crate) const ITEM_CLASS: &str = "flex items-center";
pub(crate) const LABEL_CLASS: &str = "max-w-[12rem] truncate";
pub(crate) const FRAME_WRAPPER_CLASS: &str = "relative w-full admin-tab-iframe-wrapper";
pub(crate) const FRAME_CLASS: &str = "admin-tab-iframe";
pub(crate) const LOADER_CLASS: &str = "absolute inset-0 flex items-center justify-center bg-white/80";
pub(crate) const LOADER_TEXT_CLASS: &str = "flex items-center gap-2 text-sm text-gray-500";
pub(crate) const SPINNER_CLASS: &str =
    "h-4 w-4 animate-spin rounded-full border-2 border-primary border-t-transparent";
pub(crate) const CLOSE_BUTTON_CLASS: &str = "ml-1 inline-flex h-5 w-5 items-center justify-center rounded-full text-gray-400 transition hover:bg-gray-100 hover:text-gray-600 focus:outline-none focus:ring-2 focus:ring-primary/20";
pub(crate) const CLOSE_ICON_CLASS: &str = "fas fa-times text-[10px]";
pub(crate) const FRAME_WRAPPER_MIN_HEIGHT: &str = "480px";
/// "true" while a frame is sized from its own readable document.
pub(crate) const AUTO_HEIGHT_ATTRIBUTE: &str = "data-auto-height";
/// Polling interval when `ResizeObserver` is missing.
pub(crate) const AUTO_HEIGHT_POLL_MS: i32 = 500;

pub(crate) const BASE_TRIGGER_CLASSES: [&str; 19] = [
    "admin-tab-trigger",
    "inline-flex",
    "items-center",
    "gap-2",
    "rounded-lg",
    "border",
    "border-transparent",
    "bg-white",
    "px-3",
    "py-2",
    "text-xs",
    "font-semibold",
    "text-gray-600",
    "shadow-sm",
    "transition",
    "hover:bg-primary/10",
    "focus:outline-none",
    "focus:ring-2",
    "focus:ring-primary/20",
];
pub(crate) const ACTIVE_TRIGGER_CLASSES: [&str; 4] =
    ["border-primary/30", "bg-primary/10", "text-primary", "shadow"];
pub(crate) const INACTIVE_TRIGGER_CLASSES: [&str; 4] =
    ["border-transparent", "bg-white", "text-gray-600", "shadow-sm"];

/// Attributes whose changes can open or close a modal inside an embedded page.
pub(crate) const BRIDGE_ATTRIBUTE_FILTER: [&str; 4] = ["class", "open", "data-modal-open", "style"];
