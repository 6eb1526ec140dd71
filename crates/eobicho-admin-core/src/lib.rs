//! DOM-free core of the E o Bicho admin tab shell.
//!
//! The browser bindings in `apps/admin/web-shell` own the DOM; everything that decides
//! what happens (which tab opens, which message is posted, how tall a frame gets) lives
//! here so it can be tested natively.

pub mod bridge;
pub mod config;
pub mod href;
pub mod layout;
pub mod measure;
pub mod persist;
pub mod registry;

pub use bridge::{
    BridgeDecodeError, BridgeMessage, BridgeReporter, ContentMetrics, MESSAGE_SOURCE,
    ModalEdgeTracker, ModalTransition, decode_envelope, encode_envelope,
};
pub use config::{CONFIG_GLOBAL, ConfigError, ShellConfig};
pub use href::{HrefError, HrefResolver, LinkClick, ResolvedHref, resolve_link_label};
pub use layout::{
    FrameDirective, HorizontalSpan, available_panel_height, content_frame_height, frame_directive,
    scroll_adjustment,
};
pub use measure::{DocumentExtent, ElementBox, ModalCandidate, measure, parse_css_px};
pub use persist::{PersistedTab, PersistedTabState, TabStateStore};
pub use registry::{
    CloseOutcome, DASHBOARD_TAB_ID, DefaultTab, OpenOutcome, RegistryInvariantError, TabId,
    TabRecord, TabRegistry,
};
