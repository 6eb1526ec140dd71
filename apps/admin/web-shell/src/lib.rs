#[cfg(any(target_arch = "wasm32", test))]
mod boot;
#[cfg(any(target_arch = "wasm32", test))]
mod diagnostics;
#[cfg(target_arch = "wasm32")]
mod wasm_constants;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::{Rc, Weak};

    use eobicho_admin_core::{
        BridgeReporter, CONFIG_GLOBAL, DocumentExtent, ElementBox, FrameDirective, HorizontalSpan,
        HrefResolver, LinkClick, ModalCandidate, OpenOutcome, PersistedTabState, ShellConfig,
        TabId, TabRecord, TabRegistry, TabStateStore, available_panel_height,
        content_frame_height, decode_envelope, encode_envelope, frame_directive, measure,
        parse_css_px, resolve_link_label, scroll_adjustment,
    };
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, HtmlAnchorElement, HtmlElement, HtmlIFrameElement, MessageEvent};

    use crate::boot::{BootSlot, EarlyOpen};
    use crate::diagnostics::ShellDiagnostics;
    use crate::wasm_constants::*;

    mod bridge;
    mod dom;
    mod lifecycle;
    mod logging;
    mod routing;
    mod shell;
    mod storage;

    use lifecycle::*;

    thread_local! {
        static DIAGNOSTICS: RefCell<ShellDiagnostics> = RefCell::new(ShellDiagnostics::default());
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();

        let (config, config_error) = match load_config() {
            Ok(config) => (config, None),
            Err(error) => (ShellConfig::default(), Some(error)),
        };
        logging::install(&config.log_filter);
        if let Some(error) = config_error {
            tracing::warn!(%error, "ignoring invalid admin tab configuration");
        }

        set_phase("starting", "config loaded");
        if is_embedded() {
            DIAGNOSTICS.with(|state| state.borrow_mut().embedded = true);
            if let Err(error) = bridge::install(&config) {
                tracing::warn!(%error, "frame bridge unavailable");
                set_error(&error);
            }
        }
        boot_shell(config);
    }

    #[wasm_bindgen]
    pub fn shell_diagnostics_json() -> String {
        DIAGNOSTICS.with(|state| state.borrow().to_json())
    }

    pub(super) fn set_phase(phase: &str, detail: &str) {
        DIAGNOSTICS.with(|state| state.borrow_mut().set_phase(phase, detail));
    }

    pub(super) fn set_error(message: &str) {
        DIAGNOSTICS.with(|state| state.borrow_mut().set_error(message));
    }

    pub(super) fn with_diagnostics(update: impl FnOnce(&mut ShellDiagnostics)) {
        DIAGNOSTICS.with(|state| update(&mut state.borrow_mut()));
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::shell_diagnostics_json;

#[cfg(not(target_arch = "wasm32"))]
pub fn shell_diagnostics_json() -> String {
    "{\"phase\":\"native\",\"detail\":\"admin tab shell diagnostics only available on wasm\"}"
        .to_string()
}
