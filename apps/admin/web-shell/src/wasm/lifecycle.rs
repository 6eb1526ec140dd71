use super::*;
use super::shell::{ShellController, navigate, with_shell};

thread_local! {
    static SHELL: RefCell<BootSlot<Rc<RefCell<ShellController>>>> =
        const { RefCell::new(BootSlot::Pending(Vec::new())) };
    static BOOT_OBSERVER: RefCell<Option<(web_sys::MutationObserver, Closure<dyn FnMut(js_sys::Array)>)>> =
        const { RefCell::new(None) };
}

/// Reads `window.__EO_BICHO_ADMIN_TABS__`, either a JSON string or a plain object.
pub(super) fn load_config() -> Result<ShellConfig, String> {
    let Some(window) = web_sys::window() else {
        return Ok(ShellConfig::default());
    };
    let value = js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL))
        .map_err(|_| format!("failed to read {CONFIG_GLOBAL}"))?;
    if value.is_undefined() || value.is_null() {
        return Ok(ShellConfig::default());
    }
    let raw = match value.as_string() {
        Some(raw) => raw,
        None => js_sys::JSON::stringify(&value)
            .ok()
            .and_then(|raw| raw.as_string())
            .ok_or_else(|| format!("{CONFIG_GLOBAL} is not serializable"))?,
    };
    ShellConfig::from_json(&raw).map_err(|error| error.to_string())
}

pub(super) fn is_embedded() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    match window.top() {
        Ok(Some(top)) => !js_sys::Object::is(top.as_ref(), window.as_ref()),
        Ok(None) => false,
        Err(_) => true,
    }
}

pub(super) fn boot_shell(config: ShellConfig) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    let Some(root) = document
        .query_selector(ROOT_SELECTOR)
        .ok()
        .flatten()
        .and_then(|root| root.dyn_into::<HtmlElement>().ok())
    else {
        set_phase("idle", "no admin tab root on this page");
        return;
    };

    install_global_handle();

    let mut config = Some(config);
    if try_initialize(&root, &mut config) {
        return;
    }

    set_phase("waiting", "admin tab containers not rendered yet");
    let observed_root = root.clone();
    let callback = Closure::<dyn FnMut(js_sys::Array)>::wrap(Box::new(
        move |_records: js_sys::Array| {
            if try_initialize(&observed_root, &mut config) {
                BOOT_OBSERVER.with(|slot| {
                    if let Some((observer, _)) = slot.borrow().as_ref() {
                        observer.disconnect();
                    }
                });
            }
        },
    ));
    let observer = match web_sys::MutationObserver::new(callback.as_ref().unchecked_ref()) {
        Ok(observer) => observer,
        Err(_) => {
            set_error("MutationObserver unavailable; admin tabs not booted");
            return;
        }
    };
    let options = web_sys::MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    if observer
        .observe_with_options(&root, &options)
        .is_err()
    {
        set_error("failed to observe admin tab root");
        return;
    }
    BOOT_OBSERVER.with(|slot| *slot.borrow_mut() = Some((observer, callback)));
}

/// Boots once both containers exist. `config` is consumed by the first successful call.
fn try_initialize(root: &HtmlElement, config: &mut Option<ShellConfig>) -> bool {
    if config.is_none() {
        return true;
    }
    let tab_list = root
        .query_selector(TAB_LIST_SELECTOR)
        .ok()
        .flatten()
        .and_then(|element| element.dyn_into::<HtmlElement>().ok());
    let panel_container = root
        .query_selector(PANEL_CONTAINER_SELECTOR)
        .ok()
        .flatten()
        .and_then(|element| element.dyn_into::<HtmlElement>().ok());
    let (Some(tab_list), Some(panel_container)) = (tab_list, panel_container) else {
        return false;
    };
    let Some(config) = config.take() else {
        return true;
    };

    match ShellController::mount(config, root.clone(), tab_list, panel_container) {
        Ok(shell) => {
            let handle = Rc::downgrade(&shell);
            let queued = SHELL.with(|slot| slot.borrow_mut().mark_ready(shell));
            with_shell(&handle, |shell| {
                for (href, label) in &queued {
                    shell.open(href, label);
                }
                if !queued.is_empty() {
                    shell.queue_panel_height_update();
                }
            });
            with_diagnostics(|diagnostics| diagnostics.shell_booted = true);
            set_phase("ready", "admin tab shell booted");
            tracing::info!(replayed = queued.len(), "admin tab shell booted");
        }
        Err(error) => {
            let dropped = SHELL.with(|slot| slot.borrow_mut().mark_failed());
            tracing::error!(%error, dropped, "admin tab shell failed to boot");
            set_error(&error);
        }
    }
    true
}

fn ready_shell() -> Option<Weak<RefCell<ShellController>>> {
    SHELL.with(|slot| slot.borrow().ready().map(Rc::downgrade))
}

fn install_global_handle() {
    let Some(window) = web_sys::window() else {
        return;
    };
    if js_sys::Reflect::set(
        &window,
        &JsValue::from_str(ADMIN_TABS_GLOBAL),
        &JsValue::from(AdminTabs { _private: () }),
    )
    .is_err()
    {
        tracing::warn!("failed to expose window.{ADMIN_TABS_GLOBAL}");
    }
}

/// Script-facing handle exposed as `window.AdminTabs`.
#[wasm_bindgen]
pub struct AdminTabs {
    _private: (),
}

#[wasm_bindgen]
impl AdminTabs {
    pub fn open(&self, href: String, label: Option<String>) {
        let label = label.unwrap_or_default();
        let Some(handle) = ready_shell() else {
            let early = SHELL.with(|slot| slot.borrow_mut().defer_open(href.clone(), label));
            if early == EarlyOpen::BootFailed {
                tracing::warn!(%href, "admin tabs unavailable; navigating instead");
                navigate(&href);
            }
            return;
        };
        with_shell(&handle, |shell| shell.open(&href, &label));
    }

    pub fn close(&self, id: String) {
        if let Some(handle) = ready_shell() {
            with_shell(&handle, |shell| shell.close(&TabId::from(id.as_str())));
        }
    }

    #[wasm_bindgen(js_name = setActive)]
    pub fn set_active(&self, id: String) {
        if let Some(handle) = ready_shell() {
            with_shell(&handle, |shell| shell.set_active(&TabId::from(id.as_str())));
        }
    }

    #[wasm_bindgen(getter, js_name = activeId)]
    pub fn active_id(&self) -> Option<String> {
        let handle = ready_shell()?;
        let shell = handle.upgrade()?;
        let active = shell.try_borrow().ok()?.active_id();
        active
    }
}
