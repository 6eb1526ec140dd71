use super::*;
use super::dom::{
    TabView, adopt_default_tab, apply_trigger_state, build_tab_view, horizontal_span,
    set_panel_visible, uses_auto_height,
};
use super::storage::{LocalStorageTabStore, now_unix_ms};

type EventCallback = Closure<dyn FnMut(web_sys::Event)>;

/// Runs `action` against the live shell. Events that arrive while the shell is already
/// borrowed are dropped rather than panicking.
pub(super) fn with_shell(
    handle: &Weak<RefCell<ShellController>>,
    action: impl FnOnce(&mut ShellController),
) {
    let Some(shell) = handle.upgrade() else {
        return;
    };
    let Ok(mut shell) = shell.try_borrow_mut() else {
        tracing::warn!("admin tab shell busy; dropping re-entrant event");
        return;
    };
    action(&mut shell);
}

pub(super) fn navigate(href: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if window.location().set_href(href).is_err() {
        tracing::warn!(href, "failed to navigate");
    }
}

pub(super) struct ShellController {
    config: ShellConfig,
    registry: TabRegistry,
    root: HtmlElement,
    tab_list: HtmlElement,
    panel_container: HtmlElement,
    views: HashMap<TabId, TabView>,
    store: Option<LocalStorageTabStore>,
    persist_ready: bool,
    restoring: bool,
    handle: Weak<RefCell<ShellController>>,
    pending_frame: Option<i32>,
    frame_callback: Option<Closure<dyn FnMut(f64)>>,
    _listeners: Vec<EventCallback>,
    _header_observer: Option<(web_sys::ResizeObserver, Closure<dyn FnMut(js_sys::Array)>)>,
}

impl ShellController {
    /// Wires the shell into already-present containers, restores the saved session and
    /// starts listening. The returned `Rc` is the only strong reference.
    pub(super) fn mount(
        config: ShellConfig,
        root: HtmlElement,
        tab_list: HtmlElement,
        panel_container: HtmlElement,
    ) -> Result<Rc<RefCell<Self>>, String> {
        let base = web_sys::window()
            .ok_or_else(|| "window is unavailable".to_string())?
            .location()
            .href()
            .map_err(|_| "failed to read location".to_string())?;
        let registry = TabRegistry::for_shell(&base, &config)
            .map_err(|error| format!("invalid shell location {base}: {error}"))?;
        let store = config
            .persist_tabs
            .then(|| LocalStorageTabStore::new(&config.storage_key));

        let shell = Rc::new_cyclic(|handle| {
            RefCell::new(Self {
                config,
                registry,
                root,
                tab_list,
                panel_container,
                views: HashMap::new(),
                store,
                persist_ready: false,
                restoring: false,
                handle: handle.clone(),
                pending_frame: None,
                frame_callback: None,
                _listeners: Vec::new(),
                _header_observer: None,
            })
        });

        {
            let mut controller = shell.borrow_mut();
            controller.adopt_dashboard();
            controller.install_listeners();
            controller.render_active();
            controller.restore();
            controller.persist_ready = true;
            controller.persist();
            controller.record_diagnostics();
        }
        Ok(shell)
    }

    fn adopt_dashboard(&mut self) {
        match adopt_default_tab(&self.tab_list, &self.panel_container, self.handle.clone()) {
            Some(view) => {
                self.views.insert(TabId::dashboard(), view);
            }
            None => tracing::debug!("shell markup has no dashboard tab; rendering dynamic tabs only"),
        }
    }

    pub(super) fn resolver(&self) -> &HrefResolver {
        self.registry.resolver()
    }

    pub(super) fn active_id(&self) -> Option<String> {
        self.registry.active_id().map(ToString::to_string)
    }

    pub(super) fn open(&mut self, href: &str, label: &str) {
        match self.registry.open(href, label) {
            OpenOutcome::Navigate { href } => navigate(&href),
            OpenOutcome::Activated { .. } => {
                self.render_active();
                self.after_mutation();
            }
            OpenOutcome::Created { record, iframe_src } => {
                if let Err(error) = self.mount_tab(&record, &iframe_src) {
                    tracing::warn!(tab_id = %record.id, %error, "failed to render admin tab");
                    set_error(&error);
                    self.registry.close(&record.id);
                    navigate(&record.href);
                    return;
                }
                self.render_active();
                self.after_mutation();
            }
        }
    }

    pub(super) fn close(&mut self, id: &TabId) {
        let Some(outcome) = self.registry.close(id) else {
            return;
        };
        if let Some(view) = self.views.remove(&outcome.removed.id) {
            view.remove();
        }
        if outcome.activated.is_some() {
            self.render_active();
        }
        self.after_mutation();
    }

    pub(super) fn set_active(&mut self, id: &TabId) {
        if self.registry.set_active(id) {
            self.render_active();
            self.after_mutation();
        }
    }

    fn mount_tab(&mut self, record: &TabRecord, iframe_src: &str) -> Result<(), String> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| "document is unavailable".to_string())?;
        let view = build_tab_view(&document, record, iframe_src, self.handle.clone())?;
        self.tab_list
            .append_child(&view.item)
            .map_err(|_| "failed to append tab header".to_string())?;
        if self.panel_container.append_child(&view.panel).is_err() {
            view.remove();
            return Err("failed to append tab panel".to_string());
        }
        self.views.insert(record.id.clone(), view);
        Ok(())
    }

    fn render_active(&mut self) {
        let active = self.registry.active_id().cloned();
        for (id, view) in &self.views {
            let is_active = active.as_ref() == Some(id);
            apply_trigger_state(&view.trigger, is_active);
            set_panel_visible(&view.panel, is_active);
        }

        if let Some(view) = active.as_ref().and_then(|id| self.views.get(id)) {
            if !self.restoring {
                let options = web_sys::FocusOptions::new();
                options.set_prevent_scroll(true);
                let _ = view.trigger.focus_with_options(&options);
            }
            self.ensure_tab_visible(&view.item);
        }
        self.queue_panel_height_update();
    }

    fn ensure_tab_visible(&self, item: &Element) {
        let Some(left) = scroll_adjustment(
            horizontal_span(&self.tab_list),
            horizontal_span(item),
            f64::from(self.tab_list.scroll_left()),
            self.config.tab_scroll_margin,
        ) else {
            return;
        };
        let options = web_sys::ScrollToOptions::new();
        options.set_left(left);
        options.set_behavior(web_sys::ScrollBehavior::Smooth);
        self.tab_list.scroll_to_with_scroll_to_options(&options);
    }

    fn after_mutation(&mut self) {
        self.record_diagnostics();
        self.persist();
    }

    fn record_diagnostics(&self) {
        let open_tabs = self.registry.len();
        let active = self.registry.active_id().map(TabId::as_str);
        with_diagnostics(|diagnostics| diagnostics.record_tabs(open_tabs, active));
    }

    pub(super) fn persist(&self) {
        if !self.persist_ready || self.restoring {
            return;
        }
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let state = self.registry.snapshot(now_unix_ms());
        if let Err(error) = store.persist_tab_state(&state) {
            tracing::warn!(%error, "failed to persist admin tabs");
        }
    }

    fn restore(&mut self) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let state = match store.load_tab_state() {
            Ok(Some(state)) => state,
            Ok(None) => return,
            Err(error) => {
                tracing::warn!(%error, "failed to load saved admin tabs");
                return;
            }
        };

        self.restoring = true;
        for tab in &state.tabs {
            // Saved entries that are no longer tab-eligible are dropped, never navigated to.
            if let OpenOutcome::Created { record, iframe_src } =
                self.registry.open(&tab.href, &tab.label)
            {
                if let Err(error) = self.mount_tab(&record, &iframe_src) {
                    tracing::warn!(tab_id = %record.id, %error, "failed to restore admin tab");
                    self.registry.close(&record.id);
                }
            }
        }

        let active = state
            .active_href
            .as_deref()
            .and_then(|href| self.resolver().normalize(href).ok())
            .and_then(|href| self.registry.id_for_href(&href).cloned())
            .unwrap_or_else(TabId::dashboard);
        self.registry.set_active(&active);
        self.render_active();
        self.restoring = false;

        tracing::info!(
            restored = state.tabs.len(),
            active = %active,
            "restored admin tab session"
        );
    }

    fn available_height(&self) -> f64 {
        let viewport = web_sys::window()
            .and_then(|window| window.inner_height().ok())
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0);
        let header_bottom = self
            .tab_list
            .closest("header")
            .ok()
            .flatten()
            .map_or(0.0, |header| header.get_bounding_client_rect().bottom());
        let root_top = self.root.get_bounding_client_rect().top();
        available_panel_height(
            viewport,
            header_bottom,
            root_top,
            self.config.min_panel_height,
        )
    }

    fn apply_panel_heights(&self) {
        let available = self.available_height();
        if !available.is_finite() || available <= 0.0 {
            return;
        }
        let value = format!("{available}px");
        let _ = self
            .panel_container
            .style()
            .set_property("min-height", &value);
        for view in self.views.values() {
            let _ = view.panel.style().set_property("min-height", &value);
            if let Some(frame) = view.frame.as_ref() {
                let frame_min = if uses_auto_height(frame) { "0px" } else { value.as_str() };
                let _ = frame.style().set_property("min-height", frame_min);
            }
        }
    }

    pub(super) fn queue_panel_height_update(&mut self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(pending) = self.pending_frame.take() {
            let _ = window.cancel_animation_frame(pending);
        }
        let Some(callback) = self.frame_callback.as_ref() else {
            self.apply_panel_heights();
            return;
        };
        match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            Ok(id) => self.pending_frame = Some(id),
            Err(_) => self.apply_panel_heights(),
        }
    }

    fn handle_frame_message(&mut self, event: &MessageEvent) {
        let Some(source) = event.source() else {
            return;
        };
        let source = JsValue::from(source);
        let Some(view) = self.views.values().find(|view| view.hosts_window(&source)) else {
            return;
        };

        let message = js_sys::JSON::stringify(&event.data())
            .ok()
            .and_then(|raw| raw.as_string())
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
            .ok_or_else(|| "message data is not JSON".to_string())
            .and_then(|value| decode_envelope(&value).map_err(|error| error.to_string()));
        let message = match message {
            Ok(message) => message,
            Err(error) => {
                tracing::debug!(%error, "ignoring frame message");
                with_diagnostics(|diagnostics| diagnostics.record_frame_message(false));
                return;
            }
        };
        with_diagnostics(|diagnostics| diagnostics.record_frame_message(true));

        let Some(frame) = view.frame.clone() else {
            return;
        };
        let panel = view.panel.clone();
        match frame_directive(&message, self.available_height(), self.config.frame_clearance) {
            FrameDirective::SetHeight { px, modal_open } => {
                if modal_open == Some(true) {
                    let _ = panel.class_list().add_1(MODAL_OPEN_CLASS);
                }
                let value = format!("{px}px");
                let _ = frame.style().set_property("min-height", &value);
                let _ = frame.style().set_property("height", &value);
                tracing::trace!(kind = message.type_tag(), px, "sized tab frame");
            }
            FrameDirective::Reset => {
                let _ = panel.class_list().remove_1(MODAL_OPEN_CLASS);
                let _ = frame.style().remove_property("min-height");
                let _ = frame.style().remove_property("height");
                self.apply_panel_heights();
            }
        }
    }

    fn install_listeners(&mut self) {
        let Some(window) = web_sys::window() else {
            return;
        };

        let handle = self.handle.clone();
        self.frame_callback = Some(Closure::<dyn FnMut(f64)>::wrap(Box::new(
            move |_timestamp: f64| {
                with_shell(&handle, |shell| {
                    shell.pending_frame = None;
                    shell.apply_panel_heights();
                });
            },
        )));

        let handle = self.handle.clone();
        let resize = EventCallback::wrap(Box::new(move |_event: web_sys::Event| {
            with_shell(&handle, ShellController::queue_panel_height_update);
        }));
        self.keep_listener(&window, "resize", resize);

        let handle = self.handle.clone();
        let unload = EventCallback::wrap(Box::new(move |_event: web_sys::Event| {
            with_shell(&handle, |shell| shell.persist());
        }));
        self.keep_listener(&window, "beforeunload", unload);

        let handle = self.handle.clone();
        let message = EventCallback::wrap(Box::new(move |event: web_sys::Event| {
            let Some(event) = event.dyn_ref::<MessageEvent>() else {
                return;
            };
            with_shell(&handle, |shell| shell.handle_frame_message(event));
        }));
        self.keep_listener(&window, "message", message);

        if let Some(click) = routing::install_link_interception(self.handle.clone()) {
            self._listeners.push(click);
        }

        self.observe_header();
    }

    fn keep_listener(
        &mut self,
        target: &web_sys::EventTarget,
        event: &'static str,
        callback: EventCallback,
    ) {
        if target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .is_err()
        {
            tracing::warn!(event, "failed to attach shell listener");
            return;
        }
        self._listeners.push(callback);
    }

    fn observe_header(&mut self) {
        let Some(header) = self.tab_list.closest("header").ok().flatten() else {
            return;
        };
        let handle = self.handle.clone();
        let callback = Closure::<dyn FnMut(js_sys::Array)>::wrap(Box::new(
            move |_entries: js_sys::Array| {
                with_shell(&handle, ShellController::queue_panel_height_update);
            },
        ));
        match web_sys::ResizeObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => {
                observer.observe(&header);
                self._header_observer = Some((observer, callback));
            }
            Err(_) => tracing::debug!("ResizeObserver unavailable; header resizes not tracked"),
        }
    }
}
