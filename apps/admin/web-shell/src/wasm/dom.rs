use super::*;
use super::bridge::document_extent;
use super::shell::{ShellController, with_shell};

type ObserverCallback = Closure<dyn FnMut(js_sys::Array)>;

/// Rendered header/panel pair for one tab. Dropping it releases its listeners.
pub(super) struct TabView {
    pub(super) item: HtmlElement,
    pub(super) trigger: HtmlElement,
    pub(super) panel: HtmlElement,
    pub(super) frame: Option<HtmlIFrameElement>,
    auto_height: Option<Rc<RefCell<FrameAutoHeight>>>,
    _listeners: Vec<Closure<dyn FnMut(web_sys::Event)>>,
}

impl TabView {
    pub(super) fn remove(&self) {
        if let Some(auto_height) = self.auto_height.as_ref() {
            if let Ok(mut auto_height) = auto_height.try_borrow_mut() {
                auto_height.detach();
            }
        }
        self.item.remove();
        self.panel.remove();
    }

    pub(super) fn hosts_window(&self, source: &JsValue) -> bool {
        self.frame
            .as_ref()
            .and_then(HtmlIFrameElement::content_window)
            .is_some_and(|window| js_sys::Object::is(source, window.as_ref()))
    }
}

fn create_html(document: &web_sys::Document, tag: &str) -> Result<HtmlElement, String> {
    document
        .create_element(tag)
        .map_err(|_| format!("failed to create <{tag}>"))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| format!("<{tag}> is not an HtmlElement"))
}

fn append(parent: &HtmlElement, child: &HtmlElement) -> Result<(), String> {
    parent
        .append_child(child)
        .map(|_| ())
        .map_err(|_| "failed to append tab element".to_string())
}

fn set_attribute(element: &HtmlElement, name: &str, value: &str) -> Result<(), String> {
    element
        .set_attribute(name, value)
        .map_err(|_| format!("failed to set {name}"))
}

fn click_listener(
    shell: Weak<RefCell<ShellController>>,
    id: TabId,
    close: bool,
) -> Closure<dyn FnMut(web_sys::Event)> {
    Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event: web_sys::Event| {
        if close {
            event.stop_propagation();
            with_shell(&shell, |shell| shell.close(&id));
        } else {
            with_shell(&shell, |shell| shell.set_active(&id));
        }
    }))
}

fn listen(
    element: &HtmlElement,
    event: &str,
    callback: &Closure<dyn FnMut(web_sys::Event)>,
) -> Result<(), String> {
    element
        .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
        .map_err(|_| format!("failed to attach {event} listener"))
}

pub(super) fn build_tab_view(
    document: &web_sys::Document,
    record: &TabRecord,
    iframe_src: &str,
    shell: Weak<RefCell<ShellController>>,
) -> Result<TabView, String> {
    let id = record.id.as_str();
    let trigger_id = format!("{TRIGGER_ID_PREFIX}{id}");
    let panel_id = format!("{PANEL_ID_PREFIX}{id}");

    let item = create_html(document, "div")?;
    item.set_class_name(ITEM_CLASS);
    set_attribute(&item, "data-tab-item", "true")?;
    set_attribute(&item, "data-tab-id", id)?;

    let trigger = create_html(document, "button")?;
    set_attribute(&trigger, "type", "button")?;
    for class in BASE_TRIGGER_CLASSES {
        if trigger.class_list().add_1(class).is_err() {
            tracing::debug!(class, "failed to add trigger class");
        }
    }
    trigger.set_id(&trigger_id);
    set_attribute(&trigger, "data-tab-trigger", "true")?;
    set_attribute(&trigger, "data-tab-id", id)?;
    set_attribute(&trigger, "role", "tab")?;
    set_attribute(&trigger, "aria-controls", &panel_id)?;

    let label = create_html(document, "span")?;
    label.set_class_name(LABEL_CLASS);
    label.set_text_content(Some(&record.label));
    append(&trigger, &label)?;

    let close_button = create_html(document, "button")?;
    set_attribute(&close_button, "type", "button")?;
    set_attribute(
        &close_button,
        "aria-label",
        &format!("Fechar aba {}", record.label),
    )?;
    close_button.set_class_name(CLOSE_BUTTON_CLASS);
    let icon = create_html(document, "i")?;
    icon.set_class_name(CLOSE_ICON_CLASS);
    append(&close_button, &icon)?;

    append(&item, &trigger)?;
    append(&item, &close_button)?;

    let panel = create_html(document, "section")?;
    panel.set_id(&panel_id);
    panel.set_class_name(PANEL_CLASS);
    set_attribute(&panel, "data-tab-panel", "true")?;
    set_attribute(&panel, "data-tab-id", id)?;
    set_attribute(&panel, "data-embedded-panel", "true")?;
    set_attribute(&panel, "role", "tabpanel")?;
    set_attribute(&panel, "aria-labelledby", &trigger_id)?;

    let wrapper = create_html(document, "div")?;
    wrapper.set_class_name(FRAME_WRAPPER_CLASS);
    let _ = wrapper.style().set_property("display", "block");
    let _ = wrapper.style().set_property("min-height", FRAME_WRAPPER_MIN_HEIGHT);

    let loader = build_loader(document, &record.label)?;

    let iframe = document
        .create_element("iframe")
        .map_err(|_| "failed to create <iframe>".to_string())?
        .dyn_into::<HtmlIFrameElement>()
        .map_err(|_| "<iframe> is not an HtmlIFrameElement".to_string())?;
    iframe.set_class_name(FRAME_CLASS);
    let _ = iframe.set_attribute("loading", "lazy");
    let _ = iframe.set_attribute("title", &record.label);
    let _ = iframe.set_attribute(AUTO_HEIGHT_ATTRIBUTE, "true");
    let _ = iframe.style().set_property("width", "100%");
    let _ = iframe.style().set_property("height", "0px");
    iframe.set_src(iframe_src);

    let mut listeners = Vec::with_capacity(4);

    let loaded = {
        let loader = loader.clone();
        let wrapper = wrapper.clone();
        Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event: web_sys::Event| {
            let _ = loader.class_list().add_1(HIDDEN_CLASS);
            let _ = wrapper.style().set_property("min-height", "0px");
        }))
    };
    let once = web_sys::AddEventListenerOptions::new();
    once.set_once(true);
    iframe
        .add_event_listener_with_callback_and_add_event_listener_options(
            "load",
            loaded.as_ref().unchecked_ref(),
            &once,
        )
        .map_err(|_| "failed to attach iframe load listener".to_string())?;
    listeners.push(loaded);

    let auto_height = Rc::new(RefCell::new(FrameAutoHeight::new(iframe.clone())));
    let measure_on_load = {
        let auto_height = Rc::clone(&auto_height);
        Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event: web_sys::Event| {
            if let Ok(mut auto_height) = auto_height.try_borrow_mut() {
                auto_height.attach();
            }
        }))
    };
    iframe
        .add_event_listener_with_callback("load", measure_on_load.as_ref().unchecked_ref())
        .map_err(|_| "failed to attach iframe auto-height listener".to_string())?;
    listeners.push(measure_on_load);

    wrapper
        .append_child(&iframe)
        .map_err(|_| "failed to append iframe".to_string())?;
    append(&wrapper, &loader)?;
    append(&panel, &wrapper)?;

    let select = click_listener(shell.clone(), record.id.clone(), false);
    listen(&trigger, "click", &select)?;
    listeners.push(select);

    let close = click_listener(shell, record.id.clone(), true);
    listen(&close_button, "click", &close)?;
    listeners.push(close);

    Ok(TabView {
        item,
        trigger,
        panel,
        frame: Some(iframe),
        auto_height: Some(auto_height),
        _listeners: listeners,
    })
}

fn build_loader(document: &web_sys::Document, label: &str) -> Result<HtmlElement, String> {
    let loader = create_html(document, "div")?;
    loader.set_class_name(LOADER_CLASS);

    let row = create_html(document, "div")?;
    row.set_class_name(LOADER_TEXT_CLASS);
    let spinner = create_html(document, "span")?;
    spinner.set_class_name(SPINNER_CLASS);
    append(&row, &spinner)?;
    row.append_with_str_1(&format!("Carregando \"{label}\"..."))
        .map_err(|_| "failed to write loader text".to_string())?;

    append(&loader, &row)?;
    Ok(loader)
}

/// Binds the dashboard pair already present in the shell markup. The registry record for
/// it is created from configuration; the markup is only a render target.
pub(super) fn adopt_default_tab(
    tab_list: &HtmlElement,
    panel_container: &HtmlElement,
    shell: Weak<RefCell<ShellController>>,
) -> Option<TabView> {
    let item = tab_list
        .query_selector(DEFAULT_ITEM_SELECTOR)
        .ok()??
        .dyn_into::<HtmlElement>()
        .ok()?;
    let trigger = item
        .query_selector(DEFAULT_TRIGGER_SELECTOR)
        .ok()??
        .dyn_into::<HtmlElement>()
        .ok()?;
    let panel = panel_container
        .query_selector(DEFAULT_PANEL_SELECTOR)
        .ok()??
        .dyn_into::<HtmlElement>()
        .ok()?;

    if trigger.id().is_empty() {
        trigger.set_id(&format!("{TRIGGER_ID_PREFIX}{}", TabId::dashboard()));
    }

    let select = click_listener(shell, TabId::dashboard(), false);
    if listen(&trigger, "click", &select).is_err() {
        return None;
    }

    Some(TabView {
        item,
        trigger,
        panel,
        frame: None,
        auto_height: None,
        _listeners: vec![select],
    })
}

pub(super) fn apply_trigger_state(trigger: &HtmlElement, active: bool) {
    let classes = trigger.class_list();
    for class in ACTIVE_TRIGGER_CLASSES {
        let _ = classes.toggle_with_force(class, active);
    }
    for class in INACTIVE_TRIGGER_CLASSES {
        let _ = classes.toggle_with_force(class, !active);
    }
    let _ = trigger.set_attribute("aria-selected", if active { "true" } else { "false" });
}

pub(super) fn set_panel_visible(panel: &HtmlElement, visible: bool) {
    let _ = panel.class_list().toggle_with_force(HIDDEN_CLASS, !visible);
}

pub(super) fn horizontal_span(element: &Element) -> HorizontalSpan {
    let rect = element.get_bounding_client_rect();
    HorizontalSpan::new(rect.left(), rect.right())
}

/// Sizes a same-origin frame from its own document while it stays loaded. Embedded pages
/// that never post bridge messages still get a usable height this way.
pub(super) struct FrameAutoHeight {
    iframe: HtmlIFrameElement,
    resize_observer: Option<(web_sys::ResizeObserver, ObserverCallback)>,
    mutation_observer: Option<(web_sys::MutationObserver, ObserverCallback)>,
    poll: Option<(i32, Closure<dyn FnMut()>)>,
}

impl FrameAutoHeight {
    fn new(iframe: HtmlIFrameElement) -> Self {
        Self {
            iframe,
            resize_observer: None,
            mutation_observer: None,
            poll: None,
        }
    }

    /// Re-run on every `load`; a navigation inside the frame replaces its document.
    fn attach(&mut self) {
        self.detach();
        let Some(document) = self.iframe.content_document() else {
            let _ = self.iframe.set_attribute(AUTO_HEIGHT_ATTRIBUTE, "false");
            tracing::debug!("frame document is not readable; relying on bridge messages");
            return;
        };
        let _ = self.iframe.set_attribute(AUTO_HEIGHT_ATTRIBUTE, "true");
        resize_to_content(&self.iframe);
        let Some(html) = document.document_element() else {
            return;
        };

        let iframe = self.iframe.clone();
        let on_resize = ObserverCallback::wrap(Box::new(move |_entries: js_sys::Array| {
            resize_to_content(&iframe);
        }));
        match web_sys::ResizeObserver::new(on_resize.as_ref().unchecked_ref()) {
            Ok(observer) => {
                observer.observe(&html);
                if let Some(body) = document.body() {
                    observer.observe(&body);
                }
                self.resize_observer = Some((observer, on_resize));
            }
            Err(_) => self.start_polling(),
        }

        let iframe = self.iframe.clone();
        let on_mutation = ObserverCallback::wrap(Box::new(move |_records: js_sys::Array| {
            resize_to_content(&iframe);
        }));
        if let Ok(observer) = web_sys::MutationObserver::new(on_mutation.as_ref().unchecked_ref()) {
            let options = web_sys::MutationObserverInit::new();
            options.set_attributes(true);
            options.set_child_list(true);
            options.set_subtree(true);
            if observer.observe_with_options(&html, &options).is_ok() {
                self.mutation_observer = Some((observer, on_mutation));
            } else {
                tracing::debug!("failed to observe frame document mutations");
            }
        }
    }

    fn start_polling(&mut self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let iframe = self.iframe.clone();
        let tick = Closure::<dyn FnMut()>::wrap(Box::new(move || resize_to_content(&iframe)));
        match window.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            AUTO_HEIGHT_POLL_MS,
        ) {
            Ok(id) => self.poll = Some((id, tick)),
            Err(_) => tracing::debug!("failed to start frame height polling"),
        }
    }

    pub(super) fn detach(&mut self) {
        if let Some((observer, _)) = self.resize_observer.take() {
            observer.disconnect();
        }
        if let Some((observer, _)) = self.mutation_observer.take() {
            observer.disconnect();
        }
        if let Some((id, _)) = self.poll.take() {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(id);
            }
        }
    }
}

fn resize_to_content(iframe: &HtmlIFrameElement) {
    let Some(document) = iframe.content_document() else {
        return;
    };
    if let Some(px) = content_frame_height(&document_extent(&document)) {
        let _ = iframe.style().set_property("height", &format!("{px}px"));
    }
}

pub(super) fn uses_auto_height(frame: &HtmlIFrameElement) -> bool {
    frame.get_attribute(AUTO_HEIGHT_ATTRIBUTE).as_deref() == Some("true")
}
