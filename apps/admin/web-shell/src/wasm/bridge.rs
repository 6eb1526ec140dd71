use super::*;

type ObserverCallback = Closure<dyn FnMut(js_sys::Array)>;

/// Child side of the frame bridge: observes this document and reports its size and modal
/// state to the parent shell.
struct BridgeRuntime {
    reporter: BridgeReporter,
    modal_selector: String,
    modal_shell_selector: String,
    _resize_observer: Option<(web_sys::ResizeObserver, ObserverCallback)>,
    _mutation_observer: Option<(web_sys::MutationObserver, ObserverCallback)>,
    _listeners: Vec<Closure<dyn FnMut(web_sys::Event)>>,
}

#[derive(Clone, Copy)]
enum Observation {
    Lifecycle,
    Mutation,
}

thread_local! {
    static BRIDGE: RefCell<Option<BridgeRuntime>> = const { RefCell::new(None) };
}

pub(super) fn install(config: &ShellConfig) -> Result<(), String> {
    let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
    let document = window
        .document()
        .ok_or_else(|| "document is unavailable".to_string())?;
    let html = document
        .document_element()
        .ok_or_else(|| "document has no root element".to_string())?;

    let installed = BRIDGE.with(|slot| slot.borrow().is_some());
    if installed {
        return Ok(());
    }

    let mut runtime = BridgeRuntime {
        reporter: BridgeReporter::default(),
        modal_selector: config.modal_selector.clone(),
        modal_shell_selector: config.modal_shell_selector.clone(),
        _resize_observer: None,
        _mutation_observer: None,
        _listeners: Vec::new(),
    };

    let on_resize = ObserverCallback::wrap(Box::new(|_entries: js_sys::Array| {
        report(Observation::Lifecycle);
    }));
    match web_sys::ResizeObserver::new(on_resize.as_ref().unchecked_ref()) {
        Ok(observer) => {
            observer.observe(&html);
            if let Some(body) = document.body() {
                observer.observe(&body);
            }
            runtime._resize_observer = Some((observer, on_resize));
        }
        Err(_) => tracing::debug!("ResizeObserver unavailable; relying on mutations"),
    }

    let on_mutation = ObserverCallback::wrap(Box::new(|_records: js_sys::Array| {
        report(Observation::Mutation);
    }));
    let mutation_observer = web_sys::MutationObserver::new(on_mutation.as_ref().unchecked_ref())
        .map_err(|_| "MutationObserver unavailable".to_string())?;
    let filter = BRIDGE_ATTRIBUTE_FILTER
        .iter()
        .map(|name| JsValue::from_str(name))
        .collect::<js_sys::Array>();
    let options = web_sys::MutationObserverInit::new();
    options.set_subtree(true);
    options.set_child_list(true);
    options.set_attributes(true);
    options.set_attribute_filter(&filter);
    mutation_observer
        .observe_with_options(&html, &options)
        .map_err(|_| "failed to observe document mutations".to_string())?;
    runtime._mutation_observer = Some((mutation_observer, on_mutation));

    let on_load = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(|_event| {
        report(Observation::Lifecycle);
    }));
    if window
        .add_event_listener_with_callback("load", on_load.as_ref().unchecked_ref())
        .is_err()
    {
        tracing::warn!("failed to attach bridge load listener");
    }
    runtime._listeners.push(on_load);

    let on_ready = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(|_event| {
        report(Observation::Lifecycle);
    }));
    if document
        .add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())
        .is_err()
    {
        tracing::warn!("failed to attach bridge DOMContentLoaded listener");
    }
    runtime._listeners.push(on_ready);

    BRIDGE.with(|slot| *slot.borrow_mut() = Some(runtime));
    tracing::debug!("frame bridge installed");
    report(Observation::Lifecycle);
    Ok(())
}

fn report(observation: Observation) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };

    let messages = BRIDGE.with(|slot| {
        let Ok(mut slot) = slot.try_borrow_mut() else {
            return Vec::new();
        };
        let Some(runtime) = slot.as_mut() else {
            return Vec::new();
        };
        let candidates = modal_candidates(
            &window,
            &document,
            &runtime.modal_selector,
            &runtime.modal_shell_selector,
        );
        let scroll_y = window.scroll_y().unwrap_or(0.0);
        let metrics = measure(&document_extent(&document), scroll_y, &candidates);
        match observation {
            Observation::Mutation => runtime
                .reporter
                .on_mutation(!candidates.is_empty(), metrics),
            Observation::Lifecycle => vec![runtime.reporter.on_lifecycle(metrics)],
        }
    });
    if messages.is_empty() {
        return;
    }

    let parent = match window.parent() {
        Ok(Some(parent)) => parent,
        _ => return,
    };
    for message in &messages {
        let Ok(text) = serde_json::to_string(&encode_envelope(message)) else {
            continue;
        };
        let Ok(payload) = js_sys::JSON::parse(&text) else {
            continue;
        };
        if parent.post_message(&payload, "*").is_err() {
            tracing::debug!(kind = message.type_tag(), "parent rejected bridge message");
        }
    }
    let posted = messages.len() as u64;
    with_diagnostics(|diagnostics| diagnostics.bridge_messages_posted += posted);
}

pub(super) fn document_extent(document: &web_sys::Document) -> DocumentExtent {
    let scrolling = document
        .scrolling_element()
        .or_else(|| document.document_element());
    let scrolling_scroll_height = scrolling
        .as_ref()
        .map_or(0.0, |element| f64::from(element.scroll_height()));
    let scrolling_offset_height = scrolling
        .as_ref()
        .and_then(|element| element.dyn_ref::<HtmlElement>())
        .map_or(0.0, |element| f64::from(element.offset_height()));
    let body = document.body();
    DocumentExtent {
        scrolling_scroll_height,
        scrolling_offset_height,
        body_scroll_height: body.as_ref().map(|body| f64::from(body.scroll_height())),
        body_offset_height: body.as_ref().map(|body| f64::from(body.offset_height())),
    }
}

fn modal_candidates(
    window: &web_sys::Window,
    document: &web_sys::Document,
    modal_selector: &str,
    modal_shell_selector: &str,
) -> Vec<ModalCandidate> {
    let Ok(nodes) = document.query_selector_all(modal_selector) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|index| nodes.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .map(|dialog| ModalCandidate {
            dialog: element_box(window, &dialog),
            shell: dialog
                .query_selector(modal_shell_selector)
                .ok()
                .flatten()
                .map(|shell| element_box(window, &shell)),
        })
        .collect()
}

fn element_box(window: &web_sys::Window, element: &Element) -> ElementBox {
    let rect = element.get_bounding_client_rect();
    let mut layout = ElementBox {
        connected: element.is_connected(),
        rect_top: rect.top(),
        rect_width: rect.width(),
        rect_height: rect.height(),
        scroll_height: f64::from(element.scroll_height()),
        ..ElementBox::default()
    };
    if let Ok(Some(style)) = window.get_computed_style(element) {
        let property = |name: &str| style.get_property_value(name).unwrap_or_default();
        layout.display_none = property("display") == "none";
        layout.visibility_hidden = property("visibility") == "hidden";
        layout.margin_top = parse_css_px(&property("margin-top"));
        layout.margin_bottom = parse_css_px(&property("margin-bottom"));
    }
    layout
}
