use super::*;
use super::shell::{ShellController, with_shell};

/// Document-level click listener that opens eligible admin links as tabs.
pub(super) fn install_link_interception(
    handle: Weak<RefCell<ShellController>>,
) -> Option<Closure<dyn FnMut(web_sys::Event)>> {
    let document = web_sys::window()?.document()?;
    let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event| {
        intercept_admin_link_click(&handle, event);
    }));
    document
        .add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())
        .ok()?;
    Some(callback)
}

fn intercept_admin_link_click(handle: &Weak<RefCell<ShellController>>, event: web_sys::Event) {
    let Some(mouse_event) = event.dyn_ref::<web_sys::MouseEvent>() else {
        return;
    };
    let Some(anchor) = anchor_from_event(&event) else {
        return;
    };

    let click = LinkClick {
        button: mouse_event.button(),
        meta_key: mouse_event.meta_key(),
        ctrl_key: mouse_event.ctrl_key(),
        shift_key: mouse_event.shift_key(),
        alt_key: mouse_event.alt_key(),
        default_prevented: event.default_prevented(),
        target: Some(anchor.target()),
        has_download: anchor.has_attribute("download"),
        href: anchor.get_attribute("href"),
    };

    with_shell(handle, |shell| {
        let Some(href) = click.intercept(shell.resolver()) else {
            return;
        };
        event.prevent_default();
        let label = resolve_link_label(
            anchor.get_attribute("data-tab-label").as_deref(),
            &anchor.text_content().unwrap_or_default(),
        );
        tracing::debug!(href = %href, label = %label, "routing admin link into a tab");
        shell.open(&href, &label);
    });
}

fn anchor_from_event(event: &web_sys::Event) -> Option<HtmlAnchorElement> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    target
        .closest("a[href]")
        .ok()??
        .dyn_into::<HtmlAnchorElement>()
        .ok()
}
