use crate::bridge::BridgeMessage;
use crate::measure::DocumentExtent;

pub const MIN_PANEL_HEIGHT: f64 = 480.0;
pub const PANEL_BOTTOM_GAP: f64 = 16.0;
pub const FRAME_CLEARANCE: f64 = 16.0;
pub const TAB_SCROLL_MARGIN: f64 = 24.0;

/// Height left for tab panels below the shell header, never less than `min_panel_height`.
pub fn available_panel_height(
    viewport_height: f64,
    header_bottom: f64,
    root_top: f64,
    min_panel_height: f64,
) -> f64 {
    let offset_top = header_bottom - root_top;
    let available = viewport_height - offset_top - PANEL_BOTTOM_GAP;
    if available.is_finite() {
        available.max(min_panel_height)
    } else {
        min_panel_height
    }
}

/// What the shell does to a tab iframe after a bridge message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameDirective {
    SetHeight {
        px: f64,
        /// `Some(true)` marks the panel as hosting an open modal.
        modal_open: Option<bool>,
    },
    /// Drop explicit iframe sizing, clear the modal marker and re-run panel sizing.
    Reset,
}

pub fn frame_directive(message: &BridgeMessage, available: f64, clearance: f64) -> FrameDirective {
    match message {
        BridgeMessage::ContentResize(metrics) => FrameDirective::SetHeight {
            px: frame_height(metrics.height, available, clearance),
            modal_open: None,
        },
        BridgeMessage::ModalOpen(metrics) => FrameDirective::SetHeight {
            px: frame_height(metrics.height, available, clearance),
            modal_open: Some(true),
        },
        BridgeMessage::ModalClose(_) => FrameDirective::Reset,
    }
}

pub fn frame_height(reported: f64, available: f64, clearance: f64) -> f64 {
    let raw = if reported.is_finite() {
        reported.ceil()
    } else {
        0.0
    };
    (raw + clearance).max(available)
}

/// Height a same-origin frame needs for its own document, or `None` while it is empty.
pub fn content_frame_height(extent: &DocumentExtent) -> Option<f64> {
    let height = extent.height();
    (height.is_finite() && height > 0.0).then(|| height.ceil())
}

/// Horizontal extent of an element, as from `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HorizontalSpan {
    pub left: f64,
    pub right: f64,
}

impl HorizontalSpan {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }
}

/// New `scrollLeft` for the tab strip so `item` is fully visible, or `None` if it already is.
pub fn scroll_adjustment(
    container: HorizontalSpan,
    item: HorizontalSpan,
    scroll_left: f64,
    margin: f64,
) -> Option<f64> {
    if item.right > container.right {
        let delta = item.right - container.right;
        Some(scroll_left + delta + margin)
    } else if item.left < container.left {
        let delta = container.left - item.left;
        Some((scroll_left - delta - margin).max(0.0))
    } else {
        None
    }
}
