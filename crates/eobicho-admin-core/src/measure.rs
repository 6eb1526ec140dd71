use crate::bridge::ContentMetrics;

/// Matches every modal convention found across the admin pages.
pub const MODAL_SELECTOR: &str = "[role=\"dialog\"][open], [role=\"dialog\"].show, .modal.show, .modal[open], [data-modal-open=\"true\"]";
/// Scrollable card nested inside an unsized dialog wrapper.
pub const MODAL_SHELL_SELECTOR: &str = ".modal-shell";
/// Extra room below the lowest modal edge so shadows are not clipped.
pub const MODAL_SAFETY_PAD: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DocumentExtent {
    pub scrolling_scroll_height: f64,
    pub scrolling_offset_height: f64,
    pub body_scroll_height: Option<f64>,
    pub body_offset_height: Option<f64>,
}

impl DocumentExtent {
    pub fn height(&self) -> f64 {
        [
            Some(self.scrolling_scroll_height),
            Some(self.scrolling_offset_height),
            self.body_scroll_height,
            self.body_offset_height,
        ]
        .into_iter()
        .flatten()
        .filter(|value| value.is_finite())
        .fold(0.0, f64::max)
    }
}

/// Layout of one element as read from the DOM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBox {
    pub connected: bool,
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub rect_top: f64,
    pub rect_width: f64,
    pub rect_height: f64,
    pub scroll_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
}

impl Default for ElementBox {
    fn default() -> Self {
        Self {
            connected: true,
            display_none: false,
            visibility_hidden: false,
            rect_top: 0.0,
            rect_width: 0.0,
            rect_height: 0.0,
            scroll_height: 0.0,
            margin_top: 0.0,
            margin_bottom: 0.0,
        }
    }
}

impl ElementBox {
    pub fn is_visible(&self) -> bool {
        self.connected
            && !self.display_none
            && !self.visibility_hidden
            && (self.rect_width > 0.0 || self.rect_height > 0.0)
    }

    /// Outer height and document-relative bottom edge.
    fn span(&self, scroll_y: f64) -> (f64, f64) {
        let top = self.rect_top + scroll_y - self.margin_top;
        let height =
            self.rect_height.max(self.scroll_height) + self.margin_top + self.margin_bottom;
        (height, top + height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModalCandidate {
    pub dialog: ElementBox,
    pub shell: Option<ElementBox>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct ModalMaxima {
    matched: bool,
    bottom: f64,
    height: f64,
}

impl ModalMaxima {
    fn fold(&mut self, element: &ElementBox, scroll_y: f64) {
        let (height, bottom) = element.span(scroll_y);
        self.matched = true;
        self.bottom = self.bottom.max(bottom);
        self.height = self.height.max(height);
    }
}

pub fn measure(
    document: &DocumentExtent,
    scroll_y: f64,
    candidates: &[ModalCandidate],
) -> ContentMetrics {
    let doc_height = document.height();
    let scroll_y = if scroll_y.is_finite() { scroll_y } else { 0.0 };

    let mut maxima = ModalMaxima::default();
    for candidate in candidates.iter().filter(|c| c.dialog.is_visible()) {
        maxima.fold(&candidate.dialog, scroll_y);
        if let Some(shell) = candidate.shell.as_ref().filter(|shell| shell.is_visible()) {
            maxima.fold(shell, scroll_y);
        }
    }

    let (modal_extent, modal_height) = if maxima.matched {
        (
            (maxima.bottom + MODAL_SAFETY_PAD).ceil().max(0.0),
            maxima.height.ceil().max(0.0),
        )
    } else {
        (0.0, 0.0)
    };

    ContentMetrics {
        height: doc_height.max(modal_extent),
        doc_height,
        modal_extent,
        modal_height,
    }
}

/// Parses computed CSS lengths such as `"12px"` or `"0.5px"`. Anything else is 0.
pub fn parse_css_px(value: &str) -> f64 {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    number
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(height: f64) -> DocumentExtent {
        DocumentExtent {
            scrolling_scroll_height: height,
            scrolling_offset_height: height - 20.0,
            body_scroll_height: Some(height - 8.0),
            body_offset_height: None,
        }
    }

    fn dialog(top: f64, height: f64) -> ElementBox {
        ElementBox {
            rect_top: top,
            rect_width: 600.0,
            rect_height: height,
            scroll_height: height,
            ..ElementBox::default()
        }
    }

    #[test]
    fn document_height_takes_largest_report() {
        let extent = DocumentExtent {
            scrolling_scroll_height: 900.0,
            scrolling_offset_height: 880.0,
            body_scroll_height: Some(1024.0),
            body_offset_height: Some(f64::NAN),
        };
        assert_eq!(extent.height(), 1024.0);
    }

    #[test]
    fn without_modals_height_is_document_height() {
        let metrics = measure(&document(900.0), 0.0, &[]);
        assert_eq!(metrics.height, 900.0);
        assert_eq!(metrics.doc_height, 900.0);
        assert_eq!(metrics.modal_extent, 0.0);
        assert_eq!(metrics.modal_height, 0.0);
    }

    #[test]
    fn tall_modal_drives_reported_height() {
        let modal = ModalCandidate {
            dialog: ElementBox {
                margin_top: 10.0,
                margin_bottom: 6.0,
                ..dialog(100.0, 1200.5)
            },
            shell: None,
        };
        let metrics = measure(&document(900.0), 50.0, &[modal]);

        // top = 100 + 50 - 10 = 140, height = 1200.5 + 16 = 1216.5, bottom = 1356.5
        assert_eq!(metrics.modal_height, 1217.0);
        assert_eq!(metrics.modal_extent, 1373.0);
        assert_eq!(metrics.height, metrics.modal_extent);
        assert!(metrics.modal_extent > metrics.doc_height);
    }

    #[test]
    fn scroll_height_beyond_rect_counts() {
        let modal = ModalCandidate {
            dialog: ElementBox {
                scroll_height: 1500.0,
                ..dialog(0.0, 400.0)
            },
            shell: None,
        };
        let metrics = measure(&document(600.0), 0.0, &[modal]);
        assert_eq!(metrics.modal_height, 1500.0);
        assert_eq!(metrics.modal_extent, 1516.0);
    }

    #[test]
    fn hidden_or_empty_modals_are_ignored() {
        let hidden = [
            ModalCandidate {
                dialog: ElementBox {
                    display_none: true,
                    ..dialog(0.0, 2000.0)
                },
                shell: None,
            },
            ModalCandidate {
                dialog: ElementBox {
                    visibility_hidden: true,
                    ..dialog(0.0, 2000.0)
                },
                shell: None,
            },
            ModalCandidate {
                dialog: ElementBox {
                    rect_width: 0.0,
                    rect_height: 0.0,
                    scroll_height: 2000.0,
                    ..ElementBox::default()
                },
                shell: None,
            },
            ModalCandidate {
                dialog: ElementBox {
                    connected: false,
                    ..dialog(0.0, 2000.0)
                },
                shell: None,
            },
        ];
        let metrics = measure(&document(900.0), 0.0, &hidden);
        assert_eq!(metrics, measure(&document(900.0), 0.0, &[]));
    }

    #[test]
    fn modal_shell_can_extend_past_its_wrapper() {
        let modal = ModalCandidate {
            dialog: dialog(0.0, 300.0),
            shell: Some(ElementBox {
                rect_top: 40.0,
                rect_width: 560.0,
                rect_height: 300.0,
                scroll_height: 1100.0,
                ..ElementBox::default()
            }),
        };
        let metrics = measure(&document(700.0), 0.0, &[modal]);
        assert_eq!(metrics.modal_height, 1100.0);
        assert_eq!(metrics.modal_extent, 1156.0);
        assert_eq!(metrics.height, 1156.0);
    }

    #[test]
    fn shell_of_hidden_dialog_is_not_measured() {
        let modal = ModalCandidate {
            dialog: ElementBox {
                display_none: true,
                ..dialog(0.0, 300.0)
            },
            shell: Some(dialog(0.0, 3000.0)),
        };
        assert_eq!(measure(&document(700.0), 0.0, &[modal]).height, 700.0);
    }

    #[test]
    fn short_modal_keeps_document_height() {
        let modal = ModalCandidate {
            dialog: dialog(100.0, 200.0),
            shell: None,
        };
        let metrics = measure(&document(900.0), 0.0, &[modal]);
        assert_eq!(metrics.modal_extent, 316.0);
        assert_eq!(metrics.height, 900.0);
    }

    #[test]
    fn parses_computed_pixel_lengths() {
        assert_eq!(parse_css_px("12px"), 12.0);
        assert_eq!(parse_css_px(" 0.5px "), 0.5);
        assert_eq!(parse_css_px("-4px"), -4.0);
        assert_eq!(parse_css_px("auto"), 0.0);
        assert_eq!(parse_css_px(""), 0.0);
    }
}
