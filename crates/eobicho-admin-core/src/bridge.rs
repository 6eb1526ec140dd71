//! Child-to-parent frame messages.
//!
//! Embedded admin pages report their content size and modal state to the shell with
//! `postMessage`. The envelope is flat JSON:
//!
//! ```text
//! { source: "eo-bicho", type: "TAB_CONTENT_RESIZE" | "MODAL_OPEN" | "MODAL_CLOSE",
//!   height, docHeight, modalExtent, modalHeight }
//! ```
//!
//! Messages arrive with a wildcard target origin, so the receiving side decodes through
//! [`decode_envelope`] and never reads fields off an unvalidated value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MESSAGE_SOURCE: &str = "eo-bicho";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetrics {
    pub height: f64,
    #[serde(default)]
    pub doc_height: f64,
    #[serde(default)]
    pub modal_extent: f64,
    #[serde(default)]
    pub modal_height: f64,
}

impl ContentMetrics {
    fn first_invalid_field(&self) -> Option<&'static str> {
        [
            ("height", self.height),
            ("docHeight", self.doc_height),
            ("modalExtent", self.modal_extent),
            ("modalHeight", self.modal_height),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite() || (value.is_sign_negative() && *value != 0.0))
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    #[serde(rename = "TAB_CONTENT_RESIZE")]
    ContentResize(ContentMetrics),
    #[serde(rename = "MODAL_OPEN")]
    ModalOpen(ContentMetrics),
    #[serde(rename = "MODAL_CLOSE")]
    ModalClose(ContentMetrics),
}

impl BridgeMessage {
    pub fn metrics(&self) -> &ContentMetrics {
        match self {
            Self::ContentResize(metrics) | Self::ModalOpen(metrics) | Self::ModalClose(metrics) => {
                metrics
            }
        }
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::ContentResize(_) => "TAB_CONTENT_RESIZE",
            Self::ModalOpen(_) => "MODAL_OPEN",
            Self::ModalClose(_) => "MODAL_CLOSE",
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    source: &'static str,
    #[serde(flatten)]
    message: &'a BridgeMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeDecodeError {
    #[error("frame message is not a JSON object")]
    NotAnObject,
    #[error("frame message source {0:?} is not eo-bicho")]
    ForeignSource(Option<String>),
    #[error("frame message has an unknown shape: {0}")]
    Shape(String),
    #[error("frame message field {0} is not a finite non-negative number")]
    InvalidMetric(&'static str),
}

pub fn encode_envelope(message: &BridgeMessage) -> Value {
    serde_json::to_value(Envelope {
        source: MESSAGE_SOURCE,
        message,
    })
    .unwrap_or(Value::Null)
}

pub fn decode_envelope(value: &Value) -> Result<BridgeMessage, BridgeDecodeError> {
    let object = value.as_object().ok_or(BridgeDecodeError::NotAnObject)?;
    match object.get("source").and_then(Value::as_str) {
        Some(MESSAGE_SOURCE) => {}
        Some(other) => return Err(BridgeDecodeError::ForeignSource(Some(other.to_string()))),
        None => return Err(BridgeDecodeError::ForeignSource(None)),
    }

    let message = BridgeMessage::deserialize(value)
        .map_err(|error| BridgeDecodeError::Shape(error.to_string()))?;
    if let Some(field) = message.metrics().first_invalid_field() {
        return Err(BridgeDecodeError::InvalidMetric(field));
    }
    Ok(message)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalTransition {
    Opened,
    Closed,
}

/// Edge detector for "is any modal open". Starts closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModalEdgeTracker {
    open: bool,
}

impl ModalEdgeTracker {
    pub fn observe(&mut self, open: bool) -> Option<ModalTransition> {
        if open == self.open {
            return None;
        }
        self.open = open;
        Some(if open {
            ModalTransition::Opened
        } else {
            ModalTransition::Closed
        })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// Decides which messages an embedded page posts for each observation.
#[derive(Debug, Clone, Default)]
pub struct BridgeReporter {
    modal: ModalEdgeTracker,
    posted: u64,
}

impl BridgeReporter {
    /// Mutation observer callback: a modal edge (if any) followed by a resize report.
    pub fn on_mutation(&mut self, modal_open: bool, metrics: ContentMetrics) -> Vec<BridgeMessage> {
        let mut messages = Vec::with_capacity(2);
        match self.modal.observe(modal_open) {
            Some(ModalTransition::Opened) => messages.push(BridgeMessage::ModalOpen(metrics)),
            Some(ModalTransition::Closed) => messages.push(BridgeMessage::ModalClose(metrics)),
            None => {}
        }
        messages.push(BridgeMessage::ContentResize(metrics));
        self.posted += messages.len() as u64;
        messages
    }

    /// Resize observer, `load` and `DOMContentLoaded`.
    pub fn on_lifecycle(&mut self, metrics: ContentMetrics) -> BridgeMessage {
        self.posted += 1;
        BridgeMessage::ContentResize(metrics)
    }

    pub fn posted(&self) -> u64 {
        self.posted
    }

    pub fn modal_open(&self) -> bool {
        self.modal.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metrics(height: f64) -> ContentMetrics {
        ContentMetrics {
            height,
            doc_height: height,
            modal_extent: 0.0,
            modal_height: 0.0,
        }
    }

    #[test]
    fn envelope_is_flat_and_tagged() {
        let message = BridgeMessage::ModalOpen(ContentMetrics {
            height: 1216.0,
            doc_height: 900.0,
            modal_extent: 1216.0,
            modal_height: 640.0,
        });
        assert_eq!(
            encode_envelope(&message),
            json!({
                "source": "eo-bicho",
                "type": "MODAL_OPEN",
                "height": 1216.0,
                "docHeight": 900.0,
                "modalExtent": 1216.0,
                "modalHeight": 640.0
            })
        );
    }

    #[test]
    fn decodes_integer_metrics_and_legacy_height_only_messages() {
        let decoded = decode_envelope(&json!({
            "source": "eo-bicho",
            "type": "TAB_CONTENT_RESIZE",
            "height": 800,
            "docHeight": 800,
            "modalExtent": 0,
            "modalHeight": 0
        }))
        .expect("decodes");
        assert_eq!(decoded, BridgeMessage::ContentResize(metrics(800.0)));

        let legacy = decode_envelope(&json!({
            "source": "eo-bicho",
            "type": "MODAL_CLOSE",
            "height": 512
        }))
        .expect("decodes");
        assert_eq!(
            legacy,
            BridgeMessage::ModalClose(ContentMetrics {
                height: 512.0,
                ..ContentMetrics::default()
            })
        );
    }

    #[test]
    fn rejects_untrusted_shapes() {
        assert_eq!(
            decode_envelope(&json!("TAB_CONTENT_RESIZE")),
            Err(BridgeDecodeError::NotAnObject)
        );
        assert_eq!(
            decode_envelope(&json!({"type": "MODAL_OPEN", "height": 1})),
            Err(BridgeDecodeError::ForeignSource(None))
        );
        assert_eq!(
            decode_envelope(&json!({"source": "devtools", "type": "MODAL_OPEN", "height": 1})),
            Err(BridgeDecodeError::ForeignSource(Some("devtools".to_string())))
        );
        assert!(matches!(
            decode_envelope(&json!({"source": "eo-bicho", "type": "SCROLL", "height": 1})),
            Err(BridgeDecodeError::Shape(_))
        ));
        assert!(matches!(
            decode_envelope(&json!({"source": "eo-bicho", "type": "MODAL_OPEN"})),
            Err(BridgeDecodeError::Shape(_))
        ));
        assert!(matches!(
            decode_envelope(&json!({"source": "eo-bicho", "type": "MODAL_OPEN", "height": "9"})),
            Err(BridgeDecodeError::Shape(_))
        ));
        assert_eq!(
            decode_envelope(&json!({
                "source": "eo-bicho",
                "type": "TAB_CONTENT_RESIZE",
                "height": 10,
                "modalHeight": -4
            })),
            Err(BridgeDecodeError::InvalidMetric("modalHeight"))
        );
    }

    #[test]
    fn modal_edges_fire_once_per_transition() {
        let mut tracker = ModalEdgeTracker::default();
        assert_eq!(tracker.observe(false), None);
        assert_eq!(tracker.observe(true), Some(ModalTransition::Opened));
        assert_eq!(tracker.observe(true), None);
        assert_eq!(tracker.observe(false), Some(ModalTransition::Closed));
        assert_eq!(tracker.observe(false), None);
    }

    #[test]
    fn reporter_sends_resize_on_every_mutation() {
        let mut reporter = BridgeReporter::default();

        let opened = reporter.on_mutation(true, metrics(700.0));
        assert_eq!(
            opened,
            vec![
                BridgeMessage::ModalOpen(metrics(700.0)),
                BridgeMessage::ContentResize(metrics(700.0)),
            ]
        );

        let steady = reporter.on_mutation(true, metrics(720.0));
        assert_eq!(steady, vec![BridgeMessage::ContentResize(metrics(720.0))]);

        let closed = reporter.on_mutation(false, metrics(500.0));
        assert_eq!(closed[0].type_tag(), "MODAL_CLOSE");
        assert_eq!(closed.len(), 2);
        assert!(!reporter.modal_open());
        assert_eq!(reporter.posted(), 5);
    }
}
