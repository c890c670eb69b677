//! Container tree → text blob.

use tracing::{trace, warn};

use super::line;
use super::path::{SectionPath, Segment};
use crate::config::CodecConfig;
use crate::container::{AttributeContainer, Child, Holder};
use crate::numeric::Numeric;
use crate::value::{BoundedValue, ExString, ReactiveValue};

/// Encodes `root` and its subtree with the default [`CodecConfig`].
pub fn encode(root: &AttributeContainer) -> String {
    encode_with(root, &CodecConfig::default())
}

/// Encodes `root` depth-first: section header, holder lines, then children.
///
/// Holders and children flagged `IGNORE_ON_SAVE` are skipped. Modifier
/// groups are never written; reactive values persist their base only.
pub fn encode_with(root: &AttributeContainer, config: &CodecConfig) -> String {
    let mut out = String::new();
    let mut encoder = Encoder {
        out: &mut out,
        config,
    };
    encoder.container(root, &SectionPath::root(root.kind()));
    out
}

struct Encoder<'a> {
    out: &'a mut String,
    config: &'a CodecConfig,
}

impl Encoder<'_> {
    fn push(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push_str(&self.config.line_ending);
    }

    fn container(&mut self, container: &AttributeContainer, path: &SectionPath) {
        trace!(%path, "encoding section");
        self.push(&format!("[{path}]"));

        for (name, holder) in container.saved_holders() {
            if let Some(line) = self.holder(name, holder) {
                self.push(&line);
            }
        }

        for (name, child) in container.saved_children() {
            match child {
                Child::Single(child) => self.container(child, &path.join(Segment::named(name))),
                Child::Sequence(items) => {
                    for (index, item) in items.iter().enumerate() {
                        self.container(item, &path.join(Segment::indexed(name, index)));
                    }
                }
            }
        }
    }

    fn holder(&self, name: &str, holder: &Holder) -> Option<String> {
        let payload = match holder {
            Holder::BoundedInt(v) => bounded_payload(v),
            Holder::BoundedFloat(v) => bounded_payload(v),
            Holder::BoundedDouble(v) => bounded_payload(v),
            Holder::ReactiveInt(v) => reactive_payload(v),
            Holder::ReactiveFloat(v) => reactive_payload(v),
            Holder::ReactiveDouble(v) => reactive_payload(v),
            Holder::NumberInt(v) => line::scalar(v.get()),
            Holder::NumberFloat(v) => line::scalar(v.get()),
            Holder::NumberDouble(v) => line::scalar(v.get()),
            Holder::Text(v) => self.text_payload(name, v)?,
        };
        Some(format!("{}{name}:{payload}", holder.kind().sigil()))
    }

    fn text_payload(&self, name: &str, value: &ExString) -> Option<String> {
        let text = value.get();
        if text.is_empty() && !self.config.emit_empty_strings {
            return None;
        }
        if text.contains(['\n', '\r']) {
            warn!(field = name, "line breaks in string field replaced with spaces");
            return Some(text.replace("\r\n", " ").replace(['\n', '\r'], " "));
        }
        Some(text)
    }
}

fn bounded_payload<T: Numeric>(value: &BoundedValue<T>) -> String {
    line::bounded(value.current(), value.min(), value.max())
}

fn reactive_payload<T: Numeric>(value: &ReactiveValue<T>) -> String {
    format!("{}:", line::scalar(value.base()))
}
