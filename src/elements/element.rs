use super::raw::{get_component, set_component};
use super::ElementInfo;
use crate::binding::InputValue;
use crate::layout::{LayoutDescriptor, Span};

/// A single scalar, vector or matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarElement {
    info: ElementInfo,
}

impl ScalarElement {
    /// Places the value at the first legal position at or after `offset`.
    #[must_use]
    pub fn new(key: &str, name: &str, layout: &'static LayoutDescriptor, offset: usize) -> Self {
        let span = Span::place(offset, layout.size, layout.alignment);
        let info = ElementInfo::new(key, name, layout, span).with_natural_offset(offset, layout.alignment);

        log::debug!(
            "Placed `{key}` ({}) at {}..={}",
            layout.name,
            span.start_offset(),
            span.end_offset()
        );

        Self { info }
    }

    #[inline]
    #[must_use]
    pub fn info(&self) -> &ElementInfo {
        &self.info
    }

    /// Number of components in the view over the region.
    #[inline]
    #[must_use]
    pub fn view_len(&self) -> usize {
        self.info.span.byte_count() / self.info.layout.bytes_per_component()
    }

    /// Writes every view component.
    ///
    /// Values missing from `value` are written as 0. A padded matrix given
    /// its logical component count (9 for `mat3x3f`) is expanded around the
    /// pad slots; any other value is copied component by component.
    pub fn write(&self, bytes: &mut [u8], value: &InputValue) {
        let layout = self.info.layout;
        let kind = layout.view_kind;
        let bpc = layout.bytes_per_component();
        let start = self.info.span.start_offset();

        let expand = layout
            .pad
            .filter(|_| value.len() == layout.logical_component_count());

        for index in 0..self.view_len() {
            let source = match expand {
                Some(pad) => pad.source_index(index),
                None => Some(index),
            };
            let component = source.and_then(|i| value.component(i)).unwrap_or(0.0);
            set_component(bytes, start + index * bpc, kind, component);
        }
    }

    /// Reads the value back; matrix pad slots are skipped.
    #[must_use]
    pub fn extract(&self, bytes: &[u8]) -> Vec<f64> {
        let layout = self.info.layout;
        let bpc = layout.bytes_per_component();
        let start = self.info.span.start_offset();

        (0..self.view_len())
            .filter(|&index| layout.pad.is_none_or(|pad| pad.source_index(index).is_some()))
            .map(|index| get_component(bytes, start + index * bpc, layout.view_kind))
            .collect()
    }
}
