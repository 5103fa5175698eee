use super::raw::{get_component, set_component};
use super::{ElementInfo, is_unpadded_list, repetition_components};
use crate::binding::InputValue;
use crate::errors::LayoutWarning;
use crate::layout::{LayoutDescriptor, Span, align_to};

/// A repeated scalar, vector or matrix stored contiguously.
///
/// The stride is discovered by placing a second, hypothetical value right
/// after the first one and measuring the distance between their ends, so
/// every type repeats exactly the way the placement rule wants it to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayElement {
    info: ElementInfo,
    declared_length: Option<usize>,
    num_elements: usize,
    stride: usize,
}

impl ArrayElement {
    /// Lays out `num_elements` repetitions at or after `offset`.
    ///
    /// `min_alignment` raises the start alignment of the whole array (16 for
    /// uniform bindings).
    #[must_use]
    pub fn new(
        key: &str,
        name: &str,
        layout: &'static LayoutDescriptor,
        declared_length: Option<usize>,
        num_elements: usize,
        offset: usize,
        min_alignment: usize,
    ) -> Self {
        let num_elements = num_elements.max(1);
        let (first, stride) = probe_stride(align_to(offset, min_alignment), layout);

        let start = first.start_offset();
        let end = start + stride * (num_elements - 1) + layout.size - 1;
        let span = Span::from_offsets(start, end);

        log::debug!(
            "Placed array `{key}` ({} x {num_elements}, stride {stride}) at {start}..={end}",
            layout.name
        );

        Self {
            info: ElementInfo::new(key, name, layout, span).with_natural_offset(offset, layout.alignment),
            declared_length,
            num_elements,
            stride,
        }
    }

    #[inline]
    #[must_use]
    pub fn info(&self) -> &ElementInfo {
        &self.info
    }

    /// Length written in the declaration, if any.
    #[inline]
    #[must_use]
    pub fn declared_length(&self) -> Option<usize> {
        self.declared_length
    }

    #[inline]
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// Bytes between two consecutive repetitions.
    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Total components across all repetitions.
    #[inline]
    #[must_use]
    pub fn array_length(&self) -> usize {
        self.num_elements * self.info.layout.component_count
    }

    /// Writes `num_elements` repetitions of `component_count` values each.
    ///
    /// Padded matrix types take padded data, or exactly the real components
    /// of every matrix. A short value is zero-filled, a long one is truncated
    /// with a warning. Non-array values are rejected.
    pub fn write(&self, bytes: &mut [u8], value: &InputValue) -> Result<(), LayoutWarning> {
        check_array_value(&self.info.key, value, self.array_length())?;

        let layout = self.info.layout;
        let bpc = layout.bytes_per_component();
        let start = self.info.span.start_offset();
        let unpadded = is_unpadded_list(layout, value, self.num_elements);

        for i in 0..self.num_elements {
            let base = start + i * self.stride;
            for (c, component) in repetition_components(value, layout, i, unpadded).enumerate() {
                set_component(bytes, base + c * bpc, layout.view_kind, component);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn extract(&self, bytes: &[u8]) -> Vec<f64> {
        let layout = self.info.layout;
        let bpc = layout.bytes_per_component();
        let start = self.info.span.start_offset();

        (0..self.num_elements)
            .flat_map(|i| {
                let base = start + i * self.stride;
                (0..layout.component_count)
                    .map(move |c| get_component(bytes, base + c * bpc, layout.view_kind))
            })
            .collect()
    }
}

/// Places one value at `offset` and a second one right after it.
/// Returns the first span and the distance between both ends.
///
/// When the second value would straddle a row and gets pushed forward
/// (`mat3x2h`), the stride falls back to `roundUp(alignment, size)`: WGSL
/// has no way to declare a wider array stride.
pub(crate) fn probe_stride(offset: usize, layout: &LayoutDescriptor) -> (Span, usize) {
    let first = Span::place(offset, layout.size, layout.alignment);
    let next = align_to(first.end_offset() + 1, layout.alignment);
    let second = Span::place(next, layout.size, layout.alignment);

    let stride = if second.start_offset() == next {
        second.end_offset() - first.end_offset()
    } else {
        align_to(layout.size, layout.alignment)
    };
    (first, stride)
}

/// Rejects values that cannot fill an array; logs truncation.
pub(crate) fn check_array_value(key: &str, value: &InputValue, capacity: usize) -> Result<(), LayoutWarning> {
    if !value.is_array_like() {
        return Err(LayoutWarning::ValueShapeMismatch {
            input: key.to_string(),
            expected: "an array-like value",
        });
    }

    if value.len() > capacity {
        log::warn!(
            "{}",
            LayoutWarning::ArrayTruncated {
                input: key.to_string(),
                provided: value.len(),
                capacity,
            }
        );
    }
    Ok(())
}
