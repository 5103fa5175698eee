//! Elements
//!
//! An element is the packed form of one logical input: a [`Span`] inside the
//! binding's byte region plus the code that writes values into it and reads
//! them back.
//!
//! - [`ScalarElement`]: one scalar, vector or matrix
//! - [`ArrayElement`]: repeated values, contiguous, with a probed stride
//! - [`InterleavedArrayElement`]: one member of an "array of struct" group
//!
//! Elements never own bytes. They are handed the region on every write, so a
//! binding can clone its elements verbatim and point them at a copy.

mod array;
mod element;
mod interleaved;
pub mod raw;

pub use array::ArrayElement;
pub use element::ScalarElement;
pub use interleaved::{GroupMember, InterleavedArrayElement};

use crate::binding::InputValue;
use crate::errors::LayoutWarning;
use crate::layout::{LayoutDescriptor, Span, align_to};

/// Data shared by every element kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    /// Lookup key of the input.
    pub key: String,
    /// Name used in the shader text.
    pub name: String,
    pub layout: &'static LayoutDescriptor,
    pub span: Span,
    /// Set when the start was pushed past the natural WGSL offset of the
    /// value; the shader text then carries `@align(N)` for the member.
    pub align_attribute: Option<usize>,
}

impl ElementInfo {
    pub(crate) fn new(key: &str, name: &str, layout: &'static LayoutDescriptor, span: Span) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            layout,
            span,
            align_attribute: None,
        }
    }

    /// Records `@align(16)` when `span` does not start where WGSL would put a
    /// member of alignment `natural_alignment` following byte `cursor`.
    pub(crate) fn with_natural_offset(mut self, cursor: usize, natural_alignment: usize) -> Self {
        let natural = align_to(cursor, natural_alignment);
        if natural != self.span.start_offset() {
            debug_assert_eq!(self.span.start_offset() % 16, 0);
            self.align_attribute = Some(16);
        }
        self
    }
}

/// One packed input.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Scalar(ScalarElement),
    Array(ArrayElement),
    Interleaved(InterleavedArrayElement),
}

impl Element {
    #[inline]
    #[must_use]
    pub fn info(&self) -> &ElementInfo {
        match self {
            Self::Scalar(e) => e.info(),
            Self::Array(e) => e.info(),
            Self::Interleaved(e) => e.info(),
        }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.info().key
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info().name
    }

    #[inline]
    #[must_use]
    pub fn layout(&self) -> &'static LayoutDescriptor {
        self.info().layout
    }

    #[inline]
    #[must_use]
    pub fn span(&self) -> Span {
        self.info().span
    }

    #[inline]
    #[must_use]
    pub fn start_offset(&self) -> usize {
        self.span().start_offset()
    }

    #[inline]
    #[must_use]
    pub fn end_offset(&self) -> usize {
        self.span().end_offset()
    }

    #[inline]
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.span().row_count()
    }

    #[inline]
    #[must_use]
    pub fn byte_count(&self) -> usize {
        self.span().byte_count()
    }

    #[inline]
    #[must_use]
    pub fn padded_byte_count(&self) -> usize {
        self.span().padded_byte_count()
    }

    #[inline]
    #[must_use]
    pub fn is_interleaved(&self) -> bool {
        matches!(self, Self::Interleaved(_))
    }

    /// Bytes between repetitions, `None` for non-array elements.
    #[inline]
    #[must_use]
    pub fn stride(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(e) => Some(e.stride()),
            Self::Interleaved(e) => Some(e.stride()),
        }
    }

    /// Repetition count, `None` for non-array elements.
    #[inline]
    #[must_use]
    pub fn num_elements(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(e) => Some(e.num_elements()),
            Self::Interleaved(e) => Some(e.num_elements()),
        }
    }

    /// Packs `value` into `bytes`. On `Err` nothing was written.
    pub fn write(&mut self, bytes: &mut [u8], value: &InputValue) -> Result<(), LayoutWarning> {
        match self {
            Self::Scalar(e) => {
                e.write(bytes, value);
                Ok(())
            }
            Self::Array(e) => e.write(bytes, value),
            Self::Interleaved(e) => e.write(bytes, value),
        }
    }

    /// Reads the packed value back in logical order.
    #[must_use]
    pub fn extract(&self, bytes: &[u8]) -> Vec<f64> {
        match self {
            Self::Scalar(e) => e.extract(bytes),
            Self::Array(e) => e.extract(bytes),
            Self::Interleaved(e) => e.extract(bytes),
        }
    }
}

/// `true` when a padded matrix list carries only the real components of
/// each matrix (9 per `mat3x3f`), as glam's `to_cols_array` produces.
#[inline]
pub(crate) fn is_unpadded_list(layout: &LayoutDescriptor, value: &InputValue, num_elements: usize) -> bool {
    layout.pad.is_some() && value.len() == num_elements * layout.logical_component_count()
}

/// View components of repetition `repetition`. Pad slots of an unpadded
/// list and values missing from `value` become 0.
pub(crate) fn repetition_components<'v>(
    value: &'v InputValue,
    layout: &LayoutDescriptor,
    repetition: usize,
    unpadded: bool,
) -> impl Iterator<Item = f64> + 'v {
    let count = layout.component_count;
    let pad = layout.pad.filter(|_| unpadded);
    let first = repetition * pad.map_or(count, |_| layout.logical_component_count());

    (0..count).map(move |c| {
        let source = match pad {
            Some(pad) => pad.source_index(c),
            None => Some(c),
        };
        source.and_then(|i| value.component(first + i)).unwrap_or(0.0)
    })
}
