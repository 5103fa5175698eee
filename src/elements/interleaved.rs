use super::array::check_array_value;
use super::raw::{copy_components, get_component, set_component};
use super::{ElementInfo, is_unpadded_list, repetition_components};
use crate::binding::InputValue;
use crate::errors::LayoutWarning;
use crate::layout::{BYTES_PER_ROW, LayoutDescriptor, Span, align_to};

/// Member of an interleaved group, as handed to [`InterleavedArrayElement::layout_group`].
#[derive(Debug, Clone, Copy)]
pub struct GroupMember<'a> {
    pub key: &'a str,
    pub name: &'a str,
    pub layout: &'static LayoutDescriptor,
}

/// One member of an "array of struct" group.
///
/// Siblings share one stride and their bytes interleave inside every
/// repetition, so values are staged in a private, tightly packed scratch
/// buffer and then copied repetition by repetition to absolute offsets
/// `start + i * stride` of the region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterleavedArrayElement {
    info: ElementInfo,
    num_elements: usize,
    stride: usize,
    /// Offset of the member inside one repetition.
    member_offset: usize,
    scratch: Vec<u8>,
}

impl InterleavedArrayElement {
    /// Lays out a group of `num_elements` repetitions at or after `offset`.
    ///
    /// One repetition is simulated by placing each member type back to back;
    /// the stride is the end of that block rounded up to the largest member
    /// alignment (16 when `row_aligned`, as uniform bindings require).
    #[must_use]
    pub fn layout_group(members: &[GroupMember<'_>], num_elements: usize, offset: usize, row_aligned: bool) -> Vec<Self> {
        let num_elements = num_elements.max(1);

        let mut cursor = 0;
        let mut temps = Vec::with_capacity(members.len());
        for member in members {
            let span = Span::place(cursor, member.layout.size, member.layout.alignment);
            let info = ElementInfo::new(member.key, member.name, member.layout, span)
                .with_natural_offset(cursor, member.layout.alignment);
            cursor = span.end_offset() + 1;
            temps.push(info);
        }

        let mut struct_alignment = temps
            .iter()
            .map(|info| info.align_attribute.unwrap_or(info.layout.alignment))
            .max()
            .unwrap_or(1);
        if row_aligned && struct_alignment < BYTES_PER_ROW {
            struct_alignment = BYTES_PER_ROW;
            if let Some(first) = temps.first_mut() {
                first.align_attribute = Some(BYTES_PER_ROW);
            }
        }

        let stride = align_to(cursor, struct_alignment);
        let base = align_to(offset, struct_alignment);

        log::debug!(
            "Interleaved {} members x {num_elements}, stride {stride}, base {base}",
            members.len()
        );

        temps
            .into_iter()
            .map(|mut info| {
                let member_offset = info.span.start_offset();
                let start = base + member_offset;
                let end = start + stride * (num_elements - 1) + info.layout.size - 1;
                info.span = Span::from_offsets(start, end);

                let scratch_len = num_elements * info.layout.component_count * info.layout.bytes_per_component();
                Self {
                    info,
                    num_elements,
                    stride,
                    member_offset,
                    scratch: vec![0; scratch_len],
                }
            })
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn info(&self) -> &ElementInfo {
        &self.info
    }

    #[inline]
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// Shared stride of the whole group.
    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Offset of this member inside one repetition.
    #[inline]
    #[must_use]
    pub fn member_offset(&self) -> usize {
        self.member_offset
    }

    /// Total components across all repetitions.
    #[inline]
    #[must_use]
    pub fn array_length(&self) -> usize {
        self.num_elements * self.info.layout.component_count
    }

    /// Stages the value in scratch, then copies each repetition into place.
    ///
    /// Padded matrix members accept padded data or only the real components
    /// of every matrix.
    pub fn write(&mut self, bytes: &mut [u8], value: &InputValue) -> Result<(), LayoutWarning> {
        check_array_value(&self.info.key, value, self.array_length())?;

        let layout = self.info.layout;
        let count = layout.component_count;
        let bpc = layout.bytes_per_component();
        let kind = layout.view_kind;
        let unpadded = is_unpadded_list(layout, value, self.num_elements);

        for i in 0..self.num_elements {
            for (c, component) in repetition_components(value, layout, i, unpadded).enumerate() {
                set_component(&mut self.scratch, (i * count + c) * bpc, kind, component);
            }
        }

        let start = self.info.span.start_offset();
        for i in 0..self.num_elements {
            copy_components(&self.scratch, i * count * bpc, bytes, start + i * self.stride, kind, count);
        }
        Ok(())
    }

    /// Reassembles the member's values in logical order.
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
