use std::ops::Deref;

use super::region::{ByteRegion, WeakByteRegion};
use super::{BufferBinding, BufferBindingDescriptor, InputValue, ResourceLayoutDescriptor};
use crate::elements::raw::copy_components;
use crate::errors::{LayoutError, Result};

/// Everything needed to build an [`OffsetChildBinding`].
#[derive(Debug, Clone)]
pub struct OffsetChildDescriptor<'a> {
    /// Inputs and options of the child. Address space and access mode are
    /// taken from the parent.
    pub binding: BufferBindingDescriptor,
    pub parent: Option<&'a BufferBinding>,
    /// Instance index inside the parent.
    pub index: usize,
}

impl<'a> OffsetChildDescriptor<'a> {
    #[must_use]
    pub fn new(binding: BufferBindingDescriptor) -> Self {
        Self {
            binding,
            parent: None,
            index: 0,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: &'a BufferBinding, index: usize) -> Self {
        self.parent = Some(parent);
        self.index = index;
        self
    }
}

/// One instance's slice of an interleaved parent binding.
///
/// The child lays out and updates its own inputs like any binding, then
/// copies every element into the parent region at
/// `offset + element start`. The parent is flagged for upload; the child's
/// own region never is.
///
/// The parent region is held weakly: once the parent is gone, updates are
/// logged and skipped.
pub struct OffsetChildBinding {
    binding: BufferBinding,
    parent: WeakByteRegion,
    parent_name: String,
    index: usize,
    offset: u64,
}

impl OffsetChildBinding {
    /// Fails without a parent, with a parent that is not made of
    /// interleaved elements only, or when the slice would not fit.
    pub fn new(descriptor: OffsetChildDescriptor<'_>) -> Result<Self> {
        let OffsetChildDescriptor {
            mut binding,
            parent,
            index,
        } = descriptor;

        let parent = parent.ok_or_else(|| LayoutError::MissingParent {
            child: binding.name.clone(),
        })?;
        if !parent.is_interleaved() {
            return Err(LayoutError::ParentNotInterleaved {
                parent: parent.name().to_string(),
            });
        }

        binding.kind = parent.kind();
        binding.access = parent.access();
        let binding = BufferBinding::new(binding)?;

        let size = binding.byte_size() as u64;
        let parent_size = parent.byte_size() as u64;
        let offset = (index as u64)
            .checked_mul(size)
            .and_then(|bytes| binding.settings().checked_align_dynamic_offset(bytes));
        let fits = |offset: &u64| offset.checked_add(size).is_some_and(|end| end <= parent_size);
        let Some(offset) = offset.filter(fits) else {
            return Err(LayoutError::ChildOutOfBounds {
                offset: offset.unwrap_or(u64::MAX),
                size,
                parent_size,
            });
        };

        log::debug!(
            "Offset child `{}` #{index} of `{}` at {offset} ({size} bytes)",
            binding.name(),
            parent.name()
        );

        let child = Self {
            binding,
            parent: parent.region().downgrade(),
            parent_name: parent.name().to_string(),
            index,
            offset,
        };
        child.copy_into(parent.region());
        Ok(child)
    }

    /// Updates the child's own region, then flushes into the parent when
    /// anything changed. Returns the number of inputs written.
    pub fn update(&mut self) -> usize {
        let Some(parent) = self.parent.upgrade() else {
            log::warn!(
                "Offset child `{}`: parent `{}` was dropped, update skipped",
                self.binding.name(),
                self.parent_name
            );
            return 0;
        };

        let written = self.binding.update();
        if written > 0 {
            self.copy_into(&parent);
        }
        written
    }

    fn copy_into(&self, parent: &ByteRegion) {
        let base = usize::try_from(self.offset).unwrap_or(usize::MAX);
        {
            let source = self.binding.bytes();
            let mut target = parent.write();
            for element in self.binding.elements() {
                let layout = element.layout();
                let start = element.start_offset();
                let count = element.byte_count() / layout.bytes_per_component();
                copy_components(&source, start, &mut target.bytes, base + start, layout.view_kind, count);
            }
            target.mark_written();
        }
        self.binding.clear_should_upload();
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<InputValue>) -> bool {
        self.binding.set_value(key, value)
    }

    pub fn try_set_value(&mut self, key: &str, value: impl Into<InputValue>) -> Result<()> {
        self.binding.try_set_value(key, value)
    }

    pub fn mark_dirty(&mut self, key: &str) -> bool {
        self.binding.mark_dirty(key)
    }

    /// Byte offset inside the parent region, a multiple of the dynamic
    /// offset alignment.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// `false` once the parent binding has been dropped.
    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.parent.upgrade().is_some()
    }

    /// Parent region, while it is alive.
    #[must_use]
    pub fn parent_region(&self) -> Option<ByteRegion> {
        self.parent.upgrade()
    }

    /// Layout of the parent slice: dynamic offset plus the child's size.
    #[must_use]
    pub fn resource_layout_descriptor(&self) -> ResourceLayoutDescriptor {
        ResourceLayoutDescriptor {
            offset: Some(self.offset),
            size: Some(self.binding.byte_size() as u64),
            ..self.binding.resource_layout_descriptor()
        }
    }
}

impl Deref for OffsetChildBinding {
    type Target = BufferBinding;

    fn deref(&self) -> &Self::Target {
        &self.binding
    }
}

impl std::fmt::Debug for OffsetChildBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffsetChildBinding")
            .field("binding", &self.binding)
            .field("parent", &self.parent_name)
            .field("index", &self.index)
            .field("offset", &self.offset)
            .finish()
    }
}
