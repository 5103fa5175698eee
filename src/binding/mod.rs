//! Buffer bindings
//!
//! A [`BufferBinding`] turns a set of named, typed [`Input`]s into:
//!
//! 1. an ordered list of [`Element`](crate::Element)s with fixed byte spans
//! 2. one shared [`ByteRegion`] holding the packed values
//! 3. the WGSL [`ShaderDeclaration`] describing the same layout
//!
//! An [`OffsetChildBinding`] reuses a parent binding's region at a dynamic
//! offset, for many logical instances living in one physical buffer.

mod buffer_binding;
mod input;
mod offset_child;
mod region;
mod shader;

pub use buffer_binding::BufferBinding;
pub use input::{Input, InputValue, UpdateCallback};
pub use offset_child::{OffsetChildBinding, OffsetChildDescriptor};
pub use region::{ByteRegion, WeakByteRegion};
pub use shader::ShaderDeclaration;

pub(crate) use input::LogicalInput;

use std::num::NonZeroU64;

use crate::settings::LayoutSettings;

/// Shader address space of a binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BindingKind {
    #[default]
    Uniform,
    Storage,
}

/// Shader-side access of a storage binding. Uniform bindings are always read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AccessMode {
    #[default]
    Read,
    ReadWrite,
}

impl AccessMode {
    #[inline]
    #[must_use]
    pub const fn wgsl_name(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::ReadWrite => "read_write",
        }
    }
}

/// Everything needed to build a [`BufferBinding`].
#[derive(Debug, Clone)]
pub struct BufferBindingDescriptor {
    /// Debug label of the byte region and GPU buffer. Defaults to `name`.
    pub label: Option<String>,
    /// Variable name in the shader; the struct type is its `PascalCase` form.
    pub name: String,
    pub kind: BindingKind,
    pub access: AccessMode,
    pub visibility: wgpu::ShaderStages,
    /// Pack every input under one struct (default) or declare one variable
    /// per input.
    pub use_struct: bool,
    pub settings: LayoutSettings,
    /// Inputs in declaration order.
    pub inputs: Vec<(String, Input)>,
}

impl BufferBindingDescriptor {
    pub fn uniform(name: impl Into<String>) -> Self {
        Self {
            label: None,
            name: name.into(),
            kind: BindingKind::Uniform,
            access: AccessMode::Read,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            use_struct: true,
            settings: LayoutSettings::default(),
            inputs: Vec::new(),
        }
    }

    pub fn storage(name: impl Into<String>, access: AccessMode) -> Self {
        Self {
            kind: BindingKind::Storage,
            access,
            visibility: wgpu::ShaderStages::all(),
            ..Self::uniform(name)
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds an input. A key that already exists keeps its position and gets
    /// the new declaration.
    #[must_use]
    pub fn with_input(mut self, key: impl Into<String>, input: Input) -> Self {
        let key = key.into();
        match self.inputs.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = input,
            None => self.inputs.push((key, input)),
        }
        self
    }

    /// Declares one top-level variable per input instead of a struct.
    ///
    /// The binding still owns one buffer bound at offset 0, so flat mode is
    /// meant for a single input (or a single interleaved group). More than
    /// one variable records [`LayoutWarning::FlatSharedBuffer`](crate::LayoutWarning::FlatSharedBuffer).
    #[must_use]
    pub fn flat(mut self) -> Self {
        self.use_struct = false;
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: wgpu::ShaderStages) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: LayoutSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// What the rendering side needs to build its binding table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceLayoutDescriptor {
    pub kind: BindingKind,
    pub access: AccessMode,
    pub visibility: wgpu::ShaderStages,
    /// Fixed offset inside the parent buffer (offset children only).
    pub offset: Option<u64>,
    /// Bound size (offset children only).
    pub size: Option<u64>,
}

impl ResourceLayoutDescriptor {
    #[must_use]
    pub fn buffer_binding_type(&self) -> wgpu::BufferBindingType {
        match self.kind {
            BindingKind::Uniform => wgpu::BufferBindingType::Uniform,
            BindingKind::Storage => wgpu::BufferBindingType::Storage {
                read_only: self.access == AccessMode::Read,
            },
        }
    }

    /// Layout entry at `binding`. Offset children bind with a dynamic offset
    /// and a minimum size of their own slice.
    #[must_use]
    pub fn to_layout_entry(&self, binding: u32) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: self.visibility,
            ty: wgpu::BindingType::Buffer {
                ty: self.buffer_binding_type(),
                has_dynamic_offset: self.offset.is_some(),
                min_binding_size: self.size.and_then(NonZeroU64::new),
            },
            count: None,
        }
    }
}
