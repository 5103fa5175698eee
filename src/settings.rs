//! Layout Settings
//!
//! Knobs shared by every binding built with the same settings. The defaults
//! match what WebGPU guarantees on every adapter, so most code can simply use
//! [`LayoutSettings::default()`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myth_layout::{BindingKind, LayoutSettings};
//!
//! // Defaults: 256-byte dynamic offsets, `elements` as interleaved field name
//! let settings = LayoutSettings::default();
//!
//! // Follow what the device actually reports
//! let settings = LayoutSettings::from_limits(&device.limits(), BindingKind::Uniform);
//! ```

use crate::binding::BindingKind;

/// Minimum dynamic offset granularity guaranteed by WebGPU.
pub const DEFAULT_DYNAMIC_OFFSET_ALIGNMENT: u32 = 256;

/// Configuration of the packing engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSettings {
    /// Granularity offset children round their parent offset up to.
    ///
    /// WebGPU mandates 256 as the floor for both uniform and storage buffers;
    /// some adapters report a smaller value.
    pub dynamic_offset_alignment: u32,

    /// Field name of the interleaved `array<…>` member in struct mode.
    pub interleaved_field_name: String,

    /// Suffix appended to the outer struct name to name the interleaved
    /// element struct (`Particles` + `Element` = `ParticlesElement`).
    pub interleaved_struct_suffix: String,

    /// Record a [`LayoutWarning::UniformArrayStride`](crate::LayoutWarning)
    /// when a uniform array stride is not a multiple of 16.
    pub warn_on_uniform_array_stride: bool,
}

impl Default for LayoutSettings {
    #[inline]
    fn default() -> Self {
        Self {
            dynamic_offset_alignment: DEFAULT_DYNAMIC_OFFSET_ALIGNMENT,
            interleaved_field_name: "elements".to_string(),
            interleaved_struct_suffix: "Element".to_string(),
            warn_on_uniform_array_stride: true,
        }
    }
}

impl LayoutSettings {
    /// Builds settings whose dynamic offset alignment follows the device
    /// limits for the given address space.
    #[must_use]
    pub fn from_limits(limits: &wgpu::Limits, kind: BindingKind) -> Self {
        let dynamic_offset_alignment = match kind {
            BindingKind::Uniform => limits.min_uniform_buffer_offset_alignment,
            BindingKind::Storage => limits.min_storage_buffer_offset_alignment,
        };

        Self {
            dynamic_offset_alignment: dynamic_offset_alignment.max(1),
            ..Self::default()
        }
    }

    /// Rounds `bytes` up to the dynamic offset granularity.
    #[inline]
    #[must_use]
    pub fn align_dynamic_offset(&self, bytes: u64) -> u64 {
        let alignment = u64::from(self.dynamic_offset_alignment.max(1));
        bytes.div_ceil(alignment) * alignment
    }

    /// [`align_dynamic_offset`](Self::align_dynamic_offset), `None` on overflow.
    #[inline]
    #[must_use]
    pub fn checked_align_dynamic_offset(&self, bytes: u64) -> Option<u64> {
        let alignment = u64::from(self.dynamic_offset_alignment.max(1));
        bytes.div_ceil(alignment).checked_mul(alignment)
    }
}
