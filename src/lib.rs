#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! WGSL buffer packing engine.
//!
//! Takes a set of named, typed values (scalars, vectors, matrices, arrays and
//! "array of struct" groups), computes a deterministic byte layout following
//! the WGSL memory model, keeps the packed bytes in sync with the values and
//! emits the shader declaration describing the very same layout.
//!
//! ```rust,ignore
//! use glam::Vec3;
//! use myth_layout::{BufferBinding, BufferBindingDescriptor, Input};
//!
//! let mut binding = BufferBinding::new(
//!     BufferBindingDescriptor::uniform("material")
//!         .with_input("opacity", Input::new("f32", 1.0_f32))
//!         .with_input("color", Input::new("vec3f", Vec3::X)),
//! )?;
//!
//! binding.set_value("opacity", 0.5_f32);
//! binding.update();
//! assert_eq!(binding.byte_size(), 32);
//! ```

pub mod binding;
pub mod elements;
pub mod errors;
pub mod gpu;
pub mod layout;
pub mod settings;

pub use binding::{
    AccessMode, BindingKind, BufferBinding, BufferBindingDescriptor, ByteRegion, Input,
    InputValue, OffsetChildBinding, OffsetChildDescriptor, ResourceLayoutDescriptor,
    ShaderDeclaration,
};
pub use elements::{ArrayElement, Element, InterleavedArrayElement, ScalarElement};
pub use errors::{LayoutError, LayoutWarning, Result};
pub use gpu::{GpuBindingBuffer, UploadSink};
pub use layout::{LayoutDescriptor, ViewKind, WgslType};
pub use settings::LayoutSettings;
