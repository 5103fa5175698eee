//! Error Types
//!
//! This module defines the error and warning types used by the packing engine.
//!
//! # Overview
//!
//! Failures fall into two groups:
//! - [`LayoutError`]: fatal to constructing one binding. A binding that failed
//!   to build is never handed out half-initialised.
//! - [`LayoutWarning`]: recoverable. The binding stays usable with reduced
//!   contents (or a skipped update), the warning is logged through `log::warn!`
//!   and kept on the binding for inspection.
//!
//! # Usage
//!
//! Constructors return [`Result<T>`] which is an alias for
//! `std::result::Result<T, LayoutError>`.
//!
//! ```rust,ignore
//! use myth_layout::{BufferBinding, BufferBindingDescriptor, Result};
//!
//! fn build() -> Result<BufferBinding> {
//!     BufferBinding::new(BufferBindingDescriptor::uniform("params"))
//! }
//! ```

use thiserror::Error;

/// Fatal layout errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    // ========================================================================
    // Type resolution
    // ========================================================================
    /// The declared type of an input has no layout descriptor.
    #[error("Unknown WGSL type `{type_name}` for input `{input}`")]
    UnknownType {
        /// Key of the offending input
        input: String,
        /// The (already unwrapped) type name that failed to resolve
        type_name: String,
    },

    /// The declared type string could not be parsed (e.g. `array<vec3f`).
    #[error("Malformed type declaration `{declaration}` for input `{input}`")]
    MalformedType {
        /// Key of the offending input
        input: String,
        /// The declaration as written
        declaration: String,
    },

    /// Two fields (or flat variables) of the declaration share one name.
    #[error("Binding `{binding}` declares `{field}` twice")]
    DuplicateField {
        /// Name of the binding
        binding: String,
        /// The clashing identifier
        field: String,
    },

    // ========================================================================
    // Offset children
    // ========================================================================
    /// An offset child was built without a parent binding.
    #[error("Offset child binding `{child}` has no parent binding")]
    MissingParent {
        /// Name of the child binding
        child: String,
    },

    /// The parent of an offset child is not made of interleaved array elements.
    #[error("Parent binding `{parent}` must only contain interleaved array elements")]
    ParentNotInterleaved {
        /// Name of the parent binding
        parent: String,
    },

    /// The child slice does not fit inside the parent's byte region.
    #[error("Offset child slice {offset}..{} exceeds parent size {parent_size}", .offset + .size)]
    ChildOutOfBounds {
        /// Byte offset of the child inside the parent
        offset: u64,
        /// Byte size of the child
        size: u64,
        /// Byte size of the parent region
        parent_size: u64,
    },

    // ========================================================================
    // Lookups
    // ========================================================================
    /// No input with that key exists on the binding.
    #[error("Binding `{binding}` has no input named `{input}`")]
    UnknownInput {
        /// Name of the binding
        binding: String,
        /// Requested input key
        input: String,
    },
}

/// Recoverable layout and update problems.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutWarning {
    /// Array inputs meant to be interleaved have different repetition counts.
    /// The whole group was dropped from the binding.
    #[error("Interleaved arrays {inputs:?} have unequal lengths {counts:?}; group dropped")]
    InterleavedLengthMismatch {
        /// Keys of the dropped inputs
        inputs: Vec<String>,
        /// Repetition count of each input, in the same order
        counts: Vec<usize>,
    },

    /// A uniform binding holds an array whose stride is not a multiple of 16.
    #[error("Uniform array `{input}` has stride {stride}, WGSL requires a multiple of 16")]
    UniformArrayStride {
        /// Key of the array input
        input: String,
        /// Computed stride in bytes
        stride: usize,
    },

    /// A value of the wrong shape was assigned; the update was skipped.
    #[error("Input `{input}` expects {expected}; update skipped")]
    ValueShapeMismatch {
        /// Key of the input
        input: String,
        /// Human readable description of the accepted shapes
        expected: &'static str,
    },

    /// A flat binding declares several variables over one buffer. Only the
    /// first one starts at offset 0, where the single bound buffer begins.
    #[error("Flat binding `{binding}` declares {variables} variables over one buffer")]
    FlatSharedBuffer {
        /// Name of the binding
        binding: String,
        /// Number of top-level variables
        variables: usize,
    },

    /// An array value had more components than the layout reserved.
    #[error("Input `{input}` provided {provided} components, only {capacity} were written")]
    ArrayTruncated {
        /// Key of the input
        input: String,
        /// Number of components in the value
        provided: usize,
        /// Number of components the element can hold
        capacity: usize,
    },
}

/// Alias for `Result<T, LayoutError>`.
pub type Result<T> = std::result::Result<T, LayoutError>;
