//! Type layouts
//!
//! - [`table`]: WGSL type name -> [`LayoutDescriptor`]
//! - [`position`]: the 16-byte row grid values are placed on
//! - [`wgsl`]: Rust type -> WGSL type name
//!
//! Declared input types are parsed by [`TypeDecl::parse`], which strips an
//! optional `array<T>` / `array<T, N>` wrapper before the table lookup.

pub mod position;
pub mod table;
pub mod wgsl;

pub use position::{BYTES_PER_ROW, BYTES_PER_SLOT, Position, Span, align_to};
pub use table::{LayoutDescriptor, PadPattern, TypeClass, ViewKind, lookup};
pub use wgsl::WgslType;

use crate::errors::{LayoutError, Result};

/// Array wrapper of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayDecl {
    /// `Some(N)` for `array<T, N>`, `None` for `array<T>`.
    pub length: Option<usize>,
}

/// A parsed input type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDecl {
    pub layout: &'static LayoutDescriptor,
    pub array: Option<ArrayDecl>,
}

impl TypeDecl {
    /// Parses `T`, `array<T>` or `array<T, N>` for the input named `input`.
    pub fn parse(input: &str, declaration: &str) -> Result<Self> {
        let compact: String = declaration.chars().filter(|c| !c.is_whitespace()).collect();

        let malformed = || LayoutError::MalformedType {
            input: input.to_string(),
            declaration: declaration.to_string(),
        };

        let (inner, array) = match compact.strip_prefix("array<") {
            Some(rest) => {
                let body = rest.strip_suffix('>').ok_or_else(malformed)?;
                let (element, length) = split_array_body(body).ok_or_else(malformed)?;
                let length = match length {
                    Some(text) => Some(text.parse::<usize>().map_err(|_| malformed())?),
                    None => None,
                };
                if length == Some(0) {
                    return Err(malformed());
                }
                (element, Some(ArrayDecl { length }))
            }
            None => (compact.as_str(), None),
        };

        if inner.is_empty() || inner.matches('<').count() != inner.matches('>').count() {
            return Err(malformed());
        }

        let layout = lookup(inner).ok_or_else(|| LayoutError::UnknownType {
            input: input.to_string(),
            type_name: inner.to_string(),
        })?;

        Ok(Self { layout, array })
    }

    #[inline]
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.array.is_some()
    }

    /// Declared repetition count, if any.
    #[inline]
    #[must_use]
    pub fn declared_length(&self) -> Option<usize> {
        self.array.and_then(|array| array.length)
    }

    /// Repetition count for an array value of `components` components.
    ///
    /// A declared length always wins; otherwise the count is
    /// `ceil(components / component_count)`, never less than one. Padded
    /// matrices count real components instead when only that divides evenly
    /// (27 values are three `mat3x3f`, 36 values stay three padded ones).
    #[must_use]
    pub fn repetitions(&self, components: usize) -> usize {
        let layout = self.layout;
        let logical = layout.logical_component_count();
        let per_value = if layout.pad.is_some()
            && components % logical == 0
            && components % layout.component_count != 0
        {
            logical
        } else {
            layout.component_count
        };

        self.declared_length()
            .unwrap_or_else(|| components.div_ceil(per_value))
            .max(1)
    }
}

/// Splits `T` or `T,N` at the last top-level comma.
fn split_array_body(body: &str) -> Option<(&str, Option<&str>)> {
    let mut depth = 0i32;
    let mut split = None;
    for (index, c) in body.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => split = Some(index),
            _ => {}
        }
        if depth < 0 {
            return None;
        }
    }
    if depth != 0 {
        return None;
    }

    Some(match split {
        Some(index) => (&body[..index], Some(&body[index + 1..])),
        None => (body, None),
    })
}
