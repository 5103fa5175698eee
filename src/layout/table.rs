//! Layout Table
//!
//! Static mapping from a WGSL host-shareable type name to its component count,
//! alignment, byte size and component encoding, following the WGSL
//! "Alignment and Size" table.
//!
//! | Type          | Align | Size | Notes                         |
//! |---------------|-------|------|-------------------------------|
//! | `f32`         | 4     | 4    |                               |
//! | `vec2f`       | 8     | 8    |                               |
//! | `vec3f`       | 16    | 12   | trailing 4 bytes stay free    |
//! | `vec4f`       | 16    | 16   |                               |
//! | `mat3x3f`     | 16    | 48   | each `vec3` column padded to 4 |
//! | `f16`         | 2     | 2    | encoded with `half`           |
//!
//! Both short (`vec3f`) and long (`vec3<f32>`) spellings resolve to the same
//! descriptor; the descriptor always carries the short, canonical name.

use super::position::BYTES_PER_ROW;

/// Numeric encoding of a single component inside the byte region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// 32-bit IEEE float (`f32`)
    Float32,
    /// 32-bit signed integer (`i32`)
    Sint32,
    /// 32-bit unsigned integer (`u32`)
    Uint32,
    /// 16-bit IEEE float (`f16`)
    Float16,
}

impl ViewKind {
    /// Size of one component in bytes.
    #[inline]
    #[must_use]
    pub const fn bytes_per_component(self) -> usize {
        match self {
            Self::Float32 | Self::Sint32 | Self::Uint32 => 4,
            Self::Float16 => 2,
        }
    }

    /// WGSL scalar name of the component.
    #[inline]
    #[must_use]
    pub const fn scalar_name(self) -> &'static str {
        match self {
            Self::Float32 => "f32",
            Self::Sint32 => "i32",
            Self::Uint32 => "u32",
            Self::Float16 => "f16",
        }
    }
}

/// Column padding of matrices whose columns are 3-component vectors:
/// `values` real components are followed by `padding` unused ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PadPattern {
    pub values: usize,
    pub padding: usize,
}

impl PadPattern {
    /// Length of one padded group.
    #[inline]
    #[must_use]
    pub const fn group(self) -> usize {
        self.values + self.padding
    }

    /// Maps a padded component index to the unpadded source index, or `None`
    /// for pad slots.
    #[inline]
    #[must_use]
    pub const fn source_index(self, padded_index: usize) -> Option<usize> {
        let lane = padded_index % self.group();
        if lane < self.values {
            Some(padded_index / self.group() * self.values + lane)
        } else {
            None
        }
    }
}

/// Shape category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Scalar,
    Atomic,
    Vector(usize),
    Matrix { columns: usize, rows: usize },
}

/// Immutable layout information of one WGSL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutDescriptor {
    /// Canonical (short) WGSL type name.
    pub name: &'static str,
    pub class: TypeClass,
    /// Components stored in the view, matrix column padding included.
    pub component_count: usize,
    pub alignment: usize,
    pub size: usize,
    pub view_kind: ViewKind,
    pub pad: Option<PadPattern>,
}

impl LayoutDescriptor {
    /// Components carried by a value, matrix column padding excluded.
    #[inline]
    #[must_use]
    pub const fn logical_component_count(&self) -> usize {
        match self.class {
            TypeClass::Matrix { columns, rows } => columns * rows,
            _ => self.component_count,
        }
    }

    #[inline]
    #[must_use]
    pub const fn bytes_per_component(&self) -> usize {
        self.view_kind.bytes_per_component()
    }
}

// ============================================================================
// Table construction
// ============================================================================

const fn scalar(name: &'static str, view_kind: ViewKind) -> LayoutDescriptor {
    let size = view_kind.bytes_per_component();
    LayoutDescriptor {
        name,
        class: TypeClass::Scalar,
        component_count: 1,
        alignment: size,
        size,
        view_kind,
        pad: None,
    }
}

const fn atomic(name: &'static str, view_kind: ViewKind) -> LayoutDescriptor {
    LayoutDescriptor {
        class: TypeClass::Atomic,
        ..scalar(name, view_kind)
    }
}

const fn vector_alignment(components: usize, view_kind: ViewKind) -> usize {
    let bytes = view_kind.bytes_per_component();
    if components == 2 { 2 * bytes } else { 4 * bytes }
}

const fn vector(name: &'static str, components: usize, view_kind: ViewKind) -> LayoutDescriptor {
    LayoutDescriptor {
        name,
        class: TypeClass::Vector(components),
        component_count: components,
        alignment: vector_alignment(components, view_kind),
        size: components * view_kind.bytes_per_component(),
        view_kind,
        pad: None,
    }
}

const fn matrix(name: &'static str, columns: usize, rows: usize, view_kind: ViewKind) -> LayoutDescriptor {
    // column stride == column alignment for vec2/vec3/vec4 columns
    let column_alignment = vector_alignment(rows, view_kind);
    let size = columns * column_alignment;
    LayoutDescriptor {
        name,
        class: TypeClass::Matrix { columns, rows },
        component_count: size / view_kind.bytes_per_component(),
        alignment: column_alignment,
        size,
        view_kind,
        pad: if rows == 3 {
            Some(PadPattern { values: 3, padding: 1 })
        } else {
            None
        },
    }
}

use ViewKind::{Float16 as H, Float32 as F, Sint32 as I, Uint32 as U};

static LAYOUTS: &[LayoutDescriptor] = &[
    // Scalars
    scalar("f32", F),
    scalar("i32", I),
    scalar("u32", U),
    scalar("f16", H),
    atomic("atomic<i32>", I),
    atomic("atomic<u32>", U),
    // Vectors
    vector("vec2f", 2, F),
    vector("vec3f", 3, F),
    vector("vec4f", 4, F),
    vector("vec2i", 2, I),
    vector("vec3i", 3, I),
    vector("vec4i", 4, I),
    vector("vec2u", 2, U),
    vector("vec3u", 3, U),
    vector("vec4u", 4, U),
    vector("vec2h", 2, H),
    vector("vec3h", 3, H),
    vector("vec4h", 4, H),
    // 32-bit matrices
    matrix("mat2x2f", 2, 2, F),
    matrix("mat2x3f", 2, 3, F),
    matrix("mat2x4f", 2, 4, F),
    matrix("mat3x2f", 3, 2, F),
    matrix("mat3x3f", 3, 3, F),
    matrix("mat3x4f", 3, 4, F),
    matrix("mat4x2f", 4, 2, F),
    matrix("mat4x3f", 4, 3, F),
    matrix("mat4x4f", 4, 4, F),
    // 16-bit matrices
    matrix("mat2x2h", 2, 2, H),
    matrix("mat2x3h", 2, 3, H),
    matrix("mat2x4h", 2, 4, H),
    matrix("mat3x2h", 3, 2, H),
    matrix("mat3x3h", 3, 3, H),
    matrix("mat3x4h", 3, 4, H),
    matrix("mat4x2h", 4, 2, H),
    matrix("mat4x3h", 4, 3, H),
    matrix("mat4x4h", 4, 4, H),
];

/// Every supported descriptor.
#[must_use]
pub fn all() -> &'static [LayoutDescriptor] {
    LAYOUTS
}

/// Resolves a type name (short or long spelling, no `array<…>` wrapper).
#[must_use]
pub fn lookup(type_name: &str) -> Option<&'static LayoutDescriptor> {
    let compact: String = type_name.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some(layout) = LAYOUTS.iter().find(|layout| layout.name == compact) {
        return Some(layout);
    }

    // Long spelling: `vec3<f32>`, `mat4x4<f16>`
    let (base, rest) = compact.split_once('<')?;
    let component = rest.strip_suffix('>')?;
    if !(base.starts_with("vec") || base.starts_with("mat")) {
        return None;
    }
    let suffix = match component {
        "f32" => "f",
        "f16" => "h",
        "i32" => "i",
        "u32" => "u",
        _ => return None,
    };

    let short = format!("{base}{suffix}");
    LAYOUTS.iter().find(|layout| layout.name == short)
}

/// `true` when every supported alignment divides a 16-byte row.
#[must_use]
pub fn alignments_fit_rows() -> bool {
    LAYOUTS.iter().all(|layout| BYTES_PER_ROW % layout.alignment == 0)
}
