//! Logical inputs
//!
//! An [`Input`] is a named, typed value the application wants visible to a
//! shader. Its value is an [`InputValue`], a tagged variant decided when the
//! value is assigned, so the packing code never has to probe shapes at runtime.
//!
//! Dirty tracking is explicit: [`BufferBinding::set_value`] stores the value and
//! raises the dirty flag, [`BufferBinding::update`] writes every dirty input
//! and clears the flag.
//!
//! [`BufferBinding::set_value`]: crate::BufferBinding::set_value
//! [`BufferBinding::update`]: crate::BufferBinding::update

use std::fmt;
use std::sync::Arc;

use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat3A, Mat4, UVec2, UVec3, UVec4, Vec2, Vec3, Vec3A, Vec4};
use smallvec::SmallVec;

use crate::layout::{TypeDecl, WgslType};

/// Callback run on a dirty input right before it is written.
pub type UpdateCallback = Arc<dyn Fn(&mut InputValue) + Send + Sync>;

/// The value of a logical input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// A single number (`f32`, `i32`, `u32`, `f16`, atomics).
    Scalar(f64),
    Vector2(Vec2),
    Vector3(Vec3),
    Vector4(Vec4),
    /// Column-major matrix components, unpadded (9 for a 3x3) or padded (12).
    Matrix(SmallVec<[f32; 16]>),
    /// Flat float components.
    Sequence(Vec<f32>),
    /// Flat signed integer components.
    SintSequence(Vec<i32>),
    /// Flat unsigned integer components.
    UintSequence(Vec<u32>),
}

impl InputValue {
    /// Number of flat components carried by the value.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Vector2(_) => 2,
            Self::Vector3(_) => 3,
            Self::Vector4(_) => 4,
            Self::Matrix(m) => m.len(),
            Self::Sequence(s) => s.len(),
            Self::SintSequence(s) => s.len(),
            Self::UintSequence(s) => s.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat component `index`, if present.
    #[inline]
    #[must_use]
    pub fn component(&self, index: usize) -> Option<f64> {
        match self {
            Self::Scalar(v) => (index == 0).then_some(*v),
            Self::Vector2(v) => v.to_array().get(index).copied().map(f64::from),
            Self::Vector3(v) => v.to_array().get(index).copied().map(f64::from),
            Self::Vector4(v) => v.to_array().get(index).copied().map(f64::from),
            Self::Matrix(m) => m.get(index).copied().map(f64::from),
            Self::Sequence(s) => s.get(index).copied().map(f64::from),
            Self::SintSequence(s) => s.get(index).copied().map(f64::from),
            Self::UintSequence(s) => s.get(index).copied().map(f64::from),
        }
    }

    /// `true` for values that can fill an array element.
    #[inline]
    #[must_use]
    pub fn is_array_like(&self) -> bool {
        matches!(
            self,
            Self::Matrix(_) | Self::Sequence(_) | Self::SintSequence(_) | Self::UintSequence(_)
        )
    }

    /// All flat components, for inspection and tests.
    #[must_use]
    pub fn to_components(&self) -> Vec<f64> {
        (0..self.len()).filter_map(|i| self.component(i)).collect()
    }
}

// ============================================================================
// Conversions
// ============================================================================

macro_rules! impl_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for InputValue {
                fn from(value: $ty) -> Self { Self::Scalar(f64::from(value)) }
            }
        )*
    };
}

impl_from_scalar!(f32, f64, i32, u32, i16, u16, u8);

impl From<half::f16> for InputValue {
    fn from(value: half::f16) -> Self {
        Self::Scalar(value.to_f64())
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Scalar(if value { 1.0 } else { 0.0 })
    }
}

impl From<Vec2> for InputValue {
    fn from(value: Vec2) -> Self {
        Self::Vector2(value)
    }
}

impl From<Vec3> for InputValue {
    fn from(value: Vec3) -> Self {
        Self::Vector3(value)
    }
}

impl From<Vec3A> for InputValue {
    fn from(value: Vec3A) -> Self {
        Self::Vector3(value.into())
    }
}

impl From<Vec4> for InputValue {
    fn from(value: Vec4) -> Self {
        Self::Vector4(value)
    }
}

macro_rules! impl_from_int_vector {
    ($variant:ident: $($ty:ty),*) => {
        $(
            impl From<$ty> for InputValue {
                fn from(value: $ty) -> Self { Self::$variant(value.to_array().to_vec()) }
            }
        )*
    };
}

impl_from_int_vector!(SintSequence: IVec2, IVec3, IVec4);
impl_from_int_vector!(UintSequence: UVec2, UVec3, UVec4);

macro_rules! impl_from_matrix {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for InputValue {
                fn from(value: $ty) -> Self {
                    Self::Matrix(SmallVec::from_slice(&value.to_cols_array()))
                }
            }
        )*
    };
}

impl_from_matrix!(Mat2, Mat3, Mat3A, Mat4);

impl From<Vec<f32>> for InputValue {
    fn from(value: Vec<f32>) -> Self {
        Self::Sequence(value)
    }
}

impl From<&[f32]> for InputValue {
    fn from(value: &[f32]) -> Self {
        Self::Sequence(value.to_vec())
    }
}

impl<const N: usize> From<[f32; N]> for InputValue {
    fn from(value: [f32; N]) -> Self {
        Self::Sequence(value.to_vec())
    }
}

impl From<Vec<i32>> for InputValue {
    fn from(value: Vec<i32>) -> Self {
        Self::SintSequence(value)
    }
}

impl From<Vec<u32>> for InputValue {
    fn from(value: Vec<u32>) -> Self {
        Self::UintSequence(value)
    }
}

impl<const N: usize> From<[u32; N]> for InputValue {
    fn from(value: [u32; N]) -> Self {
        Self::UintSequence(value.to_vec())
    }
}

macro_rules! impl_from_vector_list {
    ($($ty:ty),*) => {
        $(
            impl From<Vec<$ty>> for InputValue {
                fn from(value: Vec<$ty>) -> Self {
                    Self::Sequence(value.iter().flat_map(|v| v.to_array()).collect())
                }
            }

            impl From<&[$ty]> for InputValue {
                fn from(value: &[$ty]) -> Self {
                    Self::Sequence(value.iter().flat_map(|v| v.to_array()).collect())
                }
            }
        )*
    };
}

impl_from_vector_list!(Vec2, Vec3, Vec4);

macro_rules! impl_from_matrix_list {
    ($($ty:ty),*) => {
        $(
            impl From<Vec<$ty>> for InputValue {
                fn from(value: Vec<$ty>) -> Self {
                    Self::Sequence(value.iter().flat_map(<$ty>::to_cols_array).collect())
                }
            }

            impl From<&[$ty]> for InputValue {
                fn from(value: &[$ty]) -> Self {
                    Self::Sequence(value.iter().flat_map(<$ty>::to_cols_array).collect())
                }
            }
        )*
    };
}

impl_from_matrix_list!(Mat2, Mat4);

/// 3x3 matrix lists are padded to the `mat3x3` column layout (12 components
/// per matrix), so the repetition count of the list is unambiguous.
fn padded_mat3_list(columns: impl Iterator<Item = Vec3>) -> InputValue {
    InputValue::Sequence(columns.flat_map(|column| column.extend(0.0).to_array()).collect())
}

impl From<Vec<Mat3>> for InputValue {
    fn from(value: Vec<Mat3>) -> Self {
        padded_mat3_list(value.iter().flat_map(|m| [m.x_axis, m.y_axis, m.z_axis]))
    }
}

impl From<&[Mat3]> for InputValue {
    fn from(value: &[Mat3]) -> Self {
        padded_mat3_list(value.iter().flat_map(|m| [m.x_axis, m.y_axis, m.z_axis]))
    }
}

// ============================================================================
// Input
// ============================================================================

/// Declaration of one input: WGSL type, initial value and options.
#[derive(Clone)]
pub struct Input {
    /// Declared type: `T`, `array<T>` or `array<T, N>`.
    pub type_name: String,
    pub value: InputValue,
    /// Field name used in the shader text. Defaults to the input key.
    pub name: Option<String>,
    pub on_before_update: Option<UpdateCallback>,
}

impl Input {
    pub fn new(type_name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        Self {
            type_name: type_name.into(),
            value: value.into(),
            name: None,
            on_before_update: None,
        }
    }

    /// Infers the WGSL type from the Rust type of `value`.
    pub fn of<T: WgslType + Into<InputValue>>(value: T) -> Self {
        Self::new(T::wgsl_type_name(), value)
    }

    /// Overrides the field name used in the shader text.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Registers a callback run on the value right before each write.
    #[must_use]
    pub fn on_before_update(mut self, callback: impl Fn(&mut InputValue) + Send + Sync + 'static) -> Self {
        self.on_before_update = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("type_name", &self.type_name)
            .field("value", &self.value)
            .field("name", &self.name)
            .field("on_before_update", &self.on_before_update.is_some())
            .finish()
    }
}

/// An input owned by a binding.
#[derive(Clone)]
pub(crate) struct LogicalInput {
    pub key: String,
    pub name: String,
    /// Type as written by the caller.
    pub declaration: String,
    pub decl: TypeDecl,
    pub value: InputValue,
    pub dirty: bool,
    pub on_before_update: Option<UpdateCallback>,
    /// Index of the element packing this input.
    pub element: usize,
}

impl LogicalInput {
    pub fn new(key: String, input: Input, decl: TypeDecl) -> Self {
        Self {
            name: input.name.unwrap_or_else(|| key.clone()),
            key,
            declaration: input.type_name,
            decl,
            value: input.value,
            dirty: true,
            on_before_update: input.on_before_update,
            element: usize::MAX,
        }
    }

    /// Declaration that rebuilds this input with its current value.
    pub fn to_input(&self) -> Input {
        Input {
            type_name: self.declaration.clone(),
            value: self.value.clone(),
            name: Some(self.name.clone()),
            on_before_update: self.on_before_update.clone(),
        }
    }
}
