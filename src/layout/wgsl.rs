use std::borrow::Cow;

use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat3A, Mat4, UVec2, UVec3, UVec4, Vec2, Vec3, Vec3A, Vec4};

// ============================================================================
// Rust Type -> WGSL Type String
// ============================================================================

/// Maps a Rust value type to the WGSL type it is packed as.
pub trait WgslType {
    fn wgsl_type_name() -> Cow<'static, str>;
}

macro_rules! impl_wgsl_type {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl WgslType for $ty {
                fn wgsl_type_name() -> Cow<'static, str> { $name.into() }
            }
        )*
    };
}

impl_wgsl_type!(
    f32 => "f32",
    i32 => "i32",
    u32 => "u32",
    half::f16 => "f16",
    Vec2 => "vec2f",
    Vec3 => "vec3f",
    Vec3A => "vec3f",
    Vec4 => "vec4f",
    IVec2 => "vec2i",
    IVec3 => "vec3i",
    IVec4 => "vec4i",
    UVec2 => "vec2u",
    UVec3 => "vec3u",
    UVec4 => "vec4u",
    Mat2 => "mat2x2f",
    Mat3 => "mat3x3f",
    Mat3A => "mat3x3f",
    Mat4 => "mat4x4f",
);

// Fixed-length array: array<T, N>
impl<T: WgslType, const N: usize> WgslType for [T; N] {
    fn wgsl_type_name() -> Cow<'static, str> {
        format!("array<{}, {}>", T::wgsl_type_name(), N).into()
    }
}

// Length decided by the data: array<T>
impl<T: WgslType> WgslType for Vec<T> {
    fn wgsl_type_name() -> Cow<'static, str> {
        format!("array<{}>", T::wgsl_type_name()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_names() {
        assert_eq!(<[Vec4; 8]>::wgsl_type_name(), "array<vec4f, 8>");
        assert_eq!(<Vec<Mat4>>::wgsl_type_name(), "array<mat4x4f>");
        assert_eq!(half::f16::wgsl_type_name(), "f16");
    }
}
