//! Raw little-endian component access into a byte region.
//!
//! All offsets are absolute byte offsets. Callers guarantee the range is in
//! bounds; element spans are computed so that it always is.

use half::f16;

use crate::layout::ViewKind;

#[inline]
pub fn set_f32(bytes: &mut [u8], offset: usize, value: f32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn set_i32(bytes: &mut [u8], offset: usize, value: i32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn set_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn set_f16(bytes: &mut [u8], offset: usize, value: f16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_bits().to_le_bytes());
}

#[inline]
fn read<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    bytemuck::pod_read_unaligned(&bytes[offset..offset + N])
}

#[inline]
#[must_use]
pub fn get_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes(read(bytes, offset))
}

#[inline]
#[must_use]
pub fn get_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes(read(bytes, offset))
}

#[inline]
#[must_use]
pub fn get_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(read(bytes, offset))
}

#[inline]
#[must_use]
pub fn get_f16(bytes: &[u8], offset: usize) -> f16 {
    f16::from_bits(u16::from_le_bytes(read(bytes, offset)))
}

/// Writes one component, converting it to the view's encoding.
///
/// Integer views truncate toward zero and saturate at the type bounds.
#[inline]
pub fn set_component(bytes: &mut [u8], offset: usize, kind: ViewKind, value: f64) {
    match kind {
        ViewKind::Float32 => set_f32(bytes, offset, value as f32),
        ViewKind::Sint32 => set_i32(bytes, offset, value as i32),
        ViewKind::Uint32 => set_u32(bytes, offset, value as u32),
        ViewKind::Float16 => set_f16(bytes, offset, f16::from_f64(value)),
    }
}

/// Reads one component back as `f64` (exact for every view kind).
#[inline]
#[must_use]
pub fn get_component(bytes: &[u8], offset: usize, kind: ViewKind) -> f64 {
    match kind {
        ViewKind::Float32 => f64::from(get_f32(bytes, offset)),
        ViewKind::Sint32 => f64::from(get_i32(bytes, offset)),
        ViewKind::Uint32 => f64::from(get_u32(bytes, offset)),
        ViewKind::Float16 => get_f16(bytes, offset).to_f64(),
    }
}

/// Copies `count` components of `kind` from `src[src_offset..]` into
/// `dst[dst_offset..]`. Both sides share the encoding, so the copy is bitwise.
#[inline]
pub fn copy_components(
    src: &[u8],
    src_offset: usize,
    dst: &mut [u8],
    dst_offset: usize,
    kind: ViewKind,
    count: usize,
) {
    let len = count * kind.bytes_per_component();
    dst[dst_offset..dst_offset + len].copy_from_slice(&src[src_offset..src_offset + len]);
}
