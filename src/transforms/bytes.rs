//! Allocation-free byte<->f32/i16 marshaling shared by the stock kernels.
//! `Transform::execute` must not allocate (spec.md §4.2), so every kernel
//! below reads/writes fixed-width little-endian scalars directly against
//! the arena slices instead of building intermediate `Vec`s.

#[inline]
pub(crate) fn read_f32(buf: &[u8], idx: usize) -> f32 {
    let o = idx * 4;
    f32::from_le_bytes([buf[o], buf[o + 1], buf[o + 2], buf[o + 3]])
}

#[inline]
pub(crate) fn write_f32(buf: &mut [u8], idx: usize, v: f32) {
    let o = idx * 4;
    buf[o..o + 4].copy_from_slice(&v.to_le_bytes());
}

#[inline]
pub(crate) fn read_i16(buf: &[u8], idx: usize) -> i16 {
    let o = idx * 2;
    i16::from_le_bytes([buf[o], buf[o + 1]])
}

/// Checks a float output block for NaN/Inf, the condition spec.md §7's
/// `ExecutionError` row calls out ("fatal values, NaN, overflow").
pub(crate) fn validate_f32_block(buf: &[u8], len: usize) -> Result<(), String> {
    for i in 0..len {
        let v = read_f32(buf, i);
        if !v.is_finite() {
            return Err(format!("non-finite value {v} at element {i}"));
        }
    }
    Ok(())
}
