//! Byte-plane shuffle filter.
//!
//! Groups byte `k` of every element together so that slowly varying
//! numeric data (exponents, high-order bytes) forms long runs the LZ4
//! matcher can exploit. Trailing bytes that do not fill a whole element
//! are copied unchanged.

/// Shuffle `src` into `dst` by element byte position.
///
/// `dst` must be the same length as `src`.
pub fn shuffle_into(src: &[u8], typesize: usize, dst: &mut [u8]) {
    debug_assert_eq!(src.len(), dst.len());
    if typesize <= 1 {
        dst.copy_from_slice(src);
        return;
    }

    let count = src.len() / typesize;
    let body = count * typesize;

    for (i, element) in src[..body].chunks_exact(typesize).enumerate() {
        for (plane, &byte) in element.iter().enumerate() {
            dst[plane * count + i] = byte;
        }
    }
    dst[body..].copy_from_slice(&src[body..]);
}

/// Reverse [`shuffle_into`].
pub fn unshuffle_into(src: &[u8], typesize: usize, dst: &mut [u8]) {
    debug_assert_eq!(src.len(), dst.len());
    if typesize <= 1 {
        dst.copy_from_slice(src);
        return;
    }

    let count = src.len() / typesize;
    let body = count * typesize;

    for (i, element) in dst[..body].chunks_exact_mut(typesize).enumerate() {
        for (plane, byte) in element.iter_mut().enumerate() {
            *byte = src[plane * count + i];
        }
    }
    dst[body..].copy_from_slice(&src[body..]);
}
