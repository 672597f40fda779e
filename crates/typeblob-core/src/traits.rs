//! Core traits for payload codecs.
//!
//! ## Trait Hierarchy
//!
//! ```text
//! Compressor / Decompressor  (one-shot, layout-aware)
//!       ↓
//! Codec  (combined compress + decompress)
//! ```
//!
//! Codecs receive the element layout of the raw payload so that
//! type-aware filters (byte shuffling, float quantization) can be applied
//! and domain constraints enforced.

use crate::error::{alloc_zeroed, Result};
use crate::types::{CodecKind, CompressionLevel, ElementLayout};

/// One-shot compression operations.
pub trait Compressor {
    /// Get the codec family.
    fn kind(&self) -> CodecKind;

    /// Get the configured compression level.
    fn level(&self) -> CompressionLevel;

    /// Calculate maximum compressed size for input length.
    /// Useful for pre-allocating output buffers.
    fn max_compressed_size(&self, input_len: usize, layout: ElementLayout) -> usize;

    /// Compress data into existing buffer.
    ///
    /// # Arguments
    /// * `input` - Raw element bytes
    /// * `layout` - Element layout of `input`
    /// * `output` - Buffer to write compressed data
    ///
    /// # Returns
    /// Number of bytes written to output.
    fn compress_to(&self, input: &[u8], layout: ElementLayout, output: &mut [u8]) -> Result<usize>;

    /// Compress data in one shot.
    fn compress(&self, input: &[u8], layout: ElementLayout) -> Result<Vec<u8>> {
        let mut output = alloc_zeroed(self.max_compressed_size(input.len(), layout))?;
        let written = self.compress_to(input, layout, &mut output)?;
        output.truncate(written);
        Ok(output)
    }
}

/// One-shot decompression operations.
pub trait Decompressor {
    /// Get the codec family.
    fn kind(&self) -> CodecKind;

    /// Decompress data into a buffer of exactly the original size.
    ///
    /// # Arguments
    /// * `input` - Compressed data
    /// * `layout` - Element layout of the original payload
    /// * `output` - Destination, sized to the raw payload
    ///
    /// Fails if the compressed data does not describe exactly
    /// `output.len()` bytes.
    fn decompress_to(&self, input: &[u8], layout: ElementLayout, output: &mut [u8]) -> Result<()>;

    /// Decompress with known output size.
    fn decompress_with_size(
        &self,
        input: &[u8],
        layout: ElementLayout,
        output_size: usize,
    ) -> Result<Vec<u8>> {
        let mut output = alloc_zeroed(output_size)?;
        self.decompress_to(input, layout, &mut output)?;
        Ok(output)
    }
}

/// Combined compression and decompression.
pub trait Codec: Compressor + Decompressor {
    /// Create a new codec at the given level.
    fn with_level(level: CompressionLevel) -> Self
    where
        Self: Sized;

    /// Check if decoding may not reproduce the input bit-exactly.
    fn is_lossy(&self) -> bool {
        Compressor::kind(self).is_lossy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Stores the payload verbatim.
    struct Identity;

    impl Compressor for Identity {
        fn kind(&self) -> CodecKind {
            CodecKind::None
        }

        fn level(&self) -> CompressionLevel {
            CompressionLevel::NONE
        }

        fn max_compressed_size(&self, input_len: usize, _layout: ElementLayout) -> usize {
            input_len
        }

        fn compress_to(&self, input: &[u8], _layout: ElementLayout, output: &mut [u8]) -> Result<usize> {
            output[..input.len()].copy_from_slice(input);
            Ok(input.len())
        }
    }

    impl Decompressor for Identity {
        fn kind(&self) -> CodecKind {
            CodecKind::None
        }

        fn decompress_to(&self, input: &[u8], _layout: ElementLayout, output: &mut [u8]) -> Result<()> {
            if input.len() != output.len() {
                return Err(Error::compression("size mismatch"));
            }
            output.copy_from_slice(input);
            Ok(())
        }
    }

    #[test]
    fn test_default_methods() {
        let data = b"typed blob".to_vec();
        let packed = Identity.compress(&data, ElementLayout::BYTES).unwrap();
        assert_eq!(packed, data);

        let restored = Identity
            .decompress_with_size(&packed, ElementLayout::BYTES, data.len())
            .unwrap();
        assert_eq!(restored, data);

        assert!(Identity
            .decompress_with_size(&packed, ElementLayout::BYTES, data.len() + 1)
            .is_err());
    }
}
