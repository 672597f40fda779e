//! Shuffled LZ4 frame codec (combined compressor + decompressor).

use typeblob_core::{
    Codec, CodecKind, CompressionLevel, Compressor, Decompressor, ElementLayout, Result,
};

use crate::compress::{Lz4Flavor, Lz4FrameCompressor};
use crate::decompress::Lz4FrameDecompressor;

/// Lossless codec combining compression and decompression.
#[derive(Debug, Clone, Default)]
pub struct Lz4FrameCodec {
    compressor: Lz4FrameCompressor,
    decompressor: Lz4FrameDecompressor,
}

impl Lz4FrameCodec {
    /// Create a new codec with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec for a flavor and level.
    pub fn with_flavor(flavor: Lz4Flavor, level: CompressionLevel) -> Self {
        Self {
            compressor: Lz4FrameCompressor::with_level(level).with_flavor(flavor),
            decompressor: Lz4FrameDecompressor::new(),
        }
    }

    /// Get the configured flavor.
    pub fn flavor(&self) -> Lz4Flavor {
        self.compressor.flavor()
    }
}

impl Compressor for Lz4FrameCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Lossless
    }

    fn level(&self) -> CompressionLevel {
        self.compressor.level()
    }

    fn max_compressed_size(&self, input_len: usize, layout: ElementLayout) -> usize {
        self.compressor.max_compressed_size(input_len, layout)
    }

    fn compress_to(&self, input: &[u8], layout: ElementLayout, output: &mut [u8]) -> Result<usize> {
        self.compressor.compress_to(input, layout, output)
    }
}

impl Decompressor for Lz4FrameCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Lossless
    }

    fn decompress_to(&self, input: &[u8], layout: ElementLayout, output: &mut [u8]) -> Result<()> {
        self.decompressor.decompress_to(input, layout, output)
    }
}

impl Codec for Lz4FrameCodec {
    fn with_level(level: CompressionLevel) -> Self {
        Self::with_flavor(Lz4Flavor::default(), level)
    }
}
