//! Shuffled LZ4 frame compressor.

use typeblob_core::{
    alloc_zeroed, CodecKind, CompressionLevel, Compressor, ElementLayout, Error, Result,
};

use crate::frame::{flavor_flags, FrameHeader, FLAG_MEMCPY, FLAG_SHUFFLE, HEADER_SIZE, MAX_OVERHEAD};
use crate::shuffle::shuffle_into;

/// Name under which the lossless codec was selected.
///
/// All flavors produce the same frame body; the flavor is recorded in the
/// frame flags and echoed in the blob header so readers see the name the
/// writer asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lz4Flavor {
    /// `blosclz`, the default alias.
    #[default]
    BloscLz,
    /// `lz4`.
    Lz4,
    /// `lz4hc`. Encoded with the standard LZ4 block matcher.
    Lz4Hc,
}

impl Lz4Flavor {
    /// All recognized flavors.
    pub const ALL: [Lz4Flavor; 3] = [Lz4Flavor::BloscLz, Lz4Flavor::Lz4, Lz4Flavor::Lz4Hc];

    /// Get flavor name as string.
    pub fn name(self) -> &'static str {
        match self {
            Lz4Flavor::BloscLz => "blosclz",
            Lz4Flavor::Lz4 => "lz4",
            Lz4Flavor::Lz4Hc => "lz4hc",
        }
    }

    /// Resolve an alias, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Code stored in the frame flags.
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            Lz4Flavor::BloscLz => 0,
            Lz4Flavor::Lz4 => 1,
            Lz4Flavor::Lz4Hc => 2,
        }
    }
}

/// Shuffled LZ4 frame compressor.
#[derive(Debug, Clone)]
pub struct Lz4FrameCompressor {
    level: CompressionLevel,
    flavor: Lz4Flavor,
}

impl Lz4FrameCompressor {
    /// Create a new compressor with the fastest level.
    pub fn new() -> Self {
        Self::with_level(CompressionLevel::FAST)
    }

    /// Create a new compressor with specified level.
    pub fn with_level(level: CompressionLevel) -> Self {
        Self {
            level,
            flavor: Lz4Flavor::default(),
        }
    }

    /// Set the flavor recorded in produced frames.
    pub fn with_flavor(mut self, flavor: Lz4Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Get the configured flavor.
    pub fn flavor(&self) -> Lz4Flavor {
        self.flavor
    }
}

impl Default for Lz4FrameCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for Lz4FrameCompressor {
    fn kind(&self) -> CodecKind {
        CodecKind::Lossless
    }

    fn level(&self) -> CompressionLevel {
        self.level
    }

    fn max_compressed_size(&self, input_len: usize, _layout: ElementLayout) -> usize {
        input_len.saturating_add(MAX_OVERHEAD)
    }

    fn compress_to(&self, input: &[u8], layout: ElementLayout, output: &mut [u8]) -> Result<usize> {
        let nbytes = u32::try_from(input.len()).map_err(|_| {
            Error::compression(format!("input of {} bytes exceeds frame limit", input.len()))
        })?;
        let required = input.len() + MAX_OVERHEAD;
        if output.len() < required {
            return Err(Error::buffer_too_small(required, output.len()));
        }

        let typesize = u8::try_from(layout.element_size)
            .ok()
            .filter(|&t| t > 0)
            .unwrap_or(1);
        let shuffle = typesize > 1 && input.len() >= usize::from(typesize);

        let block = if self.level.is_none() || input.is_empty() {
            None
        } else if shuffle {
            let mut filtered = alloc_zeroed(input.len())?;
            shuffle_into(input, usize::from(typesize), &mut filtered);
            Some(lz4_flex::block::compress(&filtered))
        } else {
            Some(lz4_flex::block::compress(input))
        };

        let mut flags = flavor_flags(self.flavor.code());
        let body_len = match block {
            Some(block) if block.len() < input.len() => {
                if shuffle {
                    flags |= FLAG_SHUFFLE;
                }
                output[HEADER_SIZE..HEADER_SIZE + block.len()].copy_from_slice(&block);
                block.len()
            }
            _ => {
                flags |= FLAG_MEMCPY;
                output[HEADER_SIZE..HEADER_SIZE + input.len()].copy_from_slice(input);
                input.len()
            }
        };

        FrameHeader::new(flags, typesize, nbytes, body_len)?.write(output);
        Ok(HEADER_SIZE + body_len)
    }
}
