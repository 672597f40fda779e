//! Codec selection and dispatch.
//!
//! A [`CompressionSelection`] is parsed once from a compressor name and
//! level, then drives every pack and unpack through an enum dispatch.

use std::fmt;

use tracing::debug;
use typeblob_core::{
    alloc_zeroed, CodecKind, CompressionLevel, Compressor, Decompressor, ElementLayout, Error,
    Result,
};
use typeblob_lz4::{frame_sizes, Lz4Flavor, Lz4FrameCodec, MAX_OVERHEAD};
use typeblob_quant::{check_payload_len, Quantizer16};

/// Name of the linear quantizer.
pub const QLIN16: &str = "QLIN16";

/// Name of the logarithmic quantizer.
pub const QLOG16: &str = "QLOG16";

/// Parsed codec choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Choice {
    None,
    Lossless(Lz4Flavor),
    LinearQuant,
    LogQuant,
}

/// Immutable codec and level chosen for packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressionSelection {
    choice: Choice,
    level: CompressionLevel,
}

impl Default for CompressionSelection {
    fn default() -> Self {
        Self::none()
    }
}

impl CompressionSelection {
    /// Store payloads uncompressed.
    pub const fn none() -> Self {
        CompressionSelection {
            choice: Choice::None,
            level: CompressionLevel::NONE,
        }
    }

    /// Resolve a compressor name and level.
    ///
    /// Names match ignoring ASCII case; surrounding whitespace is part of
    /// the name. Level 0 or an empty name selects no compression whatever
    /// the name.
    pub fn select(name: &str, level: i32) -> Result<Self> {
        let level = CompressionLevel::from_level(level)?;
        if level.is_none() || name.is_empty() {
            return Ok(Self::none());
        }

        let choice = resolve(name).ok_or_else(|| Error::UnknownCompressor(name.to_string()))?;
        debug!(compressor = name, level = level.to_level(), "compressor selected");
        Ok(CompressionSelection { choice, level })
    }

    /// Resolve the compressor name stored in a revision 2 header.
    pub fn for_stored_name(name: &str) -> Result<Self> {
        let choice = resolve(name)
            .filter(|c| *c != Choice::None)
            .ok_or_else(|| Error::UnknownCompressor(name.to_string()))?;
        Ok(CompressionSelection {
            choice,
            level: CompressionLevel::FAST,
        })
    }

    /// Codec family.
    pub fn kind(&self) -> CodecKind {
        match self.choice {
            Choice::None => CodecKind::None,
            Choice::Lossless(_) => CodecKind::Lossless,
            Choice::LinearQuant => CodecKind::LinearQuant,
            Choice::LogQuant => CodecKind::LogQuant,
        }
    }

    /// Selected level.
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Name recorded in blob headers; empty for no compression.
    pub fn name(&self) -> &'static str {
        match self.choice {
            Choice::None => "",
            Choice::Lossless(flavor) => flavor.name(),
            Choice::LinearQuant => QLIN16,
            Choice::LogQuant => QLOG16,
        }
    }

    /// Check if no codec is selected.
    pub fn is_none(&self) -> bool {
        self.choice == Choice::None
    }

    /// Check if the selected codec loses information.
    pub fn is_lossy(&self) -> bool {
        self.kind().is_lossy()
    }

    /// Compress `raw` with the selected codec.
    ///
    /// The lossless codec writes into a buffer of `raw.len() + MAX_OVERHEAD`
    /// bytes and returns only the bytes it used. Quantizers require float64
    /// elements.
    pub fn pack(&self, raw: &[u8], layout: ElementLayout) -> Result<Vec<u8>> {
        match self.choice {
            Choice::None => {
                let mut out = alloc_zeroed(raw.len())?;
                out.copy_from_slice(raw);
                Ok(out)
            }
            Choice::Lossless(flavor) => {
                let codec = Lz4FrameCodec::with_flavor(flavor, self.level);
                let mut out = alloc_zeroed(raw.len() + MAX_OVERHEAD)?;
                let written = codec.compress_to(raw, layout, &mut out)?;
                out.truncate(written);
                Ok(out)
            }
            Choice::LinearQuant => self.quantizer().compress(raw, layout),
            Choice::LogQuant => self.quantizer().compress(raw, layout),
        }
    }

    /// Check from its length and framing alone that `compressed` decodes
    /// to `raw_size` bytes.
    ///
    /// Cheap enough to run before the destination buffer is allocated.
    pub fn check_payload(
        &self,
        compressed: &[u8],
        raw_size: usize,
        layout: ElementLayout,
    ) -> Result<()> {
        match self.choice {
            Choice::None => {
                if compressed.len() != raw_size {
                    return Err(Error::compression(format!(
                        "stored payload has {} bytes, expected {}",
                        compressed.len(),
                        raw_size
                    )));
                }
            }
            Choice::Lossless(_) => {
                let sizes = frame_sizes(compressed)?;
                if sizes.nbytes != raw_size || sizes.cbytes != compressed.len() {
                    return Err(Error::compression(format!(
                        "frame of {} bytes describes {} raw bytes, expected {} and {}",
                        sizes.cbytes,
                        sizes.nbytes,
                        compressed.len(),
                        raw_size
                    )));
                }
            }
            Choice::LinearQuant | Choice::LogQuant => {
                if !layout.is_float64 || raw_size % 8 != 0 {
                    return Err(Error::CompressorArgument(
                        "quantizer requires float64 elements".into(),
                    ));
                }
                check_payload_len(compressed.len(), raw_size / 8)?;
            }
        }
        Ok(())
    }

    /// Decompress `compressed` into `dest`, which has the raw payload size.
    pub fn unpack(&self, compressed: &[u8], dest: &mut [u8], layout: ElementLayout) -> Result<()> {
        match self.choice {
            Choice::None => {
                if compressed.len() != dest.len() {
                    return Err(Error::compression(format!(
                        "stored payload has {} bytes, expected {}",
                        compressed.len(),
                        dest.len()
                    )));
                }
                dest.copy_from_slice(compressed);
                Ok(())
            }
            Choice::Lossless(flavor) => {
                Lz4FrameCodec::with_flavor(flavor, self.level).decompress_to(compressed, layout, dest)
            }
            Choice::LinearQuant | Choice::LogQuant => {
                self.quantizer().decompress_to(compressed, layout, dest)
            }
        }
    }

    fn quantizer(&self) -> Quantizer16 {
        let q = match self.choice {
            Choice::LogQuant => Quantizer16::logarithmic(),
            _ => Quantizer16::linear(),
        };
        q.at_level(self.level)
    }
}

impl fmt::Display for CompressionSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "{}:{}", self.name(), self.level.to_level())
        }
    }
}

fn resolve(name: &str) -> Option<Choice> {
    if name.eq_ignore_ascii_case(QLIN16) {
        Some(Choice::LinearQuant)
    } else if name.eq_ignore_ascii_case(QLOG16) {
        Some(Choice::LogQuant)
    } else {
        Lz4Flavor::from_name(name).map(Choice::Lossless)
    }
}
