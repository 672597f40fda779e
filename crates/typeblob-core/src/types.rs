//! Core type definitions for typed blobs.

use crate::error::{Error, Result};

/// Semantic element type of a typed blob payload.
///
/// Discriminants follow the host runtime's class-id numbering so that
/// blobs written by other implementations decode to the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum ElementType {
    /// Payload is a byte stream produced by a structural serializer.
    Opaque = 0,
    /// Boolean, one byte per element.
    Logical = 3,
    /// UTF-16 code unit.
    Char = 4,
    /// IEEE 754 binary64.
    Float64 = 6,
    /// IEEE 754 binary32.
    Float32 = 7,
    Int8 = 8,
    UInt8 = 9,
    Int16 = 10,
    UInt16 = 11,
    Int32 = 12,
    UInt32 = 13,
    Int64 = 14,
    UInt64 = 15,
}

impl ElementType {
    /// All storable element types, opaque included.
    pub const ALL: [ElementType; 13] = [
        ElementType::Opaque,
        ElementType::Logical,
        ElementType::Char,
        ElementType::Float64,
        ElementType::Float32,
        ElementType::Int8,
        ElementType::UInt8,
        ElementType::Int16,
        ElementType::UInt16,
        ElementType::Int32,
        ElementType::UInt32,
        ElementType::Int64,
        ElementType::UInt64,
    ];

    /// Size of one element in bytes. Opaque payloads are byte streams.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            ElementType::Opaque
            | ElementType::Logical
            | ElementType::Int8
            | ElementType::UInt8 => 1,
            ElementType::Char | ElementType::Int16 | ElementType::UInt16 => 2,
            ElementType::Float32 | ElementType::Int32 | ElementType::UInt32 => 4,
            ElementType::Float64 | ElementType::Int64 | ElementType::UInt64 => 8,
        }
    }

    /// Wire code stored in the header.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Get the type name as a string.
    pub fn name(self) -> &'static str {
        match self {
            ElementType::Opaque => "opaque",
            ElementType::Logical => "logical",
            ElementType::Char => "char",
            ElementType::Float64 => "double",
            ElementType::Float32 => "single",
            ElementType::Int8 => "int8",
            ElementType::UInt8 => "uint8",
            ElementType::Int16 => "int16",
            ElementType::UInt16 => "uint16",
            ElementType::Int32 => "int32",
            ElementType::UInt32 => "uint32",
            ElementType::Int64 => "int64",
            ElementType::UInt64 => "uint64",
        }
    }

    /// Byte layout handed to codecs.
    #[inline]
    pub const fn layout(self) -> ElementLayout {
        ElementLayout {
            element_size: self.size(),
            is_float64: matches!(self, ElementType::Float64),
        }
    }
}

impl TryFrom<i32> for ElementType {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        ElementType::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or_else(|| Error::unsupported_type(format!("unknown element type code {}", code)))
    }
}

/// Element layout of a raw payload, as seen by a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementLayout {
    /// Bytes per element.
    pub element_size: usize,
    /// Whether elements are IEEE 754 binary64 values.
    pub is_float64: bool,
}

impl ElementLayout {
    /// Layout of an untyped byte stream.
    pub const BYTES: ElementLayout = ElementLayout {
        element_size: 1,
        is_float64: false,
    };

    /// Layout of a float64 array.
    pub const FLOAT64: ElementLayout = ElementLayout {
        element_size: 8,
        is_float64: true,
    };
}

/// Codec family a compression selection resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CodecKind {
    /// Payload stored uncompressed (revision 1 header).
    None,
    /// Byte-shuffled LZ4 frame.
    Lossless,
    /// 16-bit linear quantizer.
    LinearQuant,
    /// 16-bit logarithmic quantizer.
    LogQuant,
}

impl CodecKind {
    /// Check if decoding may not reproduce the input bit-exactly.
    #[inline]
    pub fn is_lossy(self) -> bool {
        matches!(self, CodecKind::LinearQuant | CodecKind::LogQuant)
    }
}

/// Compression level in the range 0..=9. Level 0 disables compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i32", into = "i32"))]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Lowest accepted level.
    pub const MIN: i32 = 0;
    /// Highest accepted level.
    pub const MAX: i32 = 9;

    /// No compression.
    pub const NONE: CompressionLevel = CompressionLevel(0);
    /// Fastest compression.
    pub const FAST: CompressionLevel = CompressionLevel(1);
    /// Best compression.
    pub const BEST: CompressionLevel = CompressionLevel(9);

    /// Create from numeric level, rejecting values outside 0..=9.
    pub fn from_level(level: i32) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&level) {
            return Err(Error::InvalidLevel {
                level,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(CompressionLevel(level as u8))
    }

    /// Convert to numeric level.
    #[inline]
    pub fn to_level(self) -> i32 {
        i32::from(self.0)
    }

    /// Check if this level disables compression.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<i32> for CompressionLevel {
    type Error = Error;

    fn try_from(level: i32) -> Result<Self> {
        CompressionLevel::from_level(level)
    }
}

impl From<CompressionLevel> for i32 {
    fn from(level: CompressionLevel) -> i32 {
        level.to_level()
    }
}

/// Compression ratio metrics.
#[derive(Debug, Clone, Copy)]
pub struct CompressionRatio {
    /// Original uncompressed size in bytes.
    pub original_size: usize,
    /// Compressed size in bytes.
    pub compressed_size: usize,
}

impl CompressionRatio {
    /// Create new ratio from sizes.
    pub fn new(original: usize, compressed: usize) -> Self {
        CompressionRatio {
            original_size: original,
            compressed_size: compressed,
        }
    }

    /// Stored size relative to original size (compressed / original).
    /// Lower is better; 1.0 means no gain.
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 1.0;
        }
        self.compressed_size as f64 / self.original_size as f64
    }

    /// Calculate space savings as percentage (0-100).
    pub fn savings_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.ratio()) * 100.0
    }

    /// Check if compression was effective (saved space).
    pub fn is_effective(&self) -> bool {
        self.compressed_size < self.original_size
    }
}
