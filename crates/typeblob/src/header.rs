//! Typed blob header.
//!
//! ## Format Overview
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ Common prefix (32 bytes)                                   │
//! │  - Magic: "mkSQLite.tbh", NUL padded (14 bytes)            │
//! │  - Version: i16, the header size of the revision           │
//! │  - Element type: i32 class id                              │
//! │  - Platform: NUL padded (11 bytes)                         │
//! │  - Endianness: 'L' or 'B' (1 byte)                         │
//! ├────────────────────────────────────────────────────────────┤
//! │ Compressor name, NUL padded (12 bytes, revision 2 only)    │
//! ├────────────────────────────────────────────────────────────┤
//! │ Dimension count: i32                                       │
//! │ Dimensions: i32 × count                                    │
//! ├────────────────────────────────────────────────────────────┤
//! │ Payload                                                    │
//! │  - Revision 1: raw element bytes                           │
//! │  - Revision 2: codec output                                │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Header integers are little-endian. The version field equals the size of
//! the fixed part of the header, so it identifies the revision and locates
//! the dimension vector at the same time.

use std::fmt;

use typeblob_core::{ElementType, Error, Result};

/// Magic tag, NUL padded.
pub const MAGIC: [u8; MAGIC_SIZE] = *b"mkSQLite.tbh\0\0";

/// Width of the magic field.
pub const MAGIC_SIZE: usize = 14;

/// Width of the platform field.
pub const PLATFORM_SIZE: usize = 11;

/// Width of the compressor name field.
pub const COMPRESSOR_NAME_SIZE: usize = 12;

/// Size of the prefix shared by both revisions.
pub const PREFIX_SIZE: usize = MAGIC_SIZE + 2 + 4 + PLATFORM_SIZE + 1;

const VERSION_AT: usize = MAGIC_SIZE;
const ELEMENT_TYPE_AT: usize = VERSION_AT + 2;
const PLATFORM_AT: usize = ELEMENT_TYPE_AT + 4;
const ENDIANNESS_AT: usize = PLATFORM_AT + PLATFORM_SIZE;

/// Header revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Revision {
    /// Uncompressed payload.
    V1,
    /// Payload produced by a named codec.
    V2,
}

impl Revision {
    /// Size of the fixed part of the header, dimension count included.
    /// This is the value stored in the version field.
    #[inline]
    pub const fn header_size(self) -> usize {
        match self {
            Revision::V1 => PREFIX_SIZE + 4,
            Revision::V2 => PREFIX_SIZE + COMPRESSOR_NAME_SIZE + 4,
        }
    }

    /// Version field value.
    #[inline]
    pub const fn version_tag(self) -> i16 {
        self.header_size() as i16
    }

    /// Resolve a version field value.
    pub fn from_version_tag(tag: i16) -> Result<Self> {
        if tag == Revision::V1.version_tag() {
            Ok(Revision::V1)
        } else if tag == Revision::V2.version_tag() {
            Ok(Revision::V2)
        } else {
            Err(Error::unsupported_header(format!(
                "unknown header version {}",
                tag
            )))
        }
    }

    /// Offset at which the dimension count is stored.
    #[inline]
    const fn dim_count_at(self) -> usize {
        self.header_size() - 4
    }
}

/// Byte offset of the payload for a header with `n_dims` dimensions.
#[inline]
pub const fn data_offset(revision: Revision, n_dims: usize) -> usize {
    revision.header_size() + 4 * n_dims
}

/// Byte order tag of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Byte order of the running host.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    #[inline]
    pub const fn tag(self) -> u8 {
        match self {
            Endianness::Little => b'L',
            Endianness::Big => b'B',
        }
    }

    /// Resolve a stored tag. Anything other than `'B'` reads as little.
    #[inline]
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            b'B' => Endianness::Big,
            _ => Endianness::Little,
        }
    }
}

/// Writer provenance recorded in every header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    tag: [u8; PLATFORM_SIZE],
    endianness: Endianness,
}

impl Platform {
    /// Platform of the running host.
    pub fn current() -> Self {
        let name = match (std::env::consts::OS, std::env::consts::ARCH) {
            ("windows", "x86_64") => "PCWIN64".to_string(),
            ("windows", "x86") => "PCWIN".to_string(),
            ("linux", "x86_64") => "GLNXA64".to_string(),
            ("linux", "x86") => "GLNX86".to_string(),
            ("macos", "x86_64") => "MACI64".to_string(),
            ("macos", "aarch64") => "MACA64".to_string(),
            (os, arch) => format!("{}-{}", os, arch),
        };
        Platform::new(&name, Endianness::native())
    }

    /// Create a platform record; names are truncated to 11 bytes.
    pub fn new(name: &str, endianness: Endianness) -> Self {
        let mut tag = [0u8; PLATFORM_SIZE];
        let bytes = name.as_bytes();
        let len = bytes.len().min(PLATFORM_SIZE);
        tag[..len].copy_from_slice(&bytes[..len]);
        Platform { tag, endianness }
    }

    /// Platform name without padding.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(trim_nul(&self.tag)).into_owned()
    }

    /// Byte order of the writer.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Compare with another platform, reporting a difference.
    pub fn check_against(&self, current: &Platform) -> Option<PlatformMismatch> {
        if self == current {
            None
        } else {
            Some(PlatformMismatch {
                stored: *self,
                current: *current,
            })
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.endianness.tag() as char)
    }
}

/// Stored platform differs from the reader's.
///
/// Payload bytes are never converted; this is reported so the caller can
/// decide whether the data is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformMismatch {
    pub stored: Platform,
    pub current: Platform,
}

impl fmt::Display for PlatformMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "blob was written on {}, reading on {}",
            self.stored, self.current
        )
    }
}

/// Fields shared by both header revisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPrefix {
    pub element_type: ElementType,
    pub platform: Platform,
}

/// Header of an uncompressed blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderV1 {
    pub prefix: HeaderPrefix,
    pub dims: Vec<usize>,
}

/// Header of a compressed blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderV2 {
    pub prefix: HeaderPrefix,
    pub compressor: String,
    pub dims: Vec<usize>,
}

/// Typed blob header, discriminated by its version field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobHeader {
    V1(HeaderV1),
    V2(HeaderV2),
}

impl BlobHeader {
    /// Build a header for the running platform.
    ///
    /// A compressor name selects revision 2; `None` selects revision 1.
    pub fn new(element_type: ElementType, dims: &[usize], compressor: Option<&str>) -> Result<Self> {
        Self::with_platform(element_type, dims, compressor, Platform::current())
    }

    /// Build a header with an explicit platform record.
    pub fn with_platform(
        element_type: ElementType,
        dims: &[usize],
        compressor: Option<&str>,
        platform: Platform,
    ) -> Result<Self> {
        if dims.len() > i32::MAX as usize {
            return Err(Error::InvalidShape(format!("{} dimensions", dims.len())));
        }
        if let Some(&d) = dims.iter().find(|&&d| d > i32::MAX as usize) {
            return Err(Error::InvalidShape(format!(
                "dimension {} exceeds the header range",
                d
            )));
        }

        let prefix = HeaderPrefix {
            element_type,
            platform,
        };
        let dims = dims.to_vec();

        match compressor {
            None => Ok(BlobHeader::V1(HeaderV1 { prefix, dims })),
            Some(name) => {
                if name.is_empty() || name.len() > COMPRESSOR_NAME_SIZE || name.contains('\0') {
                    return Err(Error::UnknownCompressor(name.to_string()));
                }
                Ok(BlobHeader::V2(HeaderV2 {
                    prefix,
                    compressor: name.to_string(),
                    dims,
                }))
            }
        }
    }

    /// Header revision.
    pub fn revision(&self) -> Revision {
        match self {
            BlobHeader::V1(_) => Revision::V1,
            BlobHeader::V2(_) => Revision::V2,
        }
    }

    pub fn prefix(&self) -> &HeaderPrefix {
        match self {
            BlobHeader::V1(h) => &h.prefix,
            BlobHeader::V2(h) => &h.prefix,
        }
    }

    pub fn element_type(&self) -> ElementType {
        self.prefix().element_type
    }

    pub fn platform(&self) -> &Platform {
        &self.prefix().platform
    }

    pub fn dims(&self) -> &[usize] {
        match self {
            BlobHeader::V1(h) => &h.dims,
            BlobHeader::V2(h) => &h.dims,
        }
    }

    /// Compressor name, revision 2 only.
    pub fn compressor(&self) -> Option<&str> {
        match self {
            BlobHeader::V1(_) => None,
            BlobHeader::V2(h) => Some(&h.compressor),
        }
    }

    /// Byte offset of the payload.
    pub fn data_offset(&self) -> usize {
        data_offset(self.revision(), self.dims().len())
    }

    /// Number of elements described by the dimensions; zero without any.
    pub fn element_count(&self) -> Result<usize> {
        element_count(self.dims())
    }

    /// Raw payload size in bytes.
    pub fn raw_size(&self) -> Result<usize> {
        self.element_count()?
            .checked_mul(self.element_type().size())
            .ok_or_else(|| Error::InvalidShape("payload size overflows".into()))
    }

    /// Append the encoded header to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let revision = self.revision();
        let start = out.len();
        out.resize(start + self.data_offset(), 0);
        let buf = &mut out[start..];

        buf[..MAGIC_SIZE].copy_from_slice(&MAGIC);
        buf[VERSION_AT..VERSION_AT + 2].copy_from_slice(&revision.version_tag().to_le_bytes());
        buf[ELEMENT_TYPE_AT..ELEMENT_TYPE_AT + 4]
            .copy_from_slice(&self.element_type().code().to_le_bytes());
        buf[PLATFORM_AT..PLATFORM_AT + PLATFORM_SIZE].copy_from_slice(&self.platform().tag);
        buf[ENDIANNESS_AT] = self.platform().endianness.tag();

        if let Some(name) = self.compressor() {
            let bytes = name.as_bytes();
            buf[PREFIX_SIZE..PREFIX_SIZE + bytes.len()].copy_from_slice(bytes);
        }

        let count_at = revision.dim_count_at();
        let dims = self.dims();
        buf[count_at..count_at + 4].copy_from_slice(&(dims.len() as i32).to_le_bytes());
        for (i, &d) in dims.iter().enumerate() {
            let at = count_at + 4 + i * 4;
            buf[at..at + 4].copy_from_slice(&(d as i32).to_le_bytes());
        }
    }

    /// Encode the header into a new buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data_offset());
        self.encode_into(&mut out);
        out
    }

    /// Parse a header from the start of a blob.
    ///
    /// Returns the header and the payload offset.
    pub fn decode(blob: &[u8]) -> Result<(Self, usize)> {
        if blob.len() < PREFIX_SIZE {
            return Err(Error::unsupported_header(format!(
                "blob of {} bytes is shorter than a header",
                blob.len()
            )));
        }
        if blob[..MAGIC_SIZE] != MAGIC {
            return Err(Error::unsupported_header("invalid magic"));
        }

        let revision = Revision::from_version_tag(read_i16(&blob[VERSION_AT..]))?;
        if blob.len() < revision.header_size() {
            return Err(Error::unsupported_header("truncated header"));
        }

        let element_type = ElementType::try_from(read_i32(&blob[ELEMENT_TYPE_AT..]))?;
        let mut tag = [0u8; PLATFORM_SIZE];
        tag.copy_from_slice(&blob[PLATFORM_AT..PLATFORM_AT + PLATFORM_SIZE]);
        let platform = Platform {
            tag,
            endianness: Endianness::from_tag(blob[ENDIANNESS_AT]),
        };

        let count_at = revision.dim_count_at();
        let n_dims = usize::try_from(read_i32(&blob[count_at..])).map_err(|_| {
            Error::unsupported_header("negative dimension count")
        })?;
        let offset = data_offset(revision, n_dims);
        if blob.len() < offset {
            return Err(Error::unsupported_header(format!(
                "truncated dimension vector: {} dimensions need {} bytes, got {}",
                n_dims,
                offset,
                blob.len()
            )));
        }

        let dims = blob[count_at + 4..offset]
            .chunks_exact(4)
            .map(|d| {
                usize::try_from(read_i32(d))
                    .map_err(|_| Error::unsupported_header("negative dimension"))
            })
            .collect::<Result<Vec<_>>>()?;

        let prefix = HeaderPrefix {
            element_type,
            platform,
        };
        let header = match revision {
            Revision::V1 => BlobHeader::V1(HeaderV1 { prefix, dims }),
            Revision::V2 => {
                let field = &blob[PREFIX_SIZE..PREFIX_SIZE + COMPRESSOR_NAME_SIZE];
                let compressor = std::str::from_utf8(trim_nul(field))
                    .map_err(|_| Error::unsupported_header("compressor name is not UTF-8"))?
                    .to_string();
                BlobHeader::V2(HeaderV2 {
                    prefix,
                    compressor,
                    dims,
                })
            }
        };

        Ok((header, offset))
    }

    /// Compare the stored platform with the running host.
    pub fn platform_mismatch(&self) -> Option<PlatformMismatch> {
        self.platform().check_against(&Platform::current())
    }
}

/// Check the platform record of an encoded blob against the running host.
///
/// Only the prefix is inspected; a mismatch is a warning, never an error.
pub fn validate_platform(blob: &[u8]) -> Result<Option<PlatformMismatch>> {
    if blob.len() < PREFIX_SIZE || blob[..MAGIC_SIZE] != MAGIC {
        return Err(Error::unsupported_header("invalid magic"));
    }
    let mut tag = [0u8; PLATFORM_SIZE];
    tag.copy_from_slice(&blob[PLATFORM_AT..PLATFORM_AT + PLATFORM_SIZE]);
    let stored = Platform {
        tag,
        endianness: Endianness::from_tag(blob[ENDIANNESS_AT]),
    };
    Ok(stored.check_against(&Platform::current()))
}

/// Product of the dimensions; zero for an empty dimension vector.
pub fn element_count(dims: &[usize]) -> Result<usize> {
    if dims.is_empty() {
        return Ok(0);
    }
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| Error::InvalidShape("element count overflows".into()))
}

fn trim_nul(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

#[inline]
fn read_i16(bytes: &[u8]) -> i16 {
    i16::from_le_bytes([bytes[0], bytes[1]])
}

#[inline]
fn read_i32(bytes: &[u8]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
