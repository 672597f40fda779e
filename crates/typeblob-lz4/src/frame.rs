//! Frame header for shuffled LZ4 payloads.
//!
//! ```text
//! +---------+-----------+-------+----------+--------+-----------+--------+
//! | version | lzversion | flags | typesize | nbytes | blocksize | cbytes |
//! |   u8    |    u8     |  u8   |    u8    | u32 LE |  u32 LE   | u32 LE |
//! +---------+-----------+-------+----------+--------+-----------+--------+
//! ```
//!
//! `nbytes` is the raw size, `cbytes` the total frame size including this
//! header. The payload is a single block, so `blocksize == nbytes`.

use typeblob_core::{Error, Result};

/// Size of the frame header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Largest possible growth of a frame over its raw input.
///
/// Incompressible input is stored verbatim behind the header, so a frame
/// never exceeds `raw + MAX_OVERHEAD` bytes.
pub const MAX_OVERHEAD: usize = HEADER_SIZE;

/// Frame format version.
pub const FRAME_VERSION: u8 = 2;

/// Block format version.
pub const LZ_VERSION: u8 = 1;

/// Body was byte-shuffled before compression.
pub const FLAG_SHUFFLE: u8 = 0x01;

/// Body is stored verbatim.
pub const FLAG_MEMCPY: u8 = 0x02;

const FLAVOR_SHIFT: u8 = 5;

/// Sizes reported by a frame header without decoding the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSizes {
    /// Decompressed size.
    pub nbytes: usize,
    /// Total frame size, header included.
    pub cbytes: usize,
    /// Block size.
    pub blocksize: usize,
}

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub lz_version: u8,
    pub flags: u8,
    pub typesize: u8,
    pub nbytes: u32,
    pub blocksize: u32,
    pub cbytes: u32,
}

impl FrameHeader {
    /// Build a header for a frame whose body is `body_len` bytes.
    pub fn new(flags: u8, typesize: u8, nbytes: u32, body_len: usize) -> Result<Self> {
        let cbytes = u32::try_from(HEADER_SIZE + body_len)
            .map_err(|_| Error::compression(format!("frame body of {} bytes too large", body_len)))?;
        Ok(FrameHeader {
            version: FRAME_VERSION,
            lz_version: LZ_VERSION,
            flags,
            typesize,
            nbytes,
            blocksize: nbytes,
            cbytes,
        })
    }

    /// Parse a header from the start of a frame.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::compression(format!(
                "frame too short: {} bytes, header needs {}",
                data.len(),
                HEADER_SIZE
            )));
        }

        let header = FrameHeader {
            version: data[0],
            lz_version: data[1],
            flags: data[2],
            typesize: data[3],
            nbytes: read_u32(&data[4..8]),
            blocksize: read_u32(&data[8..12]),
            cbytes: read_u32(&data[12..16]),
        };

        if header.version != FRAME_VERSION {
            return Err(Error::compression(format!(
                "unsupported frame version {}",
                header.version
            )));
        }
        if (header.cbytes as usize) < HEADER_SIZE {
            return Err(Error::compression(format!(
                "frame size {} smaller than its header",
                header.cbytes
            )));
        }

        let body_len = header.cbytes as usize - HEADER_SIZE;
        let nbytes = header.nbytes as usize;
        let capacity = if header.is_memcpy() {
            body_len
        } else {
            max_block_output(body_len)
        };
        if nbytes > capacity || (header.is_memcpy() && nbytes != body_len) {
            return Err(Error::compression(format!(
                "frame body of {} bytes cannot hold {} bytes",
                body_len, nbytes
            )));
        }

        Ok(header)
    }

    /// Write the header into the first [`HEADER_SIZE`] bytes of `out`.
    pub fn write(&self, out: &mut [u8]) {
        out[0] = self.version;
        out[1] = self.lz_version;
        out[2] = self.flags;
        out[3] = self.typesize;
        out[4..8].copy_from_slice(&self.nbytes.to_le_bytes());
        out[8..12].copy_from_slice(&self.blocksize.to_le_bytes());
        out[12..16].copy_from_slice(&self.cbytes.to_le_bytes());
    }

    /// Body was shuffled.
    #[inline]
    pub fn is_shuffled(&self) -> bool {
        self.flags & FLAG_SHUFFLE != 0
    }

    /// Body is stored verbatim.
    #[inline]
    pub fn is_memcpy(&self) -> bool {
        self.flags & FLAG_MEMCPY != 0
    }

    /// Flavor code recorded by the compressor.
    #[inline]
    pub fn flavor_code(&self) -> u8 {
        self.flags >> FLAVOR_SHIFT
    }

    /// Sizes carried by this header.
    pub fn sizes(&self) -> FrameSizes {
        FrameSizes {
            nbytes: self.nbytes as usize,
            cbytes: self.cbytes as usize,
            blocksize: self.blocksize as usize,
        }
    }
}

/// Pack a flavor code into the flag byte.
#[inline]
pub(crate) fn flavor_flags(code: u8) -> u8 {
    code << FLAVOR_SHIFT
}

/// Report the decompressed, compressed and block sizes of a frame.
pub fn frame_sizes(frame: &[u8]) -> Result<FrameSizes> {
    FrameHeader::parse(frame).map(|h| h.sizes())
}

/// Upper bound on what an LZ4 block of `body_len` bytes decodes to.
///
/// Each extra match-length byte adds at most 255 output bytes.
#[inline]
fn max_block_output(body_len: usize) -> usize {
    body_len.saturating_mul(255).saturating_add(MAX_BLOCK_SLACK)
}

const MAX_BLOCK_SLACK: usize = 64;

#[inline]
fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
