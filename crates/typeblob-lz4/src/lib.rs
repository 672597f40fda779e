//! # Typeblob LZ4
//!
//! Lossless payload codec for typed blobs: a byte-shuffle filter followed
//! by an LZ4 block, wrapped in a 16-byte self-describing frame.
//!
//! ## Features
//!
//! - **Shuffle**: groups bytes by position within each element
//! - **Bounded growth**: a frame is never larger than `raw + MAX_OVERHEAD`
//! - **Self-describing**: [`frame_sizes`] reports the decompressed size
//!   without decoding
//!
//! ## Example
//!
//! ```ignore
//! use typeblob_lz4::Lz4FrameCodec;
//! use typeblob_core::{Compressor, Decompressor, ElementLayout};
//!
//! let codec = Lz4FrameCodec::new();
//! let frame = codec.compress(data, ElementLayout::FLOAT64)?;
//! let original = codec.decompress_with_size(&frame, ElementLayout::FLOAT64, data.len())?;
//! ```

pub mod codec;
pub mod compress;
pub mod decompress;
pub mod frame;
pub mod shuffle;

// Re-export main types
pub use codec::Lz4FrameCodec;
pub use compress::{Lz4Flavor, Lz4FrameCompressor};
pub use decompress::Lz4FrameDecompressor;
pub use frame::{frame_sizes, FrameHeader, FrameSizes, MAX_OVERHEAD};
