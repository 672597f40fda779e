//! # Typeblob Core
//!
//! Core traits, types and errors shared by the typed blob crates.
//!
//! A typed blob is a self-describing byte string carrying an element type,
//! a shape and optionally the name of the codec that produced its payload.
//! This crate defines the vocabulary the codecs and the container agree on.
//!
//! ## Core Traits
//!
//! - [`Compressor`] - Layout-aware one-shot compression
//! - [`Decompressor`] - Layout-aware one-shot decompression into a sized buffer
//! - [`Codec`] - Combined compress/decompress capability
//!
//! ## Example
//!
//! ```ignore
//! use typeblob_core::{Codec, Compressor, Decompressor, CompressionLevel, ElementType};
//! use typeblob_lz4::Lz4FrameCodec;
//!
//! let codec = Lz4FrameCodec::with_level(CompressionLevel::FAST);
//! let layout = ElementType::Float64.layout();
//! let packed = codec.compress(raw, layout)?;
//! let restored = codec.decompress_with_size(&packed, layout, raw.len())?;
//! ```

pub mod error;
pub mod stats;
pub mod traits;
pub mod types;

pub use error::{alloc_with_capacity, alloc_zeroed, Error, Result};
pub use stats::{BlobStats, Metrics};
pub use traits::{Codec, Compressor, Decompressor};
pub use types::{CodecKind, CompressionLevel, CompressionRatio, ElementLayout, ElementType};
