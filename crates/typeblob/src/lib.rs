//! # Typeblob
//!
//! Self-describing typed blobs: a small binary header naming the element
//! type, the shape and the writer platform, followed by the array payload.
//! Payloads are optionally compressed, either losslessly (shuffle + LZ4
//! frame) or with a 16-bit quantizer for float64 data.
//!
//! ## Quick Start
//!
//! ```ignore
//! use typeblob::{BlobCodec, CompressionSelection, TypedArray};
//!
//! let codec = BlobCodec::default();
//! let matrix = TypedArray::from_slice(vec![3, 4], &values)?;
//!
//! let lz4 = CompressionSelection::select("lz4", 6)?;
//! let packed = codec.pack(&matrix.into(), &lz4)?;
//! let unpacked = codec.unpack(&packed.bytes)?;
//! ```
//!
//! ## Compressors
//!
//! | Name | Kind | Input |
//! |------|------|-------|
//! | `blosclz`, `lz4`, `lz4hc` | lossless | any element type |
//! | `QLIN16` | linear quantizer | float64 |
//! | `QLOG16` | logarithmic quantizer | non-negative float64 |
//!
//! A compressed blob is written only when it is smaller than the
//! uncompressed one; otherwise the revision 1 header is used.

pub mod config;
pub mod engine;
pub mod header;
pub mod inspect;
pub mod pipeline;
pub mod value;

pub use config::{BlobConfig, TypedBlobMode, DEFAULT_MAX_BLOB_SIZE};
pub use engine::{CompressionSelection, QLIN16, QLOG16};
pub use header::{
    data_offset, validate_platform, BlobHeader, Endianness, Platform, PlatformMismatch, Revision,
    MAGIC,
};
pub use inspect::{compression_ratio, pack_time, unpack_time, BlobInfo};
pub use pipeline::{BlobCodec, PackedBlob, Unpacked};
pub use value::{
    ArraySerializer, Element, JsonSerializer, NoSerializer, TypeComplexity, TypedArray, Value,
};

// Re-export the codec crates
pub use typeblob_core::{
    BlobStats, Codec, CodecKind, CompressionLevel, CompressionRatio, Compressor, Decompressor,
    ElementLayout, ElementType, Error, Metrics, Result,
};
pub use typeblob_lz4::{Lz4Flavor, Lz4FrameCodec};
pub use typeblob_quant::{QuantMode, Quantizer16};
