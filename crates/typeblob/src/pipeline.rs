//! Pack and unpack pipelines.
//!
//! ## Pack
//!
//! ```text
//! value ─► [composite? serialize → opaque byte stream]
//!       ─► [selection? compress → keep only if the blob shrinks]
//!       ─► [lossless and verify? decompress and compare]
//!       ─► size limit ─► header + payload
//! ```
//!
//! ## Unpack
//!
//! ```text
//! blob ─► header (platform warning) ─► copy or decompress into a
//!         buffer shaped by the header ─► [opaque? deserialize] ─► value
//! ```

use std::time::Instant;

use tracing::{debug, warn};
use typeblob_core::{
    alloc_with_capacity, alloc_zeroed, BlobStats, ElementLayout, ElementType, Error, Result,
};

use crate::config::{BlobConfig, TypedBlobMode};
use crate::engine::CompressionSelection;
use crate::header::{data_offset, BlobHeader, PlatformMismatch, Revision};
use crate::value::{ArraySerializer, NoSerializer, TypeComplexity, TypedArray, Value};

/// Encoded blob returned by [`BlobCodec::pack`].
#[derive(Debug, Clone)]
pub struct PackedBlob {
    /// Header followed by payload.
    pub bytes: Vec<u8>,
    /// Header revision written.
    pub revision: Revision,
    /// Codec statistics; uncompressed when revision 1 was written.
    pub stats: BlobStats,
    /// Blob size relative to the uncompressed blob size.
    pub ratio: f64,
}

impl PackedBlob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for PackedBlob {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Value reconstructed by [`BlobCodec::unpack`].
#[derive(Debug, Clone)]
pub struct Unpacked<C> {
    pub value: Value<C>,
    /// Header revision read.
    pub revision: Revision,
    /// Set when the blob was written on a different platform.
    pub platform_mismatch: Option<PlatformMismatch>,
    /// Codec statistics.
    pub stats: BlobStats,
    /// Stored payload size relative to raw payload size.
    pub ratio: f64,
}

/// Typed blob encoder and decoder.
#[derive(Debug, Clone)]
pub struct BlobCodec<S = NoSerializer> {
    config: BlobConfig,
    serializer: S,
}

impl BlobCodec<NoSerializer> {
    /// Create a codec for flat arrays only.
    pub fn new(config: BlobConfig) -> Self {
        Self::with_serializer(config, NoSerializer)
    }
}

impl Default for BlobCodec<NoSerializer> {
    fn default() -> Self {
        Self::new(BlobConfig::default())
    }
}

impl<S: ArraySerializer> BlobCodec<S> {
    /// Create a codec with a structural serializer for composite values.
    pub fn with_serializer(config: BlobConfig, serializer: S) -> Self {
        Self { config, serializer }
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    pub fn serializer(&self) -> &S {
        &self.serializer
    }

    /// Encode a value into a typed blob.
    pub fn pack(
        &self,
        value: &Value<S::Composite>,
        selection: &CompressionSelection,
    ) -> Result<PackedBlob> {
        match value {
            Value::Array(array) => self.pack_array(array, selection),
            Value::Composite(composite) => {
                if !self.config.mode.allows_serialization() {
                    return Err(Error::unsupported_type(
                        "composite values require byte stream mode",
                    ));
                }
                let stream = self
                    .serializer
                    .serialize(composite)
                    .map_err(|e| Error::unsupported_type(format!("serialization failed: {}", e)))?;
                let dims = [1, stream.len()];
                self.pack_raw(ElementType::Opaque, &dims, &stream, selection)
            }
        }
    }

    /// Encode a flat array into a typed blob.
    pub fn pack_array(
        &self,
        array: &TypedArray,
        selection: &CompressionSelection,
    ) -> Result<PackedBlob> {
        if self.config.mode == TypedBlobMode::Off {
            return Err(Error::unsupported_type("typed blobs are disabled"));
        }
        if array.complexity(self.config.mode.allows_serialization()) == TypeComplexity::Unsupported {
            return Err(Error::unsupported_type(format!(
                "{} arrays require byte stream mode",
                array.element_type().name()
            )));
        }
        self.pack_raw(array.element_type(), array.dims(), array.data(), selection)
    }

    /// Encode with the configured default selection.
    pub fn pack_default(&self, value: &Value<S::Composite>) -> Result<PackedBlob> {
        self.pack(value, &self.config.selection()?)
    }

    fn pack_raw(
        &self,
        element_type: ElementType,
        dims: &[usize],
        raw: &[u8],
        selection: &CompressionSelection,
    ) -> Result<PackedBlob> {
        let layout = element_type.layout();
        let uncompressed_total = data_offset(Revision::V1, dims.len())
            .checked_add(raw.len())
            .ok_or_else(|| Error::blob_too_big(usize::MAX, self.config.max_blob_size))?;

        let mut compressed = None;
        let mut stats = BlobStats::uncompressed(raw.len());
        let mut ratio = 1.0;

        if !selection.is_none() {
            let start = Instant::now();
            let payload = selection.pack(raw, layout)?;
            let time_us = start.elapsed().as_micros() as u64;

            let total = data_offset(Revision::V2, dims.len()) + payload.len();
            if total >= uncompressed_total {
                debug!(
                    compressor = selection.name(),
                    compressed = total,
                    uncompressed = uncompressed_total,
                    "compression does not pay off, storing uncompressed"
                );
                stats.time_us = time_us;
            } else {
                if self.config.verify_round_trip && !selection.is_lossy() {
                    verify_round_trip(selection, &payload, raw, layout)?;
                }
                stats = BlobStats::from_operation(selection.kind(), raw.len(), payload.len(), time_us);
                ratio = total as f64 / uncompressed_total as f64;
                compressed = Some(payload);
            }
        }

        let (revision, payload, name) = match &compressed {
            Some(payload) => (Revision::V2, payload.as_slice(), Some(selection.name())),
            None => (Revision::V1, raw, None),
        };

        let total = data_offset(revision, dims.len()) + payload.len();
        if total > self.config.max_blob_size {
            return Err(Error::blob_too_big(total, self.config.max_blob_size));
        }

        let header = BlobHeader::new(element_type, dims, name)?;
        let mut bytes = alloc_with_capacity(total)?;
        header.encode_into(&mut bytes);
        bytes.extend_from_slice(payload);

        Ok(PackedBlob {
            bytes,
            revision,
            stats,
            ratio,
        })
    }

    /// Decode a typed blob.
    pub fn unpack(&self, blob: &[u8]) -> Result<Unpacked<S::Composite>> {
        let (header, offset) = BlobHeader::decode(blob)?;

        let platform_mismatch = header.platform_mismatch();
        if let Some(mismatch) = &platform_mismatch {
            warn!(%mismatch, "typed blob platform differs, payload is used as stored");
        }

        let element_type = header.element_type();
        let layout = element_type.layout();
        let raw_size = header.raw_size()?;
        let payload = &blob[offset..];

        // Payload length is checked against the header before the
        // header-sized buffer is allocated.
        let (data, stats, ratio) = match header.compressor() {
            None => {
                if payload.len() != raw_size {
                    return Err(Error::compression(format!(
                        "stored payload has {} bytes, header describes {}",
                        payload.len(),
                        raw_size
                    )));
                }
                let mut data = alloc_zeroed(raw_size)?;
                data.copy_from_slice(payload);
                (data, BlobStats::uncompressed(raw_size), 1.0)
            }
            Some(name) => {
                let selection = CompressionSelection::for_stored_name(name)?;
                selection.check_payload(payload, raw_size, layout)?;
                let mut data = alloc_zeroed(raw_size)?;

                let start = Instant::now();
                selection.unpack(payload, &mut data, layout)?;
                let time_us = start.elapsed().as_micros() as u64;

                let ratio = if raw_size > 0 {
                    payload.len() as f64 / raw_size as f64
                } else {
                    0.0
                };
                (
                    data,
                    BlobStats::from_operation(selection.kind(), raw_size, payload.len(), time_us),
                    ratio,
                )
            }
        };

        let array = TypedArray::new(element_type, header.dims().to_vec(), data)?;
        let value = if element_type == ElementType::Opaque {
            if !self.config.mode.allows_serialization() {
                return Err(Error::unsupported_type(
                    "blob holds a serialized value and byte stream mode is off",
                ));
            }
            Value::Composite(self.serializer.deserialize(array.data())?)
        } else {
            Value::Array(array)
        };

        Ok(Unpacked {
            value,
            revision: header.revision(),
            platform_mismatch,
            stats,
            ratio,
        })
    }
}

/// Decompress a freshly produced payload and compare it with its source.
fn verify_round_trip(
    selection: &CompressionSelection,
    payload: &[u8],
    raw: &[u8],
    layout: ElementLayout,
) -> Result<()> {
    let mut restored = alloc_zeroed(raw.len())?;
    selection
        .unpack(payload, &mut restored, layout)
        .map_err(|e| Error::compression(format!("round-trip check failed: {}", e)))?;
    if restored != raw {
        return Err(Error::compression(
            "round-trip check failed: decompressed data differs from the original",
        ));
    }
    debug!(compressor = selection.name(), bytes = raw.len(), "round-trip check passed");
    Ok(())
}
