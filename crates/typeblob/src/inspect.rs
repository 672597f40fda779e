//! Blob inspection without reconstructing the value.

use std::time::Instant;

use typeblob_core::{alloc_zeroed, CodecKind, ElementType, Result};

use crate::engine::CompressionSelection;
use crate::header::{BlobHeader, Platform, PlatformMismatch, Revision};

/// Header facts about a stored blob.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobInfo {
    pub revision: Revision,
    pub element_type: ElementType,
    pub dims: Vec<usize>,
    /// Compressor name, revision 2 only.
    pub compressor: Option<String>,
    /// Codec family named by the header.
    pub codec: CodecKind,
    pub platform: Platform,
    pub platform_mismatch: Option<PlatformMismatch>,
    /// Byte offset of the payload.
    pub data_offset: usize,
    /// Stored payload size.
    pub payload_size: usize,
    /// Payload size once decoded.
    pub raw_size: usize,
}

impl BlobInfo {
    /// Read the header of a blob.
    pub fn read(blob: &[u8]) -> Result<Self> {
        let (header, data_offset) = BlobHeader::decode(blob)?;
        let codec = match header.compressor() {
            None => CodecKind::None,
            Some(name) => CompressionSelection::for_stored_name(name)?.kind(),
        };
        Ok(BlobInfo {
            revision: header.revision(),
            element_type: header.element_type(),
            dims: header.dims().to_vec(),
            compressor: header.compressor().map(str::to_string),
            codec,
            platform: *header.platform(),
            platform_mismatch: header.platform_mismatch(),
            data_offset,
            payload_size: blob.len() - data_offset,
            raw_size: header.raw_size()?,
        })
    }

    /// Stored payload size relative to raw size.
    ///
    /// 1.0 for uncompressed blobs and 0.0 for compressed blobs without data.
    pub fn ratio(&self) -> f64 {
        match self.revision {
            Revision::V1 => 1.0,
            Revision::V2 if self.raw_size == 0 => 0.0,
            Revision::V2 => self.payload_size as f64 / self.raw_size as f64,
        }
    }
}

/// Compression ratio of a stored blob.
pub fn compression_ratio(blob: &[u8]) -> Result<f64> {
    BlobInfo::read(blob).map(|info| info.ratio())
}

/// Time in microseconds to decode the payload of a stored blob.
///
/// Zero for uncompressed blobs.
pub fn unpack_time(blob: &[u8]) -> Result<u64> {
    let Some((selection, header, payload)) = compressed_payload(blob)? else {
        return Ok(0);
    };
    let layout = header.element_type().layout();
    let mut raw = alloc_zeroed(header.raw_size()?)?;

    let start = Instant::now();
    selection.unpack(payload, &mut raw, layout)?;
    Ok(start.elapsed().as_micros() as u64)
}

/// Time in microseconds to compress the payload of a stored blob again
/// with the codec named in its header.
///
/// Zero for uncompressed blobs.
pub fn pack_time(blob: &[u8]) -> Result<u64> {
    let Some((selection, header, payload)) = compressed_payload(blob)? else {
        return Ok(0);
    };
    let layout = header.element_type().layout();
    let mut raw = alloc_zeroed(header.raw_size()?)?;
    selection.unpack(payload, &mut raw, layout)?;

    let start = Instant::now();
    let _packed = selection.pack(&raw, layout)?;
    Ok(start.elapsed().as_micros() as u64)
}

/// Header, codec and payload of a compressed blob whose payload length
/// agrees with its header. `None` for uncompressed blobs.
fn compressed_payload(blob: &[u8]) -> Result<Option<(CompressionSelection, BlobHeader, &[u8])>> {
    let (header, offset) = BlobHeader::decode(blob)?;
    let Some(name) = header.compressor() else {
        return Ok(None);
    };
    let selection = CompressionSelection::for_stored_name(name)?;
    let payload = &blob[offset..];
    selection.check_payload(payload, header.raw_size()?, header.element_type().layout())?;
    Ok(Some((selection, header, payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use typeblob_core::Error;
    use crate::pipeline::BlobCodec;
    use crate::value::TypedArray;

    fn ones_blob(selection: &CompressionSelection) -> Vec<u8> {
        let array = TypedArray::from_slice(vec![100, 10], &vec![1.0f64; 1000]).unwrap();
        BlobCodec::default()
            .pack_array(&array, selection)
            .unwrap()
            .into_bytes()
    }

    #[test]
    fn test_info_uncompressed() {
        let blob = ones_blob(&CompressionSelection::none());
        let info = BlobInfo::read(&blob).unwrap();

        assert_eq!(info.revision, Revision::V1);
        assert_eq!(info.element_type, ElementType::Float64);
        assert_eq!(info.dims, vec![100, 10]);
        assert_eq!(info.compressor, None);
        assert_eq!(info.codec, CodecKind::None);
        assert_eq!(info.data_offset, 44);
        assert_eq!(info.payload_size, 8000);
        assert_eq!(info.raw_size, 8000);
        assert!(info.platform_mismatch.is_none());
        assert_eq!(compression_ratio(&blob).unwrap(), 1.0);
        assert_eq!(pack_time(&blob).unwrap(), 0);
        assert_eq!(unpack_time(&blob).unwrap(), 0);
    }

    #[test]
    fn test_info_compressed() {
        let selection = CompressionSelection::select("QLIN16", 1).unwrap();
        let blob = ones_blob(&selection);
        let info = BlobInfo::read(&blob).unwrap();

        assert_eq!(info.revision, Revision::V2);
        assert_eq!(info.compressor.as_deref(), Some("QLIN16"));
        assert_eq!(info.codec, CodecKind::LinearQuant);
        assert_eq!(info.payload_size, 8 + 2000);
        assert!((info.ratio() - 2008.0 / 8000.0).abs() < 1e-12);

        assert!(pack_time(&blob).is_ok());
        assert!(unpack_time(&blob).is_ok());
    }

    #[test]
    fn test_timing_rejects_oversized_dims() {
        let header = BlobHeader::new(ElementType::Float64, &[1, 200_000_000], Some("QLIN16")).unwrap();
        let mut blob = header.encode();
        blob.extend_from_slice(&[0u8; 8]);

        assert!(BlobInfo::read(&blob).is_ok());
        assert!(matches!(unpack_time(&blob), Err(Error::Compression { .. })));
        assert!(matches!(pack_time(&blob), Err(Error::Compression { .. })));
    }

    #[test]
    fn test_info_rejects_garbage() {
        assert!(matches!(
            BlobInfo::read(b"not a typed blob at all, definitely not"),
            Err(Error::UnsupportedHeader(_))
        ));
    }
}
