//! Wire format compatibility tests.
//!
//! Byte-level checks of the header layout and of how corrupted headers
//! are rejected.

use typeblob::{
    data_offset, BlobCodec, BlobConfig, BlobHeader, CompressionSelection, ElementType, Endianness,
    Error, Platform, Revision, TypedArray, MAGIC,
};

fn matrix() -> TypedArray {
    let values: Vec<f64> = (1..=12).map(f64::from).collect();
    TypedArray::from_slice(vec![3, 4], &values).unwrap()
}

fn read_i32(blob: &[u8], at: usize) -> i32 {
    i32::from_le_bytes(blob[at..at + 4].try_into().unwrap())
}

#[test]
fn test_revision1_layout() {
    let blob = BlobCodec::default()
        .pack_array(&matrix(), &CompressionSelection::none())
        .unwrap()
        .into_bytes();

    assert_eq!(&blob[..14], &MAGIC);
    assert_eq!(i16::from_le_bytes([blob[14], blob[15]]), 36);
    assert_eq!(read_i32(&blob, 16), ElementType::Float64.code());
    // platform tag occupies 20..31, endianness byte at 31
    assert!(matches!(blob[31], b'L' | b'B'));
    assert_eq!(read_i32(&blob, 32), 2);
    assert_eq!(read_i32(&blob, 36), 3);
    assert_eq!(read_i32(&blob, 40), 4);
    assert_eq!(blob.len(), 44 + 96);
}

#[test]
fn test_revision2_layout() {
    let selection = CompressionSelection::select("QLIN16", 1).unwrap();
    let blob = BlobCodec::default()
        .pack_array(&matrix(), &selection)
        .unwrap()
        .into_bytes();

    assert_eq!(i16::from_le_bytes([blob[14], blob[15]]), 48);
    assert_eq!(&blob[32..38], b"QLIN16");
    assert!(blob[38..44].iter().all(|&b| b == 0));
    assert_eq!(read_i32(&blob, 44), 2);
    assert_eq!(data_offset(Revision::V2, 2), 56);
    assert_eq!(blob.len(), 56 + 32);
}

#[test]
fn test_data_offsets() {
    assert_eq!(data_offset(Revision::V1, 0), 36);
    assert_eq!(data_offset(Revision::V1, 3), 48);
    assert_eq!(data_offset(Revision::V2, 0), 48);
    assert_eq!(data_offset(Revision::V2, 3), 60);
}

#[test]
fn test_corrupt_magic_rejected() {
    let blob = BlobCodec::default()
        .pack_array(&matrix(), &CompressionSelection::none())
        .unwrap()
        .into_bytes();

    for i in 0..MAGIC.len() {
        let mut corrupt = blob.clone();
        corrupt[i] ^= 0x5A;
        assert!(
            matches!(
                BlobCodec::default().unpack(&corrupt),
                Err(Error::UnsupportedHeader(_))
            ),
            "magic byte {} not checked",
            i
        );
    }
}

#[test]
fn test_unknown_version_rejected() {
    let blob = BlobCodec::default()
        .pack_array(&matrix(), &CompressionSelection::none())
        .unwrap()
        .into_bytes();

    for version in [0i16, 35, 37, 47, 49, -36] {
        let mut corrupt = blob.clone();
        corrupt[14..16].copy_from_slice(&version.to_le_bytes());
        assert!(
            matches!(BlobHeader::decode(&corrupt), Err(Error::UnsupportedHeader(_))),
            "version {} accepted",
            version
        );
    }
}

#[test]
fn test_unknown_element_type_rejected() {
    let mut blob = BlobCodec::default()
        .pack_array(&matrix(), &CompressionSelection::none())
        .unwrap()
        .into_bytes();
    blob[16..20].copy_from_slice(&5i32.to_le_bytes());

    assert!(matches!(
        BlobCodec::default().unpack(&blob),
        Err(Error::UnsupportedVariableType(_))
    ));
}

#[test]
fn test_truncated_blob_rejected() {
    let blob = BlobCodec::default()
        .pack_array(&matrix(), &CompressionSelection::none())
        .unwrap()
        .into_bytes();

    assert!(matches!(
        BlobHeader::decode(&blob[..20]),
        Err(Error::UnsupportedHeader(_))
    ));
    assert!(matches!(
        BlobHeader::decode(&blob[..40]),
        Err(Error::UnsupportedHeader(_))
    ));
    assert!(BlobCodec::default().unpack(&blob[..100]).is_err());
}

#[test]
fn test_foreign_platform_is_a_warning() {
    let foreign = Platform::new("SOL64", Endianness::Big);
    let header =
        BlobHeader::with_platform(ElementType::Int16, &[1, 2], None, foreign).unwrap();
    let mut blob = header.encode();
    blob.extend_from_slice(&[0x01, 0x00, 0x02, 0x00]);

    assert_eq!(blob[31], b'B');
    let unpacked = BlobCodec::default().unpack(&blob).unwrap();
    let mismatch = unpacked.platform_mismatch.expect("mismatch reported");
    assert_eq!(mismatch.stored.name(), "SOL64");
    assert_eq!(mismatch.current, Platform::current());

    // payload bytes are used exactly as stored
    let array = unpacked.value.into_array().unwrap();
    assert_eq!(array.data(), &[0x01, 0x00, 0x02, 0x00]);

    assert!(typeblob::validate_platform(&blob).unwrap().is_some());
}

#[test]
fn test_header_roundtrip_every_type() {
    for element_type in ElementType::ALL {
        for dims in [vec![], vec![7], vec![2, 3, 4]] {
            for compressor in [None, Some("lz4hc")] {
                let header = BlobHeader::new(element_type, &dims, compressor).unwrap();
                let bytes = header.encode();
                let (decoded, offset) = BlobHeader::decode(&bytes).unwrap();
                assert_eq!(decoded, header);
                assert_eq!(offset, bytes.len());
                assert_eq!(offset, header.data_offset());
            }
        }
    }
}

#[test]
fn test_size_limit_config() {
    let config = BlobConfig::new().with_max_blob_size(44 + 96);
    assert!(BlobCodec::new(config)
        .pack_array(&matrix(), &CompressionSelection::none())
        .is_ok());
}
