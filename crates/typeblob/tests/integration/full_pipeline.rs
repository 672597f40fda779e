//! Full pack/unpack pipeline tests.

use std::collections::BTreeMap;

use typeblob::{
    compression_ratio, BlobCodec, BlobConfig, BlobInfo, CodecKind, CompressionSelection,
    ElementType, Error, JsonSerializer, Lz4Flavor, Metrics, Revision, TypedArray, TypedBlobMode,
    Value,
};

fn matrix() -> TypedArray {
    let values: Vec<f64> = (1..=12).map(f64::from).collect();
    TypedArray::from_slice(vec![3, 4], &values).unwrap()
}

/// Bytes with a short period, so lossless codecs always shrink them.
fn repetitive(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 7) as u8).collect()
}

#[test]
fn test_uncompressed_matrix() {
    let codec = BlobCodec::default();
    let packed = codec
        .pack_array(&matrix(), &CompressionSelection::none())
        .unwrap();

    assert_eq!(packed.revision, Revision::V1);
    let info = BlobInfo::read(&packed.bytes).unwrap();
    assert_eq!(info.dims, vec![3, 4]);
    assert_eq!(info.payload_size, 96);
    assert_eq!(&packed.bytes[44..], matrix().data());

    let unpacked = codec.unpack(&packed.bytes).unwrap();
    assert_eq!(unpacked.revision, Revision::V1);
    assert_eq!(unpacked.value, Value::Array(matrix()));
}

#[test]
fn test_size_limit_one_byte_short() {
    let limit = 44 + 96 - 1;
    let codec = BlobCodec::new(BlobConfig::new().with_max_blob_size(limit));

    let result = codec.pack_array(&matrix(), &CompressionSelection::none());
    assert!(matches!(
        result,
        Err(Error::BlobTooBig { size: 140, limit: 139 })
    ));
}

#[test]
fn test_size_limit_applies_to_compressed_blob() {
    let array = TypedArray::new(ElementType::UInt8, vec![1, 4096], repetitive(4096)).unwrap();
    let selection = CompressionSelection::select("lz4", 9).unwrap();

    let packed = BlobCodec::default().pack_array(&array, &selection).unwrap();
    assert_eq!(packed.revision, Revision::V2);

    // room for the compressed blob but not for the raw one
    let codec = BlobCodec::new(BlobConfig::new().with_max_blob_size(packed.len()));
    assert!(codec.pack_array(&array, &selection).is_ok());
    assert!(codec
        .pack_array(&array, &CompressionSelection::none())
        .is_err());
}

#[test]
fn test_every_element_type_and_rank() {
    let codec = BlobCodec::default();
    let selections = [
        CompressionSelection::none(),
        CompressionSelection::select("blosclz", 5).unwrap(),
    ];

    for element_type in ElementType::ALL
        .into_iter()
        .filter(|t| *t != ElementType::Opaque)
    {
        for dims in [vec![], vec![5], vec![2, 3, 2]] {
            let count: usize = if dims.is_empty() {
                0
            } else {
                dims.iter().product()
            };
            let data = repetitive(count * element_type.size());
            let array = TypedArray::new(element_type, dims.clone(), data).unwrap();

            for selection in &selections {
                let packed = codec.pack_array(&array, selection).unwrap();
                let unpacked = codec.unpack(&packed.bytes).unwrap();
                assert_eq!(
                    unpacked.value.into_array().unwrap(),
                    array,
                    "{} {:?} with {}",
                    element_type.name(),
                    dims,
                    selection
                );
            }
        }
    }
}

#[test]
fn test_lossless_aliases() {
    let data = repetitive(8 * 1000);
    let array = TypedArray::new(ElementType::Float64, vec![1000, 1], data).unwrap();
    let codec = BlobCodec::default();

    for flavor in Lz4Flavor::ALL {
        let selection = CompressionSelection::select(flavor.name(), 6).unwrap();
        let packed = codec.pack_array(&array, &selection).unwrap();
        assert_eq!(packed.revision, Revision::V2);
        assert!(packed.ratio < 1.0);
        assert_eq!(packed.stats.codec, CodecKind::Lossless);

        let info = BlobInfo::read(&packed.bytes).unwrap();
        assert_eq!(info.compressor.as_deref(), Some(flavor.name()));

        let unpacked = codec.unpack(&packed.bytes).unwrap();
        assert_eq!(unpacked.value.as_array(), Some(&array));
        assert!(unpacked.ratio > 0.0 && unpacked.ratio < 1.0);
        assert!((compression_ratio(&packed.bytes).unwrap() - unpacked.ratio).abs() < 1e-12);
    }
}

#[test]
fn test_incompressible_falls_back() {
    // 4 bytes cannot absorb the 12 extra header bytes of revision 2
    let array = TypedArray::from_slice(vec![1, 1], &[0xDEADBEEFu32]).unwrap();
    let selection = CompressionSelection::select("lz4", 9).unwrap();

    let packed = BlobCodec::default().pack_array(&array, &selection).unwrap();
    assert_eq!(packed.revision, Revision::V1);
    assert_eq!(packed.ratio, 1.0);
    assert_eq!(packed.len(), 44 + 4);
}

#[test]
fn test_quantizer_rejects_integers() {
    let array = TypedArray::from_slice(vec![1, 3], &[1i32, 2, 3]).unwrap();
    let selection = CompressionSelection::select("QLIN16", 1).unwrap();
    assert!(matches!(
        BlobCodec::default().pack_array(&array, &selection),
        Err(Error::CompressorArgument(_))
    ));
}

#[test]
fn test_default_selection_from_config() {
    let config = BlobConfig::new().with_compressor("lz4hc", 9);
    let codec = BlobCodec::new(config);
    let array = TypedArray::new(ElementType::UInt16, vec![64, 64], repetitive(8192)).unwrap();

    let packed = codec.pack_default(&array.clone().into()).unwrap();
    let info = BlobInfo::read(&packed.bytes).unwrap();
    assert_eq!(info.compressor.as_deref(), Some("lz4hc"));
    assert_eq!(codec.unpack(&packed.bytes).unwrap().value, Value::Array(array));
}

#[test]
fn test_text_and_logical() {
    let codec = BlobCodec::default();

    let text = TypedArray::from_text("typed blob ✓").unwrap();
    let packed = codec
        .pack_array(&text, &CompressionSelection::none())
        .unwrap();
    let back = codec.unpack(&packed.bytes).unwrap().value.into_array().unwrap();
    assert_eq!(back.to_text().unwrap(), "typed blob ✓");

    let mask = TypedArray::from_bools(vec![2, 2], &[true, false, false, true]).unwrap();
    let packed = codec
        .pack_array(&mask, &CompressionSelection::none())
        .unwrap();
    let back = codec.unpack(&packed.bytes).unwrap().value.into_array().unwrap();
    assert_eq!(back.element_type(), ElementType::Logical);
    assert_eq!(back.data(), &[1, 0, 0, 1]);
}

#[test]
fn test_composite_through_json() {
    let config = BlobConfig::new().with_mode(TypedBlobMode::ByteStream);
    let codec = BlobCodec::with_serializer(config, JsonSerializer::<BTreeMap<String, Vec<i64>>>::new());

    let mut record = BTreeMap::new();
    record.insert("primes".to_string(), vec![2, 3, 5, 7, 11, 13]);
    record.insert("squares".to_string(), (1..=64).map(|i| i * i).collect());
    let value = Value::Composite(record);

    for selection in [
        CompressionSelection::none(),
        CompressionSelection::select("blosclz", 9).unwrap(),
    ] {
        let packed = codec.pack(&value, &selection).unwrap();
        let info = BlobInfo::read(&packed.bytes).unwrap();
        assert_eq!(info.element_type, ElementType::Opaque);
        assert_eq!(info.dims[0], 1);

        let unpacked = codec.unpack(&packed.bytes).unwrap();
        assert_eq!(unpacked.value, value);
    }
}

#[test]
fn test_mode_off_refuses_everything() {
    let codec = BlobCodec::new(BlobConfig::new().with_mode(TypedBlobMode::Off));
    assert!(matches!(
        codec.pack_array(&matrix(), &CompressionSelection::none()),
        Err(Error::UnsupportedVariableType(_))
    ));
}

#[test]
fn test_metrics_across_calls() {
    let codec = BlobCodec::default();
    let mut metrics = Metrics::new();
    let compressible = TypedArray::new(ElementType::UInt8, vec![1, 4096], repetitive(4096)).unwrap();
    let tiny = TypedArray::from_slice(vec![1, 1], &[7u16]).unwrap();
    let lz4 = CompressionSelection::select("lz4", 9).unwrap();

    for array in [&compressible, &tiny] {
        match codec.pack_array(array, &lz4) {
            Ok(packed) => metrics.record(&packed.stats),
            Err(_) => metrics.record_error(),
        }
    }
    match codec.pack_array(&matrix(), &CompressionSelection::select("QLOG16", 1).unwrap()) {
        Ok(packed) => metrics.record(&packed.stats),
        Err(_) => metrics.record_error(),
    }

    assert_eq!(metrics.total_operations, 3);
    assert_eq!(metrics.uncompressed_count, 1);
    assert_eq!(metrics.error_count, 0);
    assert_eq!(metrics.total_bytes_in, 4096 + 2 + 96);
    assert!(metrics.average_ratio() < 1.0);
}
