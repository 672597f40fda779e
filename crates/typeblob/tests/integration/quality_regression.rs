//! Quantizer quality regression tests.
//!
//! Reconstruction error is bounded by one masked code step: truncation and
//! the low 3 bits cleared by the code mask lose up to 8 steps, plus the f32
//! rounding of the stored offset and scale.

use typeblob::{
    BlobCodec, CodecKind, CompressionSelection, Error, Revision, TypedArray, Value, QLIN16,
};
use typeblob_quant::{QuantParams, NAN, NEG_INF, NEG_ZERO, POS_INF, POS_ZERO};

const PRELUDE_AT: usize = 48 + 2 * 4;

fn unpack_f64(codec: &BlobCodec, blob: &[u8]) -> Vec<f64> {
    codec
        .unpack(blob)
        .unwrap()
        .value
        .into_array()
        .unwrap()
        .to_vec::<f64>()
        .unwrap()
}

fn codes(blob: &[u8], count: usize) -> Vec<u16> {
    blob[PRELUDE_AT + 8..PRELUDE_AT + 8 + count * 2]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect()
}

#[test]
fn test_linear_matrix() {
    let values: Vec<f64> = (1..=12).map(f64::from).collect();
    let array = TypedArray::from_slice(vec![3, 4], &values).unwrap();
    let selection = CompressionSelection::select(QLIN16, 1).unwrap();
    let codec = BlobCodec::default();

    let packed = codec.pack_array(&array, &selection).unwrap();
    assert_eq!(packed.revision, Revision::V2);
    assert_eq!(packed.stats.codec, CodecKind::LinearQuant);
    assert_eq!(packed.len() - PRELUDE_AT, 8 + 12 * 2);

    let params = QuantParams::read(&packed.bytes[PRELUDE_AT..]).unwrap();
    assert!((params.offset - 1.0).abs() < 1e-6);
    assert!((params.scale - 11.0 / 65528.0).abs() < 1e-9);

    let bound = 8.0 * params.scale + 1e-6;
    let restored = unpack_f64(&codec, &packed.bytes);
    for (original, back) in values.iter().zip(&restored) {
        assert!(
            (original - back).abs() <= bound,
            "{} restored as {}",
            original,
            back
        );
    }
}

#[test]
fn test_log_sentinels() {
    let values = [0.0, -0.0, f64::INFINITY, f64::NEG_INFINITY, f64::NAN];
    let array = TypedArray::from_slice(vec![1, 5], &values).unwrap();
    let selection = CompressionSelection::select("QLOG16", 1).unwrap();
    let codec = BlobCodec::default();

    let packed = codec.pack_array(&array, &selection).unwrap();
    assert_eq!(packed.revision, Revision::V2);
    assert_eq!(
        codes(&packed.bytes, 5),
        vec![POS_ZERO, NEG_ZERO, POS_INF, NEG_INF, NAN]
    );

    let restored = unpack_f64(&codec, &packed.bytes);
    assert_eq!(restored[0].to_bits(), 0.0f64.to_bits());
    assert_eq!(restored[1].to_bits(), (-0.0f64).to_bits());
    assert_eq!(restored[2], f64::INFINITY);
    assert_eq!(restored[3], f64::NEG_INFINITY);
    assert!(restored[4].is_nan());
}

#[test]
fn test_log_range() {
    let values: Vec<f64> = (0..200).map(|i| 1e-3 * 1.05f64.powi(i)).collect();
    let array = TypedArray::from_slice(vec![200, 1], &values).unwrap();
    let selection = CompressionSelection::select("QLOG16", 5).unwrap();
    let codec = BlobCodec::default();

    let packed = codec.pack_array(&array, &selection).unwrap();
    assert_eq!(packed.stats.codec, CodecKind::LogQuant);
    let params = QuantParams::read(&packed.bytes[PRELUDE_AT..]).unwrap();

    // error is bounded in the log domain, hence relative in the value domain
    let bound = 8.0 * params.scale + 1e-5;
    for (original, back) in values.iter().zip(unpack_f64(&codec, &packed.bytes)) {
        assert!((original.ln() - back.ln()).abs() <= bound);
    }
}

#[test]
fn test_log_rejects_negative() {
    let array = TypedArray::from_slice(vec![1, 3], &[1.0, -2.0, 3.0]).unwrap();
    let selection = CompressionSelection::select("QLOG16", 1).unwrap();
    assert!(matches!(
        BlobCodec::default().pack_array(&array, &selection),
        Err(Error::CompressorDomain(_))
    ));
}

#[test]
fn test_flat_array_is_exact() {
    let values = vec![2.5f64; 64];
    let array = TypedArray::from_slice(vec![8, 8], &values).unwrap();
    let codec = BlobCodec::default();

    for name in ["QLIN16", "QLOG16"] {
        let selection = CompressionSelection::select(name, 1).unwrap();
        let packed = codec.pack_array(&array, &selection).unwrap();
        assert_eq!(packed.revision, Revision::V2);

        let params = QuantParams::read(&packed.bytes[PRELUDE_AT..]).unwrap();
        assert_eq!(params.scale, 1.0);
        for back in unpack_f64(&codec, &packed.bytes) {
            assert!((back - 2.5).abs() < 1e-6, "{} restored {}", name, back);
        }
    }
}

#[test]
fn test_mixed_specials_and_values() {
    let values = [-4.0, 0.0, 1.5, f64::NAN, 8.0, f64::NEG_INFINITY, -0.0, 3.25];
    let array = TypedArray::from_slice(vec![2, 4], &values).unwrap();
    let selection = CompressionSelection::select(QLIN16, 9).unwrap();
    let codec = BlobCodec::default();

    let packed = codec.pack_array(&array, &selection).unwrap();
    let params = QuantParams::read(&packed.bytes[PRELUDE_AT..]).unwrap();
    let bound = 8.0 * params.scale + 1e-6;

    let restored = unpack_f64(&codec, &packed.bytes);
    for (original, back) in values.iter().zip(&restored) {
        if original.is_nan() {
            assert!(back.is_nan());
        } else if *original == 0.0 || original.is_infinite() {
            assert_eq!(original.to_bits(), back.to_bits());
        } else {
            assert!((original - back).abs() <= bound);
        }
    }
}

#[test]
fn test_lossy_result_keeps_shape() {
    let values: Vec<f64> = (0..24).map(|i| f64::from(i) * 0.5).collect();
    let array = TypedArray::from_slice(vec![2, 3, 4], &values).unwrap();
    let selection = CompressionSelection::select(QLIN16, 1).unwrap();
    let codec = BlobCodec::default();

    let packed = codec.pack(&Value::Array(array), &selection).unwrap();
    let back = codec.unpack(&packed.bytes).unwrap().value.into_array().unwrap();
    assert_eq!(back.dims(), &[2, 3, 4]);
    assert_eq!(back.len(), 24);
}
