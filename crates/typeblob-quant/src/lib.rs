//! # Typeblob Quant
//!
//! Lossy 16-bit quantization of float64 arrays with exact encoding of
//! zero, signed zero, infinities and NaN.
//!
//! Two transforms are provided:
//!
//! - **Linear** (`QLIN16`): codes are evenly spaced between the smallest
//!   and largest finite non-zero value.
//! - **Logarithmic** (`QLOG16`): codes are evenly spaced in `ln(value)`,
//!   giving constant relative precision for non-negative data.
//!
//! ## Example
//!
//! ```ignore
//! use typeblob_quant::Quantizer16;
//!
//! let q = Quantizer16::logarithmic();
//! let mut payload = vec![0u8; typeblob_quant::encoded_size(values.len())];
//! q.encode(&values, &mut payload)?;
//! ```

pub mod quantizer;

pub use quantizer::{
    check_payload_len, encoded_size, QuantMode, QuantParams, Quantizer16, CODE_MASK, LEVELS, NAN,
    NEG_INF, NEG_ZERO, POS_INF, POS_ZERO, PRELUDE_SIZE,
};
