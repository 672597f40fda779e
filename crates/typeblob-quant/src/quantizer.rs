//! 16-bit sentinel quantizer.
//!
//! Payload layout:
//!
//! ```text
//! +------------+-----------+----------------------------+
//! | offset f32 | scale f32 | code u16 × element count   |
//! +------------+-----------+----------------------------+
//! ```
//!
//! All fields little-endian. Ordinary codes are multiples of 8 in
//! `0..=0xFFF8`; the five codes above that band carry zero, infinities
//! and NaN exactly.

use typeblob_core::{
    CodecKind, Codec, CompressionLevel, Compressor, Decompressor, ElementLayout, Error, Result,
};

/// Largest ordinary code; also the number of quantization levels.
pub const LEVELS: u16 = 0xFFF8;

/// Mask applied to ordinary codes, keeping them clear of the sentinel band.
pub const CODE_MASK: u16 = 0xFFF8;

/// Code for `+0.0`.
pub const POS_ZERO: u16 = 0xFFF9;
/// Code for `-0.0`.
pub const NEG_ZERO: u16 = 0xFFFA;
/// Code for `+inf`.
pub const POS_INF: u16 = 0xFFFB;
/// Code for `-inf`.
pub const NEG_INF: u16 = 0xFFFC;
/// Code for NaN.
pub const NAN: u16 = 0xFFFD;

/// Size of the offset/scale prelude in bytes.
pub const PRELUDE_SIZE: usize = 8;

/// Value transform applied before quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantMode {
    /// Identity transform.
    Linear,
    /// Natural logarithm; non-negative input only.
    Logarithmic,
}

impl QuantMode {
    #[inline]
    fn forward(self, value: f64) -> f64 {
        match self {
            QuantMode::Linear => value,
            QuantMode::Logarithmic => value.ln(),
        }
    }

    #[inline]
    fn inverse(self, value: f64) -> f64 {
        match self {
            QuantMode::Linear => value,
            QuantMode::Logarithmic => value.exp(),
        }
    }
}

/// Offset and scale of a quantized payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantParams {
    /// Transformed minimum.
    pub offset: f64,
    /// Transformed value width of one code unit.
    pub scale: f64,
}

impl QuantParams {
    /// Read the prelude of an encoded payload.
    pub fn read(payload: &[u8]) -> Result<Self> {
        if payload.len() < PRELUDE_SIZE {
            return Err(Error::compression(format!(
                "quantized payload too short: {} bytes",
                payload.len()
            )));
        }
        Ok(QuantParams {
            offset: f64::from(read_f32(&payload[0..4])),
            scale: f64::from(read_f32(&payload[4..8])),
        })
    }

    fn write(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&(self.offset as f32).to_le_bytes());
        out[4..8].copy_from_slice(&(self.scale as f32).to_le_bytes());
    }
}

/// Encoded size for `count` elements.
#[inline]
pub fn encoded_size(count: usize) -> usize {
    PRELUDE_SIZE + count * 2
}

/// Check that a payload of `len` bytes encodes exactly `count` elements.
pub fn check_payload_len(len: usize, count: usize) -> Result<()> {
    let expected = count
        .checked_mul(2)
        .and_then(|codes| codes.checked_add(PRELUDE_SIZE));
    if expected != Some(len) {
        return Err(Error::compression(format!(
            "quantized payload has {} bytes, which does not hold {} elements",
            len, count
        )));
    }
    Ok(())
}

/// Lossy 16-bit quantizer for float64 arrays.
#[derive(Debug, Clone, Copy)]
pub struct Quantizer16 {
    mode: QuantMode,
    level: CompressionLevel,
}

impl Quantizer16 {
    /// Create a quantizer for a mode.
    pub fn new(mode: QuantMode) -> Self {
        Self {
            mode,
            level: CompressionLevel::FAST,
        }
    }

    /// Linear quantizer.
    pub fn linear() -> Self {
        Self::new(QuantMode::Linear)
    }

    /// Logarithmic quantizer.
    pub fn logarithmic() -> Self {
        Self::new(QuantMode::Logarithmic)
    }

    /// Set the recorded level. Quantization does not depend on it.
    pub fn at_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Get the transform mode.
    pub fn mode(&self) -> QuantMode {
        self.mode
    }

    /// Derive offset and scale from the finite, non-zero values.
    ///
    /// Bounds are found on raw values and transformed afterwards.
    pub fn params(&self, values: &[f64]) -> Result<QuantParams> {
        self.params_of(values.iter().copied())
    }

    fn params_of(&self, values: impl Iterator<Item = f64>) -> Result<QuantParams> {
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        for v in values.filter(|v| v.is_finite() && *v != 0.0) {
            min = Some(min.map_or(v, |m| m.min(v)));
            max = Some(max.map_or(v, |m| m.max(v)));
        }

        if self.mode == QuantMode::Logarithmic && min.is_some_and(|m| m < 0.0) {
            return Err(Error::CompressorDomain(
                "log quantizer accepts non-negative values only".into(),
            ));
        }

        let offset = min.map_or(0.0, |m| self.mode.forward(m));
        let scale = match max {
            Some(m) => {
                let scale = (self.mode.forward(m) - offset) / f64::from(LEVELS);
                if scale == 0.0 {
                    1.0
                } else {
                    scale
                }
            }
            None => 1.0,
        };

        Ok(QuantParams { offset, scale })
    }

    /// Quantize `values` into `out`, returning the bytes written.
    pub fn encode(&self, values: &[f64], out: &mut [u8]) -> Result<usize> {
        self.encode_from(values.iter().copied(), values.len(), out)
    }

    /// Two passes over `values`: bounds first, then codes.
    fn encode_from<I>(&self, values: I, count: usize, out: &mut [u8]) -> Result<usize>
    where
        I: Iterator<Item = f64> + Clone,
    {
        let required = encoded_size(count);
        if out.len() < required {
            return Err(Error::buffer_too_small(required, out.len()));
        }

        let params = self.params_of(values.clone())?;
        params.write(out);

        for (v, slot) in values.zip(out[PRELUDE_SIZE..required].chunks_exact_mut(2)) {
            let code = self.quantize(v, &params);
            slot.copy_from_slice(&code.to_le_bytes());
        }
        Ok(required)
    }

    /// Reconstruct values from an encoded payload.
    ///
    /// `out` must hold exactly as many elements as were encoded. The two
    /// codes above [`NAN`] are never written by the encoder and fail as
    /// corrupt input.
    pub fn decode(&self, payload: &[u8], out: &mut [f64]) -> Result<()> {
        self.decode_each(payload, out.len(), |i, v| out[i] = v)
    }

    fn decode_each(
        &self,
        payload: &[u8],
        count: usize,
        mut store: impl FnMut(usize, f64),
    ) -> Result<()> {
        check_payload_len(payload.len(), count)?;

        let params = QuantParams::read(payload)?;
        for (i, code) in payload[PRELUDE_SIZE..].chunks_exact(2).enumerate() {
            let value = self.dequantize(u16::from_le_bytes([code[0], code[1]]), &params)?;
            store(i, value);
        }
        Ok(())
    }

    #[inline]
    fn quantize(&self, value: f64, params: &QuantParams) -> u16 {
        if value.is_nan() {
            NAN
        } else if value == 0.0 {
            if value.is_sign_negative() {
                NEG_ZERO
            } else {
                POS_ZERO
            }
        } else if value.is_infinite() {
            if value.is_sign_negative() {
                NEG_INF
            } else {
                POS_INF
            }
        } else {
            let steps = (self.mode.forward(value) - params.offset) / params.scale;
            (steps as u16) & CODE_MASK
        }
    }

    #[inline]
    fn dequantize(&self, code: u16, params: &QuantParams) -> Result<f64> {
        Ok(match code {
            POS_ZERO => 0.0,
            NEG_ZERO => -0.0,
            POS_INF => f64::INFINITY,
            NEG_INF => f64::NEG_INFINITY,
            NAN => f64::NAN,
            c if c > NAN => {
                return Err(Error::compression(format!(
                    "reserved quantizer code {:#06X}",
                    c
                )))
            }
            c => self.mode.inverse(f64::from(c) * params.scale + params.offset),
        })
    }
}

impl Default for Quantizer16 {
    fn default() -> Self {
        Self::linear()
    }
}

fn check_layout(layout: ElementLayout, len: usize) -> Result<usize> {
    if !layout.is_float64 {
        return Err(Error::CompressorArgument(
            "quantizer requires float64 elements".into(),
        ));
    }
    if len % 8 != 0 {
        return Err(Error::CompressorArgument(format!(
            "{} bytes is not a whole number of float64 elements",
            len
        )));
    }
    Ok(len / 8)
}

#[inline]
fn read_f32(bytes: &[u8]) -> f32 {
    f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[inline]
fn read_f64(bytes: &[u8]) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    f64::from_ne_bytes(raw)
}

impl Compressor for Quantizer16 {
    fn kind(&self) -> CodecKind {
        match self.mode {
            QuantMode::Linear => CodecKind::LinearQuant,
            QuantMode::Logarithmic => CodecKind::LogQuant,
        }
    }

    fn level(&self) -> CompressionLevel {
        self.level
    }

    fn max_compressed_size(&self, input_len: usize, _layout: ElementLayout) -> usize {
        encoded_size(input_len / 8)
    }

    fn compress_to(&self, input: &[u8], layout: ElementLayout, output: &mut [u8]) -> Result<usize> {
        let count = check_layout(layout, input.len())?;
        self.encode_from(input.chunks_exact(8).map(read_f64), count, output)
    }
}

impl Decompressor for Quantizer16 {
    fn kind(&self) -> CodecKind {
        Compressor::kind(self)
    }

    fn decompress_to(&self, input: &[u8], layout: ElementLayout, output: &mut [u8]) -> Result<()> {
        let count = check_layout(layout, output.len())?;
        self.decode_each(input, count, |i, v| {
            output[i * 8..i * 8 + 8].copy_from_slice(&v.to_ne_bytes());
        })
    }
}

impl Codec for Quantizer16 {
    fn with_level(level: CompressionLevel) -> Self {
        Quantizer16::linear().at_level(level)
    }
}
