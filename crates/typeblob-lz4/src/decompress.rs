//! Shuffled LZ4 frame decompressor.

use typeblob_core::{alloc_zeroed, CodecKind, Decompressor, ElementLayout, Error, Result};

use crate::frame::{FrameHeader, HEADER_SIZE};
use crate::shuffle::unshuffle_into;

/// Shuffled LZ4 frame decompressor.
#[derive(Debug, Clone, Default)]
pub struct Lz4FrameDecompressor;

impl Lz4FrameDecompressor {
    /// Create a new decompressor.
    pub fn new() -> Self {
        Self
    }
}

impl Decompressor for Lz4FrameDecompressor {
    fn kind(&self) -> CodecKind {
        CodecKind::Lossless
    }

    fn decompress_to(&self, input: &[u8], _layout: ElementLayout, output: &mut [u8]) -> Result<()> {
        let header = FrameHeader::parse(input)?;

        // The frame must describe exactly the destination before anything is written.
        if header.nbytes as usize != output.len() {
            return Err(Error::compression(format!(
                "frame holds {} bytes, destination expects {}",
                header.nbytes,
                output.len()
            )));
        }
        if header.cbytes as usize != input.len() {
            return Err(Error::compression(format!(
                "frame declares {} bytes, got {}",
                header.cbytes,
                input.len()
            )));
        }

        let body = &input[HEADER_SIZE..];

        if header.is_memcpy() {
            if body.len() != output.len() {
                return Err(Error::compression("stored frame body has wrong length"));
            }
            output.copy_from_slice(body);
            return Ok(());
        }

        if header.is_shuffled() {
            let mut scratch = alloc_zeroed(output.len())?;
            decode_block(body, &mut scratch)?;
            unshuffle_into(&scratch, usize::from(header.typesize), output);
        } else {
            decode_block(body, output)?;
        }

        Ok(())
    }
}

fn decode_block(body: &[u8], output: &mut [u8]) -> Result<()> {
    let written = lz4_flex::block::decompress_into(body, output)
        .map_err(|e| Error::compression(format!("lz4 block: {}", e)))?;
    if written != output.len() {
        return Err(Error::compression(format!(
            "lz4 block produced {} bytes, expected {}",
            written,
            output.len()
        )));
    }
    Ok(())
}
