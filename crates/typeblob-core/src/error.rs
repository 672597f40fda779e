//! Error types for typed blob operations.

use thiserror::Error;

/// Result type alias for typed blob operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Typed blob error types.
///
/// Every pipeline step returns one of these; the first failure aborts the
/// remaining steps of that call. Platform mismatches are not errors and
/// are reported alongside a successful unpack instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A buffer could not be allocated.
    #[error("allocation failed: could not allocate {requested_bytes} bytes")]
    AllocationFailed { requested_bytes: usize },

    /// The encoded blob would exceed the configured maximum size.
    #[error("blob too big: {size} bytes exceeds the limit of {limit} bytes")]
    BlobTooBig { size: usize, limit: usize },

    /// Codec failure or round-trip verification mismatch.
    #[error("compression error: {message}")]
    Compression { message: String },

    /// Compressor name is not recognized.
    #[error("unknown compressor: {0:?}")]
    UnknownCompressor(String),

    /// Quantizer was given data it cannot encode (non-float64 input).
    #[error("invalid compressor argument: {0}")]
    CompressorArgument(String),

    /// Input lies outside the domain of the selected codec.
    #[error("compressor domain error: {0}")]
    CompressorDomain(String),

    /// Bad magic or unknown header revision.
    #[error("unsupported header: {0}")]
    UnsupportedHeader(String),

    /// Value cannot be stored or restored with the active settings.
    #[error("unsupported variable type: {0}")]
    UnsupportedVariableType(String),

    /// Invalid compression level specified.
    #[error("invalid compression level {level}: must be in range [{min}, {max}]")]
    InvalidLevel { level: i32, min: i32, max: i32 },

    /// Buffer too small for output.
    #[error("buffer too small: need {required} bytes, got {provided}")]
    BufferTooSmall { required: usize, provided: usize },

    /// Value shape and data length disagree.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// The structural serializer reported a failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a compression error.
    pub fn compression(message: impl Into<String>) -> Self {
        Error::Compression {
            message: message.into(),
        }
    }

    /// Create an unsupported header error.
    pub fn unsupported_header(message: impl Into<String>) -> Self {
        Error::UnsupportedHeader(message.into())
    }

    /// Create an unsupported variable type error.
    pub fn unsupported_type(message: impl Into<String>) -> Self {
        Error::UnsupportedVariableType(message.into())
    }

    /// Create a buffer too small error.
    pub fn buffer_too_small(required: usize, provided: usize) -> Self {
        Error::BufferTooSmall { required, provided }
    }

    /// Create a blob too big error.
    pub fn blob_too_big(size: usize, limit: usize) -> Self {
        Error::BlobTooBig { size, limit }
    }

    /// Check if the error is transient, so the caller may retry the whole
    /// operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::AllocationFailed { .. })
    }

    /// Get error category for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Error::AllocationFailed { .. } => "allocation_failed",
            Error::BlobTooBig { .. } => "blob_too_big",
            Error::Compression { .. } => "compression",
            Error::UnknownCompressor(_) => "unknown_compressor",
            Error::CompressorArgument(_) => "compressor_argument",
            Error::CompressorDomain(_) => "compressor_domain",
            Error::UnsupportedHeader(_) => "unsupported_header",
            Error::UnsupportedVariableType(_) => "unsupported_variable_type",
            Error::InvalidLevel { .. } => "invalid_level",
            Error::BufferTooSmall { .. } => "buffer_too_small",
            Error::InvalidShape(_) => "invalid_shape",
            Error::Serialization(_) => "serialization",
        }
    }
}

/// Allocate a zeroed byte buffer, reporting allocator failure as
/// [`Error::AllocationFailed`] instead of aborting.
pub fn alloc_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed {
            requested_bytes: len,
        })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Allocate an empty byte buffer with room for `capacity` bytes.
pub fn alloc_with_capacity(capacity: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity)
        .map_err(|_| Error::AllocationFailed {
            requested_bytes: capacity,
        })?;
    Ok(buf)
}
