//! Blob configuration

use serde::{Deserialize, Serialize};
use typeblob_core::{CompressionLevel, Result};

use crate::engine::CompressionSelection;

/// Environment variable naming the default compressor.
pub const ENV_COMPRESSOR: &str = "TYPEBLOB_COMPRESSOR";
/// Environment variable holding the default level.
pub const ENV_LEVEL: &str = "TYPEBLOB_LEVEL";
/// Environment variable toggling round-trip verification.
pub const ENV_VERIFY: &str = "TYPEBLOB_VERIFY";
/// Environment variable holding the blob size limit.
pub const ENV_MAX_BLOB_SIZE: &str = "TYPEBLOB_MAX_BLOB_SIZE";
/// Environment variable selecting the typed blob mode.
pub const ENV_MODE: &str = "TYPEBLOB_MODE";

/// Largest blob the storage engine accepts.
pub const DEFAULT_MAX_BLOB_SIZE: usize = i32::MAX as usize;

/// Which values are stored as typed blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypedBlobMode {
    /// Typed blobs disabled; callers store raw bytes themselves.
    Off,
    /// Flat typed arrays only.
    #[default]
    Array,
    /// Flat arrays plus composite values through the serializer.
    ByteStream,
}

impl TypedBlobMode {
    /// Parse a mode name or its numeric form (0, 1, 2).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "off" | "no" => Some(TypedBlobMode::Off),
            "1" | "array" => Some(TypedBlobMode::Array),
            "2" | "byte_stream" | "bytestream" | "stream" => Some(TypedBlobMode::ByteStream),
            _ => None,
        }
    }

    /// Check if composite values may be serialized.
    pub fn allows_serialization(self) -> bool {
        self == TypedBlobMode::ByteStream
    }
}

/// Pack and unpack settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    /// Default compressor name (empty = none)
    pub compressor: String,
    /// Default compression level, 0..=9
    pub level: i32,
    /// Decompress and compare lossless payloads after packing
    pub verify_round_trip: bool,
    /// Maximum encoded blob size in bytes
    pub max_blob_size: usize,
    /// Typed blob mode
    pub mode: TypedBlobMode,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            compressor: String::new(),
            level: 0,
            verify_round_trip: true,
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
            mode: TypedBlobMode::Array,
        }
    }
}

impl BlobConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from `TYPEBLOB_*` environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through a lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            compressor: lookup(ENV_COMPRESSOR)
                .map(|s| s.trim().to_string())
                .unwrap_or(defaults.compressor),
            level: lookup(ENV_LEVEL)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.level),
            verify_round_trip: lookup(ENV_VERIFY)
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.verify_round_trip),
            max_blob_size: lookup(ENV_MAX_BLOB_SIZE)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.max_blob_size),
            mode: lookup(ENV_MODE)
                .and_then(|s| TypedBlobMode::parse(&s))
                .unwrap_or(defaults.mode),
        };
        config.validate()?;
        Ok(config)
    }

    /// Set default compressor and level
    pub fn with_compressor(mut self, name: impl Into<String>, level: i32) -> Self {
        self.compressor = name.into();
        self.level = level;
        self
    }

    /// Set round-trip verification
    pub fn with_verify_round_trip(mut self, verify: bool) -> Self {
        self.verify_round_trip = verify;
        self
    }

    /// Set blob size limit
    pub fn with_max_blob_size(mut self, limit: usize) -> Self {
        self.max_blob_size = limit;
        self
    }

    /// Set typed blob mode
    pub fn with_mode(mut self, mode: TypedBlobMode) -> Self {
        self.mode = mode;
        self
    }

    /// Check the level range and compressor name.
    pub fn validate(&self) -> Result<()> {
        CompressionLevel::from_level(self.level)?;
        self.selection().map(|_| ())
    }

    /// Parse the configured compressor into a selection.
    pub fn selection(&self) -> Result<CompressionSelection> {
        CompressionSelection::select(&self.compressor, self.level)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
