//! Statistics and metrics for pack and unpack operations.

use crate::types::{CodecKind, CompressionRatio};

/// Statistics from a single pack or unpack operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobStats {
    /// Codec family that produced or consumed the payload.
    pub codec: CodecKind,

    /// Raw payload size in bytes.
    pub original_size: usize,

    /// Stored payload size in bytes.
    pub compressed_size: usize,

    /// Time spent in the codec, in microseconds.
    pub time_us: u64,
}

impl Default for BlobStats {
    fn default() -> Self {
        BlobStats {
            codec: CodecKind::None,
            original_size: 0,
            compressed_size: 0,
            time_us: 0,
        }
    }
}

impl BlobStats {
    /// Create stats from a completed operation.
    pub fn from_operation(
        codec: CodecKind,
        original_size: usize,
        compressed_size: usize,
        time_us: u64,
    ) -> Self {
        BlobStats {
            codec,
            original_size,
            compressed_size,
            time_us,
        }
    }

    /// Stats for an uncompressed payload.
    pub fn uncompressed(size: usize) -> Self {
        BlobStats::from_operation(CodecKind::None, size, size, 0)
    }

    /// Get compression ratio.
    pub fn ratio(&self) -> CompressionRatio {
        CompressionRatio::new(self.original_size, self.compressed_size)
    }

    /// Get throughput in bytes per second.
    pub fn throughput_bps(&self) -> f64 {
        if self.time_us == 0 {
            return 0.0;
        }
        self.original_size as f64 * 1_000_000.0 / self.time_us as f64
    }

    /// Get throughput in MB/s.
    pub fn throughput_mbs(&self) -> f64 {
        self.throughput_bps() / 1_000_000.0
    }
}

/// Metrics collector for aggregate statistics.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    /// Total operations performed.
    pub total_operations: u64,

    /// Total raw bytes seen.
    pub total_bytes_in: u64,

    /// Total stored bytes produced or consumed.
    pub total_bytes_out: u64,

    /// Total codec time in microseconds.
    pub total_time_us: u64,

    /// Operations that fell back to the uncompressed revision.
    pub uncompressed_count: u64,

    /// Number of errors encountered.
    pub error_count: u64,
}

impl Metrics {
    /// Create new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed operation.
    pub fn record(&mut self, stats: &BlobStats) {
        self.total_operations += 1;
        self.total_bytes_in += stats.original_size as u64;
        self.total_bytes_out += stats.compressed_size as u64;
        self.total_time_us += stats.time_us;
        if stats.codec == CodecKind::None {
            self.uncompressed_count += 1;
        }
    }

    /// Record an error.
    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    /// Get aggregate stored/raw ratio.
    pub fn average_ratio(&self) -> f64 {
        if self.total_bytes_in == 0 {
            return 1.0;
        }
        self.total_bytes_out as f64 / self.total_bytes_in as f64
    }

    /// Get average throughput in MB/s.
    pub fn average_throughput_mbs(&self) -> f64 {
        if self.total_time_us == 0 {
            return 0.0;
        }
        self.total_bytes_in as f64 / self.total_time_us as f64
    }

    /// Reset all metrics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
