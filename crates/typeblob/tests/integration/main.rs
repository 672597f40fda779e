//! Integration tests for the typed blob pipelines.
//!
//! These tests drive the public API end to end, from typed arrays to
//! encoded blobs and back.

mod format_compatibility;
mod full_pipeline;
mod quality_regression;
