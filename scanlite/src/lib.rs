// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! ScanLite - A lazy, limit-aware scan engine for columnar segments
//!
//! ScanLite executes a single scan query against one segment (a bounded,
//! immutable slice of a larger dataset) and produces a lazily-evaluated,
//! paginated stream of result batches. It is built to cooperate with a
//! caller that runs the same query across many segments while sharing one
//! mutable [`ResponseContext`] that tracks how many rows have already been
//! emitted and how much wall-clock budget remains.
//!
//! # Features
//!
//! - **Pull-based batching**: one [`ScanBatch`] of up to `batchSize` rows
//!   per pull, never buffering ahead of the caller
//! - **Cross-segment limit accounting**: a shared emitted-row counter lets
//!   later segments shrink or skip their work once the limit is satisfied
//! - **Deadline enforcement**: an optional per-query timeout checked
//!   deterministically between batches
//! - **Two row encodings**: attribute-labeled records (`list`) and
//!   positional tuples (`compactedList`)
//!
//! # Usage
//!
//! ```ignore
//! let query = ScanQuery::builder()
//!     .data_source("wikiticker")
//!     .intervals(vec![interval])
//!     .columns(vec!["countryName".into(), "page".into()])
//!     .limit(100)
//!     .build();
//!
//! let context = ResponseContext::for_query(&query, Utc::now().timestamp_millis())?.shared();
//! let engine = ScanEngine::new();
//! for segment in segments {
//!     for batch in engine.process(&query, segment.as_ref(), &context)? {
//!         serve(batch?);
//!     }
//! }
//! ```

pub mod exec;
pub mod filter;
pub mod query;
pub mod segment;

// Re-export the public API
pub use exec::{
    ExecutionError, ResponseContext, ScanBatch, ScanBatchStream, ScanEngine, ScanEvents,
    SharedResponseContext, TimeoutError,
};
pub use filter::FilterSpec;
pub use query::{Interval, ResultFormat, ScanQuery, VirtualColumn};
pub use segment::{Cursor, Granularity, MemorySegment, Segment, SegmentReader, ValueSelector};

/// ScanLite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ScanLite crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
