// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scan execution engine
//!
//! This module provides the engine that takes a scan query description and
//! executes it against one segment, producing a lazy stream of result
//! batches while sharing limit and deadline state across segments.

pub mod context;
pub mod error;
pub mod result;
pub mod scan;

// Re-export the main types for convenience
pub use context::{ResponseContext, SharedResponseContext};
pub use error::{ExecutionError, TimeoutError};
pub use result::{RecordRow, ScanBatch, ScanEvents, TupleRow};
pub use scan::{ScanBatchStream, ScanEngine};
