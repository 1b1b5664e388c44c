// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Segment and cursor abstractions
//!
//! A [`Segment`] is an opaque handle to one immutable partition of data.
//! Its [`SegmentReader`] builds row cursors over a time interval and an
//! already-normalized filter; the engine drives those cursors but performs
//! no I/O of its own.

pub mod cursor;
pub mod memory;

pub use cursor::{Cursor, ValueSelector};
pub use memory::MemorySegment;

use crate::filter::FilterSpec;
use crate::query::{Interval, VirtualColumn};

/// Name of the designated timestamp column every segment carries.
pub const TIME_COLUMN: &str = "__time";

/// Row grouping granularity. Scans are flat: one row per input row, never
/// bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    #[default]
    Flat,
}

/// An immutable, already-located partition of a dataset.
///
/// Lifecycle is owned entirely by the caller; the engine only reads from it
/// for the duration of one `process` call.
pub trait Segment: Send + Sync {
    /// Stable identifier, tagged onto every result batch.
    fn id(&self) -> &str;

    /// Access the segment's reader. `None` means the backing data is no
    /// longer mapped and the segment cannot be queried.
    fn reader(&self) -> Option<&dyn SegmentReader>;
}

/// Cursor factory plus schema introspection for one segment.
pub trait SegmentReader: Send + Sync {
    /// Dimension column names in the segment's native order.
    fn available_dimensions(&self) -> Vec<String>;

    /// Metric column names in the segment's native order.
    fn available_metrics(&self) -> Vec<String>;

    /// Build one cursor per internal sub-partition over the given interval.
    /// May yield zero cursors when nothing in the segment matches.
    fn make_cursors(
        &self,
        filter: Option<&FilterSpec>,
        interval: &Interval,
        virtual_columns: &[VirtualColumn],
        granularity: Granularity,
        descending: bool,
    ) -> Vec<Box<dyn Cursor>>;
}
