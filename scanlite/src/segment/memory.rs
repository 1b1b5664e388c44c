// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory segment backend
//!
//! A reference implementation of the [`Segment`]/[`SegmentReader`] boundary
//! backed by a plain `Vec` of rows. It applies interval bounds, the
//! equality filter and sort direction at cursor-construction time, and can
//! split its rows into several cursors to model internally partitioned
//! segments. Used by the test suites; not a storage engine.

use crate::filter::FilterSpec;
use crate::query::{Interval, VirtualColumn};
use crate::segment::cursor::{Cursor, ValueSelector};
use crate::segment::{Granularity, Segment, SegmentReader, TIME_COLUMN};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One row: ordered column/value map, including a `__time` entry holding a
/// millisecond epoch timestamp.
pub type MemoryRow = serde_json::Map<String, Value>;

/// An immutable in-memory segment.
#[derive(Debug, Clone)]
pub struct MemorySegment {
    id: String,
    dimensions: Vec<String>,
    metrics: Vec<String>,
    rows: Vec<MemoryRow>,
    chunk_rows: Option<usize>,
    unmapped: bool,
}

impl MemorySegment {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dimensions: Vec::new(),
            metrics: Vec::new(),
            rows: Vec::new(),
            chunk_rows: None,
            unmapped: false,
        }
    }

    pub fn dimensions(mut self, dimensions: Vec<String>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn metrics(mut self, metrics: Vec<String>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn rows(mut self, rows: Vec<MemoryRow>) -> Self {
        self.rows = rows;
        self
    }

    /// Split matching rows into cursors of at most `chunk_rows` rows each,
    /// modeling a segment with several internal sub-partitions.
    pub fn chunk_rows(mut self, chunk_rows: usize) -> Self {
        self.chunk_rows = Some(chunk_rows);
        self
    }

    /// Mark the segment as memory-unmapped: `reader()` returns `None`.
    pub fn unmapped(mut self) -> Self {
        self.unmapped = true;
        self
    }

    fn row_time_millis(row: &MemoryRow) -> Option<i64> {
        row.get(TIME_COLUMN).and_then(Value::as_i64)
    }
}

impl Segment for MemorySegment {
    fn id(&self) -> &str {
        &self.id
    }

    fn reader(&self) -> Option<&dyn SegmentReader> {
        if self.unmapped {
            None
        } else {
            Some(self)
        }
    }
}

impl SegmentReader for MemorySegment {
    fn available_dimensions(&self) -> Vec<String> {
        self.dimensions.clone()
    }

    fn available_metrics(&self) -> Vec<String> {
        self.metrics.clone()
    }

    fn make_cursors(
        &self,
        filter: Option<&FilterSpec>,
        interval: &Interval,
        _virtual_columns: &[VirtualColumn],
        _granularity: Granularity,
        descending: bool,
    ) -> Vec<Box<dyn Cursor>> {
        let mut matching: Vec<MemoryRow> = self
            .rows
            .iter()
            .filter(|row| {
                Self::row_time_millis(row).map_or(false, |t| interval.contains_millis(t))
            })
            .filter(|row| filter.map_or(true, |f| f.matches(row)))
            .cloned()
            .collect();
        if descending {
            matching.reverse();
        }

        let mut known = vec![TIME_COLUMN.to_string()];
        known.extend(self.dimensions.iter().cloned());
        known.extend(self.metrics.iter().cloned());
        let known = Arc::new(known);

        let chunk = self.chunk_rows.unwrap_or(usize::MAX).max(1);
        let mut cursors: Vec<Box<dyn Cursor>> = Vec::new();
        while !matching.is_empty() {
            let rest = matching.split_off(chunk.min(matching.len()));
            cursors.push(Box::new(MemoryCursor::new(matching, Arc::clone(&known))));
            matching = rest;
        }
        cursors
    }
}

/// Cursor over one chunk of in-memory rows.
///
/// The row pointer is shared with every selector resolved from this cursor,
/// so selectors always observe the cursor's current row.
pub struct MemoryCursor {
    rows: Arc<Vec<MemoryRow>>,
    position: Arc<AtomicUsize>,
    known_columns: Arc<Vec<String>>,
}

impl MemoryCursor {
    fn new(rows: Vec<MemoryRow>, known_columns: Arc<Vec<String>>) -> Self {
        Self {
            rows: Arc::new(rows),
            position: Arc::new(AtomicUsize::new(0)),
            known_columns,
        }
    }
}

impl Cursor for MemoryCursor {
    fn is_done(&self) -> bool {
        self.position.load(Ordering::SeqCst) >= self.rows.len()
    }

    fn advance(&mut self) {
        if !self.is_done() {
            self.position.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn selector(&self, column: &str) -> Option<Box<dyn ValueSelector>> {
        if !self.known_columns.iter().any(|c| c == column) {
            return None;
        }
        Some(Box::new(MemoryValueSelector {
            rows: Arc::clone(&self.rows),
            position: Arc::clone(&self.position),
            column: column.to_string(),
        }))
    }
}

struct MemoryValueSelector {
    rows: Arc<Vec<MemoryRow>>,
    position: Arc<AtomicUsize>,
    column: String,
}

impl ValueSelector for MemoryValueSelector {
    fn get(&self) -> Value {
        self.rows
            .get(self.position.load(Ordering::SeqCst))
            .and_then(|row| row.get(&self.column))
            .cloned()
            .unwrap_or(Value::Null)
    }
}
