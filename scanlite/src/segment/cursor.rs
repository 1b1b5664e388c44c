// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Row cursor and per-column value access

use serde_json::Value;

/// A resumable row pointer over (a sub-partition of) a segment.
///
/// The engine advances the cursor one row at a time and reads the current
/// row through selectors resolved once per column.
pub trait Cursor: Send {
    /// Whether the cursor is past its last row.
    fn is_done(&self) -> bool;

    /// Move to the next row. Calling this on an exhausted cursor is a no-op.
    fn advance(&mut self);

    /// Resolve a per-column accessor bound to this cursor's current row.
    /// Returns `None` for columns the segment cannot provide; the engine
    /// maps an absent selector to a null value, never an error.
    fn selector(&self, column: &str) -> Option<Box<dyn ValueSelector>>;
}

/// Capability interface for reading one column of the cursor's current row.
pub trait ValueSelector: Send + Sync {
    /// The value at the cursor's current row, `Value::Null` when absent.
    fn get(&self) -> Value;
}
