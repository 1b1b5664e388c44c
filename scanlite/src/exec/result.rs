// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scan result batches

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record row: column name to value, insertion order = resolved column
/// order, with nulls included explicitly.
pub type RecordRow = serde_json::Map<String, Value>;

/// One tuple row: values positionally aligned to the resolved column list.
pub type TupleRow = Vec<Value>;

/// Row payload of a batch, in the encoding the query selected. Encodings
/// are never mixed within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScanEvents {
    Records(Vec<RecordRow>),
    Tuples(Vec<TupleRow>),
}

impl ScanEvents {
    pub fn row_count(&self) -> usize {
        match self {
            ScanEvents::Records(rows) => rows.len(),
            ScanEvents::Tuples(rows) => rows.len(),
        }
    }
}

/// One unit of scan output: up to `batchSize` rows from a single segment,
/// tagged with the segment identifier and the resolved column list.
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanBatch {
    pub segment_id: String,
    pub columns: Vec<String>,
    pub events: ScanEvents,
}

impl ScanBatch {
    pub fn row_count(&self) -> usize {
        self.events.row_count()
    }
}
