// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scan query description
//!
//! [`ScanQuery`] is the immutable value describing one scan: requested
//! columns, filter, time interval, row limit, batching policy and output
//! encoding. The engine never mutates it; all mutable cross-segment state
//! lives in the response context.

pub mod context;
pub mod interval;

pub use interval::Interval;

use crate::filter::FilterSpec;
use serde::{Deserialize, Serialize};

/// String-keyed options map carried in the query's `context` field.
///
/// Values are dynamically typed JSON; numeric options are resolved through
/// [`context::parse_long`] which rejects anything that is not an integer or
/// a numeric string.
pub type QueryContextMap = serde_json::Map<String, serde_json::Value>;

/// Fixed `queryType` discriminator for the wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueryType {
    #[default]
    #[serde(rename = "scan")]
    Scan,
}

/// Output encoding for result batches.
///
/// `List` yields attribute-labeled records, `CompactedList` positional
/// tuples. `ValueVector` is recognized on the wire but rejected by the
/// engine with an unsupported-operation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultFormat {
    #[default]
    List,
    CompactedList,
    ValueVector,
}

/// A derived column computed per row by the cursor layer.
///
/// Opaque to the engine; it is forwarded verbatim to
/// [`SegmentReader::make_cursors`](crate::segment::SegmentReader::make_cursors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VirtualColumn {
    Expression { name: String, expression: String },
}

fn default_batch_size() -> usize {
    20480
}

fn default_limit() -> u64 {
    u64::MAX
}

/// Description of a single scan query.
///
/// Field order matches the canonical wire shape. Serializing and
/// deserializing a query reproduces an equal value for every field,
/// including defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanQuery {
    #[serde(default)]
    pub query_type: QueryType,
    pub data_source: String,
    /// Query time intervals. The engine accepts exactly one; anything else
    /// is rejected as an invalid argument at execution time.
    pub intervals: Vec<Interval>,
    #[serde(default)]
    pub virtual_columns: Vec<VirtualColumn>,
    #[serde(default)]
    pub result_format: ResultFormat,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Maximum number of rows this logical query may emit across all
    /// segments. `u64::MAX` is the unbounded sentinel.
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub filter: Option<FilterSpec>,
    /// Requested columns, used verbatim (duplicates included). Empty means
    /// "all": timestamp, then dimensions, then metrics in native order.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub context: Option<QueryContextMap>,
    #[serde(default)]
    pub descending: bool,
}

impl ScanQuery {
    /// Start building a scan query.
    pub fn builder() -> ScanQueryBuilder {
        ScanQueryBuilder::default()
    }

    /// Look up a raw context option value.
    pub fn context_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.context.as_ref().and_then(|ctx| ctx.get(key))
    }
}

/// Fluent builder for [`ScanQuery`].
#[derive(Debug, Default)]
pub struct ScanQueryBuilder {
    data_source: String,
    intervals: Vec<Interval>,
    virtual_columns: Vec<VirtualColumn>,
    result_format: ResultFormat,
    batch_size: Option<usize>,
    limit: Option<u64>,
    filter: Option<FilterSpec>,
    columns: Vec<String>,
    context: Option<QueryContextMap>,
    descending: bool,
}

impl ScanQueryBuilder {
    pub fn data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = data_source.into();
        self
    }

    pub fn intervals(mut self, intervals: Vec<Interval>) -> Self {
        self.intervals = intervals;
        self
    }

    pub fn virtual_columns(mut self, virtual_columns: Vec<VirtualColumn>) -> Self {
        self.virtual_columns = virtual_columns;
        self
    }

    pub fn result_format(mut self, result_format: ResultFormat) -> Self {
        self.result_format = result_format;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn context(mut self, context: QueryContextMap) -> Self {
        self.context = Some(context);
        self
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    pub fn build(self) -> ScanQuery {
        ScanQuery {
            query_type: QueryType::Scan,
            data_source: self.data_source,
            intervals: self.intervals,
            virtual_columns: self.virtual_columns,
            result_format: self.result_format,
            batch_size: self.batch_size.unwrap_or_else(default_batch_size),
            limit: self.limit.unwrap_or_else(default_limit),
            filter: self.filter,
            columns: self.columns,
            context: self.context,
            descending: self.descending,
        }
    }
}
