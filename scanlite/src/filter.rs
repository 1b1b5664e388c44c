// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Filter expression boundary
//!
//! The engine treats filters as opaque values: it normalizes them through
//! [`to_cnf`] and hands the result to the cursor layer, which owns the
//! actual predicate semantics. The row-matching helper here implements the
//! plain equality semantics the in-memory backend needs; real storage
//! backends bring their own evaluation.

use crate::query::QueryContextMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire-shaped filter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterSpec {
    /// Match rows whose dimension equals a value. A null value matches rows
    /// where the dimension is absent.
    #[serde(rename_all = "camelCase")]
    Selector {
        dimension: String,
        value: Value,
        #[serde(default)]
        extraction_fn: Option<Value>,
    },
    And { fields: Vec<FilterSpec> },
    Or { fields: Vec<FilterSpec> },
    Not { field: Box<FilterSpec> },
}

impl FilterSpec {
    /// Equality-match a row, represented as an ordered column/value map.
    pub fn matches(&self, row: &serde_json::Map<String, Value>) -> bool {
        match self {
            FilterSpec::Selector { dimension, value, .. } => match row.get(dimension) {
                Some(actual) => actual == value,
                None => value.is_null(),
            },
            FilterSpec::And { fields } => fields.iter().all(|f| f.matches(row)),
            FilterSpec::Or { fields } => fields.iter().any(|f| f.matches(row)),
            FilterSpec::Not { field } => !field.matches(row),
        }
    }
}

/// Normalize a filter into conjunctive normal form.
///
/// This is the seam where the filter collaborator plugs in: the engine calls
/// it once per segment and forwards whatever comes back, unchanged, to
/// `make_cursors`. The rewrite itself lives with the filter implementations;
/// this passthrough keeps the expression opaque to the engine.
pub fn to_cnf(filter: Option<&FilterSpec>, _context: Option<&QueryContextMap>) -> Option<FilterSpec> {
    filter.cloned()
}
