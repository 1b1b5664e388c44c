// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cross-segment response context
//!
//! One [`ResponseContext`] is shared by every per-segment `process` call of
//! a logical query. It is the single source of truth for how many rows the
//! query has already produced and how much wall-clock budget remains.
//! Callers that fan out segments across threads share it through
//! [`SharedResponseContext`]; the engine locks it only for the short
//! read-modify-write after each batch.

use crate::exec::error::ExecutionError;
use crate::query::{self, ScanQuery};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared handle to the context, cloned into every per-segment stream.
pub type SharedResponseContext = Arc<Mutex<ResponseContext>>;

/// Mutable state shared across all segments of one logical query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseContext {
    /// Rows emitted so far across all segments. Only ever increases.
    pub emitted_count: u64,
    /// Absolute wall-clock deadline, milliseconds since the epoch.
    /// Meaningful only when `has_timeout` is set.
    pub deadline_at: i64,
    /// Pre-computed "is a timeout active" flag; the engine never re-parses
    /// query options.
    pub has_timeout: bool,
}

impl Default for ResponseContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseContext {
    /// A context with no emitted rows and no timeout.
    pub fn new() -> Self {
        Self {
            emitted_count: 0,
            deadline_at: 0,
            has_timeout: false,
        }
    }

    /// Seed a context for a query: resolves the timeout once (fail-fast on
    /// negative or unparseable values) and fixes the absolute deadline
    /// relative to `now_ms`.
    pub fn for_query(query: &ScanQuery, now_ms: i64) -> Result<Self, ExecutionError> {
        let timeout = query::context::timeout_ms(query)?;
        let has_timeout = timeout != 0;
        Ok(Self {
            emitted_count: 0,
            deadline_at: if has_timeout { now_ms + timeout } else { 0 },
            has_timeout,
        })
    }

    /// Wrap into the shared handle passed to `process`.
    pub fn shared(self) -> SharedResponseContext {
        Arc::new(Mutex::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_starts_at_zero() {
        let ctx = ResponseContext::new();
        assert_eq!(ctx.emitted_count, 0);
        assert!(!ctx.has_timeout);
    }

    #[test]
    fn test_for_query_seeds_deadline() {
        let mut options = crate::query::QueryContextMap::new();
        options.insert("timeout".to_string(), json!(5000));
        let query = ScanQuery::builder()
            .data_source("wikiticker")
            .context(options)
            .build();

        let ctx = ResponseContext::for_query(&query, 1_000_000).unwrap();
        assert!(ctx.has_timeout);
        assert_eq!(ctx.deadline_at, 1_005_000);
    }

    #[test]
    fn test_for_query_zero_timeout_is_inactive() {
        let mut options = crate::query::QueryContextMap::new();
        options.insert("timeout".to_string(), json!(0));
        let query = ScanQuery::builder()
            .data_source("wikiticker")
            .context(options)
            .build();

        let ctx = ResponseContext::for_query(&query, 1_000_000).unwrap();
        assert!(!ctx.has_timeout);
    }

    #[test]
    fn test_for_query_propagates_config_errors() {
        let mut options = crate::query::QueryContextMap::new();
        options.insert("timeout".to_string(), json!(-5));
        let query = ScanQuery::builder()
            .data_source("wikiticker")
            .context(options)
            .build();

        assert!(ResponseContext::for_query(&query, 0).is_err());
    }
}
