// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query context option resolution
//!
//! Timeout resolution happens exactly once, on the caller side, before the
//! response context is seeded. The engine itself never parses options; it
//! only reads the pre-computed deadline and active flag from the context.

use crate::exec::error::ExecutionError;
use crate::query::ScanQuery;
use serde_json::Value;

/// Fallback timeout when neither `timeout` nor `defaultTimeout` is set.
pub const DEFAULT_TIMEOUT_MS: i64 = 300_000;

/// Context key for the explicit per-query timeout, in milliseconds.
pub const TIMEOUT_KEY: &str = "timeout";

/// Context key for a pre-seeded default timeout, in milliseconds.
pub const DEFAULT_TIMEOUT_KEY: &str = "defaultTimeout";

/// Whether a timeout is active for this query. A resolved value of exactly
/// 0 means "no timeout".
pub fn has_timeout(query: &ScanQuery) -> Result<bool, ExecutionError> {
    Ok(timeout_ms(query)? != 0)
}

/// Resolve the timeout: explicit `timeout` option, else `defaultTimeout`,
/// else the fixed fallback. A negative value is a configuration error.
pub fn timeout_ms(query: &ScanQuery) -> Result<i64, ExecutionError> {
    let timeout = parse_long(query, TIMEOUT_KEY, default_timeout_ms(query)?)?;
    if timeout < 0 {
        return Err(ExecutionError::NegativeTimeout(timeout));
    }
    Ok(timeout)
}

/// Resolve the `defaultTimeout` option, falling back to [`DEFAULT_TIMEOUT_MS`].
pub fn default_timeout_ms(query: &ScanQuery) -> Result<i64, ExecutionError> {
    let default_timeout = parse_long(query, DEFAULT_TIMEOUT_KEY, DEFAULT_TIMEOUT_MS)?;
    if default_timeout < 0 {
        return Err(ExecutionError::NegativeTimeout(default_timeout));
    }
    Ok(default_timeout)
}

/// Read a numeric context option: absent yields the default, integers and
/// numeric strings are accepted, any other type fails fast.
pub fn parse_long(query: &ScanQuery, key: &str, default: i64) -> Result<i64, ExecutionError> {
    let Some(val) = query.context_value(key) else {
        return Ok(default);
    };
    match val {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| ExecutionError::UnknownContextValue {
                key: key.to_string(),
                type_name: "number",
            }),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
            ExecutionError::UnknownContextValue {
                key: key.to_string(),
                type_name: "non-numeric string",
            }
        }),
        other => Err(ExecutionError::UnknownContextValue {
            key: key.to_string(),
            type_name: json_type_name(other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
