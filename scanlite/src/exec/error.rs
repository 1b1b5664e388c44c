// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution error types

use thiserror::Error;

/// Execution errors
///
/// None of these are retried inside the engine; every one aborts batch
/// production for the query outright.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Timeout must be a non negative value, but was [{0}]")]
    NegativeTimeout(i64),

    #[error("Unknown type [{type_name}] for context key [{key}]")]
    UnknownContextValue { key: String, type_name: &'static str },

    #[error("Segment [{0}] has no readable storage; it was probably memory unmapped")]
    SegmentUnavailable(String),

    #[error("Query interrupted")]
    Interrupted(#[source] TimeoutError),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Timeout cause wrapped by [`ExecutionError::Interrupted`].
#[derive(Error, Debug)]
#[error("query timed out")]
pub struct TimeoutError;
