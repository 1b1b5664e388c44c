// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scan execution engine
//!
//! Drives an already-constructed row cursor over one segment and produces a
//! lazy stream of result batches. Limit accounting is shared with the other
//! segments of the same logical query through the response context: the
//! engine reads the cumulative emitted count at entry, scans at most
//! `limit - emitted` rows, and adds each batch's row count back after the
//! batch is pulled. An optional wall-clock deadline is checked between
//! batches, never mid-row.

use crate::exec::context::SharedResponseContext;
use crate::exec::error::{ExecutionError, TimeoutError};
use crate::exec::result::{RecordRow, ScanBatch, ScanEvents, TupleRow};
use crate::filter;
use crate::query::{ResultFormat, ScanQuery};
use crate::segment::{Cursor, Granularity, Segment, SegmentReader, ValueSelector, TIME_COLUMN};
use chrono::Utc;
use serde_json::Value;
use std::collections::VecDeque;

/// Stateless scan engine. One `process` call handles one segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanEngine;

impl ScanEngine {
    pub fn new() -> Self {
        Self
    }

    /// Execute the query against one segment, returning a lazy batch
    /// stream.
    ///
    /// Reads the shared context at entry: if prior segments already
    /// satisfied the limit, an empty terminated stream comes back and the
    /// segment's reader is never touched. Invalid arguments (multiple
    /// intervals), an unmapped segment and the unsupported `valueVector`
    /// encoding are all rejected here, before any cursor is opened.
    pub fn process(
        &self,
        query: &ScanQuery,
        segment: &dyn Segment,
        context: &SharedResponseContext,
    ) -> Result<ScanBatchStream, ExecutionError> {
        let (emitted, has_timeout, deadline_at) = {
            let ctx = context.lock();
            (ctx.emitted_count, ctx.has_timeout, ctx.deadline_at)
        };
        if emitted >= query.limit {
            log::debug!(
                "segment [{}]: limit already satisfied by {} emitted row(s), skipping",
                segment.id(),
                emitted
            );
            return Ok(ScanBatchStream::terminated(segment.id(), context.clone()));
        }
        let start_ms = Utc::now().timestamp_millis();

        let reader = segment
            .reader()
            .ok_or_else(|| ExecutionError::SegmentUnavailable(segment.id().to_string()))?;

        if query.intervals.len() != 1 {
            return Err(ExecutionError::InvalidQuery(format!(
                "can only handle a single interval, got {:?}",
                query.intervals
            )));
        }
        if query.batch_size == 0 {
            return Err(ExecutionError::InvalidQuery(
                "batchSize must be positive".to_string(),
            ));
        }

        let encoding = match query.result_format {
            ResultFormat::List => RowEncoding::Records,
            ResultFormat::CompactedList => RowEncoding::Tuples,
            ResultFormat::ValueVector => {
                return Err(ExecutionError::Unsupported(
                    "valueVector output is not supported".to_string(),
                ))
            }
        };

        let columns = resolve_columns(query, reader);
        let normalized = filter::to_cnf(query.filter.as_ref(), query.context.as_ref());
        let limit = query.limit - emitted;

        let cursors = reader.make_cursors(
            normalized.as_ref(),
            &query.intervals[0],
            &query.virtual_columns,
            Granularity::Flat,
            query.descending,
        );
        log::debug!(
            "segment [{}]: {} cursor(s), {} column(s), remaining limit {}",
            segment.id(),
            cursors.len(),
            columns.len(),
            limit
        );

        let cursors = cursors
            .into_iter()
            .map(|cursor| CursorState::bind(cursor, &columns))
            .collect();

        Ok(ScanBatchStream {
            segment_id: segment.id().to_string(),
            columns,
            encoding,
            batch_size: query.batch_size,
            limit,
            offset: 0,
            cursors,
            context: context.clone(),
            has_timeout,
            deadline_at,
            start_ms,
            state: StreamState::Ready,
        })
    }
}

/// Effective column list: the query's own columns verbatim, else timestamp
/// plus every dimension and metric in the segment's native order.
fn resolve_columns(query: &ScanQuery, reader: &dyn SegmentReader) -> Vec<String> {
    if !query.columns.is_empty() {
        return query.columns.clone();
    }
    let mut all = vec![TIME_COLUMN.to_string()];
    all.extend(reader.available_dimensions());
    all.extend(reader.available_metrics());
    all
}

/// Row encodings the stream can actually produce. `valueVector` never
/// reaches this point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowEncoding {
    Records,
    Tuples,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Ready,
    Exhausted,
}

/// One cursor plus its per-column selectors, resolved once.
struct CursorState {
    cursor: Box<dyn Cursor>,
    selectors: Vec<Option<Box<dyn ValueSelector>>>,
}

impl CursorState {
    fn bind(cursor: Box<dyn Cursor>, columns: &[String]) -> Self {
        let selectors = columns.iter().map(|c| cursor.selector(c)).collect();
        Self { cursor, selectors }
    }
}

/// Lazy batch stream over one segment's cursors.
///
/// An explicit Ready/Exhausted state machine: each pull checks the deadline,
/// drains up to `batch_size` rows from the current cursor, writes the drained
/// count (and, with a timeout active, the remaining budget) back into the
/// shared context, and re-evaluates the state. The `offset`/`limit` pair is
/// shared across all of the segment's cursors, so an internally partitioned
/// segment still never over-emits.
pub struct ScanBatchStream {
    segment_id: String,
    columns: Vec<String>,
    encoding: RowEncoding,
    batch_size: usize,
    limit: u64,
    offset: u64,
    cursors: VecDeque<CursorState>,
    context: SharedResponseContext,
    has_timeout: bool,
    deadline_at: i64,
    start_ms: i64,
    state: StreamState,
}

impl ScanBatchStream {
    /// An already-terminated stream: yields nothing, mutates nothing.
    fn terminated(segment_id: &str, context: SharedResponseContext) -> Self {
        Self {
            segment_id: segment_id.to_string(),
            columns: Vec::new(),
            encoding: RowEncoding::Records,
            batch_size: 0,
            limit: 0,
            offset: 0,
            cursors: VecDeque::new(),
            context,
            has_timeout: false,
            deadline_at: 0,
            start_ms: 0,
            state: StreamState::Exhausted,
        }
    }

    fn drain_records(&mut self) -> Vec<RecordRow> {
        let current = match self.cursors.front_mut() {
            Some(current) => current,
            None => return Vec::new(),
        };
        let mut events = Vec::new();
        while !current.cursor.is_done() && events.len() < self.batch_size && self.offset < self.limit
        {
            let mut event = RecordRow::new();
            for (column, selector) in self.columns.iter().zip(current.selectors.iter()) {
                let value = selector.as_ref().map_or(Value::Null, |s| s.get());
                event.insert(column.clone(), value);
            }
            events.push(event);
            current.cursor.advance();
            self.offset += 1;
        }
        events
    }

    fn drain_tuples(&mut self) -> Vec<TupleRow> {
        let current = match self.cursors.front_mut() {
            Some(current) => current,
            None => return Vec::new(),
        };
        let mut events = Vec::new();
        while !current.cursor.is_done() && events.len() < self.batch_size && self.offset < self.limit
        {
            let event = current
                .selectors
                .iter()
                .map(|selector| selector.as_ref().map_or(Value::Null, |s| s.get()))
                .collect();
            events.push(event);
            current.cursor.advance();
            self.offset += 1;
        }
        events
    }
}

impl Iterator for ScanBatchStream {
    type Item = Result<ScanBatch, ExecutionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == StreamState::Exhausted {
            return None;
        }
        // Skip cursors with no rows left; they produce no empty batches.
        while self
            .cursors
            .front()
            .map_or(false, |c| c.cursor.is_done())
        {
            self.cursors.pop_front();
        }
        if self.cursors.is_empty() || self.offset >= self.limit {
            self.state = StreamState::Exhausted;
            return None;
        }

        if self.has_timeout && Utc::now().timestamp_millis() >= self.deadline_at {
            self.state = StreamState::Exhausted;
            return Some(Err(ExecutionError::Interrupted(TimeoutError)));
        }

        let last_offset = self.offset;
        let events = match self.encoding {
            RowEncoding::Records => ScanEvents::Records(self.drain_records()),
            RowEncoding::Tuples => ScanEvents::Tuples(self.drain_tuples()),
        };
        let drained = self.offset - last_offset;

        {
            let mut ctx = self.context.lock();
            ctx.emitted_count += drained;
            if self.has_timeout {
                // Hand the remaining wall-clock budget to the next segment.
                ctx.deadline_at = self.deadline_at - (Utc::now().timestamp_millis() - self.start_ms);
            }
        }
        log::trace!(
            "segment [{}]: batch of {} row(s), offset {}/{}",
            self.segment_id,
            drained,
            self.offset,
            self.limit
        );

        if self.offset >= self.limit {
            self.state = StreamState::Exhausted;
        } else if self.cursors.front().map_or(false, |c| c.cursor.is_done()) {
            self.cursors.pop_front();
            if self.cursors.is_empty() {
                self.state = StreamState::Exhausted;
            }
        }

        Some(Ok(ScanBatch {
            segment_id: self.segment_id.clone(),
            columns: self.columns.clone(),
            events,
        }))
    }
}
