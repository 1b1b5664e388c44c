//! Scan engine behavior tests
//!
//! Covers limit accounting shared across segments and cursors, batch
//! shaping, the two row encodings, deadline enforcement and the
//! fail-fast rejections.

use chrono::Utc;
use scanlite::segment::memory::MemoryRow;
use scanlite::{
    ExecutionError, Interval, MemorySegment, ResponseContext, ResultFormat, ScanBatch, ScanEngine,
    ScanEvents, ScanQuery, Segment, SegmentReader, SharedResponseContext,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

fn wiki_row(time: i64, country: &str, page: &str) -> MemoryRow {
    let mut row = MemoryRow::new();
    row.insert("__time".to_string(), json!(time));
    row.insert("countryName".to_string(), json!(country));
    row.insert("page".to_string(), json!(page));
    row
}

/// A segment whose first `us_rows` rows match `countryName = "US"`.
fn wiki_segment(id: &str, total_rows: usize, us_rows: usize) -> MemorySegment {
    MemorySegment::new(id)
        .dimensions(vec!["countryName".to_string(), "page".to_string()])
        .rows(
            (0..total_rows)
                .map(|i| {
                    let country = if i < us_rows { "US" } else { "FR" };
                    wiki_row(i as i64, country, "Main_Page")
                })
                .collect(),
        )
}

fn wide_open() -> Interval {
    Interval::parse("1970-01-01/2100-01-01").unwrap()
}

fn us_filter() -> scanlite::FilterSpec {
    scanlite::FilterSpec::Selector {
        dimension: "countryName".to_string(),
        value: json!("US"),
        extraction_fn: None,
    }
}

fn collect_batches(
    query: &ScanQuery,
    segment: &dyn Segment,
    context: &SharedResponseContext,
) -> Vec<ScanBatch> {
    ScanEngine::new()
        .process(query, segment, context)
        .expect("process should succeed")
        .map(|batch| batch.expect("batch should succeed"))
        .collect()
}

#[test]
fn test_total_rows_is_min_of_limit_and_matching_rows() {
    // limit > available rows
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .limit(100)
        .build();
    let context = ResponseContext::new().shared();
    let batches = collect_batches(&query, &wiki_segment("seg-1", 50, 50), &context);
    let total: usize = batches.iter().map(ScanBatch::row_count).sum();
    assert_eq!(total, 50);

    // limit < available rows
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .limit(10)
        .build();
    let context = ResponseContext::new().shared();
    let batches = collect_batches(&query, &wiki_segment("seg-1", 50, 50), &context);
    let total: usize = batches.iter().map(ScanBatch::row_count).sum();
    assert_eq!(total, 10);
}

#[test]
fn test_emitted_count_matches_batch_totals() {
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .batch_size(7)
        .limit(40)
        .build();
    let context = ResponseContext::new().shared();
    let initial = context.lock().emitted_count;

    let batches = collect_batches(&query, &wiki_segment("seg-1", 100, 100), &context);
    let total: u64 = batches.iter().map(|b| b.row_count() as u64).sum();

    assert_eq!(total, context.lock().emitted_count - initial);
    assert_eq!(context.lock().emitted_count, 40);
}

#[test]
fn test_batch_sizing() {
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .batch_size(30)
        .build();
    let context = ResponseContext::new().shared();
    let batches = collect_batches(&query, &wiki_segment("seg-1", 100, 100), &context);

    let sizes: Vec<usize> = batches.iter().map(ScanBatch::row_count).collect();
    assert_eq!(sizes, vec![30, 30, 30, 10]);
}

#[test]
fn test_short_circuit_issues_no_cursor_request() {
    struct ProbeSegment {
        inner: MemorySegment,
        reader_calls: AtomicUsize,
    }

    impl Segment for ProbeSegment {
        fn id(&self) -> &str {
            self.inner.id()
        }

        fn reader(&self) -> Option<&dyn SegmentReader> {
            self.reader_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.reader()
        }
    }

    let probe = ProbeSegment {
        inner: wiki_segment("seg-1", 50, 50),
        reader_calls: AtomicUsize::new(0),
    };
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .limit(100)
        .build();

    let context = ResponseContext {
        emitted_count: 100,
        deadline_at: 0,
        has_timeout: false,
    }
    .shared();

    let batches = collect_batches(&query, &probe, &context);
    assert!(batches.is_empty());
    assert_eq!(probe.reader_calls.load(Ordering::SeqCst), 0);
    assert_eq!(context.lock().emitted_count, 100);
}

#[test]
fn test_records_and_tuples_carry_same_values() {
    let segment = wiki_segment("seg-1", 5, 3);
    let base = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .columns(vec!["countryName".to_string(), "page".to_string()]);
    let records_query = base.build();
    let tuples_query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .columns(vec!["countryName".to_string(), "page".to_string()])
        .result_format(ResultFormat::CompactedList)
        .build();

    let records = collect_batches(&records_query, &segment, &ResponseContext::new().shared());
    let tuples = collect_batches(&tuples_query, &segment, &ResponseContext::new().shared());
    assert_eq!(records.len(), 1);
    assert_eq!(tuples.len(), 1);

    let record_rows = match &records[0].events {
        ScanEvents::Records(rows) => rows,
        other => panic!("expected records, got {other:?}"),
    };
    let tuple_rows = match &tuples[0].events {
        ScanEvents::Tuples(rows) => rows,
        other => panic!("expected tuples, got {other:?}"),
    };
    assert_eq!(record_rows.len(), tuple_rows.len());

    for (record, tuple) in record_rows.iter().zip(tuple_rows) {
        // Records carry the column names, in resolved column order.
        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, vec!["countryName", "page"]);
        let record_values: Vec<_> = record.values().cloned().collect();
        assert_eq!(&record_values, tuple);
    }
}

#[test]
fn test_past_deadline_fails_without_partial_batch() {
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .build();
    let context = ResponseContext {
        emitted_count: 0,
        deadline_at: Utc::now().timestamp_millis() - 1000,
        has_timeout: true,
    }
    .shared();

    let mut stream = ScanEngine::new()
        .process(&query, &wiki_segment("seg-1", 50, 50), &context)
        .unwrap();

    match stream.next() {
        Some(Err(ExecutionError::Interrupted(_))) => {}
        other => panic!("expected interrupted query, got {other:?}"),
    }
    // Terminal: nothing after the failure, and no rows were accounted.
    assert!(stream.next().is_none());
    assert_eq!(context.lock().emitted_count, 0);
}

#[test]
fn test_deadline_budget_written_back_per_batch() {
    let deadline = Utc::now().timestamp_millis() + 60_000;
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .batch_size(10)
        .build();
    let context = ResponseContext {
        emitted_count: 0,
        deadline_at: deadline,
        has_timeout: true,
    }
    .shared();

    let batches = collect_batches(&query, &wiki_segment("seg-1", 25, 25), &context);
    assert_eq!(batches.len(), 3);

    let ctx = context.lock();
    assert_eq!(ctx.emitted_count, 25);
    // The remaining budget shrinks by the elapsed wall-clock time.
    assert!(ctx.deadline_at <= deadline);
    assert!(ctx.deadline_at > deadline - 60_000);
}

#[test]
fn test_two_segments_share_one_limit() {
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .limit(100)
        .build();
    let context = ResponseContext::new().shared();

    let first = collect_batches(&query, &wiki_segment("seg-1", 80, 80), &context);
    let first_total: usize = first.iter().map(ScanBatch::row_count).sum();
    assert_eq!(first_total, 80);
    assert_eq!(context.lock().emitted_count, 80);

    // Second segment has 50 matching rows but only 20 of budget left.
    let second = collect_batches(&query, &wiki_segment("seg-2", 50, 50), &context);
    let second_total: usize = second.iter().map(ScanBatch::row_count).sum();
    assert_eq!(second_total, 20);
    assert_eq!(context.lock().emitted_count, 100);

    // A third segment is skipped outright.
    let third = collect_batches(&query, &wiki_segment("seg-3", 10, 10), &context);
    assert!(third.is_empty());
}

#[test]
fn test_filtered_scan_thirty_seven_rows() {
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .filter(us_filter())
        .columns(vec!["countryName".to_string(), "page".to_string()])
        .limit(100)
        .build();
    let context = ResponseContext::new().shared();

    let batches = collect_batches(&query, &wiki_segment("seg-1", 50, 37), &context);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].row_count(), 37);
    assert_eq!(batches[0].segment_id, "seg-1");
    assert_eq!(batches[0].columns, vec!["countryName", "page"]);
    assert_eq!(context.lock().emitted_count, 37);
}

#[test]
fn test_limit_shared_across_cursors_of_one_segment() {
    let segment = wiki_segment("seg-1", 30, 30).chunk_rows(10);
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .limit(25)
        .build();
    let context = ResponseContext::new().shared();

    let batches = collect_batches(&query, &segment, &context);
    let sizes: Vec<usize> = batches.iter().map(ScanBatch::row_count).collect();
    // Three internal cursors, one shared budget: the last is cut short.
    assert_eq!(sizes, vec![10, 10, 5]);
    assert_eq!(context.lock().emitted_count, 25);
}

#[test]
fn test_missing_column_yields_nulls() {
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .columns(vec!["countryName".to_string(), "bogus".to_string()])
        .build();
    let context = ResponseContext::new().shared();

    let batches = collect_batches(&query, &wiki_segment("seg-1", 3, 3), &context);
    let rows = match &batches[0].events {
        ScanEvents::Records(rows) => rows,
        other => panic!("expected records, got {other:?}"),
    };
    for row in rows {
        assert_eq!(row.get("bogus"), Some(&serde_json::Value::Null));
        assert_eq!(row.get("countryName"), Some(&json!("US")));
    }
}

#[test]
fn test_value_vector_rejected_with_zero_batches() {
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .result_format(ResultFormat::ValueVector)
        .build();
    let context = ResponseContext::new().shared();

    let result = ScanEngine::new().process(&query, &wiki_segment("seg-1", 5, 5), &context);
    assert!(matches!(result, Err(ExecutionError::Unsupported(_))));
    assert_eq!(context.lock().emitted_count, 0);
}

#[test]
fn test_empty_match_yields_no_batches() {
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .filter(us_filter())
        .build();
    let context = ResponseContext::new().shared();

    // No US rows at all.
    let batches = collect_batches(&query, &wiki_segment("seg-1", 20, 0), &context);
    assert!(batches.is_empty());
    assert_eq!(context.lock().emitted_count, 0);
}

#[test]
fn test_descending_reverses_row_order() {
    let query = ScanQuery::builder()
        .data_source("wikiticker")
        .intervals(vec![wide_open()])
        .columns(vec!["__time".to_string()])
        .result_format(ResultFormat::CompactedList)
        .descending(true)
        .build();
    let context = ResponseContext::new().shared();

    let batches = collect_batches(&query, &wiki_segment("seg-1", 3, 3), &context);
    let rows = match &batches[0].events {
        ScanEvents::Tuples(rows) => rows,
        other => panic!("expected tuples, got {other:?}"),
    };
    let times: Vec<_> = rows.iter().map(|r| r[0].clone()).collect();
    assert_eq!(times, vec![json!(2), json!(1), json!(0)]);
}
