use crate::{
    baseline::BaselineSelector,
    performance::{compare, Comparison, PerformanceRecord, Status},
};
use tmp_ingest::{Format, MetricId, MetricKind, MetricPayload, MetricStore};

const HEADER: &str = "database,schema,category,query_id,query_name,sql_query,latency_ms,status,error_message\n";

fn benchmarks(store: &mut MetricStore, database: &str, rows: &[&str]) {
    let mut input = HEADER.to_owned();
    for row in rows {
        input.push_str(row);
        input.push('\n');
    }

    store.insert(
        MetricId::new(database, MetricKind::PerformanceBenchmarks),
        MetricPayload::decode(Format::Csv, input.as_bytes()).unwrap(),
    );
}

fn find<'a>(records: &'a [PerformanceRecord], database: &str, query_id: &str) -> &'a PerformanceRecord {
    records
        .iter()
        .find(|record| record.database == database && record.query_id.as_deref() == Some(query_id))
        .unwrap()
}

#[test]
pub fn efficiency_worked_example() {
    let mut store = MetricStore::new();
    benchmarks(&mut store, "tmp_benchmark_wide", &["x,public,baseline,1.1,Q,select 1,100,Success,"]);
    benchmarks(&mut store, "tmp_df8", &["x,public,baseline,1.1,Q,select 1,250,Success,"]);

    let comparison = compare(&store, &BaselineSelector::default());
    let records = comparison.records();

    assert!(comparison.is_compared());

    let legacy = find(records, "tmp_df8", "1.1");
    assert_eq!(legacy.baseline_latency_ms, Some(100.0));
    assert_eq!(legacy.schema_efficiency_factor, Some(2.5));
    assert_eq!(legacy.performance_improvement_factor, Some(60.0));

    let reference = find(records, "tmp_benchmark_wide", "1.1");
    assert_eq!(reference.schema_efficiency_factor, Some(1.0));
    assert_eq!(reference.performance_improvement_factor, Some(0.0));
}

#[test]
pub fn baseline_is_the_fastest_cohort_run() {
    let mut store = MetricStore::new();
    benchmarks(&mut store, "tmp_benchmark_a", &[",,joins,2.1,,,40,Success,"]);
    benchmarks(&mut store, "tmp_benchmark_b", &[",,joins,2.1,,,20,Success,"]);
    benchmarks(&mut store, "tmp_df9", &[",,joins,2.1,,,10,Success,"]);

    let comparison = compare(&store, &BaselineSelector::default());
    let records = comparison.records();

    for record in records {
        assert_eq!(record.baseline_latency_ms, Some(20.0));
    }

    let slower = find(records, "tmp_benchmark_a", "2.1");
    assert_eq!(slower.schema_efficiency_factor, Some(2.0));
    assert_eq!(slower.performance_improvement_factor, Some(0.0));

    let faster = find(records, "tmp_df9", "2.1");
    assert_eq!(faster.schema_efficiency_factor, Some(0.5));
    assert_eq!(faster.performance_improvement_factor, Some(-100.0));
}

#[test]
pub fn records_take_database_from_file_name() {
    let mut store = MetricStore::new();
    benchmarks(&mut store, "tmp_benchmark_wide", &["wrong,,c,1,,,5,Success,"]);

    let comparison = compare(&store, &BaselineSelector::default());

    assert_eq!(comparison.records()[0].database, "tmp_benchmark_wide");
}

#[test]
pub fn failed_rows_do_not_participate() {
    let mut store = MetricStore::new();
    benchmarks(
        &mut store,
        "tmp_benchmark_wide",
        &[",,c,1.1,,,1,Failed,timeout", ",,c,1.1,,,50,Success,"],
    );
    benchmarks(&mut store, "tmp_df8", &[",,c,1.1,,,,Failed,boom", ",,c,1.1,,,100,Success,"]);

    let comparison = compare(&store, &BaselineSelector::default());
    let records = comparison.records();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|record| record.status == Status::Success));
    assert_eq!(find(records, "tmp_df8", "1.1").schema_efficiency_factor, Some(2.0));
}

#[test]
pub fn non_numeric_latency_propagates_as_empty() {
    let mut store = MetricStore::new();
    benchmarks(&mut store, "tmp_benchmark_wide", &[",,c,1,,,10,Success,"]);
    benchmarks(&mut store, "tmp_df8", &[",,c,1,,,slow,Success,"]);

    let comparison = compare(&store, &BaselineSelector::default());
    let legacy = find(comparison.records(), "tmp_df8", "1");

    assert_eq!(legacy.latency_ms, None);
    assert_eq!(legacy.baseline_latency_ms, Some(10.0));
    assert_eq!(legacy.schema_efficiency_factor, None);
    assert_eq!(legacy.performance_improvement_factor, None);
}

#[test]
pub fn queries_without_baseline_run_stay_empty() {
    let mut store = MetricStore::new();
    benchmarks(&mut store, "tmp_benchmark_wide", &[",,c,1,,,10,Success,"]);
    benchmarks(&mut store, "tmp_df8", &[",,c,2,,,30,Success,"]);

    let comparison = compare(&store, &BaselineSelector::default());
    let legacy = find(comparison.records(), "tmp_df8", "2");

    assert_eq!(legacy.baseline_latency_ms, None);
    assert_eq!(legacy.schema_efficiency_factor, None);
}

#[test]
pub fn zero_baseline_is_empty_not_infinite() {
    let mut store = MetricStore::new();
    benchmarks(&mut store, "tmp_benchmark_wide", &[",,c,1,,,0,Success,"]);
    benchmarks(&mut store, "tmp_df8", &[",,c,1,,,3,Success,"]);

    let comparison = compare(&store, &BaselineSelector::default());

    assert_eq!(find(comparison.records(), "tmp_df8", "1").schema_efficiency_factor, None);
    assert_eq!(
        find(comparison.records(), "tmp_df8", "1").performance_improvement_factor,
        Some(100.0)
    );
}

#[test]
pub fn no_benchmarks_is_empty() {
    let mut store = MetricStore::new();
    store.insert(
        MetricId::new("tmp_df8", MetricKind::BasicMetrics),
        MetricPayload::decode(Format::Json, r#"{"database_size_mb": 1}"#.as_bytes()).unwrap(),
    );

    assert_eq!(compare(&store, &BaselineSelector::default()), Comparison::Empty);
}

#[test]
pub fn only_failures_is_empty() {
    let mut store = MetricStore::new();
    benchmarks(&mut store, "tmp_benchmark_wide", &[",,c,1,,,,Failed,boom"]);

    assert_eq!(compare(&store, &BaselineSelector::default()), Comparison::Empty);
}

#[test]
pub fn no_cohort_is_undecorated() {
    let mut store = MetricStore::new();
    benchmarks(&mut store, "tmp_df8", &[",,c,1,,,10,Success,", ",,c,2,,,,Failed,boom"]);
    benchmarks(&mut store, "tmp_df9", &[",,c,1,,,n/a,Success,"]);

    let comparison = compare(&store, &BaselineSelector::default());

    match comparison {
        Comparison::Undecorated(records) => {
            assert_eq!(records.len(), 3);
            assert!(records
                .iter()
                .all(|record| record.schema_efficiency_factor.is_none()));
            assert_eq!(find(&records, "tmp_df9", "1").latency_ms, None);
        }
        other => panic!("expected undecorated comparison, got {other:?}"),
    }
}

#[test]
pub fn explicit_cohort_replaces_naming_convention() {
    let mut store = MetricStore::new();
    benchmarks(&mut store, "tmp_flat_raw", &[",,c,1,,,10,Success,"]);
    benchmarks(&mut store, "tmp_benchmark_wide", &[",,c,1,,,5,Success,"]);

    let comparison = compare(&store, &BaselineSelector::explicit(["tmp_flat_raw"]));

    assert_eq!(
        comparison.baseline().map(|cohort| cohort.len()),
        Some(1)
    );
    let other = find(comparison.records(), "tmp_benchmark_wide", "1");
    assert_eq!(other.schema_efficiency_factor, Some(0.5));
    assert_eq!(other.performance_improvement_factor, Some(-100.0));
}
