use crate::summary::{summarize, summarize_all, DatabaseSummary, Measure, SummaryField};
use tmp_ingest::{DatabaseMetrics, Format, MetricId, MetricKind, MetricPayload, MetricStore};

fn json(input: &str) -> MetricPayload {
    MetricPayload::decode(Format::Json, input.as_bytes()).unwrap()
}

fn csv(input: &str) -> MetricPayload {
    MetricPayload::decode(Format::Csv, input.as_bytes()).unwrap()
}

fn full_metrics() -> DatabaseMetrics {
    DatabaseMetrics::from([
        (MetricKind::BasicMetrics, json(r#"{"database_size_mb": 12.34}"#)),
        (
            MetricKind::SchemaCounts,
            json(r#"{"table_count": 2, "view_count": 1}"#),
        ),
        (
            MetricKind::TableMetrics,
            csv("table_name,row_estimate,index_count\nsites,10,2\nfinds,20,3\n"),
        ),
        (
            MetricKind::InteropMetrics,
            json(r#"{"jdi": 0.5, "lif": 4, "nf": 0.38}"#),
        ),
    ])
}

#[test]
pub fn aggregation_total() {
    let summary = summarize("tmp_df8", &full_metrics());

    assert_eq!(summary.total_estimated_rows, Some(30));
    assert_eq!(summary.total_index_count, Some(5));
}

#[test]
pub fn all_fields_projected() {
    let summary = summarize("tmp_df8", &full_metrics());

    assert_eq!(
        summary,
        DatabaseSummary {
            database: "tmp_df8".to_owned(),
            size_mb: Some(12.34),
            table_count: Some(2),
            view_count: Some(1),
            total_estimated_rows: Some(30),
            total_index_count: Some(5),
            jdi: Some(0.5),
            lif: Some(4.0),
            nf: Some(0.38),
        }
    );
}

#[test]
pub fn removing_one_kind_only_clears_its_fields() {
    let full = summarize("tmp_df8", &full_metrics());

    for kind in [
        MetricKind::BasicMetrics,
        MetricKind::SchemaCounts,
        MetricKind::TableMetrics,
        MetricKind::InteropMetrics,
    ] {
        let mut metrics = full_metrics();
        metrics.remove(&kind);
        let partial = summarize("tmp_df8", &metrics);

        for field in SummaryField::ALL {
            if field.source() == kind {
                assert_eq!(partial.get(field), None, "{field:?} without {kind}");
            } else {
                assert_eq!(partial.get(field), full.get(field), "{field:?} without {kind}");
            }
        }
    }
}

#[test]
pub fn nothing_loaded_is_all_empty() {
    let summary = summarize("tmp_empty", &DatabaseMetrics::new());

    for field in SummaryField::ALL {
        assert_eq!(summary.get(field), None);
    }
}

#[test]
pub fn empty_table_metrics_leave_totals_empty() {
    let metrics = DatabaseMetrics::from([(
        MetricKind::TableMetrics,
        csv("table_name,row_estimate,index_count\n"),
    )]);
    let summary = summarize("tmp_df8", &metrics);

    assert_eq!(summary.total_estimated_rows, None);
    assert_eq!(summary.total_index_count, None);
}

#[test]
pub fn missing_column_leaves_only_that_total_empty() {
    let metrics = DatabaseMetrics::from([(
        MetricKind::TableMetrics,
        csv("table_name,row_estimate\nsites,10.7\nfinds,\n"),
    )]);
    let summary = summarize("tmp_df8", &metrics);

    assert_eq!(summary.total_estimated_rows, Some(10));
    assert_eq!(summary.total_index_count, None);
}

#[test]
pub fn null_values_stay_empty() {
    let metrics = DatabaseMetrics::from([(
        MetricKind::InteropMetrics,
        json(r#"{"jdi": null, "lif": 2, "nf": null}"#),
    )]);
    let summary = summarize("tmp_flat_raw", &metrics);

    assert_eq!(summary.jdi, None);
    assert_eq!(summary.lif, Some(2.0));
    assert_eq!(summary.nf, None);
}

#[test]
pub fn wrong_shape_is_ignored() {
    let metrics = DatabaseMetrics::from([(
        MetricKind::BasicMetrics,
        csv("database_size_mb\n3\n"),
    )]);

    assert_eq!(summarize("tmp_df8", &metrics).size_mb, None);
}

#[test]
pub fn one_summary_per_database() {
    let mut store = MetricStore::new();
    store.insert(
        MetricId::new("tmp_df9", MetricKind::BasicMetrics),
        json(r#"{"database_size_mb": 1}"#),
    );
    store.insert(
        MetricId::new("tmp_df10", MetricKind::SchemaCounts),
        json(r#"{"table_count": 3}"#),
    );

    let summaries = summarize_all(&store);

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].database, "tmp_df10");
    assert_eq!(summaries[1].database, "tmp_df9");
}

#[test]
pub fn measure_rendering() {
    assert_eq!(Measure::Float(2.5).fixed(), "2.50");
    assert_eq!(Measure::Integer(30).fixed(), "30");
    assert_eq!(Measure::Float(2.5).to_string(), "2.5");
    assert_eq!(Measure::Integer(7).as_f64(), 7.0);
}
