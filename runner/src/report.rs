use itertools::Itertools;
use std::{
    fmt::Write as _,
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
};
use thiserror::Error;
use tmp_analysis::{
    efficiency_pivot, latency_pivot, Comparison, DatabaseSummary, PerformanceRecord, Pivot,
    SummaryField,
};
use tracing::{debug, error, info};

pub const COMPARISON_MATRIX: &str = "comparison_matrix.csv";
pub const PERFORMANCE_DETAILED: &str = "report_performance_summary_detailed.csv";
pub const PERFORMANCE_PIVOT: &str = "report_performance_pivot_efficiency.csv";
pub const NARRATIVE: &str = "comparison_report.md";

pub const NO_PERFORMANCE_DATA: &str =
    "No performance benchmark data was found or could be calculated.";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Everything the renderer needs from one run
#[derive(Debug)]
pub struct Report<'a> {
    pub summaries: &'a [DatabaseSummary],
    pub comparison: &'a Comparison,
    pub skipped: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    Written,
    /// nothing to write for this run, a stale copy was removed if present
    Omitted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub status: ArtifactStatus,
}

/// Writes the report artifacts into one directory
#[derive(Debug)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write every artifact; a failing artifact never prevents the others.
    pub fn write_all(&self, report: &Report<'_>, generated: &str) -> Vec<Artifact> {
        let mut artifacts = vec![
            self.write_file(COMPARISON_MATRIX, |writer| {
                write_matrix(report.summaries, writer)
            }),
            self.write_file(PERFORMANCE_DETAILED, |writer| {
                write_detailed(report.comparison, writer)
            }),
        ];

        if report.comparison.is_compared() {
            let pivot = efficiency_pivot(report.comparison.records());
            artifacts.push(self.write_file(PERFORMANCE_PIVOT, |writer| write_pivot(&pivot, writer)));
        } else {
            artifacts.push(self.omit(PERFORMANCE_PIVOT));
        }

        artifacts.push(self.write_file(NARRATIVE, |writer| {
            writer.write_all(render_markdown(report, generated).as_bytes())?;

            Ok(())
        }));

        artifacts
    }

    fn write_file<F>(&self, name: &str, render: F) -> Artifact
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<(), ReportError>,
    {
        let path = self.dir.join(name);
        let result = File::create(&path)
            .map_err(ReportError::from)
            .map(BufWriter::new)
            .and_then(|mut writer| {
                render(&mut writer)?;
                writer.flush()?;

                Ok(())
            });

        match result {
            Ok(()) => {
                info!(path = ?path, "Saved report");

                Artifact {
                    path,
                    status: ArtifactStatus::Written,
                }
            }
            Err(write_error) => {
                error!(path = ?path, error = %write_error, "Failed to write report");

                Artifact {
                    path,
                    status: ArtifactStatus::Failed(write_error.to_string()),
                }
            }
        }
    }

    fn omit(&self, name: &str) -> Artifact {
        let path = self.dir.join(name);

        if path.is_file() {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = ?path, "Removed report left over from an earlier run"),
                Err(remove_error) => {
                    error!(path = ?path, error = %remove_error, "Failed to remove stale report");

                    return Artifact {
                        path,
                        status: ArtifactStatus::Failed(remove_error.to_string()),
                    };
                }
            }
        }

        Artifact {
            path,
            status: ArtifactStatus::Omitted,
        }
    }
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_owned()
}

fn number(value: Option<f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

fn fixed(value: Option<f64>) -> String {
    value.map(|value| format!("{value:.2}")).unwrap_or_default()
}

/// Summary fields as rows and databases as columns
pub fn write_matrix<W: Write>(summaries: &[DatabaseSummary], writer: W) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(writer);

    writer.write_record(
        std::iter::once(String::new())
            .chain(summaries.iter().map(|summary| summary.database.clone())),
    )?;

    for field in SummaryField::ALL {
        writer.write_record(
            std::iter::once(field.label().to_owned()).chain(summaries.iter().map(|summary| {
                summary
                    .get(field)
                    .map(|measure| measure.to_string())
                    .unwrap_or_default()
            })),
        )?;
    }

    writer.flush()?;

    Ok(())
}

fn record_cells(record: &PerformanceRecord, derived: bool) -> Vec<String> {
    let mut cells = vec![
        record.database.clone(),
        text(record.schema.as_deref()),
        text(record.category.as_deref()),
        text(record.query_id.as_deref()),
        text(record.query_name.as_deref()),
        text(record.sql_query.as_deref()),
        number(record.latency_ms),
        record.status.as_str().to_owned(),
        text(record.error_message.as_deref()),
    ];

    if derived {
        cells.extend([
            number(record.baseline_latency_ms),
            number(record.schema_efficiency_factor),
            number(record.performance_improvement_factor),
        ]);
    }

    cells
}

/// One row per benchmark record; derived columns only when a comparison ran
pub fn write_detailed<W: Write>(comparison: &Comparison, writer: W) -> Result<(), ReportError> {
    let derived = comparison.is_compared();
    let mut writer = csv::Writer::from_writer(writer);
    let mut header = PerformanceRecord::COLUMNS.to_vec();

    if derived {
        header.extend(PerformanceRecord::DERIVED_COLUMNS);
    }

    writer.write_record(&header)?;

    for record in comparison.records() {
        writer.write_record(record_cells(record, derived))?;
    }

    writer.flush()?;

    Ok(())
}

pub fn write_pivot<W: Write>(pivot: &Pivot, writer: W) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(writer);

    writer.write_record(pivot.index.iter().chain(pivot.columns.iter()))?;

    for row in pivot.rows.iter() {
        writer.write_record(
            row.key
                .iter()
                .cloned()
                .chain(row.cells.iter().map(|cell| number(*cell))),
        )?;
    }

    writer.flush()?;

    Ok(())
}

fn markdown_table(headers: &[String], key_columns: usize, rows: &[Vec<String>]) -> String {
    let mut table = String::new();
    let escape = |cell: &String| cell.replace('|', "\\|");

    let _ = writeln!(table, "| {} |", headers.iter().map(escape).join(" | "));
    let _ = writeln!(
        table,
        "|{}|",
        (0..headers.len())
            .map(|column| if column < key_columns { ":---" } else { "---:" })
            .join("|")
    );

    for row in rows {
        let _ = writeln!(table, "| {} |", row.iter().map(escape).join(" | "));
    }

    table
}

fn pivot_table(pivot: &Pivot) -> String {
    let headers = pivot
        .index
        .iter()
        .chain(pivot.columns.iter())
        .cloned()
        .collect_vec();
    let rows = pivot
        .rows
        .iter()
        .map(|row| {
            row.key
                .iter()
                .cloned()
                .chain(row.cells.iter().map(|cell| fixed(*cell)))
                .collect_vec()
        })
        .collect_vec();

    markdown_table(&headers, pivot.index.len(), &rows)
}

fn executive_summary(summaries: &[DatabaseSummary]) -> String {
    let headers = std::iter::once(DatabaseSummary::DATABASE_LABEL.to_owned())
        .chain(
            SummaryField::EXECUTIVE
                .iter()
                .map(|field| field.label().to_owned()),
        )
        .collect_vec();
    let rows = summaries
        .iter()
        .map(|summary| {
            std::iter::once(summary.database.clone())
                .chain(SummaryField::EXECUTIVE.iter().map(|field| {
                    summary
                        .get(*field)
                        .map(|measure| measure.fixed())
                        .unwrap_or_default()
                }))
                .collect_vec()
        })
        .collect_vec();

    markdown_table(&headers, 1, &rows)
}

/// Human readable report: executive summary, performance comparison, run metadata
pub fn render_markdown(report: &Report<'_>, generated: &str) -> String {
    let mut sections = vec![
        "# Database Comparison Report".to_owned(),
        format!("_Generated on: {generated}_"),
        "## 1. Executive Summary".to_owned(),
        executive_summary(report.summaries),
        "## 2. Performance Benchmark Comparison".to_owned(),
    ];

    let efficiency = report
        .comparison
        .is_compared()
        .then(|| efficiency_pivot(report.comparison.records()))
        .filter(|pivot| !pivot.is_empty());

    if let Some(efficiency) = efficiency {
        sections.push("### At-a-Glance: Schema Efficiency Factor (Lower is Better)".to_owned());
        sections.push(
            "This table shows how many times slower each database is compared to the fastest \
             baseline database for each query category. A value of 1.00 means it is as fast as \
             the baseline."
                .to_owned(),
        );
        sections.push(pivot_table(&efficiency));
        sections.push("### Detailed Latency Breakdown (ms)".to_owned());
        sections.push(pivot_table(&latency_pivot(report.comparison.records())));
    } else {
        sections.push(NO_PERFORMANCE_DATA.to_owned());
    }

    sections.push("## 3. Run Metadata".to_owned());

    let mut metadata = vec![format!(
        "- **Databases Processed**: {}",
        report
            .summaries
            .iter()
            .map(|summary| summary.database.as_str())
            .join(", ")
    )];

    if let Some(baseline) = report.comparison.baseline() {
        metadata.push(format!("- **Baseline Cohort**: {}", baseline.iter().join(", ")));
    }

    if !report.skipped.is_empty() {
        metadata.push(format!(
            "- **Skipped Input Files**: {}",
            report
                .skipped
                .iter()
                .filter_map(|path| path.file_name())
                .map(|name| name.to_string_lossy())
                .join(", ")
        ));
    }

    sections.push(metadata.join("\n"));

    let mut document = sections
        .iter()
        .map(|section| section.trim_end())
        .join("\n\n");
    document.push('\n');

    document
}
