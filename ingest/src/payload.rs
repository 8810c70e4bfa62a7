use crate::LoadError;
use itertools::Itertools;
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

/// single attribute map, e.g. the contents of `<db>_basic_metrics.json`
pub type Record = BTreeMap<String, Value>;

/// Payload of one metric file, decided once when the file is decoded
#[derive(Clone, Debug, PartialEq)]
pub enum MetricPayload {
    Scalar(Record),
    Tabular(Table),
}

/// Row oriented table that remembers the column order it was read with
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

/// File formats a metric can be stored in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|name| name == column)
    }

    /// append a row, registering unseen columns at the end
    pub fn push(&mut self, row: Record) {
        for key in row.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }

        self.rows.push(row);
    }

    /// Sum of the numeric cells of `column`, `None` if the column does not exist.
    /// Cells that are missing or non-numeric are skipped.
    pub fn sum(&self, column: &str) -> Option<f64> {
        if !self.has_column(column) {
            return None;
        }

        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(column).and_then(as_f64))
                .sum(),
        )
    }

    /// CSV keeps every cell as text; an empty cell is a missing value.
    ///
    /// Short rows are padded with missing values, rows longer than the header
    /// and files without a header are rejected.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns = reader
            .headers()?
            .iter()
            .map(|header| header.trim().to_owned())
            .collect_vec();

        if columns.is_empty() {
            return Err(LoadError::EmptyCsv);
        }

        let mut table = Self::new(columns);

        for record in reader.records() {
            let record = record?;

            if record.len() > table.columns.len() {
                return Err(LoadError::RaggedRow {
                    line: record.position().map_or(0, |position| position.line()),
                    fields: record.len(),
                    expected: table.columns.len(),
                });
            }

            let row = table
                .columns
                .iter()
                .zip(record.iter().map(Some).chain(std::iter::repeat(None)))
                .map(|(column, cell)| {
                    let value = match cell {
                        Some(cell) if !cell.is_empty() => Value::String(cell.to_owned()),
                        _ => Value::Null,
                    };

                    (column.clone(), value)
                })
                .collect();

            table.rows.push(row);
        }

        Ok(table)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), LoadError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;

        for row in self.rows.iter() {
            writer.write_record(
                self.columns
                    .iter()
                    .map(|column| row.get(column).map(cell_text).unwrap_or_default()),
            )?;
        }

        writer.flush()?;

        Ok(())
    }
}

impl MetricPayload {
    /// Decode a payload from `reader` according to `format`.
    ///
    /// JSON objects become scalar metrics and JSON arrays of objects become tables,
    /// everything else is rejected.
    pub fn decode<R: Read>(format: Format, reader: R) -> Result<Self, LoadError> {
        match format {
            Format::Csv => Table::from_csv(reader).map(Self::Tabular),
            Format::Json => match serde_json::from_reader::<_, Value>(reader)? {
                Value::Object(map) => Ok(Self::Scalar(map.into_iter().collect())),
                Value::Array(items) => {
                    let mut table = Table::default();

                    for item in items {
                        match item {
                            Value::Object(map) => table.push(map.into_iter().collect()),
                            other => {
                                return Err(LoadError::UnsupportedJson(json_type(&other)));
                            }
                        }
                    }

                    Ok(Self::Tabular(table))
                }
                other => Err(LoadError::UnsupportedJson(json_type(&other))),
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let format = path
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(Format::from_extension)
            .ok_or_else(|| LoadError::UnsupportedExtension(path.to_path_buf()))?;

        Self::decode(format, File::open(path)?)
    }

    /// scalar metrics are stored as JSON, tables as CSV
    pub fn format(&self) -> Format {
        match self {
            Self::Scalar(_) => Format::Json,
            Self::Tabular(_) => Format::Csv,
        }
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<(), LoadError> {
        match self {
            Self::Scalar(record) => {
                let map: Map<String, Value> = record.clone().into_iter().collect();
                serde_json::to_writer_pretty(writer, &map)?;

                Ok(())
            }
            Self::Tabular(table) => table.write_csv(writer),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;

        Ok(())
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Scalar(record) => Some(record),
            Self::Tabular(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Tabular(table) => Some(table),
            Self::Scalar(_) => None,
        }
    }
}

/// Numeric view of a cell. Text is parsed, anything non-finite counts as missing.
pub fn as_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    };

    number.filter(|number| number.is_finite())
}

/// Integer view of a cell, truncating fractional values
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| as_f64(value).map(|v| v as i64)),
        _ => as_f64(value).map(|v| v as i64),
    }
}

/// Text view of a cell, `None` for missing values
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn cell_text(value: &Value) -> String {
    as_text(value).unwrap_or_default()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
