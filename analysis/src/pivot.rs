use crate::{performance::PerformanceRecord, round2};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

/// Mean-aggregated pivot table with sorted row and column keys
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pivot {
    /// names of the row key components, e.g. `["category", "query_id"]`
    pub index: Vec<String>,
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PivotRow {
    pub key: Vec<String>,
    pub cells: Vec<Option<f64>>,
}

impl Pivot {
    /// Group `items` by row and column key and average the values of each cell.
    ///
    /// Items without a key or value are ignored. Rows and columns without any
    /// value are dropped and the means are rounded to two decimals.
    pub fn mean<'a, T: 'a>(
        items: impl IntoIterator<Item = &'a T>,
        index: &[&str],
        row_key: impl Fn(&T) -> Option<Vec<String>>,
        column_key: impl Fn(&T) -> Option<String>,
        value: impl Fn(&T) -> Option<f64>,
    ) -> Self {
        let mut cells: BTreeMap<(Vec<String>, String), (f64, usize)> = BTreeMap::new();

        for item in items {
            if let (Some(row), Some(column), Some(value)) =
                (row_key(item), column_key(item), value(item))
            {
                let cell = cells.entry((row, column)).or_insert((0.0, 0));
                cell.0 += value;
                cell.1 += 1;
            }
        }

        let columns: BTreeSet<&String> = cells.keys().map(|(_, column)| column).collect();
        let rows = cells
            .keys()
            .map(|(row, _)| row)
            .dedup()
            .map(|row| PivotRow {
                key: row.clone(),
                cells: columns
                    .iter()
                    .map(|column| {
                        cells
                            .get(&(row.clone(), (*column).clone()))
                            .map(|(sum, count)| round2(sum / *count as f64))
                    })
                    .collect(),
            })
            .collect_vec();

        Self {
            index: index.iter().map(|name| (*name).to_owned()).collect(),
            columns: columns.into_iter().cloned().collect(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, key: &[&str], column: &str) -> Option<f64> {
        let position = self.columns.iter().position(|name| name == column)?;

        self.rows
            .iter()
            .find(|row| row.key.iter().map(String::as_str).eq(key.iter().copied()))
            .and_then(|row| row.cells[position])
    }
}

/// database x category -> mean schema efficiency factor
pub fn efficiency_pivot(records: &[PerformanceRecord]) -> Pivot {
    Pivot::mean(
        records,
        &["database"],
        |record| Some(vec![record.database.clone()]),
        |record| record.category.clone(),
        |record| record.schema_efficiency_factor,
    )
}

/// (category, query id) x database -> mean latency in milliseconds
pub fn latency_pivot(records: &[PerformanceRecord]) -> Pivot {
    Pivot::mean(
        records,
        &["category", "query_id"],
        |record| Some(vec![record.category.clone()?, record.query_id.clone()?]),
        |record| Some(record.database.clone()),
        |record| record.latency_ms,
    )
}
