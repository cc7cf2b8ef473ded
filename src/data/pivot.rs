use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::model::{Observation, ValueColumn};
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// PivotTable – entity × year
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotRow {
    pub entity: String,
    /// One cell per entry of [`PivotTable::years`].
    pub cells: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotTable {
    pub column: ValueColumn,
    /// Ascending.
    pub years: Vec<i32>,
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    pub fn empty(column: ValueColumn) -> Self {
        Self {
            column,
            years: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell for `(entity, year)`, first matching row wins.
    pub fn get(&self, entity: &str, year: i32) -> Option<i64> {
        let col = self.years.binary_search(&year).ok()?;
        self.rows
            .iter()
            .find(|r| r.entity == entity)
            .map(|r| r.cells[col])
    }

    /// Stack tables vertically over the union of their years. Missing cells
    /// are 0 and rows keep their order, duplicates included.
    pub fn concat(column: ValueColumn, tables: &[PivotTable]) -> PivotTable {
        let years: Vec<i32> = tables
            .iter()
            .flat_map(|t| t.years.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows = tables
            .iter()
            .flat_map(|t| {
                let years = &years;
                t.rows.iter().map(move |row| {
                    let mut cells = vec![0; years.len()];
                    for (year, value) in t.years.iter().zip(&row.cells) {
                        if let Ok(col) = years.binary_search(year) {
                            cells[col] = *value;
                        }
                    }
                    PivotRow {
                        entity: row.entity.clone(),
                        cells,
                    }
                })
            })
            .collect();

        PivotTable {
            column,
            years,
            rows,
        }
    }
}

// ---------------------------------------------------------------------------
// Pivoting
// ---------------------------------------------------------------------------

/// Reshape long-form rows into one row per entity (sorted) and one column
/// per year present (ascending).
///
/// Absent combinations become 0. A repeated `(entity, year)` is a data
/// integrity violation and fails with [`DataError::DuplicateKey`].
/// Pivoting [`ValueColumn::Delta`] over rows that never went through
/// `add_delta` fails with [`DataError::MalformedSchema`].
pub fn pivot(rows: &[Observation], column: ValueColumn) -> Result<PivotTable> {
    let mut cells: BTreeMap<&str, BTreeMap<i32, i64>> = BTreeMap::new();
    let mut years = BTreeSet::new();

    for row in rows {
        let value = row
            .cell(column)
            .ok_or_else(|| DataError::missing_column("pivot input", "delta"))?;
        let previous = cells
            .entry(row.entity.as_str())
            .or_default()
            .insert(row.year, value);
        if previous.is_some() {
            return Err(DataError::DuplicateKey {
                entity: row.entity.clone(),
                year: row.year,
            });
        }
        years.insert(row.year);
    }

    let years: Vec<i32> = years.into_iter().collect();
    let rows = cells
        .into_iter()
        .map(|(entity, by_year)| PivotRow {
            entity: entity.to_string(),
            cells: years
                .iter()
                .map(|y| by_year.get(y).copied().unwrap_or(0))
                .collect(),
        })
        .collect::<Vec<_>>();

    log::debug!("pivot: {} entities x {} years", rows.len(), years.len());
    Ok(PivotTable {
        column,
        years,
        rows,
    })
}
