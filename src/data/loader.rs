use std::path::Path;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, Metric, MetricTable, Observation};
use crate::config::{ColumnSchema, DataSources};
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load all three metric tables. Any failure aborts the whole load.
pub fn load_dataset(sources: &DataSources) -> Result<Dataset> {
    let load = |metric| load_table(sources.path(metric), metric, &sources.columns);
    let facilities = load(Metric::Facilities)?;
    let rooms = load(Metric::Rooms)?;
    let capacity = load(Metric::Capacity)?;
    log::info!(
        "loaded dataset: {} facility rows, {} room rows, {} capacity rows",
        facilities.len(),
        rooms.len(),
        capacity.len()
    );
    Ok(Dataset {
        facilities,
        rooms,
        capacity,
    })
}

/// Load one long-form table.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row naming the entity, year and metric columns
/// * `.json`    – `[{ "市町村": "...", "年": 2020, "軒数": 10 }, ...]`
/// * `.parquet` – flat columns; year and metric may be any numeric type
pub fn load_table(path: &Path, metric: Metric, columns: &ColumnSchema) -> Result<MetricTable> {
    if !path.is_file() {
        return Err(DataError::not_found(path, "no such file"));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let layout = Layout::new(path, metric, columns);
    let rows = match ext.as_str() {
        "csv" => load_csv(path, &layout)?,
        "json" => load_json(path, &layout)?,
        "parquet" | "pq" => load_parquet(path, &layout)?,
        other => return Err(DataError::UnsupportedFormat(other.to_string())),
    };
    log::debug!("{}: {} rows of {metric}", layout.source, rows.len());
    Ok(MetricTable::new(metric, rows))
}

/// Resolved column names for one source, plus its display name for errors.
struct Layout<'a> {
    source: String,
    entity: &'a str,
    year: &'a str,
    value: &'a str,
}

impl<'a> Layout<'a> {
    fn new(path: &Path, metric: Metric, columns: &'a ColumnSchema) -> Self {
        Self {
            source: path.display().to_string(),
            entity: &columns.entity,
            year: &columns.year,
            value: columns.metric_column(metric),
        }
    }

    fn missing(&self, column: &str) -> DataError {
        DataError::missing_column(&self.source, column)
    }

    fn invalid(&self, row: usize, column: &str, value: impl Into<String>) -> DataError {
        DataError::invalid_value(&self.source, row, column, value)
    }

    fn entity(&self, row: usize, raw: &str) -> Result<String> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(self.invalid(row, self.entity, raw));
        }
        Ok(s.to_string())
    }

    fn year(&self, row: usize, raw: &str) -> Result<i32> {
        parse_year(raw).ok_or_else(|| self.invalid(row, self.year, raw))
    }

    fn value(&self, row: usize, raw: &str) -> Result<f64> {
        parse_number(raw).ok_or_else(|| self.invalid(row, self.value, raw))
    }
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Accepts `2020` and `2020.0`, nothing fractional.
fn parse_year(s: &str) -> Option<i32> {
    let s = s.trim();
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    year_from_float(s.parse::<f64>().ok()?)
}

fn year_from_float(f: f64) -> Option<i32> {
    let in_range = f >= i32::MIN as f64 && f <= i32::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i32)
}

/// Numeric cell with optional thousands separators (`1,234`).
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.replace(',', "").parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, layout: &Layout) -> Result<Vec<Observation>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::not_found(path, e))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DataError::not_found(path, e))?
        .iter()
        // Spreadsheet exports often lead with a UTF-8 BOM.
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| layout.missing(name))
    };
    let entity_idx = position(layout.entity)?;
    let year_idx = position(layout.year)?;
    let value_idx = position(layout.value)?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| DataError::not_found(path, format!("row {row_no}: {e}")))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        rows.push(Observation::new(
            layout.entity(row_no, cell(entity_idx))?,
            layout.year(row_no, cell(year_idx))?,
            layout.value(row_no, cell(value_idx))?,
        ));
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')` shape.
fn load_json(path: &Path, layout: &Layout) -> Result<Vec<Observation>> {
    let text = std::fs::read_to_string(path).map_err(|e| DataError::not_found(path, e))?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|e| DataError::not_found(path, e))?;
    let records = root
        .as_array()
        .ok_or_else(|| DataError::not_found(path, "expected top-level JSON array"))?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| DataError::not_found(path, format!("row {i} is not a JSON object")))?;
        let field = |name: &str| obj.get(name).ok_or_else(|| layout.missing(name));

        let entity = match field(layout.entity)? {
            JsonValue::String(s) => layout.entity(i, s)?,
            other => return Err(layout.invalid(i, layout.entity, other.to_string())),
        };
        let year = layout.year(i, &json_scalar(field(layout.year)?))?;
        let value = layout.value(i, &json_scalar(field(layout.value)?))?;

        rows.push(Observation::new(entity, year, value));
    }
    Ok(rows)
}

fn json_scalar(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Columns are located by name in every record batch and cast to
/// Utf8 / Float64, so files written by Pandas or Polars both work. Years
/// must be integral and values finite, as in the CSV reader.
fn load_parquet(path: &Path, layout: &Layout) -> Result<Vec<Observation>> {
    let file = std::fs::File::open(path).map_err(|e| DataError::not_found(path, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| DataError::not_found(path, e))?;
    let reader = builder.build().map_err(|e| DataError::not_found(path, e))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| DataError::not_found(path, e))?;
        let schema = batch.schema();
        let column = |name: &str, to: &DataType| {
            let idx = schema.index_of(name).map_err(|_| layout.missing(name))?;
            cast(batch.column(idx).as_ref(), to)
                .map_err(|e| DataError::not_found(path, format!("column '{name}': {e}")))
        };

        let entities = column(layout.entity, &DataType::Utf8)?;
        let years = column(layout.year, &DataType::Float64)?;
        let values = column(layout.value, &DataType::Float64)?;
        let entities = entities.as_string::<i32>();
        let years = years.as_primitive::<Float64Type>();
        let values = values.as_primitive::<Float64Type>();

        let offset = rows.len();
        for i in 0..batch.num_rows() {
            let row_no = offset + i;
            if entities.is_null(i) {
                return Err(layout.invalid(row_no, layout.entity, "null"));
            }
            if years.is_null(i) {
                return Err(layout.invalid(row_no, layout.year, "null"));
            }
            if values.is_null(i) {
                return Err(layout.invalid(row_no, layout.value, "null"));
            }
            let year = year_from_float(years.value(i))
                .ok_or_else(|| layout.invalid(row_no, layout.year, years.value(i).to_string()))?;
            let value = values.value(i);
            if !value.is_finite() {
                return Err(layout.invalid(row_no, layout.value, value.to_string()));
            }

            rows.push(Observation::new(
                layout.entity(row_no, entities.value(i))?,
                year,
                value,
            ));
        }
    }
    Ok(rows)
}
