use std::io::Write;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use serde::Serialize;

use crate::config::ColumnSchema;
use crate::dashboard::MetricView;
use crate::data::model::ValueColumn;
use crate::data::pivot::PivotTable;
use crate::data::series::Series;
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Output shapes for a list of [`MetricView`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewFormat {
    /// Aligned text grid per metric.
    Table,
    /// Wide pivot CSV per metric, each block preceded by a `# heading` line.
    Csv,
    /// Long `name,year,value` chart series per metric.
    SeriesCsv,
    /// All views as one JSON array.
    Json,
}

/// Write `views` in `format`. `column` picks the value or delta table for the
/// tabular formats; headings and the entity header come from `columns`.
pub fn write_views<W: Write>(
    views: &[MetricView],
    column: ValueColumn,
    format: ViewFormat,
    columns: &ColumnSchema,
    mut out: W,
) -> Result<()> {
    if format == ViewFormat::Json {
        write_json(views, &mut out)?;
        return writeln!(out).map_err(export_err);
    }

    for view in views {
        let table = match column {
            ValueColumn::Value => &view.table,
            ValueColumn::Delta => &view.delta_table,
        };
        let heading = match format {
            ViewFormat::SeriesCsv => columns.heading(view.metric, ValueColumn::Value),
            _ => columns.heading(view.metric, column),
        };
        match format {
            ViewFormat::Table => {
                writeln!(out, "{heading}").map_err(export_err)?;
                writeln!(out, "{}", render_pivot(table, &columns.entity)?).map_err(export_err)?;
            }
            ViewFormat::Csv => {
                writeln!(out, "# {heading}").map_err(export_err)?;
                write_pivot_csv(table, &columns.entity, &mut out)?;
            }
            ViewFormat::SeriesCsv => {
                writeln!(out, "# {heading}").map_err(export_err)?;
                write_series_csv(&view.series, &mut out)?;
            }
            ViewFormat::Json => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Wide CSV: `entity_header, year1, year2, ...` then one line per row.
pub fn write_pivot_csv<W: Write>(table: &PivotTable, entity_header: &str, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    let mut header = vec![entity_header.to_string()];
    header.extend(table.years.iter().map(|y| y.to_string()));
    wtr.write_record(&header).map_err(export_err)?;

    for row in &table.rows {
        let mut record = vec![row.entity.clone()];
        record.extend(row.cells.iter().map(|c| c.to_string()));
        wtr.write_record(&record).map_err(export_err)?;
    }
    wtr.flush().map_err(export_err)?;
    Ok(())
}

#[derive(Serialize)]
struct SeriesPoint<'a> {
    name: &'a str,
    year: i32,
    value: i64,
}

/// Long CSV with `name,year,value` rows, series after series.
pub fn write_series_csv<W: Write>(series: &[Series], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for s in series {
        for &(year, value) in &s.points {
            wtr.serialize(SeriesPoint {
                name: &s.name,
                year,
                value,
            })
            .map_err(export_err)?;
        }
    }
    wtr.flush().map_err(export_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

pub fn write_json<W: Write, T: Serialize + ?Sized>(value: &T, out: W) -> Result<()> {
    serde_json::to_writer_pretty(out, value).map_err(export_err)
}

// ---------------------------------------------------------------------------
// Text grid
// ---------------------------------------------------------------------------

/// Convert to an Arrow batch: one Utf8 entity column, one Int64 column per year.
pub fn pivot_to_batch(table: &PivotTable, entity_header: &str) -> Result<RecordBatch> {
    let mut fields = vec![Field::new(entity_header, DataType::Utf8, false)];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from_iter_values(
        table.rows.iter().map(|r| r.entity.as_str()),
    ))];

    for (col, year) in table.years.iter().enumerate() {
        fields.push(Field::new(year.to_string(), DataType::Int64, false));
        columns.push(Arc::new(Int64Array::from_iter_values(
            table.rows.iter().map(|r| r.cells[col]),
        )));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(export_err)
}

/// Aligned text table for terminals.
pub fn render_pivot(table: &PivotTable, entity_header: &str) -> Result<String> {
    let batch = pivot_to_batch(table, entity_header)?;
    let rendered = pretty_format_batches(&[batch]).map_err(export_err)?;
    Ok(rendered.to_string())
}

fn export_err(e: impl ToString) -> DataError {
    DataError::Export(e.to_string())
}
