//! Write deterministic sample tables in the survey's long format.
//!
//! Usage: `generate_sample [DIR] [--parquet]`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use lodging_dash::data::area::{AreaTable, AREAS};
use lodging_dash::{ColumnSchema, Metric};

const FIRST_YEAR: i32 = 2007;
const LAST_YEAR: i32 = 2023;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform in `[lo, hi)`.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        lo + (hi - lo) * unit
    }
}

/// (entity, year, facilities, rooms, capacity)
type Row = (String, i32, i64, i64, i64);

fn generate(rng: &mut SimpleRng) -> Vec<Row> {
    let areas = AreaTable::okinawa();
    let mut rows = Vec::new();
    let mut area_totals: BTreeMap<(&str, i32), (i64, i64, i64)> = BTreeMap::new();

    for area in AREAS {
        for municipality in areas.members(area) {
            let mut facilities = rng.uniform(5.0, 120.0);
            let rooms_per_facility = rng.uniform(6.0, 40.0);
            let guests_per_room = rng.uniform(2.2, 3.1);

            for year in FIRST_YEAR..=LAST_YEAR {
                // Tourism dip in 2020, steady growth otherwise.
                let growth = if year == 2020 {
                    rng.uniform(-0.08, 0.0)
                } else {
                    rng.uniform(0.0, 0.12)
                };
                facilities *= 1.0 + growth;
                let f = facilities.round() as i64;
                let r = (facilities * rooms_per_facility).round() as i64;
                let c = (facilities * rooms_per_facility * guests_per_room).round() as i64;

                let total = area_totals.entry((area, year)).or_default();
                total.0 += f;
                total.1 += r;
                total.2 += c;
                rows.push((municipality.clone(), year, f, r, c));
            }
        }
    }

    for ((area, year), (f, r, c)) in area_totals {
        rows.push((area.to_string(), year, f, r, c));
    }
    rows
}

fn pick(row: &Row, metric: Metric) -> i64 {
    match metric {
        Metric::Facilities => row.2,
        Metric::Rooms => row.3,
        Metric::Capacity => row.4,
    }
}

fn write_csv(path: &Path, rows: &[Row], metric: Metric, columns: &ColumnSchema) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record([
        columns.entity.as_str(),
        columns.year.as_str(),
        columns.metric_column(metric),
    ])?;
    for row in rows {
        wtr.write_record([
            row.0.clone(),
            row.1.to_string(),
            pick(row, metric).to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row], metric: Metric, columns: &ColumnSchema) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(columns.entity.as_str(), DataType::Utf8, false),
        Field::new(columns.year.as_str(), DataType::Int32, false),
        Field::new(columns.metric_column(metric), DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.0.as_str()))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.1))),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| pick(r, metric) as f64),
            )),
        ],
    )
    .context("building record batch")?;

    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn file_stem(metric: Metric) -> &'static str {
    match metric {
        Metric::Facilities => "facilities_long",
        Metric::Rooms => "rooms_long",
        Metric::Capacity => "capacity_long",
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut dir = PathBuf::from(".");
    let mut parquet = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--parquet" => parquet = true,
            other => dir = PathBuf::from(other),
        }
    }
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);
    let columns = ColumnSchema::default();

    for metric in Metric::ALL {
        let csv_path = dir.join(format!("{}.csv", file_stem(metric)));
        write_csv(&csv_path, &rows, metric, &columns)?;
        log::info!("wrote {}", csv_path.display());

        if parquet {
            let pq_path = dir.join(format!("{}.parquet", file_stem(metric)));
            write_parquet(&pq_path, &rows, metric, &columns)?;
            log::info!("wrote {}", pq_path.display());
        }
    }

    println!(
        "Wrote {} rows per metric ({}-{}) to {}",
        rows.len(),
        FIRST_YEAR,
        LAST_YEAR,
        dir.display()
    );
    Ok(())
}
