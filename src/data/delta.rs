use std::collections::HashMap;

use super::model::{truncate, Dataset, MetricTable};

/// Return a copy of `table` with `delta` filled in for every row.
///
/// Rows are grouped by entity and ordered by year inside each group; the
/// first row of a group gets 0, every later row the difference to the
/// previous present year. Row order of the copy matches the input.
pub fn add_delta(table: &MetricTable) -> MetricTable {
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, row) in table.rows.iter().enumerate() {
        groups.entry(row.entity.as_str()).or_default().push(i);
    }

    let mut out = table.clone();
    for indices in groups.values_mut() {
        // Stable sort keeps input order among equal years.
        indices.sort_by_key(|&i| table.rows[i].year);

        let mut previous: Option<f64> = None;
        for &i in indices.iter() {
            let value = table.rows[i].value;
            out.rows[i].delta = Some(previous.map_or(0, |p| truncate(value - p)));
            previous = Some(value);
        }
    }

    log::debug!(
        "computed deltas for {} rows across {} entities of {}",
        out.len(),
        groups.len(),
        table.metric
    );
    out
}

impl Dataset {
    /// Augment all three tables; `self` is left untouched.
    pub fn with_deltas(&self) -> Dataset {
        Dataset {
            facilities: add_delta(&self.facilities),
            rooms: add_delta(&self.rooms),
            capacity: add_delta(&self.capacity),
        }
    }
}
