use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Metric – which of the three survey measures a table holds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Number of lodging facilities (軒数).
    Facilities,
    /// Number of guest rooms (客室数).
    Rooms,
    /// Guest capacity (収容人数).
    Capacity,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Facilities, Metric::Rooms, Metric::Capacity];

    /// Survey label, also the default source column name.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Facilities => "軒数",
            Metric::Rooms => "客室数",
            Metric::Capacity => "収容人数",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which column of an [`Observation`] a pivot or series reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueColumn {
    #[default]
    Value,
    Delta,
}

// ---------------------------------------------------------------------------
// Observation – one row of a long-form table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub entity: String,
    pub year: i32,
    /// Metric value as read; fractional source values are kept until pivoting.
    pub value: f64,
    /// Year-over-year difference, `None` until the table has been augmented.
    pub delta: Option<i64>,
}

impl Observation {
    pub fn new(entity: impl Into<String>, year: i32, value: f64) -> Self {
        Self {
            entity: entity.into(),
            year,
            value,
            delta: None,
        }
    }

    /// Read `column` as an integer. `None` for a delta that was never computed.
    pub fn cell(&self, column: ValueColumn) -> Option<i64> {
        match column {
            ValueColumn::Value => Some(truncate(self.value)),
            ValueColumn::Delta => self.delta,
        }
    }
}

/// Float to integer toward zero; NaN becomes 0.
pub fn truncate(v: f64) -> i64 {
    v.trunc() as i64
}

// ---------------------------------------------------------------------------
// MetricTable – all observations for one metric
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    pub metric: Metric,
    pub rows: Vec<Observation>,
}

impl MetricTable {
    pub fn new(metric: Metric, rows: Vec<Observation>) -> Self {
        Self { metric, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether every row carries a delta.
    pub fn has_delta(&self) -> bool {
        self.rows.iter().all(|r| r.delta.is_some())
    }

    /// Distinct entities in first-seen order.
    pub fn entities(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.rows
            .iter()
            .filter(|r| seen.insert(r.entity.as_str()))
            .map(|r| r.entity.clone())
            .collect()
    }

    /// Smallest and largest year present.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        let min = self.rows.iter().map(|r| r.year).min()?;
        let max = self.rows.iter().map(|r| r.year).max()?;
        Some((min, max))
    }
}

// ---------------------------------------------------------------------------
// Dataset – the three tables loaded together
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub facilities: MetricTable,
    pub rooms: MetricTable,
    pub capacity: MetricTable,
}

impl Dataset {
    pub fn table(&self, metric: Metric) -> &MetricTable {
        match metric {
            Metric::Facilities => &self.facilities,
            Metric::Rooms => &self.rooms,
            Metric::Capacity => &self.capacity,
        }
    }

    pub fn tables(&self) -> [&MetricTable; 3] {
        [&self.facilities, &self.rooms, &self.capacity]
    }
}
