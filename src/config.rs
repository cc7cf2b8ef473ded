use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::model::{Metric, ValueColumn};
use crate::error::{DataError, Result};

pub const DEFAULT_CONFIG_NAME: &str = "lodging-dash.json";

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Fixed column names of the long-form source tables.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSchema {
    pub entity: String,
    pub year: String,
    pub facilities: String,
    pub rooms: String,
    pub capacity: String,
    /// Appended to the metric name in headings of delta tables.
    pub delta: String,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            entity: "市町村".to_string(),
            year: "年".to_string(),
            facilities: Metric::Facilities.label().to_string(),
            rooms: Metric::Rooms.label().to_string(),
            capacity: Metric::Capacity.label().to_string(),
            delta: "増減数".to_string(),
        }
    }
}

impl ColumnSchema {
    /// Name of the value column holding `metric`.
    pub fn metric_column(&self, metric: Metric) -> &str {
        match metric {
            Metric::Facilities => &self.facilities,
            Metric::Rooms => &self.rooms,
            Metric::Capacity => &self.capacity,
        }
    }

    /// Heading for an exported `metric` table, e.g. `軒数` or `軒数 増減数`.
    pub fn heading(&self, metric: Metric, column: ValueColumn) -> String {
        match column {
            ValueColumn::Value => self.metric_column(metric).to_string(),
            ValueColumn::Delta => format!("{} {}", self.metric_column(metric), self.delta),
        }
    }
}

// ---------------------------------------------------------------------------
// Source identifiers
// ---------------------------------------------------------------------------

/// The three source identifiers. Also the cache key for loaded datasets.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DataSources {
    pub facilities: PathBuf,
    pub rooms: PathBuf,
    pub capacity: PathBuf,
    pub columns: ColumnSchema,
}

impl DataSources {
    pub fn path(&self, metric: Metric) -> &Path {
        match metric {
            Metric::Facilities => &self.facilities,
            Metric::Rooms => &self.rooms,
            Metric::Capacity => &self.capacity,
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNames {
    pub facilities: String,
    pub rooms: String,
    pub capacity: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            facilities: "facilities_long.csv".to_string(),
            rooms: "rooms_long.csv".to_string(),
            capacity: "capacity_long.csv".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub files: FileNames,
    pub columns: ColumnSchema,
    /// Area names offered for region selection.
    pub regions: Vec<String>,
    /// Entities containing this marker are dropped from region matches.
    pub municipal_marker: String,
    /// Initial year window `(min, max)`.
    pub default_years: (i32, i32),
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            files: FileNames::default(),
            columns: ColumnSchema::default(),
            regions: crate::data::area::AREAS.iter().map(|a| a.to_string()).collect(),
            municipal_marker: "市".to_string(),
            default_years: (2007, 2023),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file. Missing keys fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DataError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| DataError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if config.default_years.0 > config.default_years.1 {
            return Err(DataError::Config {
                path: path.to_path_buf(),
                message: format!(
                    "default_years {} > {}",
                    config.default_years.0, config.default_years.1
                ),
            });
        }
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, else `lodging-dash.json` in the working
    /// directory if present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let local = Path::new(DEFAULT_CONFIG_NAME);
                if local.is_file() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn sources(&self) -> DataSources {
        DataSources {
            facilities: self.data_dir.join(&self.files.facilities),
            rooms: self.data_dir.join(&self.files.rooms),
            capacity: self.data_dir.join(&self.files.capacity),
            columns: self.columns.clone(),
        }
    }
}
