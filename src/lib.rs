//! Lodging facility metrics engine.
//!
//! Loads the facility, room and capacity tables of the Okinawa lodging
//! survey, derives year-over-year deltas and produces filtered series and
//! entity × year pivot tables for a presentation layer.

pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod export;

pub use config::{ColumnSchema, DashboardConfig, DataSources};
pub use dashboard::{Dashboard, MetricView, RegionMode};
pub use data::cache::DatasetCache;
pub use data::model::{Dataset, Metric, MetricTable, Observation, ValueColumn};
pub use error::{DataError, Result};
