/// Data layer: core types, loading, delta derivation, filtering and pivoting.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet  (×3 metrics)
///        │
///        ▼
///   ┌──────────┐   ┌─────────┐
///   │  loader   │──▶│  cache   │  memoised per source set
///   └──────────┘   └─────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  delta    │  once: per-entity year-over-year difference
///   └──────────┘
///        │   (read-only from here on)
///        ▼
///   ┌──────────┐
///   │  filter   │  per selection: region / municipality / year window
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │  pivot    │   │  series   │  wide table / chart lines
///   └──────────┘   └──────────┘
/// ```

pub mod area;
pub mod cache;
pub mod delta;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pivot;
pub mod series;
pub mod territory;
