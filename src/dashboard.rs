use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::DashboardConfig;
use crate::data::area::AreaTable;
use crate::data::filter::{filter_region, filter_rows, EntityFilter, Selection, YearRange};
use crate::data::model::{truncate, Dataset, Metric, Observation, ValueColumn};
use crate::data::pivot::{pivot, PivotTable};
use crate::data::series::{labelled_series, order_by_final_year, series, sort_series, Series};
use crate::data::territory;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Views handed to the presentation layer
// ---------------------------------------------------------------------------

/// Everything a chart + table pair needs for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricView {
    pub metric: Metric,
    pub series: Vec<Series>,
    pub table: PivotTable,
    pub delta_table: PivotTable,
}

/// How a selected region is turned into rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionMode {
    /// Entity name contains the region name and not the municipal marker.
    #[default]
    Substring,
    /// Members of the region according to the [`AreaTable`], summed per year
    /// for the chart.
    Classified,
}

// ---------------------------------------------------------------------------
// Dashboard session
// ---------------------------------------------------------------------------

/// Loaded data plus the current selection, independent of rendering.
pub struct Dashboard {
    /// Tables as loaded, shared with the cache.
    source: Arc<Dataset>,
    /// Delta-augmented copy of `source`; read-only.
    dataset: Dataset,
    areas: AreaTable,
    municipal_marker: String,

    /// Selected regions in selection order.
    pub regions: Vec<String>,
    /// Selected municipalities in selection order.
    pub municipalities: Vec<String>,
    pub years: YearRange,
    /// Selected metrics in selection order.
    pub metrics: Vec<Metric>,
    pub region_mode: RegionMode,
}

impl Dashboard {
    /// Augment `dataset` with deltas and start with the configured defaults:
    /// nothing selected, facilities only, the default year window.
    pub fn new(source: Arc<Dataset>, config: &DashboardConfig) -> Result<Self> {
        let (min, max) = config.default_years;
        Ok(Self {
            dataset: source.with_deltas(),
            source,
            areas: AreaTable::okinawa(),
            municipal_marker: config.municipal_marker.clone(),
            regions: Vec::new(),
            municipalities: Vec::new(),
            years: YearRange::new(min, max)?,
            metrics: vec![Metric::Facilities],
            region_mode: RegionMode::default(),
        })
    }

    pub fn with_areas(mut self, areas: AreaTable) -> Self {
        self.areas = areas;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The loaded tables this session was built from.
    pub fn source(&self) -> &Arc<Dataset> {
        &self.source
    }

    /// Municipality choices: distinct entities of the facilities table.
    pub fn municipality_options(&self) -> Vec<String> {
        self.dataset.facilities.entities()
    }

    // -- selection mutators --

    pub fn toggle_region(&mut self, region: &str) {
        toggle(&mut self.regions, region.to_string());
    }

    pub fn toggle_municipality(&mut self, name: &str) {
        toggle(&mut self.municipalities, name.to_string());
    }

    pub fn toggle_metric(&mut self, metric: Metric) {
        toggle(&mut self.metrics, metric);
    }

    pub fn select_all_municipalities(&mut self) {
        self.municipalities = self.municipality_options();
    }

    pub fn select_no_municipalities(&mut self) {
        self.municipalities.clear();
    }

    pub fn set_years(&mut self, min: i32, max: i32) -> Result<()> {
        self.years = YearRange::new(min, max)?;
        Ok(())
    }

    // -- views --

    /// One view per selected metric for the selected regions. Empty when no
    /// region is selected; regions without rows contribute nothing.
    pub fn region_views(&self) -> Result<Vec<MetricView>> {
        if self.regions.is_empty() {
            log::debug!("no region selected");
            return Ok(Vec::new());
        }

        let mut views = Vec::with_capacity(self.metrics.len());
        for &metric in &self.metrics {
            let table = self.dataset.table(metric);
            let mut lines = Vec::new();
            let mut values = Vec::new();
            let mut deltas = Vec::new();

            for region in &self.regions {
                let rows = match self.region_mode {
                    RegionMode::Substring => {
                        filter_region(table, region, &self.municipal_marker, Some(self.years))
                    }
                    RegionMode::Classified => {
                        let members = EntityFilter::Exact(self.areas.members(region));
                        filter_rows(table, &Selection::new(members, Some(self.years)))
                    }
                };
                if rows.is_empty() {
                    let (min, max) = (self.years.min(), self.years.max());
                    log::warn!("region {region}: no {metric} rows in {min}-{max}");
                    continue;
                }

                lines.push(match self.region_mode {
                    RegionMode::Substring => labelled_series(region, &rows, ValueColumn::Value),
                    RegionMode::Classified => summed_series(region, &rows),
                });
                values.push(pivot(&rows, ValueColumn::Value)?);
                deltas.push(pivot(&rows, ValueColumn::Delta)?);
            }

            views.push(MetricView {
                metric,
                series: lines,
                table: PivotTable::concat(ValueColumn::Value, &values),
                delta_table: PivotTable::concat(ValueColumn::Delta, &deltas),
            });
        }
        Ok(views)
    }

    /// One view per selected metric for the selected municipalities, lines
    /// ordered by the final year's value. Metrics with no rows are skipped.
    pub fn municipality_views(&self) -> Result<Vec<MetricView>> {
        if self.municipalities.is_empty() {
            log::debug!("no municipality selected");
            return Ok(Vec::new());
        }

        let selection = Selection::new(
            EntityFilter::exact(self.municipalities.iter().cloned()),
            Some(self.years),
        );
        let mut views = Vec::new();
        for &metric in &self.metrics {
            let rows = filter_rows(self.dataset.table(metric), &selection);
            if rows.is_empty() {
                continue;
            }
            views.push(entity_view(metric, &rows, Some(self.years.max()))?);
        }
        Ok(views)
    }
}

/// Views of the embedded prefecture-wide totals, all years, all metrics.
pub fn territory_views() -> Result<Vec<MetricView>> {
    let totals = territory::totals().with_deltas();
    Metric::ALL
        .iter()
        .map(|&metric| entity_view(metric, &totals.table(metric).rows, None))
        .collect()
}

fn entity_view(
    metric: Metric,
    rows: &[Observation],
    final_year: Option<i32>,
) -> Result<MetricView> {
    let mut lines = series(rows, ValueColumn::Value);
    if let Some(year) = final_year {
        sort_series(&mut lines, &order_by_final_year(rows, year));
    }
    Ok(MetricView {
        metric,
        series: lines,
        table: pivot(rows, ValueColumn::Value)?,
        delta_table: pivot(rows, ValueColumn::Delta)?,
    })
}

/// Per-year sum of every row, labelled `name`.
fn summed_series(name: &str, rows: &[Observation]) -> Series {
    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for row in rows {
        *by_year.entry(row.year).or_default() += row.value;
    }
    Series {
        name: name.to_string(),
        points: by_year
            .into_iter()
            .map(|(year, v)| (year, truncate(v)))
            .collect(),
    }
}

fn toggle<T: PartialEq>(selected: &mut Vec<T>, item: T) {
    if let Some(pos) = selected.iter().position(|s| *s == item) {
        selected.remove(pos);
    } else {
        selected.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::MetricTable;
    use crate::error::DataError;

    fn table(metric: Metric, rows: &[(&str, i32, f64)]) -> MetricTable {
        MetricTable::new(
            metric,
            rows.iter().map(|&(e, y, v)| Observation::new(e, y, v)).collect(),
        )
    }

    fn dataset() -> Dataset {
        let rows = [
            ("A", 2020, 10.0),
            ("A", 2021, 12.0),
            ("B", 2020, 8.0),
            ("B", 2021, 8.0),
            ("宮古", 2020, 30.0),
            ("宮古", 2021, 33.0),
            ("宮古島市", 2020, 25.0),
            ("宮古島市", 2021, 27.0),
            ("多良間村", 2021, 4.0),
        ];
        Dataset {
            facilities: table(Metric::Facilities, &rows),
            rooms: table(Metric::Rooms, &rows[..4]),
            capacity: table(Metric::Capacity, &[]),
        }
    }

    fn dashboard() -> Dashboard {
        let config = DashboardConfig {
            default_years: (2020, 2021),
            ..DashboardConfig::default()
        };
        Dashboard::new(Arc::new(dataset()), &config).unwrap()
    }

    #[test]
    fn nothing_selected_means_no_views() {
        let d = dashboard();
        assert!(d.region_views().unwrap().is_empty());
        assert!(d.municipality_views().unwrap().is_empty());
    }

    #[test]
    fn source_dataset_not_augmented() {
        let source = Arc::new(dataset());
        let d = Dashboard::new(Arc::clone(&source), &DashboardConfig::default()).unwrap();
        assert!(!source.facilities.has_delta());
        assert!(d.dataset().facilities.has_delta());
        // loaded tables are shared, not copied
        assert!(Arc::ptr_eq(d.source(), &source));
        assert!(!d.source().facilities.has_delta());
    }

    #[test]
    fn municipality_view_tables() {
        let mut d = dashboard();
        d.toggle_municipality("B");
        d.toggle_municipality("A");
        let views = d.municipality_views().unwrap();

        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.table.years, vec![2020, 2021]);
        assert_eq!(view.table.get("A", 2021), Some(12));
        assert_eq!(view.table.get("B", 2020), Some(8));
        assert_eq!(view.delta_table.get("A", 2021), Some(2));
        assert_eq!(view.delta_table.get("B", 2021), Some(0));
        // A has the larger final-year value
        assert_eq!(view.series[0].name, "A");
    }

    #[test]
    fn empty_metric_skipped() {
        let mut d = dashboard();
        d.toggle_municipality("A");
        d.toggle_metric(Metric::Capacity);
        let views = d.municipality_views().unwrap();
        let metrics: Vec<Metric> = views.iter().map(|v| v.metric).collect();
        assert_eq!(metrics, vec![Metric::Facilities]);
    }

    #[test]
    fn substring_region_excludes_cities() {
        let mut d = dashboard();
        d.toggle_region("宮古");
        let views = d.region_views().unwrap();

        let view = &views[0];
        assert_eq!(view.series.len(), 1);
        assert_eq!(view.series[0].points, vec![(2020, 30), (2021, 33)]);
        assert_eq!(view.table.rows.len(), 1);
        assert_eq!(view.table.rows[0].entity, "宮古");
    }

    #[test]
    fn classified_region_uses_area_table() {
        let mut d = dashboard();
        d.region_mode = RegionMode::Classified;
        d.toggle_region("宮古");
        let views = d.region_views().unwrap();

        let view = &views[0];
        let entities: Vec<&str> = view.table.rows.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(entities, vec!["多良間村", "宮古島市"]);
        assert_eq!(view.table.get("多良間村", 2020), Some(0));
        assert_eq!(view.series[0].points, vec![(2020, 25), (2021, 31)]);
    }

    #[test]
    fn custom_area_table() {
        let mut d = dashboard().with_areas(AreaTable::new([("東", vec!["A", "B"])]));
        d.region_mode = RegionMode::Classified;
        d.toggle_region("東");
        let view = &d.region_views().unwrap()[0];
        assert_eq!(view.series[0].points, vec![(2020, 18), (2021, 20)]);
    }

    #[test]
    fn year_window_applies() {
        let mut d = dashboard();
        d.toggle_municipality("A");
        d.set_years(2021, 2021).unwrap();
        let view = &d.municipality_views().unwrap()[0];
        assert_eq!(view.table.years, vec![2021]);
        // delta computed on the full table, not the window
        assert_eq!(view.delta_table.get("A", 2021), Some(2));

        assert!(matches!(d.set_years(2022, 2021), Err(DataError::InvalidYearRange { .. })));
    }

    #[test]
    fn toggles_are_reversible() {
        let mut d = dashboard();
        d.toggle_metric(Metric::Facilities);
        assert!(d.metrics.is_empty());
        d.toggle_metric(Metric::Facilities);
        assert_eq!(d.metrics, vec![Metric::Facilities]);

        d.select_all_municipalities();
        assert_eq!(d.municipalities.len(), 5);
        d.select_no_municipalities();
        assert!(d.municipalities.is_empty());
    }

    #[test]
    fn territory_views_cover_all_metrics() {
        let views = territory_views().unwrap();
        assert_eq!(views.len(), 3);
        assert_eq!(views[1].metric, Metric::Rooms);
        assert_eq!(views[1].series[0].points.len(), 34);
    }
}
