use std::path::Path;
use std::sync::Arc;

use lodging_dash::data::delta::add_delta;
use lodging_dash::data::filter::{filter_rows, EntityFilter, Selection, YearRange};
use lodging_dash::data::loader::load_dataset;
use lodging_dash::data::pivot::{pivot, PivotRow};
use lodging_dash::export::write_pivot_csv;
use lodging_dash::{Dashboard, DashboardConfig, DataError, DatasetCache, Metric, ValueColumn};

fn write_tables(dir: &Path) -> DashboardConfig {
    std::fs::write(
        dir.join("facilities_long.csv"),
        "市町村,年,軒数\nA,2020,10\nA,2021,12\nB,2020,8\nB,2021,8\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("rooms_long.csv"),
        "市町村,年,客室数\nA,2020,100\nA,2021,90\nB,2020,80\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("capacity_long.csv"),
        "市町村,年,収容人数\nA,2020,300\nA,2021,320\nB,2021,200\n",
    )
    .unwrap();
    DashboardConfig {
        data_dir: dir.to_path_buf(),
        default_years: (2020, 2021),
        ..DashboardConfig::default()
    }
}

#[test]
fn load_delta_filter_pivot() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_tables(dir.path());
    let dataset = load_dataset(&config.sources()).unwrap();

    let augmented = add_delta(&dataset.facilities);
    let selection = Selection::new(
        EntityFilter::exact(["A", "B"]),
        Some(YearRange::new(2020, 2021).unwrap()),
    );
    let rows = filter_rows(&augmented, &selection);

    let values = pivot(&rows, ValueColumn::Value).unwrap();
    assert_eq!(values.years, vec![2020, 2021]);
    assert_eq!(
        values.rows,
        vec![
            PivotRow {
                entity: "A".into(),
                cells: vec![10, 12],
            },
            PivotRow {
                entity: "B".into(),
                cells: vec![8, 8],
            },
        ]
    );

    let deltas = pivot(&rows, ValueColumn::Delta).unwrap();
    assert_eq!(deltas.rows[0].cells, vec![0, 2]);
    assert_eq!(deltas.rows[1].cells, vec![0, 0]);

    // loaded table untouched by augmentation
    assert!(!dataset.facilities.has_delta());
}

#[test]
fn loader_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let sources = write_tables(dir.path()).sources();

    let first = load_dataset(&sources).unwrap();
    let second = load_dataset(&sources).unwrap();
    assert_eq!(first, second);

    let cache = DatasetCache::new();
    let a = cache.get_or_load(&sources).unwrap();
    let b = cache.get_or_load(&sources).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(*a, first);
}

#[test]
fn dashboard_fills_gaps_with_zero() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_tables(dir.path());
    let cache = DatasetCache::new();
    let dataset = cache.get_or_load(&config.sources()).unwrap();

    let mut dashboard = Dashboard::new(Arc::clone(&dataset), &config).unwrap();
    assert!(Arc::ptr_eq(dashboard.source(), &dataset));
    dashboard.toggle_municipality("A");
    dashboard.toggle_municipality("B");
    dashboard.toggle_metric(Metric::Facilities);
    dashboard.toggle_metric(Metric::Rooms);
    dashboard.toggle_metric(Metric::Capacity);

    let views = dashboard.municipality_views().unwrap();
    assert_eq!(
        views.iter().map(|v| v.metric).collect::<Vec<_>>(),
        vec![Metric::Rooms, Metric::Capacity]
    );
    assert_eq!(views[0].table.get("B", 2021), Some(0));
    assert_eq!(views[0].delta_table.get("A", 2021), Some(-10));
    assert_eq!(views[1].table.get("B", 2020), Some(0));

    let mut csv = Vec::new();
    write_pivot_csv(&views[1].table, &config.columns.entity, &mut csv).unwrap();
    assert_eq!(
        String::from_utf8(csv).unwrap(),
        "市町村,2020,2021\nA,300,320\nB,0,200\n"
    );
}

#[test]
fn duplicate_rows_surface_at_pivot() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_tables(dir.path());
    std::fs::write(
        dir.path().join("facilities_long.csv"),
        "市町村,年,軒数\nA,2020,10\nA,2020,11\n",
    )
    .unwrap();
    let dataset = Arc::new(load_dataset(&config.sources()).unwrap());

    let mut dashboard = Dashboard::new(dataset, &config).unwrap();
    dashboard.toggle_municipality("A");
    assert!(matches!(
        dashboard.municipality_views(),
        Err(DataError::DuplicateKey { year: 2020, .. })
    ));
}

#[test]
fn missing_source_fails_whole_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_tables(dir.path());
    std::fs::remove_file(dir.path().join("capacity_long.csv")).unwrap();

    assert!(matches!(
        load_dataset(&config.sources()),
        Err(DataError::DataNotFound { .. })
    ));
}
