use std::collections::BTreeSet;

use super::model::{MetricTable, Observation};
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Inclusive year window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    min: i32,
    max: i32,
}

impl YearRange {
    pub fn new(min: i32, max: i32) -> Result<Self> {
        if min > max {
            return Err(DataError::InvalidYearRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

/// Which entities a selection keeps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EntityFilter {
    /// No constraint.
    #[default]
    All,
    /// Exact name match. An empty set keeps nothing.
    Exact(BTreeSet<String>),
    /// Substring match against any region name, dropping entities that
    /// contain `exclude_marker`. "宮古" would otherwise also pick up
    /// "宮古島市". An empty region set keeps nothing.
    Region {
        regions: BTreeSet<String>,
        exclude_marker: String,
    },
}

impl EntityFilter {
    pub fn exact<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EntityFilter::Exact(names.into_iter().map(Into::into).collect())
    }

    pub fn region<I, S>(regions: I, exclude_marker: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EntityFilter::Region {
            regions: regions.into_iter().map(Into::into).collect(),
            exclude_marker: exclude_marker.into(),
        }
    }

    pub fn matches(&self, entity: &str) -> bool {
        match self {
            EntityFilter::All => true,
            EntityFilter::Exact(names) => names.contains(entity),
            EntityFilter::Region {
                regions,
                exclude_marker,
            } => {
                if !exclude_marker.is_empty() && entity.contains(exclude_marker.as_str()) {
                    return false;
                }
                regions.iter().any(|r| entity.contains(r.as_str()))
            }
        }
    }
}

/// Criteria combined with logical AND.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub entities: EntityFilter,
    /// `None` means every year.
    pub years: Option<YearRange>,
}

impl Selection {
    pub fn new(entities: EntityFilter, years: Option<YearRange>) -> Self {
        Self { entities, years }
    }

    pub fn matches(&self, row: &Observation) -> bool {
        self.years.map_or(true, |y| y.contains(row.year)) && self.entities.matches(&row.entity)
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Rows of `table` passing `selection`. No match yields an empty vec.
pub fn filter_rows(table: &MetricTable, selection: &Selection) -> Vec<Observation> {
    let rows: Vec<Observation> = table
        .rows
        .iter()
        .filter(|row| selection.matches(row))
        .cloned()
        .collect();
    log::debug!(
        "filter on {}: {} of {} rows kept",
        table.metric,
        rows.len(),
        table.len()
    );
    rows
}

/// Rows belonging to a single region under the substring rule.
pub fn filter_region(
    table: &MetricTable,
    region: &str,
    exclude_marker: &str,
    years: Option<YearRange>,
) -> Vec<Observation> {
    let selection = Selection::new(EntityFilter::region([region], exclude_marker), years);
    filter_rows(table, &selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Metric;

    fn table() -> MetricTable {
        MetricTable::new(
            Metric::Facilities,
            vec![
                Observation::new("A", 2020, 10.0),
                Observation::new("A", 2021, 12.0),
                Observation::new("B", 2020, 8.0),
                Observation::new("B", 2021, 8.0),
                Observation::new("宮古", 2021, 300.0),
                Observation::new("宮古島市", 2021, 280.0),
                Observation::new("八重山", 2021, 500.0),
            ],
        )
    }

    fn entities(rows: &[Observation]) -> Vec<(&str, i32)> {
        rows.iter().map(|r| (r.entity.as_str(), r.year)).collect()
    }

    #[test]
    fn exact_membership_and_years() {
        let years = YearRange::new(2021, 2021).unwrap();
        let sel = Selection::new(EntityFilter::exact(["A"]), Some(years));
        assert_eq!(entities(&filter_rows(&table(), &sel)), vec![("A", 2021)]);
    }

    #[test]
    fn empty_membership_set_yields_nothing() {
        let sel = Selection::new(EntityFilter::Exact(BTreeSet::new()), None);
        assert!(filter_rows(&table(), &sel).is_empty());

        let sel = Selection::new(EntityFilter::region(Vec::<String>::new(), "市"), None);
        assert!(filter_rows(&table(), &sel).is_empty());
    }

    #[test]
    fn year_range_outside_data_yields_nothing() {
        let sel = Selection::new(EntityFilter::All, Some(YearRange::new(1990, 1999).unwrap()));
        assert!(filter_rows(&table(), &sel).is_empty());
    }

    #[test]
    fn year_bounds_are_inclusive() {
        let years = YearRange::new(2020, 2021).unwrap();
        let sel = Selection::new(EntityFilter::exact(["A", "B"]), Some(years));
        assert_eq!(filter_rows(&table(), &sel).len(), 4);
    }

    #[test]
    fn region_match_excludes_municipal_marker() {
        let rows = filter_region(&table(), "宮古", "市", None);
        assert_eq!(entities(&rows), vec![("宮古", 2021)]);
    }

    #[test]
    fn region_set_matches_any() {
        let sel = Selection::new(EntityFilter::region(["宮古", "八重山"], "市"), None);
        assert_eq!(
            entities(&filter_rows(&table(), &sel)),
            vec![("宮古", 2021), ("八重山", 2021)]
        );
    }

    #[test]
    fn empty_marker_disables_exclusion() {
        let rows = filter_region(&table(), "宮古", "", None);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn inverted_range_rejected() {
        assert!(matches!(
            YearRange::new(2023, 2007),
            Err(DataError::InvalidYearRange { min: 2023, max: 2007 })
        ));
    }

    #[test]
    fn filtering_leaves_table_untouched() {
        let t = table();
        let before = t.clone();
        let _ = filter_rows(&t, &Selection::default());
        assert_eq!(t, before);
    }
}
