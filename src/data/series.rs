use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{Observation, ValueColumn};

/// One line of a chart: a label and its `(year, value)` points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    pub name: String,
    /// Ascending by year.
    pub points: Vec<(i32, i64)>,
}

/// Group rows into one series per entity, sorted by entity name.
/// Rows without the requested column are skipped.
pub fn series(rows: &[Observation], column: ValueColumn) -> Vec<Series> {
    let mut grouped: BTreeMap<&str, Vec<(i32, i64)>> = BTreeMap::new();
    for row in rows {
        if let Some(v) = row.cell(column) {
            grouped.entry(row.entity.as_str()).or_default().push((row.year, v));
        }
    }
    grouped
        .into_iter()
        .map(|(name, mut points)| {
            points.sort_by_key(|&(year, _)| year);
            Series {
                name: name.to_string(),
                points,
            }
        })
        .collect()
}

/// A single series labelled `name` holding every row, whatever its entity.
/// Region charts draw all matched rows of a region as one line.
pub fn labelled_series(name: &str, rows: &[Observation], column: ValueColumn) -> Series {
    let mut points: Vec<(i32, i64)> = rows
        .iter()
        .filter_map(|r| r.cell(column).map(|v| (r.year, v)))
        .collect();
    points.sort_by_key(|&(year, _)| year);
    Series {
        name: name.to_string(),
        points,
    }
}

/// Entities ordered by their value in `final_year`, largest first, ties by
/// name. Entities without a row in that year follow in name order.
pub fn order_by_final_year(rows: &[Observation], final_year: i32) -> Vec<String> {
    let mut latest: BTreeMap<&str, Option<f64>> = BTreeMap::new();
    for row in rows {
        let slot = latest.entry(row.entity.as_str()).or_default();
        if row.year == final_year {
            *slot = Some(row.value);
        }
    }

    let (mut ranked, unranked): (Vec<_>, Vec<_>) =
        latest.into_iter().partition(|(_, v)| v.is_some());
    ranked.sort_by(|(a_name, a), (b_name, b)| {
        let a = a.unwrap_or(0.0);
        let b = b.unwrap_or(0.0);
        b.total_cmp(&a).then_with(|| a_name.cmp(b_name))
    });

    ranked
        .into_iter()
        .chain(unranked)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Reorder `series` to follow `order`; series not named there keep their
/// relative order at the end.
pub fn sort_series(series: &mut [Series], order: &[String]) {
    series.sort_by_key(|s| {
        order
            .iter()
            .position(|name| *name == s.name)
            .unwrap_or(order.len())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[(&str, i32, f64)]) -> Vec<Observation> {
        data.iter().map(|&(e, y, v)| Observation::new(e, y, v)).collect()
    }

    #[test]
    fn one_series_per_entity_sorted_by_year() {
        let s = series(
            &rows(&[("B", 2021, 8.0), ("A", 2021, 12.0), ("A", 2020, 10.0)]),
            ValueColumn::Value,
        );
        assert_eq!(
            s,
            vec![
                Series {
                    name: "A".into(),
                    points: vec![(2020, 10), (2021, 12)],
                },
                Series {
                    name: "B".into(),
                    points: vec![(2021, 8)],
                },
            ]
        );
    }

    #[test]
    fn delta_series_skips_unaugmented_rows() {
        assert!(series(&rows(&[("A", 2020, 1.0)]), ValueColumn::Delta).is_empty());
    }

    #[test]
    fn final_year_ordering() {
        let data = rows(&[
            ("名護市", 2023, 120.0),
            ("那覇市", 2023, 480.0),
            ("石垣市", 2022, 300.0),
            ("恩納村", 2023, 120.0),
            ("那覇市", 2022, 470.0),
        ]);
        assert_eq!(
            order_by_final_year(&data, 2023),
            vec!["那覇市", "名護市", "恩納村", "石垣市"]
        );
    }

    #[test]
    fn sort_series_follows_order() {
        let mut s = vec![
            Series {
                name: "A".into(),
                points: vec![],
            },
            Series {
                name: "B".into(),
                points: vec![],
            },
            Series {
                name: "C".into(),
                points: vec![],
            },
        ];
        sort_series(&mut s, &["C".to_string(), "A".to_string()]);
        let names: Vec<&str> = s.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn labelled_series_merges_entities() {
        let input = rows(&[("宮古", 2021, 3.0), ("宮古", 2020, 2.0)]);
        let s = labelled_series("宮古", &input, ValueColumn::Value);
        assert_eq!(s.name, "宮古");
        assert_eq!(s.points, vec![(2020, 2), (2021, 3)]);
    }
}
