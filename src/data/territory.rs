//! Prefecture-wide totals from the Okinawa lodging facility survey.
//!
//! These figures are published separately from the per-municipality tables
//! and are embedded so the territory chart works without any source file.

use super::area::TERRITORY;
use super::model::{Dataset, Metric, MetricTable, Observation};

const YEARS: [i32; 34] = [
    1978, 1980, 1982, 1984, 1986, 1988, 1990, 1992, 1994, 1996, 1998, 2000, 2002, 2003, 2004,
    2005, 2006, 2007, 2008, 2009, 2010, 2011, 2012, 2013, 2014, 2015, 2016, 2017, 2018, 2019,
    2020, 2021, 2022, 2023,
];

const FACILITIES: [i64; 34] = [
    655, 689, 693, 662, 620, 593, 634, 668, 676, 661, 682, 673, 707, 808, 822, 966, 1022, 1087,
    1170, 1232, 1299, 1357, 1411, 1441, 1541, 1664, 1823, 2082, 2488, 3084, 3342, 3480, 3681,
    3914,
];

const ROOMS: [i64; 34] = [
    14026, 14428, 15095, 15532, 16254, 17664, 18976, 19864, 22753, 23186, 23297, 23781, 25423,
    27533, 28303, 31238, 32320, 33654, 35005, 36359, 37050, 38152, 38891, 38905, 40243, 41037,
    42248, 45661, 49144, 54380, 57759, 59448, 63215, 63497,
];

const CAPACITY: [i64; 34] = [
    36350, 38278, 38904, 40403, 42196, 45696, 48707, 52199, 57990, 57639, 60345, 60078, 63797,
    69344, 71062, 77201, 80746, 82972, 86545, 90066, 92833, 96954, 99061, 100111, 104724, 107190,
    111982, 121403, 132445, 149216, 160213, 167662, 177191, 184732,
];

fn table(metric: Metric, values: &[i64]) -> MetricTable {
    let rows = YEARS
        .iter()
        .zip(values)
        .map(|(&year, &v)| Observation::new(TERRITORY, year, v as f64))
        .collect();
    MetricTable::new(metric, rows)
}

/// The three territory series as a dataset with a single entity.
pub fn totals() -> Dataset {
    Dataset {
        facilities: table(Metric::Facilities, &FACILITIES),
        rooms: table(Metric::Rooms, &ROOMS),
        capacity: table(Metric::Capacity, &CAPACITY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ValueColumn;
    use crate::data::pivot::pivot;

    #[test]
    fn series_cover_every_survey_year() {
        let data = totals();
        for table in data.tables() {
            assert_eq!(table.len(), YEARS.len());
            assert_eq!(table.entities(), vec![TERRITORY]);
            assert_eq!(table.year_span(), Some((1978, 2023)));
        }
    }

    #[test]
    fn deltas_over_survey_gaps() {
        let data = totals().with_deltas();
        let wide = pivot(&data.facilities.rows, ValueColumn::Delta).unwrap();
        assert_eq!(wide.get(TERRITORY, 1978), Some(0));
        assert_eq!(wide.get(TERRITORY, 1980), Some(34));
        assert_eq!(wide.get(TERRITORY, 2023), Some(233));
    }
}
