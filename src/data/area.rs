use std::collections::{BTreeMap, BTreeSet};

/// The six survey areas, in display order.
pub const AREAS: [&str; 6] = ["南部", "中部", "北部", "宮古", "八重山", "離島"];

/// Name used for prefecture-wide rows.
pub const TERRITORY: &str = "沖縄県";

const BREAKDOWN: [(&str, &[&str]); 6] = [
    ("南部", &["那覇市", "糸満市", "豊見城市", "八重瀬町", "南城市", "与那原町", "南風原町"]),
    (
        "中部",
        &[
            "沖縄市", "宜野湾市", "浦添市", "うるま市", "読谷村", "嘉手納町", "北谷町", "北中城村",
            "中城村", "西原町",
        ],
    ),
    (
        "北部",
        &[
            "名護市", "国頭村", "大宜味村", "東村", "今帰仁村", "本部町", "恩納村", "宜野座村",
            "金武町",
        ],
    ),
    ("宮古", &["宮古島市", "多良間村"]),
    ("八重山", &["石垣市", "竹富町", "与那国町"]),
    (
        "離島",
        &[
            "久米島町", "渡嘉敷村", "座間味村", "粟国村", "渡名喜村", "南大東村", "北大東村",
            "伊江村", "伊平屋村", "伊是名村",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Territory,
    Area,
    Municipality,
    Unknown,
}

/// Explicit area → municipality classification.
///
/// Alternative to the substring rule of `EntityFilter::Region`: membership
/// comes from the published breakdown rather than from name matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaTable {
    members: BTreeMap<String, BTreeSet<String>>,
    area_of: BTreeMap<String, String>,
}

impl AreaTable {
    pub fn new<I, A, M>(breakdown: I) -> Self
    where
        I: IntoIterator<Item = (A, Vec<M>)>,
        A: Into<String>,
        M: Into<String>,
    {
        let mut members: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut area_of = BTreeMap::new();
        for (area, municipalities) in breakdown {
            let area = area.into();
            let set = members.entry(area.clone()).or_default();
            for m in municipalities {
                let m = m.into();
                area_of.insert(m.clone(), area.clone());
                set.insert(m);
            }
        }
        Self { members, area_of }
    }

    /// The Okinawa lodging survey breakdown.
    pub fn okinawa() -> Self {
        Self::new(BREAKDOWN.iter().map(|(a, ms)| (*a, ms.to_vec())))
    }

    pub fn areas(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Municipalities of `area`; empty for an unknown area.
    pub fn members(&self, area: &str) -> BTreeSet<String> {
        self.members.get(area).cloned().unwrap_or_default()
    }

    /// Union of members over several areas.
    pub fn members_of<'a>(&self, areas: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
        areas
            .into_iter()
            .flat_map(|a| self.members(a))
            .collect()
    }

    pub fn area_of(&self, municipality: &str) -> Option<&str> {
        self.area_of.get(municipality).map(String::as_str)
    }

    pub fn classify(&self, entity: &str) -> EntityKind {
        if entity == TERRITORY {
            EntityKind::Territory
        } else if self.members.contains_key(entity) {
            EntityKind::Area
        } else if self.area_of.contains_key(entity) {
            EntityKind::Municipality
        } else {
            EntityKind::Unknown
        }
    }
}

impl Default for AreaTable {
    fn default() -> Self {
        Self::okinawa()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_area_has_members() {
        let table = AreaTable::okinawa();
        assert_eq!(table.areas().count(), AREAS.len());
        for area in AREAS {
            assert!(!table.members(area).is_empty(), "{area}");
        }
    }

    #[test]
    fn classification() {
        let table = AreaTable::okinawa();
        assert_eq!(table.classify("沖縄県"), EntityKind::Territory);
        assert_eq!(table.classify("宮古"), EntityKind::Area);
        assert_eq!(table.classify("宮古島市"), EntityKind::Municipality);
        assert_eq!(table.classify("東京都"), EntityKind::Unknown);
        assert_eq!(table.area_of("宮古島市"), Some("宮古"));
    }

    #[test]
    fn members_of_unions_areas() {
        let table = AreaTable::okinawa();
        let set = table.members_of(["宮古", "八重山"]);
        assert_eq!(set.len(), 5);
        assert!(set.contains("与那国町"));
        assert!(table.members("どこか").is_empty());
    }
}
