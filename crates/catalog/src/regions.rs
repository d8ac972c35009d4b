//! The six regional overlays and their visibility.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionId {
    Northeast,
    Midwest,
    South,
    West,
    Alaska,
    Hawaii,
}

impl RegionId {
    pub const ALL: [RegionId; 6] = [
        RegionId::Northeast,
        RegionId::Midwest,
        RegionId::South,
        RegionId::West,
        RegionId::Alaska,
        RegionId::Hawaii,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RegionId::Northeast => "northeast",
            RegionId::Midwest => "midwest",
            RegionId::South => "south",
            RegionId::West => "west",
            RegionId::Alaska => "alaska",
            RegionId::Hawaii => "hawaii",
        }
    }

    pub fn meta(self) -> &'static RegionMeta {
        &REGIONS[self as usize]
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegionId::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown region '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMeta {
    pub id: RegionId,
    pub name: &'static str,
    /// File name under the `/regions/` asset path.
    pub file: &'static str,
    pub color: &'static str,
}

impl RegionMeta {
    pub fn url(&self) -> String {
        region_url("", self.file)
    }
}

/// Indexed by `RegionId as usize`.
pub static REGIONS: [RegionMeta; 6] = [
    RegionMeta { id: RegionId::Northeast, name: "Northeast", file: "US_Northeast.geojson", color: "#6750A4" },
    RegionMeta { id: RegionId::Midwest, name: "Midwest", file: "US_Midwest.geojson", color: "#10B981" },
    RegionMeta { id: RegionId::South, name: "South", file: "US_South.geojson", color: "#6366F1" },
    RegionMeta { id: RegionId::West, name: "West", file: "US_West_cropped.json", color: "#F59E0B" },
    RegionMeta { id: RegionId::Alaska, name: "Alaska", file: "Alaska_Region.geojson", color: "#F43F5E" },
    RegionMeta { id: RegionId::Hawaii, name: "Hawaii", file: "Hawaii_Region.geojson", color: "#06B6D4" },
];

/// `<base>/regions/<file>`, with any trailing slash on `base` dropped.
pub fn region_url(base: &str, file: &str) -> String {
    format!("{}/regions/{file}", base.trim_end_matches('/'))
}

/// Per-region visibility; every region is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionVisibility(BTreeMap<RegionId, bool>);

impl Default for RegionVisibility {
    fn default() -> Self {
        Self(RegionId::ALL.into_iter().map(|r| (r, true)).collect())
    }
}

impl RegionVisibility {
    pub fn is_visible(&self, region: RegionId) -> bool {
        self.0.get(&region).copied().unwrap_or(true)
    }

    pub fn set(&mut self, region: RegionId, visible: bool) {
        self.0.insert(region, visible);
    }

    pub fn toggle(&mut self, region: RegionId) -> bool {
        let next = !self.is_visible(region);
        self.set(region, next);
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, bool)> + '_ {
        self.0.iter().map(|(r, v)| (*r, *v))
    }

    /// Merges stored `{ "<id>": bool }` entries over the all-visible
    /// defaults. Unknown ids and non-boolean values are ignored.
    pub fn merged_from(stored: &Map<String, Value>) -> Self {
        let mut out = Self::default();
        for (key, value) in stored {
            if let (Ok(region), Some(v)) = (key.parse::<RegionId>(), value.as_bool()) {
                out.set(region, v);
            }
        }
        out
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(r, v)| (r.as_str().to_string(), Value::Bool(*v)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_table_is_indexed_by_id() {
        for r in RegionId::ALL {
            assert_eq!(r.meta().id, r);
            assert_eq!(r.as_str().parse::<RegionId>(), Ok(r));
        }
        assert_eq!(RegionId::West.meta().url(), "/regions/US_West_cropped.json");
        assert_eq!(region_url("https://x.test/", "a.json"), "https://x.test/regions/a.json");
    }

    #[test]
    fn stored_values_merge_over_defaults() {
        let stored = json!({"west": false, "mars": false, "south": "no"});
        let v = RegionVisibility::merged_from(stored.as_object().unwrap());
        assert!(!v.is_visible(RegionId::West));
        assert!(v.is_visible(RegionId::South));
        assert_eq!(v.iter().count(), 6);
    }

    #[test]
    fn toggle_twice_restores() {
        let mut v = RegionVisibility::default();
        assert!(!v.toggle(RegionId::Alaska));
        assert!(v.toggle(RegionId::Alaska));
        assert_eq!(v, RegionVisibility::default());
    }
}
