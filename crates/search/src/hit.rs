use foundation::bounds::{LngLat, LngLatBounds};
use foundation::ids::FeatureId;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One record of the trail index. Unknown fields (`objectID`, highlight
/// metadata) are ignored.
///
/// Only a missing or unusable `osm_id` rejects a record; any other field of
/// the wrong shape decodes as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailHit {
    #[serde(deserialize_with = "lenient_id")]
    pub osm_id: FeatureId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub region: Option<String>,
    #[serde(default, rename = "lengthKm", deserialize_with = "lenient_number")]
    pub length_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub difficulty: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub website: Option<String>,
    /// `[lng, lat]` or `{lng|lon, lat}`; see [`resolve_coordinate`].
    #[serde(default)]
    pub center: Option<Value>,
    #[serde(default)]
    pub midpoint: Option<Value>,
    /// `[minX, minY, maxX, maxY]`.
    #[serde(default, deserialize_with = "lenient_numbers")]
    pub bbox: Option<Vec<f64>>,
}

/// Same rules as [`FeatureId::from_value`], so integral floats are accepted.
fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<FeatureId, D::Error> {
    let v = Value::deserialize(d)?;
    FeatureId::from_value(&v).ok_or_else(|| D::Error::custom(format!("unusable osm_id {v}")))
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(coordinate_number(&Value::deserialize(d)?))
}

fn lenient_numbers<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<f64>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items.iter().map(coordinate_number).collect(),
        _ => None,
    })
}

impl TrailHit {
    pub fn new(osm_id: impl Into<FeatureId>) -> Self {
        Self {
            osm_id: osm_id.into(),
            name: None,
            kind: None,
            region: None,
            length_km: None,
            difficulty: None,
            website: None,
            center: None,
            midpoint: None,
            bbox: None,
        }
    }

    /// Lenient decode of a raw index record.
    pub fn from_value(v: Value) -> Option<Self> {
        match serde_json::from_value(v) {
            Ok(hit) => Some(hit),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed search hit");
                None
            }
        }
    }

    /// Finite bounding box, if the record has one.
    pub fn bounds(&self) -> Option<LngLatBounds> {
        self.bbox.as_deref().and_then(LngLatBounds::from_slice)
    }

    /// Center when it resolves, otherwise the midpoint.
    pub fn anchor(&self) -> Option<LngLat> {
        self.center
            .as_ref()
            .and_then(resolve_coordinate)
            .or_else(|| self.midpoint.as_ref().and_then(resolve_coordinate))
    }

    pub fn trail_kind(&self) -> TrailKind {
        normalize_trail_kind(self.kind.as_deref())
    }

    pub fn type_tag(&self) -> TrailTypeTag {
        trail_type_tag(self.kind.as_deref())
    }

    /// Name for list rows.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n,
            _ => "(Unnamed)",
        }
    }
}

fn coordinate_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Reads `[lng, lat]` or `{lng|lon, lat}`; components may be numeric strings.
pub fn resolve_coordinate(v: &Value) -> Option<LngLat> {
    let (lng, lat) = match v {
        Value::Array(a) if a.len() >= 2 => (coordinate_number(&a[0])?, coordinate_number(&a[1])?),
        Value::Object(o) => {
            let lng = o.get("lng").or_else(|| o.get("lon"))?;
            (coordinate_number(lng)?, coordinate_number(o.get("lat")?)?)
        }
        _ => return None,
    };
    Some(LngLat::new(lng, lat))
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrailKind {
    Route,
    #[default]
    Way,
}

impl TrailKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TrailKind::Route => "Route",
            TrailKind::Way => "Way",
        }
    }
}

/// `route` is a route; everything else, blank included, is a way.
pub fn normalize_trail_kind(raw: Option<&str>) -> TrailKind {
    match raw.map(str::trim) {
        Some(t) if t.eq_ignore_ascii_case("route") => TrailKind::Route,
        _ => TrailKind::Way,
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TagVariant {
    Route,
    Way,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailTypeTag {
    pub label: String,
    pub variant: TagVariant,
}

pub fn trail_type_tag(raw: Option<&str>) -> TrailTypeTag {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    let (label, variant) = if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("way") {
        ("WAY".to_string(), TagVariant::Way)
    } else if trimmed.eq_ignore_ascii_case("route") {
        ("ROUTE".to_string(), TagVariant::Route)
    } else {
        (trimmed.to_uppercase(), TagVariant::Other)
    };
    TrailTypeTag { label, variant }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_index_record() {
        let hit = TrailHit::from_value(json!({
            "objectID": "abc",
            "osm_id": 123,
            "name": "Skyline",
            "type": "route",
            "lengthKm": 12.5,
            "website": null,
            "center": {"lon": "-120.5", "lat": 38},
            "bbox": [-121.0, 37.0, -120.0, 39.0],
            "_highlightResult": {}
        }))
        .unwrap();
        assert_eq!(hit.osm_id, FeatureId::Number(123));
        assert_eq!(hit.trail_kind(), TrailKind::Route);
        assert_eq!(hit.anchor(), Some(LngLat::new(-120.5, 38.0)));
        assert_eq!(hit.bounds().map(|b| b.to_array()), Some([-121.0, 37.0, -120.0, 39.0]));
        assert_eq!(hit.website, None);
    }

    #[test]
    fn string_ids_and_missing_id() {
        let hit = TrailHit::from_value(json!({"osm_id": "w42"})).unwrap();
        assert_eq!(hit.osm_id, FeatureId::Text("w42".to_string()));
        assert_eq!(TrailHit::from_value(json!({"name": "no id"})), None);
    }

    #[test]
    fn loosely_typed_fields_keep_the_record() {
        let hit = TrailHit::from_value(json!({
            "osm_id": 123.0,
            "name": 7,
            "region": ["CA"],
            "lengthKm": "12.5",
            "difficulty": {"level": 2},
            "bbox": "nope"
        }))
        .unwrap();
        assert_eq!(hit.osm_id, FeatureId::Number(123));
        assert_eq!(hit.name.as_deref(), Some("7"));
        assert_eq!(hit.region, None);
        assert_eq!(hit.length_km, Some(12.5));
        assert_eq!(hit.difficulty, None);
        assert_eq!(hit.bbox, None);

        let hit = TrailHit::from_value(json!({"osm_id": 5, "lengthKm": "far", "bbox": [0, "1", 2, 3]})).unwrap();
        assert_eq!(hit.length_km, None);
        assert_eq!(hit.bbox, Some(vec![0.0, 1.0, 2.0, 3.0]));
        assert_eq!(TrailHit::from_value(json!({"osm_id": 1.5})), None);
        assert_eq!(TrailHit::from_value(json!({"osm_id": null})), None);
    }

    #[test]
    fn coordinates_fall_back_to_midpoint() {
        let mut hit = TrailHit::new(1);
        hit.center = Some(json!({"lat": 3}));
        hit.midpoint = Some(json!([5, "6"]));
        assert_eq!(hit.anchor(), Some(LngLat::new(5.0, 6.0)));
        assert_eq!(resolve_coordinate(&json!("x")), None);
        assert_eq!(resolve_coordinate(&json!([1.0, "nan"])), None);
    }

    #[test]
    fn non_finite_bbox_is_ignored() {
        let mut hit = TrailHit::new(1);
        hit.bbox = Some(vec![0.0, 0.0, 1.0]);
        assert_eq!(hit.bounds(), None);
    }

    #[test]
    fn type_tags() {
        assert_eq!(trail_type_tag(Some(" Route ")).label, "ROUTE");
        assert_eq!(trail_type_tag(None).variant, TagVariant::Way);
        assert_eq!(trail_type_tag(Some("  ")).label, "WAY");
        let other = trail_type_tag(Some("path"));
        assert_eq!((other.label.as_str(), other.variant), ("PATH", TagVariant::Other));
        assert_eq!(normalize_trail_kind(Some("path")), TrailKind::Way);
        assert_eq!(normalize_trail_kind(Some("ROUTE")), TrailKind::Route);
    }
}
