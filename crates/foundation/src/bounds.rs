use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Geographic position in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(v: LngLat) -> Self {
        v.to_array()
    }
}

/// Axis-aligned lon/lat box. `min` is south-west, `max` is north-east.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LngLatBounds {
    pub min: LngLat,
    pub max: LngLat,
}

impl LngLatBounds {
    pub fn new(min: LngLat, max: LngLat) -> Self {
        Self { min, max }
    }

    /// Builds bounds from `[min_x, min_y, max_x, max_y]`.
    ///
    /// Returns `None` unless all four values are finite.
    pub fn from_array(v: [f64; 4]) -> Option<Self> {
        if !v.iter().all(|c| c.is_finite()) {
            return None;
        }
        Some(Self::new(LngLat::new(v[0], v[1]), LngLat::new(v[2], v[3])))
    }

    /// Same as [`LngLatBounds::from_array`] for an unsized slice; anything but
    /// four finite values is rejected.
    pub fn from_slice(v: &[f64]) -> Option<Self> {
        let arr: [f64; 4] = v.try_into().ok()?;
        Self::from_array(arr)
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min.lng, self.min.lat, self.max.lng, self.max.lat]
    }

    pub fn center(&self) -> LngLat {
        LngLat::new(
            (self.min.lng + self.max.lng) / 2.0,
            (self.min.lat + self.max.lat) / 2.0,
        )
    }

    pub fn contains(&self, p: LngLat) -> bool {
        p.lng >= self.min.lng && p.lng <= self.max.lng && p.lat >= self.min.lat && p.lat <= self.max.lat
    }
}

/// Running min/max accumulator. Non-finite coordinates are skipped.
#[derive(Copy, Clone, Debug)]
pub struct BoundsBuilder {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Default for BoundsBuilder {
    fn default() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }
}

impl BoundsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn build(&self) -> Option<LngLatBounds> {
        LngLatBounds::from_array([self.min_x, self.min_y, self.max_x, self.max_y])
    }
}

/// Bounding box of any GeoJSON object.
///
/// Walks `FeatureCollection`, `Feature`, `GeometryCollection` and raw
/// geometries. Returns `None` when no usable coordinate is found.
pub fn geojson_bbox(geojson: &Value) -> Option<LngLatBounds> {
    let mut builder = BoundsBuilder::new();
    walk_geojson(geojson, &mut builder);
    builder.build()
}

/// Bounding box of a list of GeoJSON geometries (typically the geometries of
/// features sharing one id, spread across tiles).
pub fn geometries_bbox<'a>(geometries: impl IntoIterator<Item = &'a Value>) -> Option<LngLatBounds> {
    let mut builder = BoundsBuilder::new();
    for g in geometries {
        walk_geojson(g, &mut builder);
    }
    builder.build()
}

fn walk_geojson(node: &Value, out: &mut BoundsBuilder) {
    let Some(obj) = node.as_object() else {
        return;
    };
    match obj.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            if let Some(features) = obj.get("features").and_then(Value::as_array) {
                for f in features {
                    walk_geojson(f, out);
                }
            }
        }
        Some("Feature") => {
            if let Some(g) = obj.get("geometry") {
                walk_geojson(g, out);
            }
        }
        Some("GeometryCollection") => {
            if let Some(geoms) = obj.get("geometries").and_then(Value::as_array) {
                for g in geoms {
                    walk_geojson(g, out);
                }
            }
        }
        _ => {
            if let Some(coords) = obj.get("coordinates") {
                visit_coordinates(coords, out);
            }
        }
    }
}

fn visit_coordinates(node: &Value, out: &mut BoundsBuilder) {
    let Some(arr) = node.as_array() else {
        return;
    };
    if let (Some(x), Some(y)) = (
        arr.first().and_then(Value::as_f64),
        arr.get(1).and_then(Value::as_f64),
    ) {
        out.extend(x, y);
        return;
    }
    for child in arr {
        visit_coordinates(child, out);
    }
}
