//! Persisted view snapshots. Reads never fail to the caller: missing or
//! malformed entries fall back to defaults field by field.

use foundation::bounds::LngLat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::regions::RegionVisibility;
use crate::store::{KeyValueStore, StoreError};

pub const MAP_STATE_KEY: &str = "ihike-map-state-v1";
pub const REGION_VISIBILITY_KEY: &str = "ihike:region-visibility";

/// The persisted subset of the view state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMapState {
    pub center: LngLat,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
    /// Base style URL.
    pub style: String,
    pub show_routes: bool,
    pub show_ways: bool,
}

/// Whatever could be recovered from storage.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StoredMapState {
    pub center: Option<LngLat>,
    pub zoom: Option<f64>,
    pub bearing: Option<f64>,
    pub pitch: Option<f64>,
    pub style: Option<String>,
    pub show_routes: Option<bool>,
    pub show_ways: Option<bool>,
}

fn finite(v: Option<&Value>) -> Option<f64> {
    v.and_then(Value::as_f64).filter(|n| n.is_finite())
}

impl StoredMapState {
    /// Parses a stored snapshot. A field of the wrong type is dropped on its
    /// own; unparsable JSON yields an empty state.
    pub fn parse(raw: &str) -> Self {
        let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(raw) else {
            return Self::default();
        };
        let center = match obj.get("center") {
            Some(Value::Array(a)) if a.len() == 2 => match (finite(a.first()), finite(a.get(1))) {
                (Some(lng), Some(lat)) => Some(LngLat::new(lng, lat)),
                _ => None,
            },
            _ => None,
        };
        Self {
            center,
            zoom: finite(obj.get("zoom")),
            bearing: finite(obj.get("bearing")),
            pitch: finite(obj.get("pitch")),
            style: obj
                .get("style")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            show_routes: obj.get("showRoutes").and_then(Value::as_bool),
            show_ways: obj.get("showWays").and_then(Value::as_bool),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn merged_over(self, defaults: SavedMapState) -> SavedMapState {
        SavedMapState {
            center: self.center.unwrap_or(defaults.center),
            zoom: self.zoom.unwrap_or(defaults.zoom),
            bearing: self.bearing.unwrap_or(defaults.bearing),
            pitch: self.pitch.unwrap_or(defaults.pitch),
            style: self.style.unwrap_or(defaults.style),
            show_routes: self.show_routes.unwrap_or(defaults.show_routes),
            show_ways: self.show_ways.unwrap_or(defaults.show_ways),
        }
    }
}

fn read_raw<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(raw) => raw.filter(|r| !r.trim().is_empty()),
        Err(e) => {
            tracing::warn!(key, error = %e, "storage read failed");
            None
        }
    }
}

fn write_raw<S: KeyValueStore + ?Sized>(store: &mut S, key: &str, value: &Value) -> bool {
    let result = serde_json::to_string(value)
        .map_err(|e| StoreError::Io(e.to_string()))
        .and_then(|raw| store.set(key, &raw));
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "storage write failed");
            false
        }
    }
}

pub fn load_map_state<S: KeyValueStore + ?Sized>(store: &S) -> StoredMapState {
    read_raw(store, MAP_STATE_KEY)
        .map(|raw| StoredMapState::parse(&raw))
        .unwrap_or_default()
}

/// Returns whether the write went through. Failures are logged, never raised.
pub fn save_map_state<S: KeyValueStore + ?Sized>(store: &mut S, state: &SavedMapState) -> bool {
    match serde_json::to_value(state) {
        Ok(v) => write_raw(store, MAP_STATE_KEY, &v),
        Err(e) => {
            tracing::warn!(error = %e, "could not encode map state");
            false
        }
    }
}

pub fn load_region_visibility<S: KeyValueStore + ?Sized>(store: &S) -> RegionVisibility {
    let stored = read_raw(store, REGION_VISIBILITY_KEY)
        .and_then(|raw| serde_json::from_str::<Map<String, Value>>(&raw).ok());
    match stored {
        Some(map) => RegionVisibility::merged_from(&map),
        None => RegionVisibility::default(),
    }
}

pub fn save_region_visibility<S: KeyValueStore + ?Sized>(store: &mut S, visibility: &RegionVisibility) -> bool {
    write_raw(store, REGION_VISIBILITY_KEY, &visibility.to_json())
}
