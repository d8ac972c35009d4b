use serde_json::{Value, json};

use crate::layer::SourceSpec;

pub const DEM_SOURCE_ID: &str = "mapbox-dem";
pub const DEM_URL: &str = "mapbox://mapbox.mapbox-terrain-dem-v1";
pub const DEFAULT_EXAGGERATION: f64 = 1.0;

pub fn dem_source() -> SourceSpec {
    SourceSpec::RasterDem {
        url: DEM_URL.to_string(),
        tile_size: 512,
        max_zoom: 14,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSpec {
    pub source: String,
    pub exaggeration: f64,
}

impl TerrainSpec {
    /// Terrain over the DEM source. Negative or non-finite exaggeration is
    /// clamped to zero (flat).
    pub fn dem(exaggeration: f64) -> Self {
        let exaggeration = if exaggeration.is_finite() { exaggeration.max(0.0) } else { 0.0 };
        Self {
            source: DEM_SOURCE_ID.to_string(),
            exaggeration,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({"source": self.source, "exaggeration": self.exaggeration})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exaggeration_is_clamped() {
        assert_eq!(TerrainSpec::dem(-2.0).exaggeration, 0.0);
        assert_eq!(TerrainSpec::dem(f64::NAN).exaggeration, 0.0);
        assert_eq!(TerrainSpec::dem(2.5).to_json(), json!({"source": "mapbox-dem", "exaggeration": 2.5}));
    }
}
