//! The rendering engine as seen by the adapter.

use foundation::bounds::{LngLat, LngLatBounds, geometries_bbox};
use foundation::ids::FeatureId;
use layers::expression::{Expr, FeatureContext};
use layers::layer::{LayerSpec, SourceSpec};
use layers::terrain::TerrainSpec;
use layers::trails::ID_PROP;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Disposed,
    MissingLayer(String),
    MissingSource(String),
    Call(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Disposed => write!(f, "map engine already disposed"),
            EngineError::MissingLayer(id) => write!(f, "layer '{id}' does not exist"),
            EngineError::MissingSource(id) => write!(f, "source '{id}' does not exist"),
            EngineError::Call(msg) => write!(f, "engine call failed: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

pub const DEFAULT_CENTER: LngLat = LngLat::new(-99.5, 37.8);
pub const DEFAULT_ZOOM: f64 = 2.08;
pub const DEFAULT_PITCH: f64 = 55.0;
pub const DEFAULT_BEARING: f64 = 0.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraPose {
    pub center: LngLat,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            bearing: DEFAULT_BEARING,
            pitch: DEFAULT_PITCH,
        }
    }
}

/// Pixel position within the map canvas.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A feature returned by a rendered or source query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedFeature {
    /// Style layer the feature was rendered in; empty for source queries.
    pub layer_id: String,
    /// The engine's own feature id.
    pub id: Option<Value>,
    pub properties: Map<String, Value>,
    pub geometry: Option<Value>,
}

impl RenderedFeature {
    /// `osm_id` when present, otherwise the engine id.
    pub fn feature_id(&self) -> Option<FeatureId> {
        self.properties
            .get(ID_PROP)
            .filter(|v| !v.is_null())
            .and_then(FeatureId::from_value)
            .or_else(|| self.id.as_ref().and_then(FeatureId::from_value))
    }

    pub fn context(&self) -> FeatureContext<'_> {
        let ctx = FeatureContext::new(&self.properties);
        match &self.id {
            Some(id) => ctx.with_id(id),
            None => ctx,
        }
    }

    pub fn bounds(&self) -> Option<LngLatBounds> {
        geometries_bbox(self.geometry.iter())
    }
}

/// Bounding box over several features' geometries.
pub fn features_bounds(features: &[RenderedFeature]) -> Option<LngLatBounds> {
    geometries_bbox(features.iter().filter_map(|f| f.geometry.as_ref()))
}

/// Calls the adapter needs from the rendering engine. Every mutating call can
/// fail (the layer or source may not exist yet); callers decide whether
/// that matters.
pub trait MapEngine {
    fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), EngineError>;
    fn has_source(&self, id: &str) -> bool;
    fn set_source_data(&mut self, id: &str, data: &Value) -> Result<(), EngineError>;

    /// Inserts `layer` beneath `before`, or on top when `before` is `None`.
    fn add_layer(&mut self, layer: &LayerSpec, before: Option<&str>) -> Result<(), EngineError>;
    fn has_layer(&self, id: &str) -> bool;
    /// Topmost symbol layer of the base style. Layers added beneath it stay
    /// under the style's labels.
    fn top_symbol_layer(&self) -> Option<String>;

    fn set_filter(&mut self, layer: &str, filter: Option<&Expr>) -> Result<(), EngineError>;
    fn set_paint_property(&mut self, layer: &str, name: &str, value: &Value) -> Result<(), EngineError>;
    fn set_layout_property(&mut self, layer: &str, name: &str, value: &Value) -> Result<(), EngineError>;
    fn set_terrain(&mut self, terrain: &TerrainSpec) -> Result<(), EngineError>;

    /// Starts an asynchronous style swap; completion arrives as a style-load
    /// event and wipes every source and layer.
    fn set_style(&mut self, url: &str) -> Result<(), EngineError>;

    fn camera(&self) -> CameraPose;
    fn jump_to(&mut self, pose: &CameraPose) -> Result<(), EngineError>;
    fn fit_bounds(&mut self, bounds: &LngLatBounds, padding: f64, duration_ms: u32) -> Result<(), EngineError>;
    fn fly_to(&mut self, center: LngLat, zoom: f64, duration_ms: u32) -> Result<(), EngineError>;
    fn ease_to(&mut self, center: LngLat, zoom: f64, duration_ms: u32) -> Result<(), EngineError>;

    fn query_rendered_features(
        &self,
        point: ScreenPoint,
        layers: &[&str],
    ) -> Result<Vec<RenderedFeature>, EngineError>;
    fn query_source_features(
        &self,
        source: &str,
        source_layer: Option<&str>,
        filter: &Expr,
    ) -> Result<Vec<RenderedFeature>, EngineError>;

    fn set_cursor(&mut self, cursor: &str);
    fn resize(&mut self);
    /// Disposes the engine. No other call is made afterwards.
    fn remove(&mut self);
}
