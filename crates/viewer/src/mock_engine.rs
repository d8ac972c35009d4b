//! Recording engine for adapter tests. Filters are evaluated locally so
//! tests can ask which features a layer would draw.

use std::collections::BTreeMap;

use foundation::bounds::{LngLat, LngLatBounds};
use layers::expression::Expr;
use layers::layer::{LayerSpec, SourceSpec, Visibility};
use layers::terrain::TerrainSpec;
use serde_json::Value;

use crate::engine::{CameraPose, EngineError, MapEngine, RenderedFeature, ScreenPoint};

#[derive(Debug, Clone, PartialEq)]
pub enum CameraMove {
    Fit { bounds: LngLatBounds, padding: f64, duration_ms: u32 },
    Fly { center: LngLat, zoom: f64, duration_ms: u32 },
    Ease { center: LngLat, zoom: f64, duration_ms: u32 },
    Jump(CameraPose),
}

#[derive(Debug, Default)]
pub struct MockEngine {
    pub style_url: String,
    pub sources: BTreeMap<String, SourceSpec>,
    /// Bottom to top.
    pub layers: Vec<LayerSpec>,
    pub terrain: Option<TerrainSpec>,
    pub camera: CameraPose,
    pub moves: Vec<CameraMove>,
    pub cursor: String,
    pub calls: Vec<String>,
    /// Returned by rendered queries, restricted to the requested layers.
    pub rendered: Vec<RenderedFeature>,
    /// Loaded tile features per source, searched by source queries.
    pub loaded: BTreeMap<String, Vec<RenderedFeature>>,
    pub symbol_layer: Option<String>,
    /// Layers owned by the base style; they survive style swaps.
    pub base_layers: Vec<String>,
    pub resized: u32,
    pub removed: bool,
}

impl MockEngine {
    pub fn new(style_url: &str) -> Self {
        Self {
            style_url: style_url.to_string(),
            ..Self::default()
        }
    }

    /// Adds a base-style label layer that runtime layers go beneath.
    pub fn with_label_layer(mut self, id: &str) -> Self {
        self.layers.push(LayerSpec::line(id, "composite"));
        self.base_layers.push(id.to_string());
        self.symbol_layer = Some(id.to_string());
        self
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    pub fn visibility(&self, id: &str) -> Option<Visibility> {
        self.layer(id).map(LayerSpec::current_visibility)
    }

    pub fn paint(&self, layer: &str, name: &str) -> Option<&Value> {
        self.layer(layer).and_then(|l| l.paint.get(name))
    }

    /// Whether `layer` would draw `feature` under its current filter.
    pub fn draws(&self, layer: &str, feature: &RenderedFeature) -> bool {
        match self.layer(layer) {
            Some(l) => l.filter.as_ref().is_none_or(|f| f.matches(&feature.context())),
            None => false,
        }
    }

    /// Mimics a style load finishing: everything added at runtime is gone.
    pub fn finish_style_swap(&mut self) {
        self.sources.clear();
        let base = &self.base_layers;
        self.layers.retain(|l| base.contains(&l.id));
        self.terrain = None;
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn live(&self) -> Result<(), EngineError> {
        if self.removed { Err(EngineError::Disposed) } else { Ok(()) }
    }

    fn layer_mut(&mut self, id: &str) -> Result<&mut LayerSpec, EngineError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| EngineError::MissingLayer(id.to_string()))
    }
}

impl MapEngine for MockEngine {
    fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), EngineError> {
        self.live()?;
        self.calls.push(format!("add_source {id}"));
        if self.sources.contains_key(id) {
            return Err(EngineError::Call(format!("source '{id}' already exists")));
        }
        self.sources.insert(id.to_string(), source.clone());
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn set_source_data(&mut self, id: &str, data: &Value) -> Result<(), EngineError> {
        self.live()?;
        self.calls.push(format!("set_source_data {id}"));
        match self.sources.get_mut(id) {
            Some(SourceSpec::GeoJson { data: d, .. }) => {
                *d = data.clone();
                Ok(())
            }
            Some(_) => Err(EngineError::Call(format!("source '{id}' is not geojson"))),
            None => Err(EngineError::MissingSource(id.to_string())),
        }
    }

    fn add_layer(&mut self, layer: &LayerSpec, before: Option<&str>) -> Result<(), EngineError> {
        self.live()?;
        self.calls.push(format!("add_layer {}", layer.id));
        if self.layer(&layer.id).is_some() {
            return Err(EngineError::Call(format!("layer '{}' already exists", layer.id)));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(EngineError::MissingSource(layer.source.clone()));
        }
        let at = before
            .and_then(|b| self.layers.iter().position(|l| l.id == b))
            .unwrap_or(self.layers.len());
        self.layers.insert(at, layer.clone());
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layer(id).is_some()
    }

    fn top_symbol_layer(&self) -> Option<String> {
        self.symbol_layer.clone()
    }

    fn set_filter(&mut self, layer: &str, filter: Option<&Expr>) -> Result<(), EngineError> {
        self.live()?;
        self.calls.push(format!("set_filter {layer}"));
        self.layer_mut(layer)?.filter = filter.cloned();
        Ok(())
    }

    fn set_paint_property(&mut self, layer: &str, name: &str, value: &Value) -> Result<(), EngineError> {
        self.live()?;
        self.calls.push(format!("set_paint_property {layer} {name}"));
        self.layer_mut(layer)?.paint.insert(name.to_string(), value.clone());
        Ok(())
    }

    fn set_layout_property(&mut self, layer: &str, name: &str, value: &Value) -> Result<(), EngineError> {
        self.live()?;
        self.calls.push(format!("set_layout_property {layer} {name}"));
        self.layer_mut(layer)?.layout.insert(name.to_string(), value.clone());
        Ok(())
    }

    fn set_terrain(&mut self, terrain: &TerrainSpec) -> Result<(), EngineError> {
        self.live()?;
        self.calls.push("set_terrain".to_string());
        if !self.sources.contains_key(&terrain.source) {
            return Err(EngineError::MissingSource(terrain.source.clone()));
        }
        self.terrain = Some(terrain.clone());
        Ok(())
    }

    fn set_style(&mut self, url: &str) -> Result<(), EngineError> {
        self.live()?;
        self.calls.push(format!("set_style {url}"));
        self.style_url = url.to_string();
        Ok(())
    }

    fn camera(&self) -> CameraPose {
        self.camera
    }

    fn jump_to(&mut self, pose: &CameraPose) -> Result<(), EngineError> {
        self.live()?;
        self.camera = *pose;
        self.moves.push(CameraMove::Jump(*pose));
        Ok(())
    }

    fn fit_bounds(&mut self, bounds: &LngLatBounds, padding: f64, duration_ms: u32) -> Result<(), EngineError> {
        self.live()?;
        self.moves.push(CameraMove::Fit {
            bounds: *bounds,
            padding,
            duration_ms,
        });
        self.camera.center = bounds.center();
        Ok(())
    }

    fn fly_to(&mut self, center: LngLat, zoom: f64, duration_ms: u32) -> Result<(), EngineError> {
        self.live()?;
        self.moves.push(CameraMove::Fly { center, zoom, duration_ms });
        self.camera.center = center;
        self.camera.zoom = zoom;
        Ok(())
    }

    fn ease_to(&mut self, center: LngLat, zoom: f64, duration_ms: u32) -> Result<(), EngineError> {
        self.live()?;
        self.moves.push(CameraMove::Ease { center, zoom, duration_ms });
        self.camera.center = center;
        self.camera.zoom = zoom;
        Ok(())
    }

    fn query_rendered_features(
        &self,
        _point: ScreenPoint,
        layers: &[&str],
    ) -> Result<Vec<RenderedFeature>, EngineError> {
        self.live()?;
        Ok(self
            .rendered
            .iter()
            .filter(|f| layers.contains(&f.layer_id.as_str()) && self.has_layer(&f.layer_id))
            .cloned()
            .collect())
    }

    fn query_source_features(
        &self,
        source: &str,
        _source_layer: Option<&str>,
        filter: &Expr,
    ) -> Result<Vec<RenderedFeature>, EngineError> {
        self.live()?;
        if !self.sources.contains_key(source) {
            return Err(EngineError::MissingSource(source.to_string()));
        }
        Ok(self
            .loaded
            .get(source)
            .map(|fs| fs.iter().filter(|f| filter.matches(&f.context())).cloned().collect())
            .unwrap_or_default())
    }

    fn set_cursor(&mut self, cursor: &str) {
        self.cursor = cursor.to_string();
    }

    fn resize(&mut self) {
        self.resized += 1;
    }

    fn remove(&mut self) {
        self.calls.push("remove".to_string());
        self.removed = true;
    }
}
