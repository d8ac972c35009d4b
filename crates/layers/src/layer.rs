use serde_json::{Map, Value, json};

use crate::expression::Expr;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    None,
}

impl Visibility {
    pub fn from_bool(visible: bool) -> Self {
        if visible { Visibility::Visible } else { Visibility::None }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }

    pub fn to_value(self) -> Value {
        Value::from(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerKind {
    Line,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Line => "line",
        }
    }
}

/// A paint-styled rendering of one source, ready to hand to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub kind: LayerKind,
    pub source: String,
    pub source_layer: Option<String>,
    pub layout: Map<String, Value>,
    pub paint: Map<String, Value>,
    pub filter: Option<Expr>,
}

impl LayerSpec {
    /// Line layer with round joins and caps.
    pub fn line(id: impl Into<String>, source: impl Into<String>) -> Self {
        let mut layout = Map::new();
        layout.insert("line-join".to_string(), json!("round"));
        layout.insert("line-cap".to_string(), json!("round"));
        Self {
            id: id.into(),
            kind: LayerKind::Line,
            source: source.into(),
            source_layer: None,
            layout,
            paint: Map::new(),
            filter: None,
        }
    }

    pub fn source_layer(mut self, source_layer: Option<&str>) -> Self {
        self.source_layer = source_layer.map(str::to_string);
        self
    }

    pub fn visibility(mut self, v: Visibility) -> Self {
        self.layout.insert("visibility".to_string(), v.to_value());
        self
    }

    pub fn paint(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.paint.insert(name.to_string(), value.into());
        self
    }

    pub fn filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn current_visibility(&self) -> Visibility {
        match self.layout.get("visibility").and_then(Value::as_str) {
            Some("none") => Visibility::None,
            _ => Visibility::Visible,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("id".to_string(), json!(self.id));
        out.insert("type".to_string(), json!(self.kind.as_str()));
        out.insert("source".to_string(), json!(self.source));
        if let Some(sl) = &self.source_layer {
            out.insert("source-layer".to_string(), json!(sl));
        }
        out.insert("layout".to_string(), Value::Object(self.layout.clone()));
        out.insert("paint".to_string(), Value::Object(self.paint.clone()));
        if let Some(f) = &self.filter {
            out.insert("filter".to_string(), f.to_json());
        }
        Value::Object(out)
    }
}

/// A named dataset registered with the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    Vector { url: String },
    GeoJson { data: Value, generate_id: bool },
    RasterDem { url: String, tile_size: u32, max_zoom: u8 },
}

impl SourceSpec {
    pub fn to_json(&self) -> Value {
        match self {
            SourceSpec::Vector { url } => json!({"type": "vector", "url": url}),
            SourceSpec::GeoJson { data, generate_id } => {
                json!({"type": "geojson", "data": data, "generateId": generate_id})
            }
            SourceSpec::RasterDem {
                url,
                tile_size,
                max_zoom,
            } => json!({"type": "raster-dem", "url": url, "tileSize": tile_size, "maxzoom": max_zoom}),
        }
    }
}
