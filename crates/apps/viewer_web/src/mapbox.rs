//! mapbox-gl bridge. Specs, filters and query results cross the boundary as
//! JSON text; the page must load `mapboxgl` before `init` is called.

use foundation::bounds::{LngLat, LngLatBounds};
use layers::expression::Expr;
use layers::layer::{LayerSpec, SourceSpec};
use layers::terrain::TerrainSpec;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use viewer::engine::{CameraPose, EngineError, MapEngine, RenderedFeature, ScreenPoint};
use viewer::events::EngineEvent;
use viewer::view_state::ViewState;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = "
function trailmap_feature(f) {
    return {
        layer: (f.layer && f.layer.id) || '',
        id: f.id ?? null,
        properties: f.properties || {},
        geometry: f.geometry || null,
    };
}

export function trailmap_create(container, token, options, interactive, onEvent) {
    if (typeof mapboxgl === 'undefined') {
        throw new Error('mapbox-gl is not loaded');
    }
    mapboxgl.accessToken = token;
    const map = new mapboxgl.Map(Object.assign({ container }, JSON.parse(options)));
    for (const name of ['load', 'style.load', 'idle', 'zoom', 'moveend', 'zoomend', 'rotateend', 'pitchend']) {
        map.on(name, () => onEvent(name, NaN, NaN, null));
    }
    map.on('sourcedata', (e) => onEvent('sourcedata', NaN, NaN, e.sourceId ?? null));
    map.on('error', (e) => onEvent('error', NaN, NaN, String((e && e.error && e.error.message) || 'map error')));
    map.on('mousemove', (e) => onEvent('mousemove', e.point.x, e.point.y, null));
    map.on('click', (e) => onEvent('click', e.point.x, e.point.y, null));
    for (const layer of JSON.parse(interactive)) {
        map.on('mouseleave', layer, () => onEvent('mouseleave', NaN, NaN, layer));
    }
    const onKey = (e) => onEvent('keydown', NaN, NaN, e.key);
    window.addEventListener('keydown', onKey);
    const observer = new ResizeObserver(() => map.resize());
    observer.observe(map.getContainer());
    map.__trailmapRelease = () => {
        observer.disconnect();
        window.removeEventListener('keydown', onKey);
    };
    return map;
}

export function trailmap_add_source(map, id, spec) {
    map.addSource(id, JSON.parse(spec));
}

export function trailmap_has_source(map, id) {
    return !!map.getSource(id);
}

export function trailmap_set_source_data(map, id, data) {
    const src = map.getSource(id);
    if (!src || typeof src.setData !== 'function') {
        throw new Error('no geojson source ' + id);
    }
    src.setData(JSON.parse(data));
}

export function trailmap_add_layer(map, spec, before) {
    map.addLayer(JSON.parse(spec), before ?? undefined);
}

export function trailmap_has_layer(map, id) {
    return !!map.getLayer(id);
}

export function trailmap_top_symbol_layer(map) {
    const style = map.getStyle();
    const layers = (style && style.layers) || [];
    for (let i = layers.length - 1; i >= 0; i--) {
        if (layers[i].type === 'symbol') return layers[i].id;
    }
    return undefined;
}

export function trailmap_set_filter(map, layer, filter) {
    map.setFilter(layer, filter == null ? null : JSON.parse(filter));
}

export function trailmap_set_paint(map, layer, name, value) {
    map.setPaintProperty(layer, name, JSON.parse(value));
}

export function trailmap_set_layout(map, layer, name, value) {
    map.setLayoutProperty(layer, name, JSON.parse(value));
}

export function trailmap_set_terrain(map, spec) {
    map.setTerrain(JSON.parse(spec));
}

export function trailmap_set_style(map, url) {
    map.setStyle(url);
}

export function trailmap_camera(map) {
    const c = map.getCenter();
    return JSON.stringify({
        center: [c.lng, c.lat],
        zoom: map.getZoom(),
        bearing: map.getBearing(),
        pitch: map.getPitch(),
    });
}

export function trailmap_jump_to(map, camera) {
    map.jumpTo(JSON.parse(camera));
}

export function trailmap_fit_bounds(map, west, south, east, north, padding, duration) {
    map.fitBounds([[west, south], [east, north]], { padding, duration });
}

export function trailmap_fly_to(map, lng, lat, zoom, duration) {
    map.flyTo({ center: [lng, lat], zoom, duration });
}

export function trailmap_ease_to(map, lng, lat, zoom, duration) {
    map.easeTo({ center: [lng, lat], zoom, duration });
}

export function trailmap_query_rendered(map, x, y, layers) {
    const wanted = JSON.parse(layers).filter((id) => map.getLayer(id));
    if (wanted.length === 0) return '[]';
    return JSON.stringify(map.queryRenderedFeatures([x, y], { layers: wanted }).map(trailmap_feature));
}

export function trailmap_query_source(map, source, sourceLayer, filter) {
    const opts = { filter: JSON.parse(filter) };
    if (sourceLayer != null) opts.sourceLayer = sourceLayer;
    return JSON.stringify(map.querySourceFeatures(source, opts).map(trailmap_feature));
}

export function trailmap_set_cursor(map, cursor) {
    map.getCanvas().style.cursor = cursor;
}

export function trailmap_resize(map) {
    map.resize();
}

export function trailmap_remove(map) {
    if (map.__trailmapRelease) map.__trailmapRelease();
    map.remove();
}
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn trailmap_create(
        container: &str,
        token: &str,
        options: &str,
        interactive: &str,
        on_event: &js_sys::Function,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    fn trailmap_add_source(map: &JsValue, id: &str, spec: &str) -> Result<(), JsValue>;

    fn trailmap_has_source(map: &JsValue, id: &str) -> bool;

    #[wasm_bindgen(catch)]
    fn trailmap_set_source_data(map: &JsValue, id: &str, data: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn trailmap_add_layer(map: &JsValue, spec: &str, before: Option<String>) -> Result<(), JsValue>;

    fn trailmap_has_layer(map: &JsValue, id: &str) -> bool;

    fn trailmap_top_symbol_layer(map: &JsValue) -> Option<String>;

    #[wasm_bindgen(catch)]
    fn trailmap_set_filter(map: &JsValue, layer: &str, filter: Option<String>) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn trailmap_set_paint(map: &JsValue, layer: &str, name: &str, value: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn trailmap_set_layout(map: &JsValue, layer: &str, name: &str, value: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn trailmap_set_terrain(map: &JsValue, spec: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn trailmap_set_style(map: &JsValue, url: &str) -> Result<(), JsValue>;

    fn trailmap_camera(map: &JsValue) -> String;

    #[wasm_bindgen(catch)]
    fn trailmap_jump_to(map: &JsValue, camera: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn trailmap_fit_bounds(
        map: &JsValue,
        west: f64,
        south: f64,
        east: f64,
        north: f64,
        padding: f64,
        duration: u32,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn trailmap_fly_to(map: &JsValue, lng: f64, lat: f64, zoom: f64, duration: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn trailmap_ease_to(map: &JsValue, lng: f64, lat: f64, zoom: f64, duration: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn trailmap_query_rendered(map: &JsValue, x: f64, y: f64, layers: &str) -> Result<String, JsValue>;

    #[wasm_bindgen(catch)]
    fn trailmap_query_source(
        map: &JsValue,
        source: &str,
        source_layer: Option<String>,
        filter: &str,
    ) -> Result<String, JsValue>;

    fn trailmap_set_cursor(map: &JsValue, cursor: &str);

    fn trailmap_resize(map: &JsValue);

    fn trailmap_remove(map: &JsValue);
}

/// Something the page reported: an engine event or a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Engine(EngineEvent),
    Key(String),
}

/// Decodes one bridge callback. Pointer events carry a finite `x`/`y`; the
/// others carry at most a string payload.
pub fn decode_event(name: &str, x: f64, y: f64, text: Option<String>) -> Option<Inbound> {
    let point = (x.is_finite() && y.is_finite()).then(|| ScreenPoint::new(x, y));
    let event = match name {
        "load" => EngineEvent::Load,
        "style.load" => EngineEvent::StyleLoad,
        "idle" => EngineEvent::Idle,
        "sourcedata" => EngineEvent::SourceData { source_id: text },
        "zoom" => EngineEvent::Zoom,
        "moveend" => EngineEvent::MoveEnd,
        "zoomend" => EngineEvent::ZoomEnd,
        "rotateend" => EngineEvent::RotateEnd,
        "pitchend" => EngineEvent::PitchEnd,
        "mousemove" => EngineEvent::MouseMove(point?),
        "click" => EngineEvent::Click(point?),
        "mouseleave" => EngineEvent::MouseLeave { layer: text? },
        "error" => EngineEvent::Error(text.unwrap_or_default()),
        "keydown" => return text.map(Inbound::Key),
        _ => return None,
    };
    Some(Inbound::Engine(event))
}

#[derive(Deserialize)]
struct WireFeature {
    #[serde(default)]
    layer: String,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    geometry: Option<Value>,
}

pub fn parse_features(text: &str) -> Result<Vec<RenderedFeature>, EngineError> {
    let wire: Vec<WireFeature> =
        serde_json::from_str(text).map_err(|e| EngineError::Call(format!("bad feature list: {e}")))?;
    Ok(wire
        .into_iter()
        .map(|f| RenderedFeature {
            layer_id: f.layer,
            id: f.id.filter(|v| !v.is_null()),
            properties: f.properties,
            geometry: f.geometry.filter(|v| !v.is_null()),
        })
        .collect())
}

#[derive(Deserialize)]
struct WireCamera {
    center: LngLat,
    zoom: f64,
    bearing: f64,
    pitch: f64,
}

pub fn parse_camera(text: &str) -> Option<CameraPose> {
    let c: WireCamera = serde_json::from_str(text).ok()?;
    Some(CameraPose {
        center: c.center,
        zoom: c.zoom,
        bearing: c.bearing,
        pitch: c.pitch,
    })
}

pub fn camera_json(pose: &CameraPose) -> Value {
    json!({
        "center": [pose.center.lng, pose.center.lat],
        "zoom": pose.zoom,
        "bearing": pose.bearing,
        "pitch": pose.pitch,
    })
}

/// Constructor options for a map showing `state`.
pub fn map_options(state: &ViewState) -> Value {
    let mut opts = camera_json(&state.camera);
    if let Some(obj) = opts.as_object_mut() {
        obj.insert("style".to_string(), json!(state.base_style.url()));
        obj.insert("antialias".to_string(), json!(true));
    }
    opts
}

fn js_error(e: JsValue) -> EngineError {
    EngineError::Call(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

pub struct MapboxEngine {
    map: JsValue,
    removed: bool,
}

impl MapboxEngine {
    pub fn create(
        container: &str,
        token: &str,
        state: &ViewState,
        on_event: &js_sys::Function,
    ) -> Result<Self, JsValue> {
        let interactive = json!(layers::trails::INTERACTIVE_LAYERS).to_string();
        let map = trailmap_create(container, token, &map_options(state).to_string(), &interactive, on_event)?;
        Ok(Self { map, removed: false })
    }

    fn live(&self) -> Result<&JsValue, EngineError> {
        if self.removed { Err(EngineError::Disposed) } else { Ok(&self.map) }
    }
}

impl MapEngine for MapboxEngine {
    fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), EngineError> {
        trailmap_add_source(self.live()?, id, &source.to_json().to_string()).map_err(js_error)
    }

    fn has_source(&self, id: &str) -> bool {
        self.live().is_ok_and(|m| trailmap_has_source(m, id))
    }

    fn set_source_data(&mut self, id: &str, data: &Value) -> Result<(), EngineError> {
        trailmap_set_source_data(self.live()?, id, &data.to_string()).map_err(js_error)
    }

    fn add_layer(&mut self, layer: &LayerSpec, before: Option<&str>) -> Result<(), EngineError> {
        trailmap_add_layer(self.live()?, &layer.to_json().to_string(), before.map(str::to_string)).map_err(js_error)
    }

    fn has_layer(&self, id: &str) -> bool {
        self.live().is_ok_and(|m| trailmap_has_layer(m, id))
    }

    fn top_symbol_layer(&self) -> Option<String> {
        self.live().ok().and_then(trailmap_top_symbol_layer)
    }

    fn set_filter(&mut self, layer: &str, filter: Option<&Expr>) -> Result<(), EngineError> {
        let filter = filter.map(|f| f.to_json().to_string());
        trailmap_set_filter(self.live()?, layer, filter).map_err(js_error)
    }

    fn set_paint_property(&mut self, layer: &str, name: &str, value: &Value) -> Result<(), EngineError> {
        trailmap_set_paint(self.live()?, layer, name, &value.to_string()).map_err(js_error)
    }

    fn set_layout_property(&mut self, layer: &str, name: &str, value: &Value) -> Result<(), EngineError> {
        trailmap_set_layout(self.live()?, layer, name, &value.to_string()).map_err(js_error)
    }

    fn set_terrain(&mut self, terrain: &TerrainSpec) -> Result<(), EngineError> {
        trailmap_set_terrain(self.live()?, &terrain.to_json().to_string()).map_err(js_error)
    }

    fn set_style(&mut self, url: &str) -> Result<(), EngineError> {
        trailmap_set_style(self.live()?, url).map_err(js_error)
    }

    fn camera(&self) -> CameraPose {
        self.live()
            .ok()
            .and_then(|m| parse_camera(&trailmap_camera(m)))
            .unwrap_or_default()
    }

    fn jump_to(&mut self, pose: &CameraPose) -> Result<(), EngineError> {
        trailmap_jump_to(self.live()?, &camera_json(pose).to_string()).map_err(js_error)
    }

    fn fit_bounds(&mut self, bounds: &LngLatBounds, padding: f64, duration_ms: u32) -> Result<(), EngineError> {
        let [west, south, east, north] = bounds.to_array();
        trailmap_fit_bounds(self.live()?, west, south, east, north, padding, duration_ms).map_err(js_error)
    }

    fn fly_to(&mut self, center: LngLat, zoom: f64, duration_ms: u32) -> Result<(), EngineError> {
        trailmap_fly_to(self.live()?, center.lng, center.lat, zoom, duration_ms).map_err(js_error)
    }

    fn ease_to(&mut self, center: LngLat, zoom: f64, duration_ms: u32) -> Result<(), EngineError> {
        trailmap_ease_to(self.live()?, center.lng, center.lat, zoom, duration_ms).map_err(js_error)
    }

    fn query_rendered_features(
        &self,
        point: ScreenPoint,
        layers: &[&str],
    ) -> Result<Vec<RenderedFeature>, EngineError> {
        let text = trailmap_query_rendered(self.live()?, point.x, point.y, &json!(layers).to_string())
            .map_err(js_error)?;
        parse_features(&text)
    }

    fn query_source_features(
        &self,
        source: &str,
        source_layer: Option<&str>,
        filter: &Expr,
    ) -> Result<Vec<RenderedFeature>, EngineError> {
        let text = trailmap_query_source(
            self.live()?,
            source,
            source_layer.map(str::to_string),
            &filter.to_json().to_string(),
        )
        .map_err(js_error)?;
        parse_features(&text)
    }

    fn set_cursor(&mut self, cursor: &str) {
        if let Ok(m) = self.live() {
            trailmap_set_cursor(m, cursor);
        }
    }

    fn resize(&mut self) {
        if let Ok(m) = self.live() {
            trailmap_resize(m);
        }
    }

    fn remove(&mut self) {
        if !self.removed {
            trailmap_remove(&self.map);
            self.removed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layers::symbology::BaseStyle;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_bridge_events() {
        let nan = f64::NAN;
        assert_eq!(decode_event("load", nan, nan, None), Some(Inbound::Engine(EngineEvent::Load)));
        assert_eq!(
            decode_event("click", 3.0, 4.0, None),
            Some(Inbound::Engine(EngineEvent::Click(ScreenPoint::new(3.0, 4.0))))
        );
        assert_eq!(decode_event("click", nan, nan, None), None);
        assert_eq!(
            decode_event("sourcedata", nan, nan, Some("ways".to_string())),
            Some(Inbound::Engine(EngineEvent::SourceData { source_id: Some("ways".to_string()) }))
        );
        assert_eq!(decode_event("mouseleave", nan, nan, None), None);
        assert_eq!(decode_event("keydown", nan, nan, Some("Escape".to_string())), Some(Inbound::Key("Escape".to_string())));
        assert_eq!(decode_event("render", nan, nan, None), None);
    }

    #[test]
    fn parses_query_results() {
        let fs = parse_features(
            r#"[{"layer":"Ways","id":null,"properties":{"osm_id":12,"name":"Loop"},"geometry":null},{"layer":"Route"}]"#,
        )
        .unwrap();
        assert_eq!(fs.len(), 2);
        assert_eq!(fs[0].layer_id, "Ways");
        assert_eq!(fs[0].id, None);
        assert_eq!(fs[0].properties.get("name"), Some(&json!("Loop")));
        assert!(fs[1].properties.is_empty());
        assert!(parse_features("{").is_err());
    }

    #[test]
    fn camera_round_trips_through_json() {
        let pose = CameraPose {
            center: LngLat::new(-105.5, 39.25),
            zoom: 9.0,
            bearing: 12.0,
            pitch: 45.0,
        };
        assert_eq!(parse_camera(&camera_json(&pose).to_string()), Some(pose));
        assert_eq!(parse_camera("null"), None);
    }

    #[test]
    fn options_carry_style_and_camera() {
        let mut state = ViewState::default();
        state.base_style = BaseStyle::Outdoors;
        let opts = map_options(&state);
        assert_eq!(opts["style"], json!(BaseStyle::Outdoors.url()));
        assert_eq!(opts["pitch"], json!(55.0));
    }
}
