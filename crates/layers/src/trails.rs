//! Sources and layers for the routes and ways overlays.

use foundation::ids::FeatureId;
use serde_json::json;

use crate::expression::Expr;
use crate::layer::{LayerSpec, SourceSpec, Visibility};
use crate::legend::{LegendSelection, ways_layer_filter};
use crate::symbology::{
    BaseStyle, route_halo_width_expression, route_line_color_expression, route_width_expression,
    ways_color_expression, ways_width_expression,
};

pub const ROUTES_SOURCE_ID: &str = "routes";
pub const WAYS_SOURCE_ID: &str = "ways";
pub const ROUTES_TILESET: &str = "mapbox://ultimateboss.us_routes_v1";
pub const WAYS_TILESET: &str = "mapbox://ultimateboss.us_ways_v1";
pub const ROUTES_SOURCE_LAYER: &str = "us_routes";
pub const WAYS_SOURCE_LAYER: &str = "us_ways";

/// Property carrying the stable feature id in both tilesets.
pub const ID_PROP: &str = "osm_id";

pub const ROUTE_HALO_LAYER: &str = "Route-halo";
pub const ROUTE_LAYER: &str = "Route";
pub const WAYS_LAYER: &str = "Ways";
pub const WAYS_HOVER_LAYER: &str = "Ways-hover";
pub const ROUTE_HOVER_LAYER: &str = "Route-hover";
pub const WAYS_SELECTED_LAYER: &str = "Ways-selected";
pub const ROUTE_SELECTED_LAYER: &str = "Route-selected";

/// Layers that respond to hover and click.
pub const INTERACTIVE_LAYERS: [&str; 2] = [WAYS_LAYER, ROUTE_LAYER];

/// Filter value meaning "no feature".
pub const NO_FEATURE_SENTINEL: i64 = -1;

/// The two trail datasets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrailSource {
    Routes,
    Ways,
}

impl TrailSource {
    pub const ALL: [TrailSource; 2] = [TrailSource::Ways, TrailSource::Routes];

    pub fn source_id(self) -> &'static str {
        match self {
            TrailSource::Routes => ROUTES_SOURCE_ID,
            TrailSource::Ways => WAYS_SOURCE_ID,
        }
    }

    pub fn source_layer(self) -> &'static str {
        match self {
            TrailSource::Routes => ROUTES_SOURCE_LAYER,
            TrailSource::Ways => WAYS_SOURCE_LAYER,
        }
    }

    pub fn tileset(self) -> &'static str {
        match self {
            TrailSource::Routes => ROUTES_TILESET,
            TrailSource::Ways => WAYS_TILESET,
        }
    }

    pub fn spec(self) -> SourceSpec {
        SourceSpec::Vector {
            url: self.tileset().to_string(),
        }
    }

    pub fn hover_layer(self) -> &'static str {
        match self {
            TrailSource::Routes => ROUTE_HOVER_LAYER,
            TrailSource::Ways => WAYS_HOVER_LAYER,
        }
    }

    pub fn selected_layer(self) -> &'static str {
        match self {
            TrailSource::Routes => ROUTE_SELECTED_LAYER,
            TrailSource::Ways => WAYS_SELECTED_LAYER,
        }
    }

    /// Source behind a rendered layer. Any layer id mentioning "Route" is a
    /// route layer.
    pub fn from_layer_id(layer_id: &str) -> Self {
        if layer_id.contains("Route") {
            TrailSource::Routes
        } else {
            TrailSource::Ways
        }
    }
}

pub fn trail_sources() -> Vec<(&'static str, SourceSpec)> {
    TrailSource::ALL.iter().map(|s| (s.source_id(), s.spec())).collect()
}

/// View-state inputs that shape the base trail layers.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailLayerOptions {
    pub style: BaseStyle,
    pub show_routes: bool,
    pub show_ways: bool,
    pub route_width_scale: f64,
    pub ways_width_scale: f64,
    pub legend: LegendSelection,
}

impl Default for TrailLayerOptions {
    fn default() -> Self {
        Self {
            style: BaseStyle::default(),
            show_routes: true,
            show_ways: true,
            route_width_scale: 1.0,
            ways_width_scale: 1.0,
            legend: LegendSelection::all(),
        }
    }
}

pub fn route_halo_visible(style: BaseStyle, show_routes: bool) -> bool {
    style.is_dark() && show_routes
}

pub fn route_halo_layer(opts: &TrailLayerOptions) -> LayerSpec {
    LayerSpec::line(ROUTE_HALO_LAYER, ROUTES_SOURCE_ID)
        .source_layer(Some(ROUTES_SOURCE_LAYER))
        .visibility(Visibility::from_bool(route_halo_visible(opts.style, opts.show_routes)))
        .paint("line-color", "#ffffff")
        .paint("line-opacity", 0.25)
        .paint("line-blur", 2.0)
        .paint("line-emissive-strength", 0.0)
        .paint("line-width", route_halo_width_expression(opts.route_width_scale).to_json())
}

pub fn route_layer(opts: &TrailLayerOptions) -> LayerSpec {
    LayerSpec::line(ROUTE_LAYER, ROUTES_SOURCE_ID)
        .source_layer(Some(ROUTES_SOURCE_LAYER))
        .visibility(Visibility::from_bool(opts.show_routes))
        .paint("line-color", route_line_color_expression().to_json())
        .paint("line-opacity", 0.8)
        .paint("line-emissive-strength", 1.0)
        .paint("line-width", route_width_expression(opts.route_width_scale).to_json())
}

pub fn ways_layer(opts: &TrailLayerOptions) -> LayerSpec {
    let layer = LayerSpec::line(WAYS_LAYER, WAYS_SOURCE_ID)
        .source_layer(Some(WAYS_SOURCE_LAYER))
        .visibility(Visibility::from_bool(opts.show_ways))
        .paint("line-color", ways_color_expression(opts.style).to_json())
        .paint("line-opacity", 1.0)
        .paint("line-emissive-strength", 1.0)
        .paint("line-width", ways_width_expression(opts.ways_width_scale).to_json());
    match ways_layer_filter(&opts.legend, opts.show_ways) {
        Some(f) => layer.filter(f),
        None => layer,
    }
}

/// Base trail layers in insertion order: halo beneath routes, ways on top.
pub fn trail_layers(opts: &TrailLayerOptions) -> Vec<LayerSpec> {
    vec![route_halo_layer(opts), route_layer(opts), ways_layer(opts)]
}

fn highlight_layer(id: &str, source: TrailSource, width: f64, filter: Expr) -> LayerSpec {
    LayerSpec::line(id, source.source_id())
        .source_layer(Some(source.source_layer()))
        .paint("line-color", "#ffffff")
        .paint("line-width", width)
        .paint("line-emissive-strength", 1.0)
        .filter(filter)
}

/// Hover outlines, initially matching nothing.
pub fn hover_layers() -> Vec<LayerSpec> {
    vec![
        highlight_layer(WAYS_HOVER_LAYER, TrailSource::Ways, 5.0, id_filter(None))
            .paint("line-opacity", 0.9),
        highlight_layer(ROUTE_HOVER_LAYER, TrailSource::Routes, 6.0, id_filter(None))
            .paint("line-opacity", 0.9),
    ]
}

/// Selection outlines for the currently selected id.
pub fn selection_layers(selected: Option<&FeatureId>) -> Vec<LayerSpec> {
    vec![
        highlight_layer(WAYS_SELECTED_LAYER, TrailSource::Ways, 6.0, id_filter(selected))
            .paint("line-opacity", 1.0),
        highlight_layer(ROUTE_SELECTED_LAYER, TrailSource::Routes, 7.0, id_filter(selected))
            .paint("line-opacity", 1.0),
    ]
}

/// `["coalesce", ["get", "osm_id"], ["id"]]`
pub fn feature_id_expression() -> Expr {
    Expr::coalesce(vec![Expr::get(ID_PROP), Expr::id()])
}

/// Matches features whose id equals `id`, or nothing for `None`.
pub fn id_filter(id: Option<&FeatureId>) -> Expr {
    let target = match id {
        Some(id) => id.to_value(),
        None => json!(NO_FEATURE_SENTINEL),
    };
    Expr::eq(feature_id_expression(), Expr::lit(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::FeatureContext;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value};

    fn props(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn layer_order_and_ids() {
        let ids: Vec<String> = trail_layers(&TrailLayerOptions::default())
            .into_iter()
            .chain(hover_layers())
            .chain(selection_layers(None))
            .map(|l| l.id)
            .collect();
        assert_eq!(
            ids,
            vec!["Route-halo", "Route", "Ways", "Ways-hover", "Route-hover", "Ways-selected", "Route-selected"]
        );
    }

    #[test]
    fn id_filter_json_and_sentinel() {
        assert_eq!(
            id_filter(Some(&FeatureId::Number(42))).to_json(),
            json!(["==", ["coalesce", ["get", "osm_id"], ["id"]], 42])
        );
        assert_eq!(
            id_filter(None).to_json(),
            json!(["==", ["coalesce", ["get", "osm_id"], ["id"]], -1])
        );
    }

    #[test]
    fn id_filter_falls_back_to_engine_id() {
        let f = id_filter(Some(&FeatureId::Number(7)));
        let empty = Map::new();
        let engine_id = json!(7);
        assert!(f.matches(&FeatureContext::new(&empty).with_id(&engine_id)));
        let p = props(json!({"osm_id": 8}));
        assert!(!f.matches(&FeatureContext::new(&p).with_id(&engine_id)));
        assert!(!id_filter(None).matches(&FeatureContext::new(&props(json!({"osm_id": 7})))));
    }

    #[test]
    fn halo_only_on_dark_with_routes() {
        assert!(route_halo_visible(BaseStyle::Dark, true));
        assert!(!route_halo_visible(BaseStyle::Dark, false));
        assert!(!route_halo_visible(BaseStyle::Outdoors, true));
        let opts = TrailLayerOptions {
            style: BaseStyle::Outdoors,
            ..TrailLayerOptions::default()
        };
        assert_eq!(route_halo_layer(&opts).current_visibility(), Visibility::None);
    }

    #[test]
    fn hidden_ways_drop_the_legend_filter() {
        let opts = TrailLayerOptions {
            show_ways: false,
            ..TrailLayerOptions::default()
        };
        let layer = ways_layer(&opts);
        assert_eq!(layer.filter, None);
        assert_eq!(layer.current_visibility(), Visibility::None);
        assert!(ways_layer(&TrailLayerOptions::default()).filter.is_some());
    }

    #[test]
    fn route_kind_from_layer_id() {
        assert_eq!(TrailSource::from_layer_id("Route-selected"), TrailSource::Routes);
        assert_eq!(TrailSource::from_layer_id("Ways"), TrailSource::Ways);
    }
}
