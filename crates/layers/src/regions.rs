//! Outline overlays for the regional boundaries.

use serde_json::Value;

use crate::layer::{LayerSpec, SourceSpec, Visibility};

/// Region outlines go beneath the first of these that exists.
pub const REGION_INSERT_BEFORE: [&str; 2] = [crate::trails::WAYS_LAYER, crate::trails::ROUTE_LAYER];

const HALO_COLOR: &str = "#ffffff";
const HALO_WIDTH: f64 = 8.0;
const HALO_OPACITY: f64 = 0.55;
const OUTLINE_WIDTH: f64 = 4.0;

pub fn region_source_id(region: &str) -> String {
    format!("region-src-{region}")
}

pub fn region_halo_layer_id(region: &str) -> String {
    format!("region-outline-{region}-halo")
}

pub fn region_outline_layer_id(region: &str) -> String {
    format!("region-outline-{region}")
}

pub fn region_source(data: Value) -> SourceSpec {
    SourceSpec::GeoJson {
        data,
        generate_id: false,
    }
}

/// Halo then outline, both drawn from the region's GeoJSON source.
pub fn region_outline_layers(region: &str, color: &str, visible: bool) -> [LayerSpec; 2] {
    let source = region_source_id(region);
    let vis = Visibility::from_bool(visible);
    [
        LayerSpec::line(region_halo_layer_id(region), source.clone())
            .visibility(vis)
            .paint("line-color", HALO_COLOR)
            .paint("line-width", HALO_WIDTH)
            .paint("line-opacity", HALO_OPACITY),
        LayerSpec::line(region_outline_layer_id(region), source)
            .visibility(vis)
            .paint("line-color", color)
            .paint("line-width", OUTLINE_WIDTH)
            .paint("line-opacity", 1.0)
            .paint("line-emissive-strength", 1.0),
    ]
}

/// Layer ids whose visibility follows the region toggle.
pub fn region_layer_ids(region: &str) -> [String; 2] {
    [region_halo_layer_id(region), region_outline_layer_id(region)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_follow_the_naming_scheme() {
        assert_eq!(region_source_id("west"), "region-src-west");
        assert_eq!(
            region_layer_ids("west"),
            ["region-outline-west-halo".to_string(), "region-outline-west".to_string()]
        );
    }

    #[test]
    fn outline_layers_carry_color_and_visibility() {
        let [halo, outline] = region_outline_layers("alaska", "#F43F5E", false);
        assert_eq!(halo.source, "region-src-alaska");
        assert_eq!(halo.paint.get("line-width"), Some(&json!(8.0)));
        assert_eq!(outline.paint.get("line-color"), Some(&json!("#F43F5E")));
        assert_eq!(outline.current_visibility(), Visibility::None);
        assert_eq!(halo.source_layer, None);
    }
}
