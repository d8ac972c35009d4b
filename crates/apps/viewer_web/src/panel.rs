//! JSON snapshots for the page's panels.

use layers::legend::WAYS_LEGEND_BUCKETS;
use search::{FacetItem, SearchState, Suggestions, TagVariant, TrailHit};
use serde_json::{Value, json};
use viewer::{TrailDetails, ViewState};

fn details_json(d: &TrailDetails) -> Value {
    json!({
        "name": d.name,
        "type": d.kind,
        "length": d.length,
        "difficulty": d.difficulty,
        "website": d.website,
        "websiteIsLink": d.website_is_link,
    })
}

/// Controls, overlays and the selected trail.
pub fn view_json(state: &ViewState, details: &TrailDetails) -> Value {
    json!({
        "style": if state.base_style.is_dark() { "dark" } else { "outdoors" },
        "showRoutes": state.show_routes,
        "showWays": state.show_ways,
        "widthScale": state.width_scale,
        "affectRoutes": state.affect_routes,
        "affectWays": state.affect_ways,
        "terrainExaggeration": state.terrain_exaggeration,
        "legend": state.legend.flags(),
        "regions": state.regions.to_json(),
        "zoom": state.zoom_label,
        "selected": state.selected.as_ref().map(|_| details_json(details)),
    })
}

fn hit_json(hit: &TrailHit) -> Value {
    let tag = hit.type_tag();
    let variant = match tag.variant {
        TagVariant::Route => "route",
        TagVariant::Way => "way",
        TagVariant::Other => "other",
    };
    json!({
        "osmId": hit.osm_id.to_value(),
        "name": hit.display_name(),
        "region": hit.region,
        "tag": tag.label,
        "tagVariant": variant,
    })
}

fn facets_json(items: Vec<FacetItem>) -> Value {
    items
        .into_iter()
        .map(|f| json!({"value": f.value, "count": f.count, "isRefined": f.is_refined}))
        .collect()
}

pub fn search_json(state: &SearchState, suggestions: &Suggestions) -> Value {
    json!({
        "query": state.query(),
        "nbHits": state.nb_hits(),
        "hits": state.hits().iter().map(hit_json).collect::<Vec<_>>(),
        "canShowMore": !state.is_last_page(),
        "facets": {
            "region": facets_json(state.facet_items("region")),
            "type": facets_json(state.facet_items("type")),
        },
        "refinements": state.current_refinements(),
        "suggestions": {
            "open": suggestions.is_open(),
            "active": suggestions.active(),
            "items": suggestions.items().iter().map(hit_json).collect::<Vec<_>>(),
        },
    })
}

pub fn legend_json() -> Value {
    WAYS_LEGEND_BUCKETS
        .iter()
        .map(|b| json!({"label": b.label, "color": b.color, "minKm": b.min_km, "maxKm": b.max_km}))
        .collect()
}
