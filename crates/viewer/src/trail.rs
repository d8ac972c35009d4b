use foundation::ids::FeatureId;
use layers::length::length_km;
use layers::trails::TrailSource;
use search::{TrailHit, TrailKind};
use serde_json::{Map, Value};

use crate::engine::RenderedFeature;

/// What the details panel shows for one selected feature.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailSummary {
    pub id: FeatureId,
    pub name: Option<String>,
    pub kind: TrailKind,
    pub length_km: Option<f64>,
    pub difficulty: Option<String>,
    pub website: Option<String>,
}

pub fn kind_of_source(source: TrailSource) -> TrailKind {
    match source {
        TrailSource::Routes => TrailKind::Route,
        TrailSource::Ways => TrailKind::Way,
    }
}

fn string_prop(props: &Map<String, Value>, key: &str) -> Option<String> {
    props.get(key).and_then(Value::as_str).map(str::to_string)
}

impl TrailSummary {
    pub fn from_properties(id: FeatureId, kind: TrailKind, props: &Map<String, Value>) -> Self {
        Self {
            id,
            name: string_prop(props, "name"),
            kind,
            length_km: length_km(props),
            difficulty: string_prop(props, "difficulty"),
            website: string_prop(props, "website"),
        }
    }

    /// Summary of a clicked feature; the kind follows the layer it was
    /// rendered in. `None` when the feature carries no id.
    pub fn from_rendered(feature: &RenderedFeature) -> Option<Self> {
        let id = feature.feature_id()?;
        let kind = kind_of_source(TrailSource::from_layer_id(&feature.layer_id));
        Some(Self::from_properties(id, kind, &feature.properties))
    }

    /// Provisional summary from a search record.
    pub fn from_hit(hit: &TrailHit) -> Self {
        Self {
            id: hit.osm_id.clone(),
            name: hit.name.clone(),
            kind: hit.trail_kind(),
            length_km: hit.length_km.filter(|km| km.is_finite()),
            difficulty: hit.difficulty.clone(),
            website: hit.website.clone(),
        }
    }
}

const NOT_AVAILABLE: &str = "N/A";

/// Display strings for the details panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailDetails {
    pub name: String,
    pub kind: String,
    pub length: String,
    pub difficulty: String,
    pub website: String,
    /// The website is rendered as a link only when it looks like a URL.
    pub website_is_link: bool,
}

fn or_na(v: Option<&str>) -> String {
    match v {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

impl TrailDetails {
    pub fn from_summary(summary: Option<&TrailSummary>) -> Self {
        let website = or_na(summary.and_then(|s| s.website.as_deref()));
        Self {
            name: or_na(summary.and_then(|s| s.name.as_deref())),
            kind: summary.map_or(TrailKind::Route, |s| s.kind).as_str().to_string(),
            length: summary
                .and_then(|s| s.length_km)
                .map_or_else(|| NOT_AVAILABLE.to_string(), |km| format!("{km:.2} km")),
            difficulty: or_na(summary.and_then(|s| s.difficulty.as_deref())),
            website_is_link: website != NOT_AVAILABLE && website.starts_with("http"),
            website,
        }
    }
}
