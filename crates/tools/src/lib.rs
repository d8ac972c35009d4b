//! Offline inspection helpers behind the `trailmap` binary.

use catalog::{REGIONS, RegionMeta};
use foundation::bounds::geojson_bbox;
use layers::FeatureContext;
use layers::legend::{BUCKET_COUNT, WAYS_LEGEND_BUCKETS, bucket_index, ways_legend_filter};
use layers::length::LengthMeasurement;
use layers::{LegendSelection, LengthEncoding};
use search::{SearchConfig, SearchError, TrailHit, TrailKind};
use serde::Serialize;
use serde_json::{Map, Value, json};
use viewer::{ConfigError, ViewerConfig};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BboxReport {
    /// Region whose asset file name matches the input, if any.
    pub region: Option<&'static str>,
    pub bbox: [f64; 4],
    pub center: [f64; 2],
}

pub fn region_for_file(file_name: &str) -> Option<&'static RegionMeta> {
    REGIONS.iter().find(|r| r.file == file_name)
}

pub fn bbox_report(file_name: &str, geojson: &Value) -> Result<BboxReport, String> {
    let bounds = geojson_bbox(geojson).ok_or_else(|| format!("{file_name}: no coordinates found"))?;
    Ok(BboxReport {
        region: region_for_file(file_name).map(|r| r.name),
        bbox: bounds.to_array(),
        center: bounds.center().to_array(),
    })
}

/// Parses a flag string such as `10110`: one `0`/`1` per legend tier.
pub fn parse_legend_flags(s: &str) -> Result<LegendSelection, String> {
    let chars: Vec<char> = s.trim().chars().collect();
    if chars.len() != BUCKET_COUNT {
        return Err(format!("expected {BUCKET_COUNT} flags, got '{s}'"));
    }
    let mut flags = [false; BUCKET_COUNT];
    for (flag, c) in flags.iter_mut().zip(chars) {
        *flag = match c {
            '1' => true,
            '0' => false,
            other => return Err(format!("invalid legend flag '{other}'")),
        };
    }
    Ok(LegendSelection::new(flags))
}

/// The ways filter for `selection`, plus a check of `km` against it when
/// given. The check runs the filter expression itself and the local
/// bucket test side by side.
pub fn legend_report(selection: &LegendSelection, km: Option<f64>) -> Value {
    let filter = ways_legend_filter(selection);
    let enabled: Vec<&str> = selection.enabled().map(|b| b.label).collect();
    let mut out = json!({ "enabled": enabled, "filter": filter.to_json() });
    if let Some(km) = km {
        let mut props = Map::new();
        props.insert(LengthEncoding::Kilometers.tile_key().to_string(), json!(km));
        let ctx = FeatureContext::new(&props);
        out["check"] = json!({
            "km": km,
            "bucket": bucket_index(km).map(|i| WAYS_LEGEND_BUCKETS[i].label),
            "admitted": selection.admits(km),
            "filterMatches": filter.matches(&ctx),
        });
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthReport {
    pub encoding: Option<&'static str>,
    pub km: Option<f64>,
    pub bucket: Option<&'static str>,
}

fn encoding_name(encoding: LengthEncoding) -> &'static str {
    match encoding {
        LengthEncoding::Kilometers => "kilometers",
        LengthEncoding::Meters => "meters",
        LengthEncoding::Ambiguous => "ambiguous",
    }
}

/// Normalized length of a feature's properties object.
pub fn length_report(props: &Value) -> Result<LengthReport, String> {
    let obj = props
        .as_object()
        .ok_or_else(|| "properties must be a JSON object".to_string())?;
    let measurement = LengthMeasurement::from_properties(obj);
    let km = measurement.map(|m| m.km());
    Ok(LengthReport {
        encoding: measurement.map(|m| encoding_name(m.encoding())),
        km,
        bucket: km.and_then(bucket_index).map(|i| WAYS_LEGEND_BUCKETS[i].label),
    })
}

/// Keeps the first four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let shown: String = secret.chars().take(4).collect();
    if shown.len() == secret.len() {
        "*".repeat(secret.chars().count())
    } else {
        format!("{shown}…")
    }
}

/// Resolved viewer and search settings, with secrets masked and errors
/// reported in place.
pub fn config_report(viewer: Result<ViewerConfig, ConfigError>, search: Result<SearchConfig, SearchError>) -> Value {
    let viewer = match viewer {
        Ok(cfg) => json!({
            "mapboxToken": mask_secret(&cfg.mapbox_token),
            "style": cfg.default_style.url(),
            "center": cfg.initial_camera.center.to_array(),
            "zoom": cfg.initial_camera.zoom,
            "bearing": cfg.initial_camera.bearing,
            "pitch": cfg.initial_camera.pitch,
            "assetBase": cfg.asset_base,
        }),
        Err(e) => json!({ "error": e.to_string() }),
    };
    let search = match search {
        Ok(cfg) => json!({
            "appId": cfg.app_id,
            "searchKey": mask_secret(&cfg.search_key),
            "indexName": cfg.index_name,
            "hitsPerPage": cfg.hits_per_page,
        }),
        Err(e) => json!({ "error": e.to_string() }),
    };
    json!({ "viewer": viewer, "search": search })
}

/// One line per hit: tag, display name, region, id.
pub fn format_hit(hit: &TrailHit) -> String {
    let tag = hit.type_tag();
    let region = hit.region.as_deref().unwrap_or("-");
    let mut line = format!("[{}] {} ({region}) id={}", tag.label, hit.display_name(), hit.osm_id);
    if hit.trail_kind() == TrailKind::Way && hit.bounds().is_none() && hit.anchor().is_none() {
        line.push_str(" no-location");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bbox_names_known_region_files() {
        let geojson = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "Polygon", "coordinates": [[[-160.0, 18.0], [-154.0, 18.0], [-154.0, 23.0], [-160.0, 18.0]]]}}
            ]
        });
        let report = bbox_report("Hawaii_Region.geojson", &geojson).unwrap();
        assert_eq!(report.region, Some("Hawaii"));
        assert_eq!(report.bbox, [-160.0, 18.0, -154.0, 23.0]);
        assert_eq!(report.center, [-157.0, 20.5]);

        let other = bbox_report("mine.geojson", &geojson).unwrap();
        assert_eq!(other.region, None);
        assert!(bbox_report("empty.geojson", &json!({"type": "FeatureCollection", "features": []})).is_err());
    }

    #[test]
    fn legend_flags_parse() {
        assert_eq!(
            parse_legend_flags("10010").unwrap().flags(),
            [true, false, false, true, false]
        );
        assert!(parse_legend_flags("1001").is_err());
        assert!(parse_legend_flags("1002x").is_err());
    }

    #[test]
    fn legend_check_agrees_with_local_test() {
        let selection = parse_legend_flags("01000").unwrap();
        let inside = legend_report(&selection, Some(2.0));
        assert_eq!(inside["check"]["admitted"], json!(true));
        assert_eq!(inside["check"]["filterMatches"], json!(true));
        assert_eq!(inside["check"]["bucket"], json!("1 – 3 km"));

        let edge = legend_report(&selection, Some(3.0));
        assert_eq!(edge["check"]["admitted"], json!(false));
        assert_eq!(edge["check"]["filterMatches"], json!(false));

        let none = legend_report(&LegendSelection::none(), None);
        assert_eq!(none["filter"], json!(["==", 1, 0]));
        assert!(none.get("check").is_none());
    }

    #[test]
    fn length_prefers_kilometers() {
        let r = length_report(&json!({"length_m": 4200, "length_km": "1.5"})).unwrap();
        assert_eq!(r.encoding, Some("kilometers"));
        assert_eq!(r.km, Some(1.5));
        assert_eq!(r.bucket, Some("1 – 3 km"));

        let m = length_report(&json!({"lengthMeters": 12500})).unwrap();
        assert_eq!(m.km, Some(12.5));
        assert_eq!(m.bucket, Some("10+ km"));

        let missing = length_report(&json!({"name": "x"})).unwrap();
        assert_eq!(missing, LengthReport { encoding: None, km: None, bucket: None });
        assert!(length_report(&json!([1, 2])).is_err());
    }

    #[test]
    fn config_masks_secrets_and_reports_errors() {
        let mut viewer = ViewerConfig::new("pk.eyJ1Ijoi");
        viewer.asset_base = "/static".to_string();
        let v = config_report(Ok(viewer), Err(SearchError::MissingCredential("ALGOLIA_APP_ID")));
        assert_eq!(v["viewer"]["mapboxToken"], json!("pk.e…"));
        assert_eq!(v["viewer"]["zoom"], json!(2.08));
        assert_eq!(v["viewer"]["assetBase"], json!("/static"));
        assert_eq!(v["search"]["error"], json!("missing search credential ALGOLIA_APP_ID"));

        let v = config_report(Err(ConfigError::MissingToken), Ok(SearchConfig::new("APP1", "key")));
        assert_eq!(v["viewer"]["error"], json!("missing map access token (MAPBOX_TOKEN)"));
        assert_eq!(v["search"]["searchKey"], json!("***"));
        assert_eq!(v["search"]["indexName"], json!("US_Routes_Ways"));
        assert_eq!(v["search"]["hitsPerPage"], json!(20));
    }

    #[test]
    fn hit_lines() {
        let mut hit = TrailHit::new(42);
        hit.name = Some("Creek Path".to_string());
        hit.kind = Some("route".to_string());
        hit.region = Some("West".to_string());
        assert_eq!(format_hit(&hit), "[ROUTE] Creek Path (West) id=42");

        let bare = TrailHit::new(7);
        assert_eq!(format_hit(&bare), "[WAY] (Unnamed) (-) id=7 no-location");
    }
}
