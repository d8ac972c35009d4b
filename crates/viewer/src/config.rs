use std::env;

use foundation::bounds::LngLat;
use layers::symbology::BaseStyle;
use serde::Deserialize;

use crate::engine::CameraPose;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingToken,
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingToken => write!(f, "missing map access token (MAPBOX_TOKEN)"),
            ConfigError::Invalid(msg) => write!(f, "invalid viewer config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub mapbox_token: String,
    /// Camera used when nothing is persisted.
    pub initial_camera: CameraPose,
    pub default_style: BaseStyle,
    /// Prefix for static assets such as `/regions/<file>`.
    pub asset_base: String,
}

impl ViewerConfig {
    pub fn new(mapbox_token: impl Into<String>) -> Self {
        Self {
            mapbox_token: mapbox_token.into(),
            initial_camera: CameraPose::default(),
            default_style: BaseStyle::Dark,
            asset_base: String::new(),
        }
    }

    /// Reads `MAPBOX_TOKEN`, plus the optional `TRAILMAP_ASSET_BASE` and
    /// `TRAILMAP_STYLE` (a style URL).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("MAPBOX_TOKEN").unwrap_or_default();
        if token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        let mut cfg = Self::new(token.trim());
        if let Some(base) = lookup("TRAILMAP_ASSET_BASE") {
            cfg.asset_base = base;
        }
        if let Some(url) = lookup("TRAILMAP_STYLE").filter(|u| !u.trim().is_empty()) {
            cfg.default_style = BaseStyle::from_url(url.trim())
                .ok_or_else(|| ConfigError::Invalid(format!("unknown style '{url}'")))?;
        }
        Ok(cfg)
    }

    /// Parses the JSON object handed over by the page:
    /// `{ "mapboxToken", "center"?, "zoom"?, "bearing"?, "pitch"?, "style"?, "assetBase"? }`.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let raw: RawViewerConfig =
            serde_json::from_str(raw).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let token = raw.mapbox_token.unwrap_or_default();
        if token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        let mut cfg = Self::new(token.trim());
        let cam = &mut cfg.initial_camera;
        if let Some(c) = raw.center.filter(|c| c.is_finite()) {
            cam.center = c;
        }
        for (slot, v) in [
            (&mut cam.zoom, raw.zoom),
            (&mut cam.bearing, raw.bearing),
            (&mut cam.pitch, raw.pitch),
        ] {
            if let Some(v) = v.filter(|v| v.is_finite()) {
                *slot = v;
            }
        }
        if let Some(url) = raw.style {
            cfg.default_style = BaseStyle::from_url(&url)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown style '{url}'")))?;
        }
        if let Some(base) = raw.asset_base {
            cfg.asset_base = base;
        }
        Ok(cfg)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawViewerConfig {
    mapbox_token: Option<String>,
    center: Option<LngLat>,
    zoom: Option<f64>,
    bearing: Option<f64>,
    pitch: Option<f64>,
    style: Option<String>,
    asset_base: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_overrides_defaults() {
        let cfg = ViewerConfig::from_json(
            r#"{"mapboxToken":"pk.x","center":[-71.0,44.0],"zoom":6,"style":"mapbox://styles/mapbox/outdoors-v12"}"#,
        )
        .unwrap();
        assert_eq!(cfg.initial_camera.center, LngLat::new(-71.0, 44.0));
        assert_eq!(cfg.initial_camera.zoom, 6.0);
        assert_eq!(cfg.initial_camera.pitch, 55.0);
        assert_eq!(cfg.default_style, BaseStyle::Outdoors);
    }

    #[test]
    fn missing_token_fails() {
        assert_eq!(ViewerConfig::from_json("{}"), Err(ConfigError::MissingToken));
        assert_eq!(
            ViewerConfig::from_json(r#"{"mapboxToken":"  "}"#),
            Err(ConfigError::MissingToken)
        );
        assert!(matches!(ViewerConfig::from_json("[]"), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn environment_lookup() {
        let env = |vars: &'static [(&'static str, &'static str)]| {
            move |k: &str| vars.iter().find(|(name, _)| *name == k).map(|(_, v)| v.to_string())
        };
        assert_eq!(ViewerConfig::from_lookup(env(&[])), Err(ConfigError::MissingToken));

        let cfg = ViewerConfig::from_lookup(env(&[
            ("MAPBOX_TOKEN", " pk.env "),
            ("TRAILMAP_ASSET_BASE", "https://cdn.example.org/"),
            ("TRAILMAP_STYLE", "mapbox://styles/mapbox/outdoors-v12"),
        ]))
        .unwrap();
        assert_eq!(cfg.mapbox_token, "pk.env");
        assert_eq!(cfg.asset_base, "https://cdn.example.org/");
        assert_eq!(cfg.default_style, BaseStyle::Outdoors);
        assert_eq!(cfg.initial_camera, CameraPose::default());

        let bad = ViewerConfig::from_lookup(env(&[("MAPBOX_TOKEN", "pk"), ("TRAILMAP_STYLE", "x")]));
        assert!(matches!(bad, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn unknown_style_is_invalid() {
        let err = ViewerConfig::from_json(r#"{"mapboxToken":"pk","style":"mapbox://styles/x/streets"}"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }
}
