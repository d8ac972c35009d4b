//! Colors and line widths for the trail layers.

use foundation::color::brighten_hex;
use foundation::hash::palette_index;
use serde_json::Value;

use crate::expression::Expr;
use crate::length::length_km_expression;
use crate::trails::ID_PROP;

pub const DARK_STYLE_URL: &str = "mapbox://styles/ultimateboss/cmgsd44fu00cb01qo5wsjehsu";
pub const OUTDOORS_STYLE_URL: &str = "mapbox://styles/mapbox/outdoors-v12";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum BaseStyle {
    #[default]
    Dark,
    Outdoors,
}

impl BaseStyle {
    pub fn url(self) -> &'static str {
        match self {
            BaseStyle::Dark => DARK_STYLE_URL,
            BaseStyle::Outdoors => OUTDOORS_STYLE_URL,
        }
    }

    /// Recognizes the two known style URLs, and any other URL mentioning
    /// "dark" as the dark style.
    pub fn from_url(url: &str) -> Option<Self> {
        if url == OUTDOORS_STYLE_URL {
            Some(BaseStyle::Outdoors)
        } else if is_dark_style_url(url) {
            Some(BaseStyle::Dark)
        } else {
            None
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            BaseStyle::Dark => BaseStyle::Outdoors,
            BaseStyle::Outdoors => BaseStyle::Dark,
        }
    }

    pub fn is_dark(self) -> bool {
        self == BaseStyle::Dark
    }
}

pub fn is_dark_style_url(url: &str) -> bool {
    !url.is_empty() && (url == DARK_STYLE_URL || url.to_lowercase().contains("dark"))
}

pub const ROUTE_PALETTE: [&str; 8] = [
    "#3B82F6", // blue
    "#10B981", // emerald
    "#F59E0B", // amber
    "#EF4444", // soft red
    "#8B5CF6", // violet
    "#F472B6", // rose
    "#14B8A6", // teal
    "#84CC16", // lime
];

const ROUTE_DARK_BRIGHTEN: f64 = 0.2;

/// Ways colors per length tier, shortest first.
pub const WAYS_COLOR_STOPS: [&str; 5] = ["#A8E6A3", "#C7E98D", "#FFD76A", "#FFB347", "#FF6961"];
/// Tier boundaries (km) between consecutive [`WAYS_COLOR_STOPS`].
pub const WAYS_COLOR_BREAKS_KM: [f64; 4] = [1.0, 3.0, 6.0, 10.0];
const WAYS_DARK_BRIGHTEN: f64 = 0.18;

pub const WAYS_WIDTH_STOPS: [(f64, f64); 3] = [(5.0, 1.5), (12.0, 2.5), (16.0, 3.0)];
pub const ROUTE_WIDTH_STOPS: [(f64, f64); 3] = [(5.0, 3.0), (12.0, 3.5), (16.0, 4.0)];
/// Extra width of the dark-style route halo over the route line.
pub const ROUTE_HALO_EXTRA_PX: f64 = 2.0;

/// Stable route color derived from its name (blank names hash as "route").
pub fn route_color(name: Option<&str>, style: BaseStyle) -> String {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or("route");
    let base = ROUTE_PALETTE[palette_index(name, ROUTE_PALETTE.len())];
    if style.is_dark() {
        brighten_hex(base, ROUTE_DARK_BRIGHTEN)
    } else {
        base.to_string()
    }
}

fn ways_stops(style: BaseStyle) -> [String; 5] {
    WAYS_COLOR_STOPS.map(|c| {
        if style.is_dark() {
            brighten_hex(c, WAYS_DARK_BRIGHTEN)
        } else {
            c.to_string()
        }
    })
}

/// Local counterpart of [`ways_color_expression`].
pub fn way_color(length_km: f64, style: BaseStyle) -> String {
    let tier = WAYS_COLOR_BREAKS_KM.iter().filter(|b| length_km >= **b).count();
    ways_stops(style)[tier].clone()
}

/// `["step", length_km, c0, 1, c1, 3, c2, 6, c3, 10, c4]`.
pub fn ways_color_expression(style: BaseStyle) -> Expr {
    let [c0, c1, c2, c3, c4] = ways_stops(style);
    let stops = WAYS_COLOR_BREAKS_KM
        .into_iter()
        .zip([c1, c2, c3, c4])
        .map(|(b, c)| (b, Expr::lit(c)))
        .collect();
    Expr::step(length_km_expression(), Expr::lit(c0), stops)
}

/// Palette color keyed on `to-number(osm_id) % palette_len`.
pub fn route_color_by_id_expression() -> Expr {
    let n = ROUTE_PALETTE.len();
    let cases = ROUTE_PALETTE
        .iter()
        .enumerate()
        .map(|(i, c)| (Value::from(i as u64), Expr::lit(*c)))
        .collect();
    Expr::match_cases(
        Expr::rem(
            Expr::coalesce(vec![Expr::to_number(Expr::get(ID_PROP)), Expr::lit(0)]),
            Expr::lit(n as u64),
        ),
        cases,
        Expr::lit(ROUTE_PALETTE[n - 1]),
    )
}

/// Route line color: a published `routeColor` wins over the id palette.
pub fn route_line_color_expression() -> Expr {
    Expr::coalesce(vec![Expr::get("routeColor"), route_color_by_id_expression()])
}

fn scaled_width(stops: &[(f64, f64)], extra: f64, scale: f64) -> Expr {
    let scaled: Vec<(f64, f64)> = stops.iter().map(|(z, w)| (*z, (w + extra) * scale)).collect();
    Expr::interpolate_zoom(&scaled)
}

/// Width expressions keep `["zoom"]` at the top level of the interpolation,
/// so the scale factor is folded into each stop.
pub fn ways_width_expression(scale: f64) -> Expr {
    scaled_width(&WAYS_WIDTH_STOPS, 0.0, scale)
}

pub fn route_width_expression(scale: f64) -> Expr {
    scaled_width(&ROUTE_WIDTH_STOPS, 0.0, scale)
}

pub fn route_halo_width_expression(scale: f64) -> Expr {
    scaled_width(&ROUTE_WIDTH_STOPS, ROUTE_HALO_EXTRA_PX, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::FeatureContext;
    use serde_json::{Map, json};

    #[test]
    fn style_urls_round_trip() {
        for s in [BaseStyle::Dark, BaseStyle::Outdoors] {
            assert_eq!(BaseStyle::from_url(s.url()), Some(s));
        }
        assert_eq!(BaseStyle::from_url("mapbox://styles/me/Dark-v2"), Some(BaseStyle::Dark));
        assert_eq!(BaseStyle::from_url("mapbox://styles/mapbox/streets-v12"), None);
        assert_eq!(BaseStyle::Dark.toggled(), BaseStyle::Outdoors);
    }

    #[test]
    fn route_color_is_stable_and_brightened_on_dark() {
        let light = route_color(Some("  Long Trail "), BaseStyle::Outdoors);
        assert_eq!(light, route_color(Some("Long Trail"), BaseStyle::Outdoors));
        assert!(ROUTE_PALETTE.contains(&light.as_str()));
        let dark = route_color(Some("Long Trail"), BaseStyle::Dark);
        assert_eq!(dark, brighten_hex(&light, 0.2));
        assert_eq!(route_color(None, BaseStyle::Outdoors), route_color(Some("  "), BaseStyle::Outdoors));
    }

    #[test]
    fn way_color_matches_step_expression() {
        for style in [BaseStyle::Dark, BaseStyle::Outdoors] {
            let e = ways_color_expression(style);
            for km in [0.0, 0.9, 1.0, 2.0, 3.0, 6.5, 10.0, 30.0] {
                let p: Map<String, Value> = json!({"length_km": km}).as_object().cloned().unwrap();
                let got = e.evaluate(&FeatureContext::new(&p)).unwrap();
                assert_eq!(got, json!(way_color(km, style)), "km={km}");
            }
        }
    }

    #[test]
    fn width_scale_multiplies_every_stop() {
        assert_eq!(
            route_halo_width_expression(2.0).to_json(),
            json!(["interpolate", ["linear"], ["zoom"], 5.0, 10.0, 12.0, 11.0, 16.0, 12.0])
        );
        assert_eq!(
            ways_width_expression(1.0).to_json(),
            json!(["interpolate", ["linear"], ["zoom"], 5.0, 1.5, 12.0, 2.5, 16.0, 3.0])
        );
    }

    #[test]
    fn route_color_by_id_uses_modulo() {
        let e = route_color_by_id_expression();
        let p: Map<String, Value> = json!({"osm_id": 10}).as_object().cloned().unwrap();
        assert_eq!(e.evaluate(&FeatureContext::new(&p)).unwrap(), json!(ROUTE_PALETTE[2]));
        let missing = Map::new();
        assert_eq!(e.evaluate(&FeatureContext::new(&missing)).unwrap(), json!(ROUTE_PALETTE[0]));
    }
}
