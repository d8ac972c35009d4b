//! The single source of truth the adapter projects onto the engine.

use catalog::persist::{SavedMapState, StoredMapState};
use catalog::regions::RegionVisibility;
use layers::legend::LegendSelection;
use layers::symbology::BaseStyle;
use layers::trails::TrailLayerOptions;

use crate::config::ViewerConfig;
use crate::engine::CameraPose;
use crate::trail::TrailSummary;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub base_style: BaseStyle,
    pub show_routes: bool,
    pub show_ways: bool,
    /// Width slider value, always > 0.
    pub width_scale: f64,
    pub affect_routes: bool,
    pub affect_ways: bool,
    /// Scales last applied to each layer family. A family keeps its scale
    /// while its affect flag is off.
    pub route_width_scale: f64,
    pub ways_width_scale: f64,
    /// Always >= 0.
    pub terrain_exaggeration: f64,
    pub legend: LegendSelection,
    pub selected: Option<TrailSummary>,
    pub regions: RegionVisibility,
    pub camera: CameraPose,
    /// Zoom rounded to two decimals, for display.
    pub zoom_label: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        let camera = CameraPose::default();
        Self {
            base_style: BaseStyle::Dark,
            show_routes: true,
            show_ways: true,
            width_scale: 1.0,
            affect_routes: true,
            affect_ways: true,
            route_width_scale: 1.0,
            ways_width_scale: 1.0,
            terrain_exaggeration: 1.0,
            legend: LegendSelection::all(),
            selected: None,
            regions: RegionVisibility::default(),
            camera,
            zoom_label: round_zoom(camera.zoom),
        }
    }
}

pub fn round_zoom(zoom: f64) -> f64 {
    (zoom * 100.0).round() / 100.0
}

impl ViewState {
    /// Initial state: persisted values over configured defaults. A stored
    /// style URL that is not one of the known styles is ignored.
    pub fn restore(stored: StoredMapState, regions: RegionVisibility, config: &ViewerConfig) -> Self {
        let style = stored.style.as_deref().and_then(BaseStyle::from_url);
        let defaults = Self {
            base_style: config.default_style,
            camera: config.initial_camera,
            ..Self::default()
        };
        let saved = stored.merged_over(defaults.to_saved());
        let camera = CameraPose {
            center: saved.center,
            zoom: saved.zoom,
            bearing: saved.bearing,
            pitch: saved.pitch,
        };
        Self {
            base_style: style.unwrap_or(config.default_style),
            show_routes: saved.show_routes,
            show_ways: saved.show_ways,
            regions,
            camera,
            zoom_label: round_zoom(camera.zoom),
            ..defaults
        }
    }

    pub fn to_saved(&self) -> SavedMapState {
        SavedMapState {
            center: self.camera.center,
            zoom: self.camera.zoom,
            bearing: self.camera.bearing,
            pitch: self.camera.pitch,
            style: self.base_style.url().to_string(),
            show_routes: self.show_routes,
            show_ways: self.show_ways,
        }
    }

    pub fn set_camera(&mut self, camera: CameraPose) {
        self.camera = camera;
        self.zoom_label = round_zoom(camera.zoom);
    }

    pub fn trail_layer_options(&self) -> TrailLayerOptions {
        TrailLayerOptions {
            style: self.base_style,
            show_routes: self.show_routes,
            show_ways: self.show_ways,
            route_width_scale: self.route_width_scale,
            ways_width_scale: self.ways_width_scale,
            legend: self.legend,
        }
    }

    /// Returns which families changed width: `(routes, ways)`. Non-positive
    /// or non-finite scales are rejected.
    pub fn set_width_scale(&mut self, scale: f64) -> (bool, bool) {
        if !(scale.is_finite() && scale > 0.0) {
            return (false, false);
        }
        self.width_scale = scale;
        self.sync_width_scales()
    }

    pub fn set_affect(&mut self, routes: bool, ways: bool) -> (bool, bool) {
        self.affect_routes = routes;
        self.affect_ways = ways;
        self.sync_width_scales()
    }

    pub fn reset_widths(&mut self) -> (bool, bool) {
        self.width_scale = 1.0;
        self.set_affect(true, true)
    }

    fn sync_width_scales(&mut self) -> (bool, bool) {
        let mut changed = (false, false);
        if self.affect_routes && self.route_width_scale != self.width_scale {
            self.route_width_scale = self.width_scale;
            changed.0 = true;
        }
        if self.affect_ways && self.ways_width_scale != self.width_scale {
            self.ways_width_scale = self.width_scale;
            changed.1 = true;
        }
        changed
    }

    /// Clamps to `[0, ∞)`; NaN becomes 0.
    pub fn set_terrain_exaggeration(&mut self, value: f64) -> f64 {
        self.terrain_exaggeration = if value.is_finite() {
            value.max(0.0)
        } else if value == f64::INFINITY {
            self.terrain_exaggeration
        } else {
            0.0
        };
        self.terrain_exaggeration
    }

    /// Flips one bucket. Ways are hidden once no bucket remains and shown
    /// again as soon as one is enabled.
    pub fn toggle_legend_bucket(&mut self, index: usize) {
        self.legend.toggle(index);
        self.show_ways = self.legend.any_enabled();
    }

    pub fn select_all_buckets(&mut self) {
        self.legend = LegendSelection::all();
        self.show_ways = true;
    }

    pub fn clear_buckets(&mut self) {
        self.legend = LegendSelection::none();
        self.show_ways = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::persist::{load_map_state, save_map_state};
    use catalog::store::InMemoryStore;
    use foundation::bounds::LngLat;
    use pretty_assertions::assert_eq;

    #[test]
    fn persisted_subset_round_trips() {
        let cfg = ViewerConfig::new("pk");
        let mut state = ViewState::default();
        state.base_style = BaseStyle::Outdoors;
        state.show_routes = false;
        state.set_camera(CameraPose {
            center: LngLat::new(-120.25, 45.5),
            zoom: 9.125,
            bearing: 30.0,
            pitch: 10.0,
        });

        let mut store = InMemoryStore::new();
        assert!(save_map_state(&mut store, &state.to_saved()));
        let back = ViewState::restore(load_map_state(&store), RegionVisibility::default(), &cfg);
        assert_eq!(back.to_saved(), state.to_saved());
        assert_eq!(back.base_style, BaseStyle::Outdoors);
        assert_eq!(back.zoom_label, 9.13);
    }

    #[test]
    fn restore_falls_back_to_config() {
        let mut cfg = ViewerConfig::new("pk");
        cfg.default_style = BaseStyle::Outdoors;
        let stored = StoredMapState {
            style: Some("mapbox://styles/mapbox/streets-v12".to_string()),
            zoom: Some(4.0),
            ..StoredMapState::default()
        };
        let s = ViewState::restore(stored, RegionVisibility::default(), &cfg);
        assert_eq!(s.base_style, BaseStyle::Outdoors);
        assert_eq!(s.camera.zoom, 4.0);
        assert_eq!(s.camera.pitch, 55.0);
        assert!(s.show_ways);
    }

    #[test]
    fn legend_toggles_drive_ways_visibility() {
        let mut s = ViewState::default();
        for i in 0..5 {
            s.toggle_legend_bucket(i);
        }
        assert!(!s.show_ways);
        s.toggle_legend_bucket(2);
        assert!(s.show_ways);
        s.clear_buckets();
        assert!(!s.show_ways && !s.legend.any_enabled());
        s.select_all_buckets();
        assert!(s.show_ways);
        assert_eq!(s.legend, LegendSelection::all());
    }

    #[test]
    fn width_scale_respects_affect_flags() {
        let mut s = ViewState::default();
        s.set_affect(false, true);
        assert_eq!(s.set_width_scale(2.0), (false, true));
        assert_eq!(s.route_width_scale, 1.0);
        assert_eq!(s.set_width_scale(0.0), (false, false));
        assert_eq!(s.set_affect(true, true), (true, false));
        assert_eq!(s.route_width_scale, 2.0);
        assert_eq!(s.reset_widths(), (true, true));
        assert_eq!((s.width_scale, s.ways_width_scale), (1.0, 1.0));
    }

    #[test]
    fn terrain_is_clamped() {
        let mut s = ViewState::default();
        assert_eq!(s.set_terrain_exaggeration(-1.0), 0.0);
        assert_eq!(s.set_terrain_exaggeration(2.5), 2.5);
        assert_eq!(s.set_terrain_exaggeration(f64::NAN), 0.0);
    }
}
