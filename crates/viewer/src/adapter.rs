//! Keeps one engine instance in step with the view state.
//!
//! Every user intent updates [`ViewState`] first and then re-applies the
//! matching engine calls. Setter calls (filters, paint, layout, terrain) are
//! only issued while the lifecycle is `Ready`; anything that arrives earlier
//! is picked up by the full registration pass that runs on load and after
//! each style swap. Engine failures are logged and counted, never returned.

use std::collections::BTreeMap;

use catalog::persist::{load_map_state, load_region_visibility, save_map_state, save_region_visibility};
use catalog::regions::RegionId;
use catalog::store::KeyValueStore;
use foundation::ids::FeatureId;
use foundation::time::Time;
use layers::layer::{SourceSpec, Visibility};
use layers::legend::ways_layer_filter;
use layers::regions::{REGION_INSERT_BEFORE, region_layer_ids, region_outline_layers, region_source, region_source_id};
use layers::symbology::{BaseStyle, route_halo_width_expression, route_width_expression, ways_width_expression};
use layers::terrain::{DEM_SOURCE_ID, TerrainSpec, dem_source};
use layers::trails::{
    INTERACTIVE_LAYERS, ROUTE_HALO_LAYER, ROUTE_LAYER, TrailSource, WAYS_LAYER, hover_layers, id_filter,
    route_halo_visible, selection_layers, trail_layers, trail_sources,
};
use runtime::event_bus::EventBus;
use runtime::metrics::Metrics;
use runtime::timers::TimerQueue;
use search::TrailHit;
use serde_json::Value;

use crate::config::ViewerConfig;
use crate::engine::{CameraPose, EngineError, MapEngine, ScreenPoint, features_bounds};
use crate::events::{EngineEvent, EngineEventKind};
use crate::feature_cache::FeatureCache;
use crate::focus::{
    CameraTarget, FOCUS_DURATION_MS, FOCUS_PADDING_PX, FocusResolver, ListenerTag, PendingFocus, camera_target,
};
use crate::interaction::{
    CLICK_EASE_DURATION_MS, CLICK_EASE_ZOOM, ClickOutcome, HoverState, KeyIntent, POINTER_CURSOR, click_outcome,
    key_intent,
};
use crate::lifecycle::{Lifecycle, LifecycleError, LifecycleEvent, LifecycleState};
use crate::trail::{TrailDetails, TrailSummary, kind_of_source};
use crate::view_state::{ViewState, round_zoom};

/// How a search hit was resolved when it was chosen.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FocusOutcome {
    /// The feature was already loaded locally.
    Resolved,
    /// A provisional summary is shown while waiting for tiles.
    Deferred,
    /// The map is not ready; only the provisional summary was applied.
    Provisional,
    Ignored,
}

pub struct MapAdapter<E: MapEngine, S: KeyValueStore> {
    engine: Option<E>,
    store: S,
    state: ViewState,
    lifecycle: Lifecycle,
    cache: FeatureCache,
    bus: EventBus<EngineEventKind, ListenerTag>,
    timers: TimerQueue,
    focus: FocusResolver,
    regions: BTreeMap<RegionId, Value>,
    hover: HoverState,
    captured_camera: Option<CameraPose>,
    metrics: Metrics,
}

impl<E: MapEngine, S: KeyValueStore> MapAdapter<E, S> {
    /// Restores the persisted view from `store` and wraps `engine`.
    pub fn new(engine: E, store: S, config: &ViewerConfig) -> Self {
        let state = Self::restore_state(&store, config);
        Self::with_state(engine, store, state)
    }

    /// The view a new engine should be created with.
    pub fn restore_state(store: &S, config: &ViewerConfig) -> ViewState {
        let stored = load_map_state(store);
        if stored.is_empty() {
            tracing::debug!("no stored map state; starting from config");
        }
        ViewState::restore(stored, load_region_visibility(store), config)
    }

    pub fn with_state(engine: E, store: S, state: ViewState) -> Self {
        Self {
            engine: Some(engine),
            store,
            state,
            lifecycle: Lifecycle::new(),
            cache: FeatureCache::default(),
            bus: EventBus::new(),
            timers: TimerQueue::new(),
            focus: FocusResolver::new(),
            regions: BTreeMap::new(),
            hover: HoverState::default(),
            captured_camera: None,
            metrics: Metrics::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &FeatureCache {
        &self.cache
    }

    pub fn pending_focus(&self) -> Option<&PendingFocus> {
        self.focus.pending()
    }

    pub fn listener_count(&self) -> usize {
        self.bus.len()
    }

    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn hover(&self) -> &HoverState {
        &self.hover
    }

    pub fn details(&self) -> TrailDetails {
        TrailDetails::from_summary(self.state.selected.as_ref())
    }

    pub fn mount(&mut self) -> Result<(), LifecycleError> {
        self.lifecycle.apply(LifecycleEvent::Mount).map(|_| ())
    }

    fn transition(&mut self, event: LifecycleEvent) -> bool {
        match self.lifecycle.apply(event) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "lifecycle transition rejected");
                self.metrics.incr("lifecycle.rejected");
                false
            }
        }
    }

    /// Runs `f` against the live engine, swallowing failures.
    fn call(&mut self, what: &str, f: impl FnOnce(&mut E) -> Result<(), EngineError>) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if let Err(e) = f(engine) {
            tracing::debug!(call = what, error = %e, "engine call failed");
            self.metrics.incr("engine.call_failed");
        }
    }

    /// Like [`Self::call`], but only once the current style is ready.
    fn guarded(&mut self, what: &str, f: impl FnOnce(&mut E) -> Result<(), EngineError>) {
        if !self.lifecycle.is_ready() {
            tracing::debug!(call = what, state = ?self.lifecycle.state(), "engine call deferred until ready");
            self.metrics.incr("engine.call_deferred");
            return;
        }
        self.call(what, f);
    }

    fn persist_map_state(&mut self) {
        if !save_map_state(&mut self.store, &self.state.to_saved()) {
            self.metrics.incr("storage.write_failed");
        }
    }

    fn persist_regions(&mut self) {
        if !save_region_visibility(&mut self.store, &self.state.regions) {
            self.metrics.incr("storage.write_failed");
        }
    }

    // ---- engine events ----

    pub fn handle_event(&mut self, event: EngineEvent) {
        if self.lifecycle.is_destroyed() || self.engine.is_none() {
            tracing::debug!(event = event.kind().name(), "event after teardown ignored");
            return;
        }
        let kind = event.kind();
        match event {
            EngineEvent::Load => {
                if self.transition(LifecycleEvent::Loaded) {
                    self.register_all();
                    self.persist_map_state();
                }
            }
            EngineEvent::StyleLoad => {
                // The first style load precedes `Load` and is handled there.
                if self.lifecycle.state() == LifecycleState::StyleSwapping
                    && self.transition(LifecycleEvent::StyleLoaded)
                {
                    if let Some(pose) = self.captured_camera.take() {
                        self.call("jump_to", |e| e.jump_to(&pose));
                        self.state.set_camera(pose);
                    }
                    self.register_all();
                    self.persist_map_state();
                }
            }
            EngineEvent::Idle | EngineEvent::SourceData { .. } => {
                let wakes = self.bus.dispatch(kind);
                if wakes.iter().any(|(_, tag)| *tag == ListenerTag::Focus) {
                    self.retry_focus();
                }
            }
            EngineEvent::Zoom => {
                if let Some(e) = self.engine.as_ref() {
                    self.state.zoom_label = round_zoom(e.camera().zoom);
                }
            }
            EngineEvent::MoveEnd | EngineEvent::ZoomEnd | EngineEvent::RotateEnd | EngineEvent::PitchEnd => {
                if let Some(e) = self.engine.as_ref() {
                    let pose = e.camera();
                    self.state.set_camera(pose);
                    self.persist_map_state();
                }
            }
            EngineEvent::MouseMove(point) => self.hover_at(point),
            EngineEvent::MouseLeave { layer } => self.leave_layer(TrailSource::from_layer_id(&layer)),
            EngineEvent::Click(point) => self.click_at(point),
            EngineEvent::Error(message) => {
                tracing::warn!(%message, "map engine error");
                self.metrics.incr("engine.error");
            }
        }
    }

    /// Advances the clock; an expired focus wait is retired and its
    /// provisional summary kept.
    pub fn tick(&mut self, now: Time) {
        for timer in self.timers.expire(now) {
            if self.focus.owns_timer(timer) {
                if let Some(p) = self.focus.retire(&mut self.bus, &mut self.timers) {
                    tracing::info!(id = %p.id, "focus timed out; keeping provisional details");
                }
                self.metrics.incr("focus.timed_out");
            }
        }
    }

    /// Adds every source and layer for the current style generation and
    /// applies the whole view state to them.
    fn register_all(&mut self) {
        let opts = self.state.trail_layer_options();
        let exaggeration = self.state.terrain_exaggeration;
        let selected = self.state.selected.as_ref().map(|s| s.id.clone());

        self.call("add_source", |e| add_source_once(e, DEM_SOURCE_ID, &dem_source()));
        self.guarded("set_terrain", |e| e.set_terrain(&TerrainSpec::dem(exaggeration)));
        for (id, spec) in trail_sources() {
            self.call("add_source", |e| add_source_once(e, id, &spec));
        }
        let labels = self.engine.as_ref().and_then(|e| e.top_symbol_layer());
        let mut layers = trail_layers(&opts);
        layers.extend(hover_layers());
        layers.extend(selection_layers(selected.as_ref()));
        for layer in layers {
            self.call("add_layer", |e| {
                if e.has_layer(&layer.id) { Ok(()) } else { e.add_layer(&layer, labels.as_deref()) }
            });
        }
        self.hover = HoverState::default();

        let regions: Vec<(RegionId, Value)> = self.regions.iter().map(|(r, v)| (*r, v.clone())).collect();
        for (region, data) in regions {
            self.install_region(region, data);
        }
        tracing::debug!(generation = self.lifecycle.generation(), "map layers registered");
    }

    // ---- pointer and keyboard ----

    fn hover_at(&mut self, point: ScreenPoint) {
        if !self.lifecycle.is_ready() {
            return;
        }
        let features = match self.engine.as_ref().map(|e| e.query_rendered_features(point, &INTERACTIVE_LAYERS)) {
            Some(Ok(f)) => f,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "hover query failed");
                return;
            }
            None => return,
        };
        let next = HoverState::from_features(&features);
        if next == self.hover {
            return;
        }
        for source in TrailSource::ALL {
            if next.get(source) != self.hover.get(source) {
                let filter = id_filter(next.get(source));
                self.guarded("set_filter", |e| e.set_filter(source.hover_layer(), Some(&filter)));
            }
        }
        let cursor = if next.is_empty() { "" } else { POINTER_CURSOR };
        if let Some(e) = self.engine.as_mut() {
            e.set_cursor(cursor);
        }
        self.hover = next;
    }

    fn leave_layer(&mut self, source: TrailSource) {
        if self.hover.slot(source).take().is_none() {
            return;
        }
        let filter = id_filter(None);
        self.guarded("set_filter", |e| e.set_filter(source.hover_layer(), Some(&filter)));
        if let Some(e) = self.engine.as_mut() {
            e.set_cursor("");
        }
    }

    fn click_at(&mut self, point: ScreenPoint) {
        if !self.lifecycle.is_ready() {
            return;
        }
        let features = match self.engine.as_ref().map(|e| e.query_rendered_features(point, &INTERACTIVE_LAYERS)) {
            Some(Ok(f)) => f,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "click query failed");
                self.metrics.incr("engine.call_failed");
                return;
            }
            None => return,
        };
        match click_outcome(&features) {
            ClickOutcome::Clear => self.clear_selection(),
            ClickOutcome::Select { summary, ease_to } => {
                let bounds = features.first().and_then(|f| f.bounds());
                self.cache.insert(summary.clone(), bounds);
                self.select(summary);
                if let Some(center) = ease_to {
                    self.call("ease_to", |e| e.ease_to(center, CLICK_EASE_ZOOM, CLICK_EASE_DURATION_MS));
                }
                self.metrics.incr("selection.click");
            }
        }
    }

    /// Returns whether the key was handled.
    pub fn key_down(&mut self, key: &str) -> bool {
        match key_intent(key) {
            Some(KeyIntent::ClearSelection) => {
                self.clear_selection();
                true
            }
            None => false,
        }
    }

    // ---- selection ----

    fn apply_selection(&mut self, summary: Option<TrailSummary>) {
        let filter = id_filter(summary.as_ref().map(|s| &s.id));
        self.state.selected = summary;
        for source in TrailSource::ALL {
            self.guarded("set_filter", |e| e.set_filter(source.selected_layer(), Some(&filter)));
        }
    }

    fn retire_focus(&mut self) {
        if let Some(p) = self.focus.retire(&mut self.bus, &mut self.timers) {
            tracing::debug!(id = %p.id, "pending focus retired");
        }
    }

    pub fn select(&mut self, summary: TrailSummary) {
        if self.lifecycle.is_destroyed() {
            return;
        }
        self.retire_focus();
        self.apply_selection(Some(summary));
    }

    /// Drops the selection; the highlight reverts to matching nothing.
    pub fn clear_selection(&mut self) {
        if self.lifecycle.is_destroyed() {
            return;
        }
        self.retire_focus();
        self.apply_selection(None);
    }

    /// Looks `id` up in the feature cache, then in the loaded tiles of the
    /// routes and ways sources.
    fn lookup_local(&mut self, id: &FeatureId) -> Option<TrailSummary> {
        if let Some(hit) = self.cache.get(id) {
            return Some(hit.summary.clone());
        }
        let engine = self.engine.as_ref()?;
        let filter = id_filter(Some(id));
        for source in [TrailSource::Routes, TrailSource::Ways] {
            match engine.query_source_features(source.source_id(), Some(source.source_layer()), &filter) {
                Ok(features) => {
                    if let Some(f) = features.first() {
                        let summary = TrailSummary::from_properties(id.clone(), kind_of_source(source), &f.properties);
                        let bounds = features_bounds(&features);
                        self.cache.insert(summary.clone(), bounds);
                        return Some(summary);
                    }
                }
                Err(e) => tracing::debug!(source = source.source_id(), error = %e, "source query failed"),
            }
        }
        None
    }

    /// Moves to and selects a chosen search hit. When the feature is not
    /// loaded yet its provisional summary is shown and the lookup is retried
    /// on idle and source-data events until the focus timeout.
    pub fn focus_hit(&mut self, hit: &TrailHit, now: Time) -> FocusOutcome {
        if self.lifecycle.is_destroyed() {
            return FocusOutcome::Ignored;
        }
        let provisional = TrailSummary::from_hit(hit);
        if !self.lifecycle.is_ready() {
            self.select(provisional);
            return FocusOutcome::Provisional;
        }

        let id = hit.osm_id.clone();
        let local = self.lookup_local(&id);
        let zoom = self.engine.as_ref().map_or(0.0, |e| e.camera().zoom);
        let target = camera_target(hit, zoom)
            .or_else(|| self.cache.get(&id).and_then(|c| c.bounds).map(CameraTarget::Fit));
        match target {
            Some(CameraTarget::Fit(bounds)) => {
                self.call("fit_bounds", |e| e.fit_bounds(&bounds, FOCUS_PADDING_PX, FOCUS_DURATION_MS))
            }
            Some(CameraTarget::Fly { center, zoom }) => {
                self.call("fly_to", |e| e.fly_to(center, zoom, FOCUS_DURATION_MS))
            }
            None => tracing::debug!(%id, "no camera target for search hit"),
        }

        match local {
            Some(summary) => {
                self.select(summary);
                self.metrics.incr("focus.resolved");
                FocusOutcome::Resolved
            }
            None => {
                self.apply_selection(Some(provisional));
                if let Some(old) = self.focus.begin(id, now, &mut self.bus, &mut self.timers) {
                    tracing::debug!(id = %old.id, "pending focus superseded");
                }
                self.metrics.incr("focus.deferred");
                FocusOutcome::Deferred
            }
        }
    }

    fn retry_focus(&mut self) {
        let Some(id) = self.focus.pending().map(|p| p.id.clone()) else {
            return;
        };
        if let Some(summary) = self.lookup_local(&id) {
            self.retire_focus();
            self.apply_selection(Some(summary));
            self.metrics.incr("focus.resolved");
            tracing::debug!(%id, "focus resolved from loaded tiles");
        }
    }

    // ---- view intents ----

    pub fn set_base_style(&mut self, style: BaseStyle) {
        if self.lifecycle.is_destroyed() || style == self.state.base_style {
            return;
        }
        self.state.base_style = style;
        self.persist_map_state();
        match self.lifecycle.state() {
            LifecycleState::Ready | LifecycleState::StyleSwapping => {
                // A swap that supersedes another keeps the pose from before the first.
                if self.captured_camera.is_none() || self.lifecycle.is_ready() {
                    self.captured_camera = self.engine.as_ref().map(|e| e.camera());
                }
                if self.transition(LifecycleEvent::StyleRequested) {
                    self.hover = HoverState::default();
                    self.call("set_style", |e| e.set_style(style.url()));
                }
            }
            // The engine is still loading its first style; the swap has no
            // layers to restore.
            LifecycleState::Initializing => self.call("set_style", |e| e.set_style(style.url())),
            LifecycleState::Uninitialized | LifecycleState::Destroyed => {}
        }
    }

    pub fn toggle_base_style(&mut self) {
        self.set_base_style(self.state.base_style.toggled());
    }

    pub fn set_show_routes(&mut self, show: bool) {
        if self.lifecycle.is_destroyed() {
            return;
        }
        self.state.show_routes = show;
        self.persist_map_state();
        let halo = route_halo_visible(self.state.base_style, show);
        self.guarded("set_layout_property", |e| {
            e.set_layout_property(ROUTE_LAYER, "visibility", &Visibility::from_bool(show).to_value())
        });
        self.guarded("set_layout_property", |e| {
            e.set_layout_property(ROUTE_HALO_LAYER, "visibility", &Visibility::from_bool(halo).to_value())
        });
    }

    pub fn set_show_ways(&mut self, show: bool) {
        if self.lifecycle.is_destroyed() {
            return;
        }
        self.state.show_ways = show;
        self.persist_map_state();
        self.apply_ways();
    }

    fn apply_ways(&mut self) {
        let show = self.state.show_ways;
        let filter = ways_layer_filter(&self.state.legend, show);
        self.guarded("set_layout_property", |e| {
            e.set_layout_property(WAYS_LAYER, "visibility", &Visibility::from_bool(show).to_value())
        });
        self.guarded("set_filter", |e| e.set_filter(WAYS_LAYER, filter.as_ref()));
    }

    pub fn toggle_legend_bucket(&mut self, index: usize) {
        self.state.toggle_legend_bucket(index);
        self.persist_map_state();
        self.apply_ways();
    }

    pub fn select_all_buckets(&mut self) {
        self.state.select_all_buckets();
        self.persist_map_state();
        self.apply_ways();
    }

    pub fn clear_buckets(&mut self) {
        self.state.clear_buckets();
        self.persist_map_state();
        self.apply_ways();
    }

    pub fn set_width_scale(&mut self, scale: f64) {
        let changed = self.state.set_width_scale(scale);
        self.apply_widths(changed);
    }

    pub fn set_affect_routes(&mut self, affect: bool) {
        let changed = self.state.set_affect(affect, self.state.affect_ways);
        self.apply_widths(changed);
    }

    pub fn set_affect_ways(&mut self, affect: bool) {
        let changed = self.state.set_affect(self.state.affect_routes, affect);
        self.apply_widths(changed);
    }

    pub fn reset_widths(&mut self) {
        let changed = self.state.reset_widths();
        self.apply_widths(changed);
    }

    fn apply_widths(&mut self, (routes, ways): (bool, bool)) {
        if routes {
            let width = route_width_expression(self.state.route_width_scale).to_json();
            let halo = route_halo_width_expression(self.state.route_width_scale).to_json();
            self.guarded("set_paint_property", |e| e.set_paint_property(ROUTE_LAYER, "line-width", &width));
            self.guarded("set_paint_property", |e| e.set_paint_property(ROUTE_HALO_LAYER, "line-width", &halo));
        }
        if ways {
            let width = ways_width_expression(self.state.ways_width_scale).to_json();
            self.guarded("set_paint_property", |e| e.set_paint_property(WAYS_LAYER, "line-width", &width));
        }
    }

    pub fn set_terrain_exaggeration(&mut self, value: f64) {
        let value = self.state.set_terrain_exaggeration(value);
        self.guarded("set_terrain", |e| e.set_terrain(&TerrainSpec::dem(value)));
    }

    pub fn reset_terrain(&mut self) {
        self.set_terrain_exaggeration(layers::terrain::DEFAULT_EXAGGERATION);
    }

    // ---- regions ----

    /// First trail layer present, else the style's top symbol layer.
    fn region_anchor(&self) -> Option<String> {
        let engine = self.engine.as_ref()?;
        REGION_INSERT_BEFORE
            .iter()
            .find(|id| engine.has_layer(id))
            .map(|id| id.to_string())
            .or_else(|| engine.top_symbol_layer())
    }

    fn install_region(&mut self, region: RegionId, data: Value) {
        let key = region.as_str();
        let meta = region.meta();
        let source_id = region_source_id(key);
        let before = self.region_anchor();
        self.guarded("add_source", |e| {
            if e.has_source(&source_id) {
                e.set_source_data(&source_id, &data)
            } else {
                e.add_source(&source_id, &region_source(data))
            }
        });
        for layer in region_outline_layers(key, meta.color, self.state.regions.is_visible(region)) {
            self.guarded("add_layer", |e| {
                if e.has_layer(&layer.id) { Ok(()) } else { e.add_layer(&layer, before.as_deref()) }
            });
        }
    }

    /// Hands over a fetched region outline. It is kept for re-registration
    /// after style swaps.
    pub fn set_region_data(&mut self, region: RegionId, data: Value) {
        if self.lifecycle.is_destroyed() {
            return;
        }
        self.regions.insert(region, data.clone());
        if self.lifecycle.is_ready() {
            self.install_region(region, data);
        }
    }

    pub fn has_region_data(&self, region: RegionId) -> bool {
        self.regions.contains_key(&region)
    }

    /// Flips one region's outline and returns its new visibility.
    pub fn toggle_region(&mut self, region: RegionId) -> bool {
        let visible = self.state.regions.toggle(region);
        self.persist_regions();
        let value = Visibility::from_bool(visible).to_value();
        for layer in region_layer_ids(region.as_str()) {
            self.guarded("set_layout_property", |e| e.set_layout_property(&layer, "visibility", &value));
        }
        visible
    }

    // ---- container ----

    pub fn resize(&mut self) {
        if let Some(e) = self.engine.as_mut() {
            e.resize();
        }
    }

    /// Releases listeners, timers and the engine. Later calls are no-ops.
    pub fn destroy(&mut self) {
        if self.lifecycle.is_destroyed() {
            return;
        }
        self.transition(LifecycleEvent::Destroy);
        self.focus.retire(&mut self.bus, &mut self.timers);
        self.bus.clear();
        self.timers.clear();
        self.cache.clear();
        self.hover = HoverState::default();
        self.captured_camera = None;
        if let Some(mut engine) = self.engine.take() {
            engine.remove();
        }
        tracing::debug!(counters = ?self.metrics.snapshot(), "map adapter destroyed");
    }
}

fn add_source_once<E: MapEngine>(
    engine: &mut E,
    id: &str,
    spec: &SourceSpec,
) -> Result<(), EngineError> {
    if engine.has_source(id) { Ok(()) } else { engine.add_source(id, spec) }
}
