//! Browser entry point for the trail map.
//!
//! The page calls [`init`] once with a container id and a JSON config, then
//! forwards UI intents through the exported functions. State lives in one
//! thread-local [`App`]; engine callbacks that fire while it is borrowed are
//! queued and drained as soon as the current call returns.

mod mapbox;
mod panel;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use catalog::regions::{RegionId, region_url};
use catalog::store::LocalStorageStore;
use foundation::time::Time;
use gloo_net::http::Request;
use layers::symbology::BaseStyle;
use search::{AlgoliaClient, SearchClient, SearchConfig, SearchError, SearchPage, SearchRequest, SearchState, SuggestionKey, Suggestions};
use serde_json::Value;
use viewer::{MapAdapter, ViewerConfig};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use mapbox::{Inbound, MapboxEngine, decode_event};

const TICK_INTERVAL_MS: i32 = 250;

type EventCallback = Closure<dyn FnMut(String, f64, f64, Option<String>)>;

struct SearchSession {
    client: AlgoliaClient,
    index: String,
    state: SearchState,
    suggestions: Suggestions,
}

struct App {
    adapter: MapAdapter<MapboxEngine, LocalStorageStore>,
    search: SearchSession,
    on_change: Option<js_sys::Function>,
    _on_event: EventCallback,
    ticker: Option<(i32, Closure<dyn FnMut()>)>,
}

impl App {
    fn dispatch(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Engine(event) => {
                self.adapter.tick(now());
                self.adapter.handle_event(event);
            }
            Inbound::Key(key) => {
                self.adapter.key_down(&key);
            }
        }
    }
}

thread_local! {
    static STATE: RefCell<Option<App>> = const { RefCell::new(None) };
    static PENDING: RefCell<VecDeque<Inbound>> = const { RefCell::new(VecDeque::new()) };
    static NOTIFYING: Cell<bool> = const { Cell::new(false) };
}

fn now() -> Time {
    Time(js_sys::Date::now() / 1000.0)
}

fn log_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

fn log_warn(msg: &str) {
    web_sys::console::warn_1(&JsValue::from_str(msg));
}

/// Runs `f` against the app, then drains queued engine events and notifies
/// the page. Returns the default when the app is missing or busy.
fn with_app<F, R>(f: F) -> R
where
    F: FnOnce(&mut App) -> R,
    R: Default,
{
    let out = STATE.with(|cell| match cell.try_borrow_mut() {
        Ok(mut slot) => slot.as_mut().map(f).unwrap_or_default(),
        Err(_) => {
            log_warn("trailmap: re-entrant call ignored");
            R::default()
        }
    });
    drain_pending();
    notify();
    out
}

/// Read-only access that never notifies, for the page's render pass.
fn read_app<F, R>(f: F) -> R
where
    F: FnOnce(&App) -> R,
    R: Default,
{
    STATE.with(|cell| match cell.try_borrow() {
        Ok(slot) => slot.as_ref().map(f).unwrap_or_default(),
        Err(_) => R::default(),
    })
}

fn drain_pending() {
    STATE.with(|cell| {
        let Ok(mut slot) = cell.try_borrow_mut() else {
            return;
        };
        while let Some(next) = PENDING.with(|q| q.borrow_mut().pop_front()) {
            if let Some(app) = slot.as_mut() {
                app.dispatch(next);
            }
        }
    });
}

fn notify() {
    if NOTIFYING.with(|n| n.replace(true)) {
        return;
    }
    let callback = read_app(|app| app.on_change.clone());
    if let Some(cb) = callback {
        if let Err(e) = cb.call0(&JsValue::NULL) {
            log_warn(&format!("trailmap: change listener failed: {e:?}"));
        }
    }
    NOTIFYING.with(|n| n.set(false));
}

fn on_engine_event(name: String, x: f64, y: f64, text: Option<String>) {
    let Some(inbound) = decode_event(&name, x, y, text) else {
        return;
    };
    PENDING.with(|q| q.borrow_mut().push_back(inbound));
    drain_pending();
    if name != "mousemove" {
        notify();
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    Ok(())
}

/// Creates the map inside `container_id`.
///
/// `config_json` holds the viewer fields (`mapboxToken`, `center`, `zoom`,
/// `bearing`, `pitch`, `style`, `assetBase`) plus a `search` object with
/// `appId`, `searchKey` and an optional `indexName`. Missing credentials
/// fail here.
#[wasm_bindgen]
pub fn init(container_id: &str, config_json: &str) -> Result<(), JsValue> {
    if read_app(|_| true) {
        return Err(JsValue::from_str("trailmap is already initialized"));
    }
    let config = ViewerConfig::from_json(config_json).map_err(|e| {
        log_error(&e.to_string());
        JsValue::from_str(&e.to_string())
    })?;
    let search_config = search_config(config_json).map_err(|e| {
        log_error(&e.to_string());
        JsValue::from_str(&e.to_string())
    })?;

    let store = LocalStorageStore::new().unwrap_or_else(|e| {
        log_warn(&format!("trailmap: {e}; view state will not persist"));
        LocalStorageStore::default()
    });
    let state = MapAdapter::<MapboxEngine, LocalStorageStore>::restore_state(&store, &config);

    let on_event: EventCallback = Closure::new(on_engine_event);
    let engine = MapboxEngine::create(
        container_id,
        &config.mapbox_token,
        &state,
        on_event.as_ref().unchecked_ref(),
    )?;
    let mut adapter = MapAdapter::with_state(engine, store, state);
    adapter.mount().map_err(|e| JsValue::from_str(&e.to_string()))?;

    let app = App {
        adapter,
        search: SearchSession {
            client: AlgoliaClient::new(&search_config),
            index: search_config.index_name.clone(),
            state: SearchState::new(search_config.hits_per_page),
            suggestions: Suggestions::default(),
        },
        on_change: None,
        _on_event: on_event,
        ticker: None,
    };
    STATE.with(|cell| *cell.borrow_mut() = Some(app));

    start_ticker()?;
    for region in RegionId::ALL {
        load_region(region, config.asset_base.clone());
    }
    run_search(|s| Some(s.state.set_query("")));
    Ok(())
}

fn search_config(config_json: &str) -> Result<SearchConfig, SearchError> {
    let root: Value = serde_json::from_str(config_json).unwrap_or(Value::Null);
    let section = root.get("search").cloned().unwrap_or(Value::Null);
    SearchConfig::from_lookup(|key| {
        let field = match key {
            "ALGOLIA_APP_ID" => "appId",
            "ALGOLIA_SEARCH_KEY" => "searchKey",
            "ALGOLIA_INDEX_NAME" => "indexName",
            _ => return None,
        };
        section.get(field).and_then(Value::as_str).map(str::to_string)
    })
}

fn start_ticker() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let tick: Closure<dyn FnMut()> = Closure::new(|| with_app(|app| app.adapter.tick(now())));
    let handle = window
        .set_interval_with_callback_and_timeout_and_arguments_0(tick.as_ref().unchecked_ref(), TICK_INTERVAL_MS)?;
    with_app(|app| app.ticker = Some((handle, tick)));
    Ok(())
}

fn load_region(region: RegionId, asset_base: String) {
    spawn_local(async move {
        let url = region_url(&asset_base, region.meta().file);
        match fetch_json(&url).await {
            Ok(data) => with_app(|app| app.adapter.set_region_data(region, data)),
            Err(err) => log_warn(&format!("trailmap: region {region} unavailable: {err}")),
        }
    });
}

async fn fetch_json(url: &str) -> Result<Value, String> {
    let resp = Request::get(url).send().await.map_err(|e| e.to_string())?;
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    let text = resp.text().await.map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

/// Builds a request from the search session and runs it in the background.
fn run_search(build: impl FnOnce(&mut SearchSession) -> Option<SearchRequest>) {
    let job = with_app(|app| {
        build(&mut app.search).map(|req| (app.search.client.clone(), app.search.index.clone(), req))
    });
    let Some((client, index, request)) = job else {
        return;
    };
    spawn_local(async move {
        let result = client.search(&index, &request).await;
        with_app(|app| apply_search(&mut app.search, &request, result));
    });
}

fn apply_search(session: &mut SearchSession, request: &SearchRequest, result: Result<SearchPage, SearchError>) {
    match result {
        Ok(page) => {
            if session.state.apply(request, page) {
                let query = session.state.query().to_string();
                session.suggestions.update(&query, session.state.hits());
            }
        }
        Err(e) => log_warn(&format!("trailmap: {e}")),
    }
}

fn focus_chosen(app: &mut App, hit: Option<search::TrailHit>) -> bool {
    match hit {
        Some(hit) => {
            app.adapter.focus_hit(&hit, now());
            true
        }
        None => false,
    }
}

/// Registers the callback invoked after every state change.
#[wasm_bindgen]
pub fn subscribe(callback: js_sys::Function) {
    with_app(|app| app.on_change = Some(callback));
}

/// Snapshot of everything the panels render, as JSON.
#[wasm_bindgen]
pub fn view_json() -> String {
    read_app(|app| panel::view_json(app.adapter.state(), &app.adapter.details()).to_string())
}

#[wasm_bindgen]
pub fn search_json() -> String {
    read_app(|app| panel::search_json(&app.search.state, &app.search.suggestions).to_string())
}

#[wasm_bindgen]
pub fn legend_json() -> String {
    panel::legend_json().to_string()
}

#[wasm_bindgen]
pub fn toggle_base_style() {
    with_app(|app| app.adapter.toggle_base_style());
}

/// `"dark"` or `"outdoors"`.
#[wasm_bindgen]
pub fn set_base_style(name: &str) -> Result<(), JsValue> {
    let style = match name {
        "dark" => BaseStyle::Dark,
        "outdoors" => BaseStyle::Outdoors,
        other => return Err(JsValue::from_str(&format!("unknown base style '{other}'"))),
    };
    with_app(|app| app.adapter.set_base_style(style));
    Ok(())
}

#[wasm_bindgen]
pub fn set_show_routes(show: bool) {
    with_app(|app| app.adapter.set_show_routes(show));
}

#[wasm_bindgen]
pub fn set_show_ways(show: bool) {
    with_app(|app| app.adapter.set_show_ways(show));
}

#[wasm_bindgen]
pub fn set_width_scale(scale: f64) {
    with_app(|app| app.adapter.set_width_scale(scale));
}

#[wasm_bindgen]
pub fn set_affect_routes(affect: bool) {
    with_app(|app| app.adapter.set_affect_routes(affect));
}

#[wasm_bindgen]
pub fn set_affect_ways(affect: bool) {
    with_app(|app| app.adapter.set_affect_ways(affect));
}

#[wasm_bindgen]
pub fn reset_widths() {
    with_app(|app| app.adapter.reset_widths());
}

#[wasm_bindgen]
pub fn set_terrain_exaggeration(value: f64) {
    with_app(|app| app.adapter.set_terrain_exaggeration(value));
}

#[wasm_bindgen]
pub fn reset_terrain() {
    with_app(|app| app.adapter.reset_terrain());
}

#[wasm_bindgen]
pub fn toggle_legend_bucket(index: usize) {
    with_app(|app| app.adapter.toggle_legend_bucket(index));
}

#[wasm_bindgen]
pub fn select_all_buckets() {
    with_app(|app| app.adapter.select_all_buckets());
}

#[wasm_bindgen]
pub fn clear_buckets() {
    with_app(|app| app.adapter.clear_buckets());
}

/// Returns the region's new visibility.
#[wasm_bindgen]
pub fn toggle_region(region: &str) -> Result<bool, JsValue> {
    let region: RegionId = region.parse().map_err(|e: String| JsValue::from_str(&e))?;
    Ok(with_app(|app| app.adapter.toggle_region(region)))
}

#[wasm_bindgen]
pub fn clear_selection() {
    with_app(|app| app.adapter.clear_selection());
}

#[wasm_bindgen]
pub fn search_query(query: String) {
    run_search(move |s| Some(s.state.set_query(&query)));
}

#[wasm_bindgen]
pub fn search_toggle_refinement(attribute: String, value: String) {
    run_search(move |s| Some(s.state.toggle_refinement(&attribute, &value)));
}

#[wasm_bindgen]
pub fn search_clear_refinements() {
    run_search(|s| Some(s.state.clear_refinements()));
}

#[wasm_bindgen]
pub fn search_show_more() {
    run_search(|s| s.state.show_more());
}

/// Keyboard handling for the suggestion list. Returns whether a hit was
/// chosen.
#[wasm_bindgen]
pub fn search_key(key: &str) -> bool {
    let Some(key) = SuggestionKey::from_key_name(key) else {
        return false;
    };
    with_app(|app| {
        let hit = app.search.suggestions.key(key);
        focus_chosen(app, hit)
    })
}

#[wasm_bindgen]
pub fn search_hover(index: usize) {
    with_app(|app| app.search.suggestions.hover(index));
}

#[wasm_bindgen]
pub fn search_close() {
    with_app(|app| app.search.suggestions.close());
}

/// Picks a suggestion by index.
#[wasm_bindgen]
pub fn search_choose(index: usize) -> bool {
    with_app(|app| {
        let hit = app.search.suggestions.choose(index);
        focus_chosen(app, hit)
    })
}

/// Picks an entry of the full results list by index.
#[wasm_bindgen]
pub fn search_choose_result(index: usize) -> bool {
    with_app(|app| {
        let hit = app.search.state.hits().get(index).cloned();
        focus_chosen(app, hit)
    })
}

#[wasm_bindgen]
pub fn resize() {
    with_app(|app| app.adapter.resize());
}

/// Tears down the map, listeners and the tick timer.
#[wasm_bindgen]
pub fn destroy() {
    let app = STATE.with(|cell| cell.try_borrow_mut().ok().and_then(|mut slot| slot.take()));
    let Some(mut app) = app else {
        return;
    };
    if let Some((handle, _tick)) = app.ticker.take() {
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(handle);
        }
    }
    app.adapter.destroy();
    PENDING.with(|q| q.borrow_mut().clear());
}
