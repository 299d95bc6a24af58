//! Browser control panel for an embedded showcase.
//!
//! The host page owns the markup and wires its buttons to the exported
//! functions below. All state lives in one thread-local; async work is
//! spawned on the page's event loop and re-checks the session generation
//! before touching the DOM.

use console_error_panic_hook::set_once;
use credentials::{
    CookieCredentialStore, CredentialError, CredentialStore, InMemoryCredentialStore, SdkKey,
};
use futures::FutureExt;
use futures::future::{AbortHandle, Abortable};
use gloo_net::http::Request;
use runtime::{Notice, NoticeBoard};
use std::cell::RefCell;
use std::rc::Rc;
use sweeps::export::CSV_MIME;
use sweeps::model::DEFAULT_MODEL;
use sweeps::{
    CurrentLocation, LoadError, ModelSid, MoveOptions, NavigateError, Navigated, NavigationMode,
    NavigationRequest, Session, Showcase, encode_csv, export_file_name, follow_locations,
    load_model, showcase_url, sync_current_location,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

mod config;
mod dom;
mod render;
mod sdk;

pub use config::PanelConfig;
use sdk::{JsConnector, JsShowcase};

const SHOWCASE_LOADED: &str = "Matterport Showcase loaded.";
const LABELS_FAILED: &str = "Error: Could not fetch sweep labels.";
const KEY_SAVED: &str = "SDK Key saved successfully!";
const KEY_INVALID: &str = "Please enter a valid SDK Key";

/// Where a notice is displayed. Each control has its own feedback line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Slot {
    /// Main feedback: loading, sweep navigation, credentials.
    Location,
    Legacy,
    Model,
}

#[derive(Debug)]
enum PanelCredentialStore {
    Cookie(CookieCredentialStore),
    Memory(InMemoryCredentialStore),
}

impl PanelCredentialStore {
    fn new(config: &PanelConfig) -> Self {
        match CookieCredentialStore::new(config.cookie_name.clone(), config.credential_ttl_days) {
            Ok(s) => PanelCredentialStore::Cookie(s),
            Err(_) => PanelCredentialStore::Memory(InMemoryCredentialStore::new()),
        }
    }
}

impl CredentialStore for PanelCredentialStore {
    fn load(&self) -> Result<Option<SdkKey>, CredentialError> {
        match self {
            PanelCredentialStore::Cookie(s) => s.load(),
            PanelCredentialStore::Memory(s) => s.load(),
        }
    }

    fn save(&mut self, key: &SdkKey) -> Result<(), CredentialError> {
        match self {
            PanelCredentialStore::Cookie(s) => s.save(key),
            PanelCredentialStore::Memory(s) => s.save(key),
        }
    }

    fn clear(&mut self) -> Result<(), CredentialError> {
        match self {
            PanelCredentialStore::Cookie(s) => s.clear(),
            PanelCredentialStore::Memory(s) => s.clear(),
        }
    }
}

#[derive(Debug)]
struct PanelState {
    config: PanelConfig,
    session: Rc<RefCell<Session>>,
    showcase: Option<JsShowcase>,
    notices: NoticeBoard<Slot>,
    credentials: PanelCredentialStore,
    key: Option<SdkKey>,
}

impl PanelState {
    fn new(config: PanelConfig) -> Self {
        let model = ModelSid::parse(&config.initial_model)
            .unwrap_or_else(|_| ModelSid::new(DEFAULT_MODEL));
        let credentials = PanelCredentialStore::new(&config);
        let key = credentials.load().unwrap_or_else(|err| {
            dom::log_error(&format!("could not read stored SDK key: {err}"));
            None
        });
        Self {
            notices: NoticeBoard::new(config.notice_ttl_ms),
            session: Rc::new(RefCell::new(Session::new(model))),
            showcase: None,
            credentials,
            key,
            config,
        }
    }
}

thread_local! {
    static STATE: RefCell<PanelState> = RefCell::new(PanelState::new(PanelConfig::default()));
}

/// Runs `f` with the panel state borrowed. Never await inside `f`.
fn with_state<F, R>(f: F) -> R
where
    F: FnOnce(&mut PanelState) -> R,
{
    STATE.with(|state| f(&mut state.borrow_mut()))
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

fn notify(slot: Slot, notice: Notice) {
    let now = now_ms();
    let due = with_state(|s| s.notices.show(slot, notice.clone(), now));
    if let Err(err) = dom::show_notice(slot, &notice) {
        dom::log_error(&format!("notice render failed: {err:?}"));
    }
    schedule_tick(due.saturating_sub(now));
}

fn schedule_tick(delay_ms: u64) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let tick = Closure::once_into_js(move || tick_notices());
    let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
    if let Err(err) = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(tick.unchecked_ref(), delay)
    {
        dom::log_error(&format!("could not schedule notice clear: {err:?}"));
    }
}

fn render_table(session: &RefCell<Session>) {
    if let Err(err) = dom::render_table(session.borrow().table()) {
        dom::log_error(&format!("table render failed: {err:?}"));
    }
}

fn render_location(location: Option<&CurrentLocation>) {
    if let Err(err) = dom::render_location(location) {
        dom::log_error(&format!("location render failed: {err:?}"));
    }
}

fn clear_input(id: &str) {
    if let Err(err) = dom::clear_input(id) {
        dom::log_error(&format!("could not clear #{id}: {err:?}"));
    }
}

fn set_key_dialog(visible: bool, prefill: Option<&str>) {
    if let Err(err) = dom::set_key_dialog(visible, prefill) {
        dom::log_error(&format!("key dialog unavailable: {err:?}"));
    }
}

/// The key dialog opens before the iframe loads so a stalled page cannot
/// hide it.
fn needs_key_prompt(key: Option<&SdkKey>) -> bool {
    key.is_none()
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Boots the panel with an optional JSON config and loads the initial model.
#[wasm_bindgen]
pub fn boot(config_json: Option<String>) -> Result<(), JsValue> {
    let config = PanelConfig::from_json(config_json.as_deref().unwrap_or(""))
        .map_err(|e| JsValue::from_str(&format!("invalid panel config: {e}")))?;
    install(config);
    Ok(())
}

/// Like [`boot`], with the config fetched from `url`.
#[wasm_bindgen]
pub fn boot_from_url(url: String) {
    spawn_local(async move {
        let config = match fetch_config(&url).await {
            Ok(config) => config,
            Err(err) => {
                dom::log_error(&format!("Failed to fetch panel config: {err:?}"));
                PanelConfig::default()
            }
        };
        install(config);
    });
}

async fn fetch_config(url: &str) -> Result<PanelConfig, JsValue> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let text = resp
        .text()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    PanelConfig::from_json(&text).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn install(config: PanelConfig) {
    let state = PanelState::new(config);
    let session = Rc::clone(&state.session);
    let previous = STATE.with(|s| s.replace(state));
    previous.session.borrow_mut().reset(None);

    render_table(&session);
    render_location(None);
    spawn_local(load_active_model());
}

/// Loads the session's model into the iframe, connects and builds the table.
async fn load_active_model() {
    let (session, config, key) = with_state(|s| {
        (Rc::clone(&s.session), s.config.clone(), s.key.clone())
    });
    let (generation, model) = {
        let s = session.borrow();
        (s.generation(), s.model().clone())
    };
    tracing::info!(%model, %generation, "loading showcase");
    if needs_key_prompt(key.as_ref()) {
        set_key_dialog(true, None);
    }

    let url = match showcase_url(&config.showcase_origin, &model) {
        Ok(url) => url,
        Err(err) => {
            dom::log_error(&format!("Error building showcase URL: {err}"));
            notify(Slot::Location, Notice::error("Error loading Matterport Showcase."));
            return;
        }
    };
    if let Err(err) = sdk::load_iframe(&config.iframe_id, url.as_str()).await {
        dom::log_error(&format!("Error loading showcase iframe: {err:?}"));
        notify(Slot::Location, Notice::error("Error loading Matterport Showcase."));
        return;
    }
    if !session.borrow().is_current(generation) {
        return;
    }

    let connector = JsConnector::new(config.iframe_id.clone());
    let loaded = match load_model(&session, &connector, key.as_ref()).await {
        Ok(loaded) => loaded,
        Err(LoadError::Superseded) => {
            dom::log("showcase load superseded by a newer one");
            return;
        }
        Err(err) => {
            match std::error::Error::source(&err) {
                Some(cause) => dom::log_error(&format!("{err} ({cause})")),
                None => dom::log_error(&err.to_string()),
            }
            notify(Slot::Location, Notice::error(err.to_string()));
            if err == LoadError::MissingCredential {
                set_key_dialog(true, None);
            }
            return;
        }
    };

    let showcase = loaded.showcase;
    let attached = with_state(|s| {
        let same = Rc::ptr_eq(&s.session, &session);
        if same {
            s.showcase = Some(showcase.clone());
        }
        same
    });
    if !attached {
        return;
    }

    notify(Slot::Location, Notice::success(SHOWCASE_LOADED));
    if let Some(err) = &loaded.label_error {
        dom::log_error(&format!("Error fetching sweep labels: {err}"));
        notify(Slot::Location, Notice::error(LABELS_FAILED));
    }
    render_table(&session);

    let subscription = showcase.subscribe_current_sweep();
    let (handle, registration) = AbortHandle::new_pair();
    if session.borrow_mut().attach_follower(generation, handle) {
        let session = Rc::clone(&session);
        let showcase = showcase.clone();
        let follower = async move {
            follow_locations(&session, &showcase, subscription, generation, |location| {
                render_location(Some(location))
            })
            .await;
        };
        spawn_local(Abortable::new(follower, registration).map(|_| ()));
    }

    match sync_current_location(&session, &showcase, generation).await {
        Ok(Some(location)) => render_location(Some(&location)),
        Ok(None) => {}
        Err(err) => dom::log_error(&format!("Error in initial sweep fetch: {err}")),
    }
}

/// Moves the viewer to the sweep id the operator typed.
#[wasm_bindgen]
pub fn navigate_sweep(query: String) {
    spawn_local(run_navigation(query, NavigationMode::Sweep));
}

/// Moves the viewer to the sweep whose legacy pano id the operator typed.
#[wasm_bindgen]
pub fn navigate_pano(query: String) {
    spawn_local(run_navigation(query, NavigationMode::Pano));
}

async fn run_navigation(query: String, mode: NavigationMode) {
    let (slot, input) = match mode {
        NavigationMode::Sweep => (Slot::Location, dom::SWEEP_INPUT_ID),
        NavigationMode::Pano => (Slot::Legacy, dom::LEGACY_INPUT_ID),
    };
    match try_navigation(&query, mode).await {
        Ok(navigated) => {
            notify(slot, Notice::success(navigated.success_text()));
            clear_input(input);
        }
        Err(err) => {
            if let NavigateError::Move { error, .. } = &err {
                dom::log_error(&format!("Error navigating to sweep: {error:?}"));
            }
            notify(slot, Notice::error(err.to_string()));
        }
    }
}

async fn try_navigation(query: &str, mode: NavigationMode) -> Result<Navigated, NavigateError> {
    let (session, showcase, transition) = with_state(|s| {
        (Rc::clone(&s.session), s.showcase.clone(), s.config.transition)
    });
    let showcase = showcase.ok_or(NavigateError::NotConnected)?;
    let request = NavigationRequest::prepare(session.borrow().table(), query, mode)?;
    request.dispatch(&showcase, MoveOptions { transition }).await
}

/// Switches to another model, dropping everything derived from the current one.
#[wasm_bindgen]
pub fn change_model(sid: String) {
    let session = with_state(|s| Rc::clone(&s.session));
    let selected = session.borrow_mut().select_model(&sid);
    if let Err(err) = selected {
        notify(Slot::Model, Notice::error(err.to_string()));
        return;
    }
    let model = session.borrow().model().clone();
    tracing::info!(%model, "model change requested");
    with_state(|s| s.showcase = None);
    render_table(&session);
    render_location(None);

    notify(Slot::Model, Notice::success(format!("Model changed to: {model}")));
    clear_input(dom::MODEL_INPUT_ID);
    spawn_local(load_active_model());
}

/// Stores a new SDK key and reloads the showcase with it.
#[wasm_bindgen]
pub fn save_sdk_key(key: String) {
    let key = match SdkKey::parse(&key) {
        Ok(key) => key,
        Err(err) => {
            dom::log_error(&err.to_string());
            dom::alert(KEY_INVALID);
            return;
        }
    };
    let (session, saved) = with_state(|s| {
        let saved = s.credentials.save(&key);
        s.key = Some(key);
        s.showcase = None;
        (Rc::clone(&s.session), saved)
    });
    if let Err(err) = saved {
        dom::log_error(&format!("could not persist SDK key: {err}"));
    }
    set_key_dialog(false, None);

    session.borrow_mut().reset(None);
    render_table(&session);
    render_location(None);
    notify(Slot::Location, Notice::success(KEY_SAVED));
    spawn_local(load_active_model());
}

/// Shows the key dialog, prefilled with the stored key.
#[wasm_bindgen]
pub fn open_sdk_key_dialog() {
    let current = with_state(|s| s.key.as_ref().map(|k| k.expose().to_string()));
    set_key_dialog(true, Some(current.as_deref().unwrap_or("")));
}

#[wasm_bindgen]
pub fn close_sdk_key_dialog() {
    set_key_dialog(false, None);
}

/// Downloads the conversion table as `sweep_id_map_<model>.csv`.
#[wasm_bindgen]
pub fn export_csv() -> Result<(), JsValue> {
    let session = with_state(|s| Rc::clone(&s.session));
    let (csv, file_name) = {
        let s = session.borrow();
        (encode_csv(s.table().rows()), export_file_name(s.model()))
    };
    dom::download_text(&file_name, CSV_MIME, &csv)
}

#[wasm_bindgen]
pub fn help_html() -> String {
    render::HELP_HTML.to_string()
}

/// Applies due notice clears. Also driven by an internal timer.
#[wasm_bindgen]
pub fn tick_notices() {
    let hidden = with_state(|s| s.notices.expire(now_ms()));
    for slot in hidden {
        if let Err(err) = dom::hide_notice(slot) {
            dom::log_error(&format!("notice clear failed: {err:?}"));
        }
    }
}
