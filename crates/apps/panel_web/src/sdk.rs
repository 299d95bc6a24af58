//! Bindings to the showcase SDK that the host page loads as `window.MP_SDK`.

use std::cell::RefCell;
use std::rc::Rc;

use credentials::SdkKey;
use sweeps::{
    ConnectionError, Connector, ConversionError, IdentifierMap, LabelError, ModelSid, MoveError,
    MoveOptions, QueryError, Showcase, Subscription, SweepId,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen(inline_js = "
export function panel_load_iframe(iframe_id, src) {
    const iframe = document.getElementById(iframe_id);
    if (!iframe) {
        throw new Error('showcase iframe not found: ' + iframe_id);
    }
    return new Promise((resolve) => {
        iframe.addEventListener('load', () => resolve(true), { once: true });
        iframe.src = src;
    });
}

export function mp_connect(iframe_id, key) {
    const iframe = document.getElementById(iframe_id);
    if (!iframe) {
        throw new Error('showcase iframe not found: ' + iframe_id);
    }
    if (!window.MP_SDK) {
        throw new Error('MP_SDK is not loaded');
    }
    return window.MP_SDK.connect(iframe, key, '');
}

export function mp_create_id_map(sdk) {
    return sdk.Sweep.Conversion.createIdMap().then((map) => JSON.stringify(map || {}));
}

export function mp_label_from_id(sdk, id) {
    return sdk.Sweep.Conversion.getLabelFromId(id);
}

export function mp_current_sweep(sdk) {
    return sdk.Sweep.getCurrent().then((sweep) => (sweep && sweep.id) ? sweep.id : null);
}

export function mp_subscribe_sweep(sdk, callback) {
    return sdk.Sweep.current.subscribe((sweep) => {
        if (sweep && sweep.id) {
            callback(sweep.id);
        }
    });
}

export function mp_cancel_subscription(handle) {
    if (handle && typeof handle.cancel === 'function') {
        handle.cancel();
    }
}

export function mp_move_to(sdk, id, transition) {
    return sdk.Sweep.moveTo(id, { transition: transition });
}
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn panel_load_iframe(iframe_id: &str, src: &str) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch)]
    fn mp_connect(iframe_id: &str, key: &str) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch)]
    fn mp_create_id_map(sdk: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch)]
    fn mp_label_from_id(sdk: &JsValue, id: &str) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch)]
    fn mp_current_sweep(sdk: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch)]
    fn mp_subscribe_sweep(
        sdk: &JsValue,
        callback: &Closure<dyn FnMut(String)>,
    ) -> Result<JsValue, JsValue>;

    fn mp_cancel_subscription(handle: &JsValue);

    #[wasm_bindgen(catch)]
    fn mp_move_to(sdk: &JsValue, id: &str, transition: &str) -> Result<js_sys::Promise, JsValue>;
}

/// `err.message` when the rejection carries one.
pub fn js_error_message(err: &JsValue) -> Option<String> {
    js_sys::Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .filter(|m| !m.trim().is_empty())
}

pub fn js_error_text(err: &JsValue) -> String {
    js_error_message(err)
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"))
}

async fn settle(promise: Result<js_sys::Promise, JsValue>) -> Result<JsValue, JsValue> {
    JsFuture::from(promise?).await
}

/// Points the iframe at `src` and waits for its `load` event.
pub async fn load_iframe(iframe_id: &str, src: &str) -> Result<(), JsValue> {
    settle(panel_load_iframe(iframe_id, src)).await?;
    Ok(())
}

/// A connected SDK handle. Cloning shares the same JS object.
#[derive(Debug, Clone)]
pub struct JsShowcase {
    sdk: JsValue,
}

type Registration = (JsValue, Closure<dyn FnMut(String)>);

impl Showcase for JsShowcase {
    async fn create_id_map(&self) -> Result<IdentifierMap, ConversionError> {
        let raw = settle(mp_create_id_map(&self.sdk))
            .await
            .map_err(|e| ConversionError {
                message: js_error_text(&e),
            })?;
        let raw = raw.as_string().unwrap_or_default();
        serde_json::from_str(&raw).map_err(|e| ConversionError {
            message: format!("unexpected id map payload: {e}"),
        })
    }

    async fn label_for(&self, sweep: &SweepId) -> Result<Option<String>, LabelError> {
        // A synchronous throw means the conversion namespace itself is missing.
        let promise = mp_label_from_id(&self.sdk, sweep.as_str())
            .map_err(|e| LabelError::unavailable(js_error_text(&e)))?;
        let value = JsFuture::from(promise)
            .await
            .map_err(|e| LabelError::item(js_error_text(&e)))?;
        Ok(value.as_string())
    }

    async fn current_sweep(&self) -> Result<Option<SweepId>, QueryError> {
        let value = settle(mp_current_sweep(&self.sdk))
            .await
            .map_err(|e| QueryError {
                message: js_error_text(&e),
            })?;
        Ok(value
            .as_string()
            .and_then(|id| SweepId::parse(&id).ok()))
    }

    fn subscribe_current_sweep(&self) -> Subscription {
        let slot: Rc<RefCell<Option<Registration>>> = Rc::default();
        let cancel_slot = Rc::clone(&slot);
        let (sink, subscription) = Subscription::channel(move || {
            if let Some((handle, _callback)) = cancel_slot.borrow_mut().take() {
                mp_cancel_subscription(&handle);
            }
        });

        let callback = Closure::<dyn FnMut(String)>::new(move |id: String| {
            if let Ok(sweep) = SweepId::parse(&id) {
                sink.push(sweep);
            }
        });
        match mp_subscribe_sweep(&self.sdk, &callback) {
            Ok(handle) => *slot.borrow_mut() = Some((handle, callback)),
            Err(err) => {
                // Dropping the callback closes the stream.
                web_sys::console::error_1(&JsValue::from_str(&format!(
                    "sweep subscription failed: {}",
                    js_error_text(&err)
                )));
            }
        }
        subscription
    }

    async fn move_to(&self, sweep: &SweepId, options: MoveOptions) -> Result<(), MoveError> {
        settle(mp_move_to(
            &self.sdk,
            sweep.as_str(),
            options.transition.as_str(),
        ))
        .await
        .map_err(|e| MoveError::new(js_error_message(&e).unwrap_or_default()))?;
        Ok(())
    }
}

/// Connects through the iframe that hosts the showcase.
#[derive(Debug, Clone)]
pub struct JsConnector {
    iframe_id: String,
}

impl JsConnector {
    pub fn new(iframe_id: impl Into<String>) -> Self {
        Self {
            iframe_id: iframe_id.into(),
        }
    }
}

impl Connector for JsConnector {
    type Showcase = JsShowcase;

    async fn connect(&self, model: &ModelSid, key: &SdkKey) -> Result<JsShowcase, ConnectionError> {
        let sdk = settle(mp_connect(&self.iframe_id, key.expose()))
            .await
            .map_err(|e| ConnectionError {
                message: js_error_text(&e),
            })?;
        web_sys::console::log_1(&JsValue::from_str(&format!(
            "Matterport SDK connected for model {model}"
        )));
        Ok(JsShowcase { sdk })
    }
}
