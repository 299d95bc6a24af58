//! DOM access for the panel page.

use runtime::{Notice, NoticeKind};
use sweeps::{CurrentLocation, ReconciliationTable};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlAnchorElement, HtmlElement, HtmlInputElement};

use crate::Slot;
use crate::render;

pub const SWEEP_INPUT_ID: &str = "sweepId";
pub const LEGACY_INPUT_ID: &str = "legacySweepId";
pub const MODEL_INPUT_ID: &str = "modelId";
pub const KEY_INPUT_ID: &str = "sdkKeyInput";
pub const KEY_DIALOG_ID: &str = "sdkKeyModal";
pub const TABLE_BODY_SELECTOR: &str = "#id-map-table tbody";
pub const CURRENT_SWEEP_ID: &str = "current-sweep-id";
pub const CURRENT_PANO_ID: &str = "legacy-sweep-id";
pub const CURRENT_LABEL_ID: &str = "current-sweep-label";
pub const SWEEP_INFO_SELECTOR: &str = ".sweep-info";

impl Slot {
    fn element_id(self) -> &'static str {
        match self {
            Slot::Location => "feedback",
            Slot::Legacy => "legacyFeedback",
            Slot::Model => "modelFeedback",
        }
    }
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document unavailable"))
}

fn element<T: JsCast>(id: &str) -> Result<T, JsValue> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element #{id} has an unexpected type")))
}

pub fn show_notice(slot: Slot, notice: &Notice) -> Result<(), JsValue> {
    let el: HtmlElement = element(slot.element_id())?;
    el.set_text_content(Some(&notice.message));
    el.set_class_name(&notice_class(notice.kind));
    Ok(())
}

pub fn hide_notice(slot: Slot) -> Result<(), JsValue> {
    let el: HtmlElement = element(slot.element_id())?;
    el.set_class_name("feedback");
    Ok(())
}

pub fn render_table(table: &ReconciliationTable) -> Result<(), JsValue> {
    let body = document()?
        .query_selector(TABLE_BODY_SELECTOR)?
        .ok_or_else(|| JsValue::from_str("missing conversion table body"))?;
    body.set_inner_html(&render::table_body_html(table.view()));
    Ok(())
}

/// The label field is not part of every page layout; create it on demand.
fn label_field() -> Result<web_sys::Element, JsValue> {
    let doc = document()?;
    if let Some(el) = doc.get_element_by_id(CURRENT_LABEL_ID) {
        return Ok(el);
    }
    let el = doc.create_element("div")?;
    el.set_id(CURRENT_LABEL_ID);
    el.set_class_name("sweep-info-item");
    if let Some(info) = doc.query_selector(SWEEP_INFO_SELECTOR)? {
        info.append_child(&el)?;
    }
    Ok(el)
}

pub fn render_location(location: Option<&CurrentLocation>) -> Result<(), JsValue> {
    let doc = document()?;
    let fields = match location {
        Some(location) => render::location_fields(location),
        None => Default::default(),
    };
    let [sweep, pano, label] = fields;
    if let Some(el) = doc.get_element_by_id(CURRENT_SWEEP_ID) {
        el.set_inner_html(&sweep);
    }
    if let Some(el) = doc.get_element_by_id(CURRENT_PANO_ID) {
        el.set_inner_html(&pano);
    }
    label_field()?.set_inner_html(&label);
    Ok(())
}

pub fn clear_input(id: &str) -> Result<(), JsValue> {
    element::<HtmlInputElement>(id)?.set_value("");
    Ok(())
}

pub fn set_key_dialog(visible: bool, prefill: Option<&str>) -> Result<(), JsValue> {
    if let Some(value) = prefill {
        element::<HtmlInputElement>(KEY_INPUT_ID)?.set_value(value);
    }
    let dialog: HtmlElement = element(KEY_DIALOG_ID)?;
    dialog
        .style()
        .set_property("display", if visible { "flex" } else { "none" })
}

pub fn alert(message: &str) {
    let Some(window) = web_sys::window() else {
        log_error(&format!("no window for alert: {message}"));
        return;
    };
    if let Err(err) = window.alert_with_message(message) {
        log_error(&format!("alert failed: {err:?}"));
    }
}

/// Offers `text` as a file download named `file_name`.
pub fn download_text(file_name: &str, mime: &str, text: &str) -> Result<(), JsValue> {
    let doc = document()?;
    let parts = js_sys::Array::of1(&JsValue::from_str(text));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime);
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let link: HtmlAnchorElement = doc.create_element("a")?.dyn_into()?;
    link.set_href(&url);
    link.set_download(file_name);
    let body = doc
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?;
    body.append_child(&link)?;
    link.click();
    body.remove_child(&link)?;
    web_sys::Url::revoke_object_url(&url)
}

pub fn log_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}

pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

fn notice_class(kind: NoticeKind) -> String {
    format!("feedback {}", kind.as_str())
}
