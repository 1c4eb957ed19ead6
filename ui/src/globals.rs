//! Page-supplied inputs: lookup tables on `window` and inline settings.

use formwork::choice::ChoiceStore;
use formwork::config::Settings;
use formwork::dom::Dom;
use js_sys::{Reflect, JSON};
use serde_json::{Map, Value};
use wasm_bindgen::JsValue;
use web_sys::Window;

use crate::web_dom::WebDom;

/// Globals the server renders into the page
pub const STORE_GLOBALS: [&str; 3] = ["ni_counties", "ie_counties", "pack_temp_lu"];
pub const SETTINGS_SCRIPT_ID: &str = "formwork-settings";

fn global_json(window: &Window, name: &str) -> Option<Value> {
    let value = Reflect::get(window, &JsValue::from_str(name)).ok()?;
    if value.is_undefined() || value.is_null() {
        return None;
    }
    let raw: String = JSON::stringify(&value).ok()?.into();
    match serde_json::from_str(&raw) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!("window.{} is not JSON: {}", name, e);
            None
        }
    }
}

pub fn choice_store(window: &Window) -> ChoiceStore {
    let globals: Map<String, Value> = STORE_GLOBALS
        .iter()
        .filter_map(|name| global_json(window, name).map(|v| (name.to_string(), v)))
        .collect();
    ChoiceStore::from_globals(&Value::Object(globals))
}

/// Settings from `<script id="formwork-settings">`, defaults when absent or invalid
pub fn settings(dom: &WebDom) -> Settings {
    let Some(script) = dom.element_by_id(SETTINGS_SCRIPT_ID) else {
        return Settings::default();
    };
    match Settings::from_json(&dom.text(&script)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Ignoring #{}: {}", SETTINGS_SCRIPT_ID, e);
            Settings::default()
        }
    }
}
