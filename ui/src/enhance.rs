//! Hands selects to the page's widget library, if it installed a hook.

use formwork::enhance::Enhancer;
use formwork::error::EnhanceError;
use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Element;

use crate::web_dom::WebDom;

/// Window function called with each element to enhance
pub const DEFAULT_HOOK: &str = "formworkEnhance";

#[derive(Debug, Clone)]
pub struct JsEnhancer {
    hook: String,
}

impl Default for JsEnhancer {
    fn default() -> Self {
        Self::new(DEFAULT_HOOK)
    }
}

impl JsEnhancer {
    pub fn new(hook: &str) -> Self {
        Self { hook: hook.to_string() }
    }
}

impl Enhancer<WebDom> for JsEnhancer {
    fn enhance(&mut self, dom: &mut WebDom, node: &Element) -> Result<(), EnhanceError> {
        let hook = Reflect::get(dom.window(), &JsValue::from_str(&self.hook))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| EnhanceError(format!("window.{} is not installed", self.hook)))?;
        hook.call1(&JsValue::NULL, node)
            .map(|_| ())
            .map_err(|e| EnhanceError(format!("{:?}", e)))
    }
}
