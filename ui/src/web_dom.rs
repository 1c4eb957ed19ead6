//! [`Dom`] over the live browser document

use formwork::dom::{Dom, Query};
use wasm_bindgen::{JsCast, JsValue, UnwrapThrowExt};
use web_sys::{
    Document, Element, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
    Window,
};

pub struct WebDom {
    window: Window,
    document: Document,
}

impl WebDom {
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

fn report(op: &str, result: Result<impl Sized, JsValue>) {
    if let Err(e) = result {
        tracing::debug!("DOM {} failed: {:?}", op, e);
    }
}

fn is_display_none(element: &HtmlElement) -> bool {
    element
        .style()
        .get_property_value("display")
        .is_ok_and(|display| display.trim() == "none")
}

impl Dom for WebDom {
    type Node = Element;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query(&self, scope: Option<&Element>, query: &Query) -> Vec<Element> {
        let css = query.to_css();
        let found = match scope {
            Some(scope) => scope.query_selector_all(&css),
            None => self.document.query_selector_all(&css),
        };
        match found {
            Ok(list) => (0..list.length())
                .filter_map(|i| list.item(i))
                .filter_map(|n| n.dyn_into::<Element>().ok())
                .collect(),
            Err(e) => {
                tracing::warn!("Selector {} rejected: {:?}", css, e);
                Vec::new()
            }
        }
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name().to_ascii_lowercase()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn attributes(&self, node: &Element) -> Vec<(String, String)> {
        let attrs = node.attributes();
        (0..attrs.length())
            .filter_map(|i| attrs.item(i))
            .map(|a| (a.name(), a.value()))
            .collect()
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) {
        report("set_attribute", node.set_attribute(name, value));
    }

    fn remove_attribute(&mut self, node: &Element, name: &str) {
        report("remove_attribute", node.remove_attribute(name));
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            node.get_attribute("value").unwrap_or_default()
        }
    }

    fn set_value(&mut self, node: &Element, value: &str) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        }
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn create_element(&mut self, tag: &str) -> Element {
        self.document.create_element(tag).expect_throw("engine tag names are valid")
    }

    fn append_child(&mut self, parent: &Element, child: &Element) {
        report("append_child", parent.append_child(child));
    }

    fn insert_after(&mut self, reference: &Element, node: &Element) {
        report("insert_after", reference.after_with_node_1(node));
    }

    fn remove(&mut self, node: &Element) {
        node.remove();
    }

    fn remove_children(&mut self, node: &Element) {
        while let Some(child) = node.first_child() {
            report("remove_child", node.remove_child(&child));
        }
    }

    fn clone_subtree(&mut self, node: &Element) -> Element {
        node.clone_node_with_deep(true)
            .expect_throw("element is cloneable")
            .unchecked_into::<Element>()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn children(&self, node: &Element) -> Vec<Element> {
        let children = node.children();
        (0..children.length()).filter_map(|i| children.item(i)).collect()
    }

    fn set_hidden(&mut self, node: &Element, hidden: bool) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            element.set_hidden(hidden);
            // Templates are often hidden with an inline `display: none`
            if !hidden && is_display_none(element) {
                report("show", element.style().remove_property("display"));
            }
        }
    }

    fn is_hidden(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlElement>()
            .is_some_and(|e| e.hidden() || is_display_none(e))
    }

    fn submit_form(&mut self, form: &Element) {
        match form.dyn_ref::<HtmlFormElement>() {
            Some(form) => report("submit", form.submit()),
            None => tracing::error!("#{} is not a form", form.id()),
        }
    }

    fn navigate(&mut self, url: &str) {
        report("navigate", self.window.location().set_href(url));
    }

    fn open_window(&mut self, url: &str, target: &str) {
        report("open_window", self.window.open_with_url_and_target(url, target));
    }
}
