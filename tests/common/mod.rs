#![allow(dead_code)]

use async_trait::async_trait;
use formwork::choice::ChoiceStore;
use formwork::dom::{Dom, MemoryDom, NodeId, Query};
use formwork::enhance::Enhancer;
use formwork::error::{EnhanceError, FetchError};
use formwork::schema::{DynamicSchema, SchemaFetcher};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub const DIMENSION_FIELDS: [&str; 4] = ["length", "width", "height", "weight"];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Tables as the server renders them into the page's globals
pub fn store() -> ChoiceStore {
    ChoiceStore::from_globals(&json!({
        "ni_counties": {"null": "-------", "ANTRIM": "Antrim", "DOWN": "Down"},
        "ie_counties": {"null": "-------", "DUBLIN": "Dublin", "CORK": "Cork"},
        "pack_temp_lu": {
            "1": {"length": 10, "width": 20, "height": 30, "weight": 1.5},
            "2": {"length": "40", "width": "50", "height": "60", "weight": "12"}
        }
    }))
}

pub fn by_id(dom: &MemoryDom, id: &str) -> NodeId {
    dom.element_by_id(id)
        .unwrap_or_else(|| panic!("#{} not on the page", id))
}

/// `#post-form` with the CSRF token the server renders into it
pub fn post_form(dom: &mut MemoryDom) -> NodeId {
    let body = dom.body();
    let form = dom.element(body, "form", &[("id", "post-form"), ("method", "post")]);
    dom.element(
        form,
        "input",
        &[("type", "hidden"), ("name", "csrfmiddlewaretoken"), ("value", "csrf-token")],
    );
    form
}

/// `#ef-form` with region, county and postcode fields
pub fn region_form(dom: &mut MemoryDom, selected_region: &str) {
    let body = dom.body();
    let form = dom.element(body, "form", &[("id", "ef-form")]);
    let region = dom.element(form, "select", &[("id", "id_region"), ("name", "region")]);
    for value in ["DUBLIN", "NORTH IRELAND", "CORK"] {
        let option = dom.option(region, value, value);
        if value == selected_region {
            dom.set_attribute(&option, "selected", "");
        }
    }
    let county = dom.element(form, "select", &[("id", "id_county"), ("name", "county")]);
    dom.option(county, "", "-------");
    dom.element(form, "input", &[("id", "id_postcode"), ("name", "postcode"), ("value", "BT1")]);
}

fn package_fields(dom: &mut MemoryDom, row: NodeId, index: &str) {
    let id = format!("id_form-{}-package_type", index);
    let name = format!("form-{}-package_type", index);
    let select = dom.element(
        row,
        "select",
        &[("id", id.as_str()), ("name", name.as_str()), ("data-field-id", "package-type")],
    );
    dom.option(select, "", "---------");
    dom.option(select, "1", "Small box");
    dom.option(select, "2", "Pallet");
    for field in DIMENSION_FIELDS {
        let id = format!("id_form-{}-{}", index, field);
        let name = format!("form-{}-{}", index, field);
        dom.element(row, "label", &[("for", id.as_str())]);
        dom.element(row, "input", &[("id", id.as_str()), ("name", name.as_str())]);
    }
}

/// Package formset (`form` prefix) with `rows` live rows and its template
pub fn package_formset(dom: &mut MemoryDom, rows: usize, floor: Option<&str>) -> NodeId {
    let body = dom.body();
    let mut attrs = vec![("class", "formsets-form formset-packages-sending")];
    if let Some(floor) = floor {
        attrs.push(("data-floor", floor));
    }
    let container = dom.element(body, "div", &attrs);
    dom.element(
        container,
        "input",
        &[("type", "hidden"), ("id", "id_form-TOTAL_FORMS"), ("name", "form-TOTAL_FORMS"), ("value", "0")],
    );
    for index in 0..rows {
        let row = dom.element(
            container,
            "div",
            &[("class", "formset-form"), ("data-prefix", "form"), ("data-formset_id", "packages")],
        );
        package_fields(dom, row, &index.to_string());
    }
    let template = dom.element(body, "div", &[("id", "id_empty_packages")]);
    dom.set_hidden(&template, true);
    package_fields(dom, template, "__prefix__");
    container
}

fn ingredient_fields(dom: &mut MemoryDom, row: NodeId, index: &str) {
    let unit_id = format!("id_ing-{}-unit", index);
    let unit_name = format!("ing-{}-unit", index);
    let unit = dom.element(row, "select", &[("id", unit_id.as_str()), ("name", unit_name.as_str())]);
    dom.option(unit, "1", "Kilogram");
    dom.option(unit, "2", "Litre");
    let quantity_id = format!("id_ing-{}-quantity", index);
    let quantity_name = format!("ing-{}-quantity", index);
    let wrapper = dom.element(row, "div", &[("class", "quantity")]);
    dom.element(
        wrapper,
        "input",
        &[
            ("id", quantity_id.as_str()),
            ("name", quantity_name.as_str()),
            ("input-group-label-lu", "data-unit-labels"),
            ("data-unit-labels", r#"{"1": "Kilogram", "2": "Litre"}"#),
            ("linked-input-id", unit_id.as_str()),
        ],
    );
}

/// Ingredient formset (`ing` prefix) whose quantities carry unit suffixes
pub fn ingredient_formset(dom: &mut MemoryDom, rows: usize, floor: &str) -> NodeId {
    let body = dom.body();
    let container = dom.element(body, "div", &[("class", "formsets-form"), ("data-floor", floor)]);
    for index in 0..rows {
        let row = dom.element(
            container,
            "div",
            &[("class", "formset-form"), ("data-prefix", "ing"), ("data-formset_id", "ingredients")],
        );
        ingredient_fields(dom, row, &index.to_string());
    }
    let template = dom.element(body, "div", &[("id", "id_empty_ingredients")]);
    dom.set_hidden(&template, true);
    ingredient_fields(dom, template, "__prefix__");
    container
}

/// Product form whose type fetches the ingredient schema
pub fn product_form(dom: &mut MemoryDom) {
    let body = dom.body();
    let product_type = dom.element(
        body,
        "select",
        &[
            ("id", "id_product_type"),
            ("name", "product_type"),
            ("product-ingredient-choices-url-template", "/products/999/ingredient-choices/"),
        ],
    );
    dom.option(product_type, "1", "Pesto");
    dom.option(product_type, "2", "Salsa");
    dom.element(body, "div", &[("id", "product-ingredients")]);
    let busy = dom.element(body, "div", &[("id", "product-ingredients-loading")]);
    dom.set_hidden(&busy, true);
    let error = dom.element(body, "div", &[("id", "product-ingredients-error")]);
    dom.set_hidden(&error, true);
}

/// First select id in each row, in row order
pub fn row_select_ids(dom: &MemoryDom, rows: &[NodeId]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            dom.query(Some(row), &Query::tag("select"))
                .first()
                .and_then(|s| dom.id(s))
                .unwrap_or_default()
        })
        .collect()
}

pub fn suffix_text(dom: &MemoryDom, row: &NodeId) -> String {
    dom.query(Some(row), &Query::tag("span").with_class("input-group-text"))
        .first()
        .map(|s| dom.text(s))
        .unwrap_or_default()
}

/// Serves canned schema bodies by URL; anything else is a 404
#[derive(Default)]
pub struct StaticSchemaFetcher {
    responses: HashMap<String, String>,
    pub requests: RefCell<Vec<String>>,
}

impl StaticSchemaFetcher {
    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait(?Send)]
impl SchemaFetcher for StaticSchemaFetcher {
    async fn fetch_schema(&self, url: &str) -> Result<DynamicSchema, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        match self.responses.get(url) {
            Some(body) => DynamicSchema::from_json(body),
            None => Err(FetchError::Status { status: 404 }),
        }
    }
}

/// Records the id of every control handed to it; clones share the record
#[derive(Debug, Clone, Default)]
pub struct RecordingEnhancer {
    seen: Rc<RefCell<Vec<String>>>,
}

impl RecordingEnhancer {
    /// Ids enhanced since the last call
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.seen.borrow_mut())
    }
}

impl Enhancer<MemoryDom> for RecordingEnhancer {
    fn enhance(&mut self, dom: &mut MemoryDom, node: &NodeId) -> Result<(), EnhanceError> {
        self.seen.borrow_mut().push(dom.id(node).unwrap_or_default());
        Ok(())
    }
}
