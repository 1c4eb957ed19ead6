//! Turns a fetched schema into form rows.
//!
//! Every driver change fully replaces the generated rows. Requests are
//! numbered per driver; a response whose generation is not the latest one
//! issued for its driver is dropped, so a slow stale response can never
//! redraw rows over a newer one.

use std::collections::HashMap;

use super::{DynamicSchema, SchemaEntry, SchemaFetcher, SchemaMaterialize};
use crate::config::Settings;
use crate::dom::Dom;
use crate::enhance::{enhance_selects, Enhancer};
use crate::error::{FetchError, FormworkError, FormworkResult};

pub const FAILED_ATTRIBUTE: &str = "data-fetch-failed";

/// An issued request the host must fetch and hand back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub driver: String,
    pub generation: u64,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDisposition {
    Rendered { rows: usize },
    Failed,
    /// A newer request for the same driver superseded this one
    Stale,
}

#[derive(Debug, Clone)]
pub struct SchemaMaterializer {
    generations: HashMap<String, u64>,
    busy_indicator_id: Option<String>,
    error_element_id: Option<String>,
    failure_message: String,
    template_placeholder: String,
}

impl SchemaMaterializer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            generations: HashMap::new(),
            busy_indicator_id: settings.schema.busy_indicator_id.clone(),
            error_element_id: settings.schema.error_element_id.clone(),
            failure_message: settings.schema.failure_message.clone(),
            template_placeholder: settings.formset.placeholder.clone(),
        }
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.generations.get(&ticket.driver) == Some(&ticket.generation)
    }

    /// Clears the previous rows, shows the busy indicator and issues a ticket
    pub fn begin<D: Dom>(&mut self, dom: &mut D, binding: &SchemaMaterialize) -> FormworkResult<FetchTicket> {
        let driver = dom
            .element_by_id(&binding.driver)
            .ok_or_else(|| FormworkError::MissingElement(binding.driver.clone()))?;
        let container = dom
            .element_by_id(&binding.container)
            .ok_or_else(|| FormworkError::MissingElement(binding.container.clone()))?;

        let generation = self.generations.entry(binding.driver.clone()).or_insert(0);
        *generation += 1;
        let ticket = FetchTicket {
            driver: binding.driver.clone(),
            generation: *generation,
            url: binding.endpoint.resolve(&dom.value(&driver)),
        };

        dom.remove_children(&container);
        dom.remove_attribute(&container, FAILED_ATTRIBUTE);
        if let Some(error) = self.error_element(dom) {
            dom.set_text(&error, "");
            dom.set_hidden(&error, true);
        }
        self.set_busy(dom, true);

        tracing::debug!("Schema request #{} for '{}': {}", ticket.generation, ticket.driver, ticket.url);
        Ok(ticket)
    }

    /// Applies a fetch result, unless a newer request superseded it
    pub fn finish<D, E>(
        &mut self,
        dom: &mut D,
        enhancer: &mut E,
        binding: &SchemaMaterialize,
        ticket: &FetchTicket,
        result: Result<DynamicSchema, FetchError>,
    ) -> FetchDisposition
    where
        D: Dom,
        E: Enhancer<D> + ?Sized,
    {
        if !self.is_current(ticket) {
            tracing::debug!("Dropping stale schema response #{} for '{}'", ticket.generation, ticket.driver);
            return FetchDisposition::Stale;
        }
        let Some(container) = dom.element_by_id(&binding.container) else {
            self.set_busy(dom, false);
            return FetchDisposition::Failed;
        };

        let disposition = match result {
            Ok(schema) => {
                for (index, entry) in schema.entries.iter().enumerate() {
                    let row = render_row(dom, index, entry);
                    dom.append_child(&container, &row);
                }
                enhance_selects(dom, enhancer, Some(&container), &self.template_placeholder);
                tracing::info!("Rendered {} schema rows into '{}'", schema.len(), binding.container);
                FetchDisposition::Rendered { rows: schema.len() }
            }
            Err(e) => {
                tracing::warn!("Schema request for '{}' failed: {}", ticket.driver, e);
                dom.set_attribute(&container, FAILED_ATTRIBUTE, "true");
                if let Some(error) = self.error_element(dom) {
                    dom.set_text(&error, &self.failure_message);
                    dom.set_hidden(&error, false);
                }
                FetchDisposition::Failed
            }
        };
        self.set_busy(dom, false);
        disposition
    }

    /// `begin`, fetch and `finish` in one go, for hosts that own the document
    pub async fn refresh<D, E, F>(
        &mut self,
        dom: &mut D,
        enhancer: &mut E,
        fetcher: &F,
        binding: &SchemaMaterialize,
    ) -> FormworkResult<FetchDisposition>
    where
        D: Dom,
        E: Enhancer<D> + ?Sized,
        F: SchemaFetcher + ?Sized,
    {
        let ticket = self.begin(dom, binding)?;
        let result = fetcher.fetch_schema(&ticket.url).await;
        Ok(self.finish(dom, enhancer, binding, &ticket, result))
    }

    fn set_busy<D: Dom>(&self, dom: &mut D, busy: bool) {
        if let Some(indicator) = self.busy_indicator_id.as_deref().and_then(|id| dom.element_by_id(id)) {
            dom.set_hidden(&indicator, !busy);
        }
    }

    fn error_element<D: Dom>(&self, dom: &D) -> Option<D::Node> {
        self.error_element_id.as_deref().and_then(|id| dom.element_by_id(id))
    }
}

fn form_group<D: Dom>(dom: &mut D, row: &D::Node, label_for: &str, label: &str) -> D::Node {
    let group = dom.create_element("div");
    dom.set_attribute(&group, "class", "form-group");
    let label_node = dom.create_element("label");
    dom.set_attribute(&label_node, "for", label_for);
    dom.set_text(&label_node, label);
    dom.append_child(&group, &label_node);
    dom.append_child(row, &group);
    group
}

/// One ingredient row: a required choice field and a required quantity with its unit
pub fn render_row<D: Dom>(dom: &mut D, index: usize, entry: &SchemaEntry) -> D::Node {
    let row = dom.create_element("div");
    dom.set_attribute(&row, "class", "row");

    let ingredient_id = format!("id_ingredient_{}", index);
    let ingredient_group = form_group(dom, &row, &ingredient_id, &entry.name);
    let select = dom.create_element("select");
    dom.set_attribute(&select, "name", &format!("ingredient_{}", index));
    dom.set_attribute(&select, "class", "form-control");
    dom.set_attribute(&select, "id", &ingredient_id);
    dom.set_attribute(&select, "required", "");
    for (value, label) in entry.choices.entries() {
        let option = dom.create_element("option");
        dom.set_attribute(&option, "value", value);
        dom.set_text(&option, label);
        dom.append_child(&select, &option);
    }
    dom.append_child(&ingredient_group, &select);

    let quantity_id = format!("id_quantity_{}", index);
    let quantity_group = form_group(dom, &row, &quantity_id, "Quantity");
    let input_group = dom.create_element("div");
    dom.set_attribute(&input_group, "class", "input-group");
    let quantity = dom.create_element("input");
    for (name, value) in [
        ("type", "number"),
        ("name", format!("quantity_{}", index).as_str()),
        ("class", "form-control"),
        ("id", quantity_id.as_str()),
        ("placeholder", "Quantity"),
        ("step", "0.01"),
        ("required", ""),
    ] {
        dom.set_attribute(&quantity, name, value);
    }
    dom.append_child(&input_group, &quantity);
    let unit = dom.create_element("span");
    dom.set_attribute(&unit, "class", "input-group-text");
    dom.set_text(&unit, &entry.unit);
    dom.append_child(&input_group, &unit);
    dom.append_child(&quantity_group, &input_group);

    row
}
