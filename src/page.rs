//! Page session: binds every component once and routes page events to them.
//!
//! Each component binds on its own. A component whose markup is broken is
//! recorded in [`PageSession::diagnostics`] and left unbound while the rest
//! of the page keeps working.

use crate::binding::{BinderRegistry, BindingDescriptor};
use crate::cascade::{ChoiceCascade, ValueFillCascade};
use crate::choice::ChoiceStore;
use crate::config::Settings;
use crate::dom::{Dom, Query};
use crate::enhance::{enhance_selects, Enhancer};
use crate::error::{FetchError, FormworkError, FormworkResult};
use crate::formset::{FormsetControl, FormsetController};
use crate::schema::{
    DynamicSchema, EndpointTemplate, FetchDisposition, FetchTicket, SchemaFetcher, SchemaMaterialize,
    SchemaMaterializer,
};
use crate::submit::{self, Action, ConfirmRequest, Intercept, Interceptor, SubmissionChannel};
use crate::units::{UnitLabelSynchronizer, LINKED_ATTRIBUTE};

const REGION_FORM_ID: &str = "ef-form";
const PACKAGE_FORMSET_CLASS: &str = "formset-packages-sending";
const PACKAGE_TABLE: &str = "pack_temp_lu";
const PRODUCT_TYPE_ID: &str = "id_product_type";
const PRODUCT_ENDPOINT_ATTRIBUTE: &str = "product-ingredient-choices-url-template";
const PRODUCT_INGREDIENTS_ID: &str = "product-ingredients";

/// How the host should treat a click after the engine saw it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClickOutcome {
    pub prevent_default: bool,
    /// Set when the user must answer before anything happens
    pub confirm: Option<ConfirmRequest>,
}

impl ClickOutcome {
    fn ignored() -> Self {
        Self::default()
    }

    fn handled() -> Self {
        Self {
            prevent_default: true,
            confirm: None,
        }
    }
}

pub struct PageSession<D: Dom, E> {
    settings: Settings,
    store: ChoiceStore,
    enhancer: E,
    registry: BinderRegistry<D::Node>,
    formsets: FormsetController<D::Node>,
    units: UnitLabelSynchronizer,
    materializer: SchemaMaterializer,
    interceptor: Interceptor<D::Node>,
    channel: Option<SubmissionChannel<D::Node>>,
    diagnostics: Vec<FormworkError>,
}

impl<D: Dom, E: Enhancer<D>> PageSession<D, E> {
    /// Wires every component present on the page
    pub fn bind(dom: &mut D, settings: Settings, store: ChoiceStore, enhancer: E) -> Self {
        let mut session = Self {
            units: UnitLabelSynchronizer::new(&settings.units),
            materializer: SchemaMaterializer::new(&settings),
            formsets: FormsetController::new(settings.formset.clone()),
            interceptor: Interceptor::bind(dom, &settings.submit),
            registry: BinderRegistry::new(),
            channel: None,
            diagnostics: Vec::new(),
            settings,
            store,
            enhancer,
        };

        session.bind_channel(dom);
        if dom.element_by_id(REGION_FORM_ID).is_some() {
            let cascade = BindingDescriptor::ChoiceCascade(ChoiceCascade::region_counties());
            session.register_or_report(dom, cascade);
        }
        let placeholder = session.settings.formset.placeholder.clone();
        enhance_selects(dom, &mut session.enhancer, None, &placeholder);

        let errors = session.formsets.discover(dom);
        session.diagnostics.extend(errors);
        session.bind_units(dom, None);
        session.bind_product_schema(dom);
        if !dom.query(None, &Query::class(PACKAGE_FORMSET_CLASS)).is_empty() {
            match ValueFillCascade::packages(PACKAGE_TABLE, PACKAGE_FORMSET_CLASS) {
                Ok(fill) => session.register_or_report(dom, BindingDescriptor::ValueFillCascade(fill)),
                Err(e) => session.diagnostics.push(e),
            }
        }

        tracing::info!(
            "Page bound: {} bindings, {} formsets, {} action links, {} diagnostics",
            session.registry.len(),
            session.formsets.groups().len(),
            session.interceptor.len(),
            session.diagnostics.len()
        );
        session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Configuration errors found while binding
    pub fn diagnostics(&self) -> &[FormworkError] {
        &self.diagnostics
    }

    pub fn registry(&self) -> &BinderRegistry<D::Node> {
        &self.registry
    }

    pub fn formsets(&self) -> &FormsetController<D::Node> {
        &self.formsets
    }

    pub fn interceptor(&self) -> &Interceptor<D::Node> {
        &self.interceptor
    }

    /// Validates and registers a binding. Choice cascades apply once immediately.
    pub fn register(&mut self, dom: &mut D, binding: BindingDescriptor<D::Node>) -> FormworkResult<()> {
        match &binding {
            BindingDescriptor::ChoiceCascade(cascade) => {
                cascade.validate(dom, &self.store)?;
                let placeholder = self.settings.formset.placeholder.clone();
                cascade.apply(dom, &self.store, &mut self.enhancer, &placeholder)?;
            }
            BindingDescriptor::ValueFillCascade(fill) => {
                self.store.dimensions(&fill.table)?;
            }
            BindingDescriptor::SchemaMaterialize(schema) => {
                for id in [&schema.driver, &schema.container] {
                    if dom.element_by_id(id).is_none() {
                        return Err(FormworkError::MissingElement(id.clone()));
                    }
                }
            }
            BindingDescriptor::UnitSync(sync) => {
                if dom.element_by_id(&sync.linked).is_none() {
                    return Err(FormworkError::MissingLinkedField { id: sync.linked.clone() });
                }
            }
        }
        self.registry.register(binding);
        Ok(())
    }

    /// Runs every binding driven by `target`. Returns the schema fetches to issue.
    pub fn handle_change(&mut self, dom: &mut D, target: &D::Node) -> Vec<FetchTicket> {
        let driven: Vec<_> = self.registry.driven_by(dom, target).cloned().collect();
        let placeholder = self.settings.formset.placeholder.clone();
        let mut tickets = Vec::new();

        for binding in driven {
            match binding {
                BindingDescriptor::ChoiceCascade(cascade) => {
                    if let Err(e) = cascade.apply(dom, &self.store, &mut self.enhancer, &placeholder) {
                        tracing::warn!("Choice cascade on '{}' failed: {}", cascade.driver, e);
                    }
                }
                BindingDescriptor::ValueFillCascade(fill) => {
                    if let Err(e) = fill.apply(dom, &self.store, target) {
                        tracing::warn!("Value fill from '{}' failed: {}", fill.table, e);
                    }
                }
                BindingDescriptor::SchemaMaterialize(schema) => match self.materializer.begin(dom, &schema) {
                    Ok(ticket) => tickets.push(ticket),
                    Err(e) => tracing::warn!("Schema refresh for '{}' not started: {}", schema.driver, e),
                },
                BindingDescriptor::UnitSync(sync) => self.units.sync(dom, &sync),
            }
        }
        tickets
    }

    /// Hands a fetch result back to the materializer that issued `ticket`
    pub fn complete_fetch(
        &mut self,
        dom: &mut D,
        ticket: &FetchTicket,
        result: Result<DynamicSchema, FetchError>,
    ) -> FetchDisposition {
        let binding = self.registry.iter().find_map(|b| match b {
            BindingDescriptor::SchemaMaterialize(s) if s.driver == ticket.driver => Some(s.clone()),
            _ => None,
        });
        match binding {
            Some(binding) => self.materializer.finish(dom, &mut self.enhancer, &binding, ticket, result),
            None => {
                tracing::debug!("No schema binding for '{}' any more", ticket.driver);
                FetchDisposition::Stale
            }
        }
    }

    /// `handle_change` followed by fetching and completing every issued ticket
    pub async fn dispatch_change<F>(&mut self, dom: &mut D, target: &D::Node, fetcher: &F) -> Vec<FetchDisposition>
    where
        F: SchemaFetcher + ?Sized,
    {
        let mut dispositions = Vec::new();
        for ticket in self.handle_change(dom, target) {
            let result = fetcher.fetch_schema(&ticket.url).await;
            dispositions.push(self.complete_fetch(dom, &ticket, result));
        }
        dispositions
    }

    /// Routes a click on `target`, or on one of its ancestors
    pub fn handle_click(&mut self, dom: &mut D, target: &D::Node) -> ClickOutcome {
        if let Some(control) = self.formsets.locate_control(dom, target) {
            match control {
                FormsetControl::Add { group } => self.add_row(dom, group),
                FormsetControl::Remove { group, row } => self.remove_row(dom, group, row),
            }
            return ClickOutcome::handled();
        }

        match self.interceptor.click(dom, target) {
            Some(Intercept::Confirm(request)) => ClickOutcome {
                prevent_default: true,
                confirm: Some(request),
            },
            Some(Intercept::Perform(action)) => {
                submit::perform(dom, self.channel.as_mut(), &action);
                ClickOutcome::handled()
            }
            Some(Intercept::Suppressed) => ClickOutcome::handled(),
            None => ClickOutcome::ignored(),
        }
    }

    /// Carries out a confirmed request. Returns the action taken, if any.
    pub fn resolve_confirmation(&mut self, dom: &mut D, request: &ConfirmRequest, accepted: bool) -> Option<Action> {
        let action = submit::resolve(request, accepted)?;
        submit::perform(dom, self.channel.as_mut(), &action);
        Some(action)
    }

    fn register_or_report(&mut self, dom: &mut D, binding: BindingDescriptor<D::Node>) {
        let kind = binding.kind();
        if let Err(e) = self.register(dom, binding) {
            tracing::error!("{} binding skipped: {}", kind, e);
            self.diagnostics.push(e);
        }
    }

    fn bind_channel(&mut self, dom: &D) {
        match SubmissionChannel::attach(dom, &self.settings.submit.post_form_id) {
            Ok(channel) => self.channel = Some(channel),
            Err(e) if self.interceptor.needs_channel() => {
                tracing::error!("POST links cannot submit: {}", e);
                self.diagnostics.push(e);
            }
            Err(_) => {}
        }
    }

    fn bind_units(&mut self, dom: &mut D, scope: Option<&D::Node>) {
        let placeholder = self.settings.formset.placeholder.clone();
        let (bindings, errors) = self.units.discover(dom, scope, &placeholder);
        self.diagnostics.extend(errors);
        for sync in bindings {
            self.registry.register(BindingDescriptor::UnitSync(sync));
        }
    }

    fn bind_product_schema(&mut self, dom: &mut D) {
        let Some(driver) = dom.element_by_id(PRODUCT_TYPE_ID) else {
            return;
        };
        let Some(template) = dom.attribute(&driver, PRODUCT_ENDPOINT_ATTRIBUTE) else {
            self.diagnostics.push(FormworkError::MissingAttribute {
                element: PRODUCT_TYPE_ID.to_string(),
                attribute: PRODUCT_ENDPOINT_ATTRIBUTE.to_string(),
            });
            return;
        };
        let schema = SchemaMaterialize {
            driver: PRODUCT_TYPE_ID.to_string(),
            container: PRODUCT_INGREDIENTS_ID.to_string(),
            endpoint: EndpointTemplate::new(&template, &self.settings.schema.placeholder),
        };
        self.register_or_report(dom, BindingDescriptor::SchemaMaterialize(schema));
    }

    fn add_row(&mut self, dom: &mut D, group: usize) {
        if let Some(row) = self.formsets.add(dom, &mut self.enhancer, group) {
            self.bind_units(dom, Some(&row));
        }
    }

    fn remove_row(&mut self, dom: &mut D, group: usize, row: usize) {
        let Some(node) = self
            .formsets
            .groups()
            .get(group)
            .and_then(|g| g.rows().get(row))
            .cloned()
        else {
            return;
        };
        if !self.formsets.remove(dom, group, row) {
            return;
        }

        // Suffixes inside the detached row go with it; the rest follow renumbering.
        let view: &D = &*dom;
        self.registry.retain(|b| match b {
            BindingDescriptor::UnitSync(sync) => !view.ancestors_inclusive(&sync.decorated).contains(&node),
            _ => true,
        });
        for binding in self.registry.iter_mut() {
            if let BindingDescriptor::UnitSync(sync) = binding {
                if let Some(linked) = view.attribute(&sync.decorated, LINKED_ATTRIBUTE) {
                    sync.linked = linked;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::ChoiceTable;
    use crate::dom::MemoryDom;
    use crate::enhance::NoopEnhancer;

    #[test]
    fn test_broken_component_does_not_block_others() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let form = dom.element(body, "form", &[("id", "ef-form")]);
        let region = dom.element(form, "select", &[("id", "id_region")]);
        dom.option(region, "NORTH IRELAND", "Northern Ireland");
        dom.element(form, "select", &[("id", "id_county")]);
        let container = dom.element(body, "div", &[("class", "formsets-form")]);
        dom.element(container, "div", &[("class", "formset-form"), ("data-prefix", "form"), ("data-formset_id", "pk")]);

        let store = ChoiceStore::new()
            .with_choices("ni_counties", ChoiceTable::new([("ANTRIM", "Antrim")]))
            .with_choices("ie_counties", ChoiceTable::new([("DUBLIN", "Dublin")]));
        let session = PageSession::bind(&mut dom, Settings::default(), store, NoopEnhancer);

        assert!(matches!(
            session.diagnostics(),
            [FormworkError::MissingTemplate { .. }]
        ));
        assert_eq!(session.registry().len(), 1);
        let county = dom.element_by_id("id_county").unwrap();
        assert_eq!(dom.options(county), vec![("ANTRIM".to_string(), "Antrim".to_string())]);
    }

    #[test]
    fn test_post_links_without_form_are_reported() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        dom.element(body, "a", &[("href", "/delete/"), ("data-method", "POST")]);

        let session = PageSession::bind(&mut dom, Settings::default(), ChoiceStore::new(), NoopEnhancer);
        assert_eq!(
            session.diagnostics(),
            &[FormworkError::MissingPostForm {
                id: "post-form".to_string()
            }]
        );
    }
}
