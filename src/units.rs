//! Unit suffixes that follow a linked field.

use crate::choice::LabelLookup;
use crate::config::UnitSettings;
use crate::dom::{Dom, Query};
use crate::error::{FormworkError, FormworkResult};

/// Names the attribute holding the inline label lookup JSON
pub const LOOKUP_POINTER_ATTRIBUTE: &str = "input-group-label-lu";
pub const LINKED_ATTRIBUTE: &str = "linked-input-id";

/// A decorated field's suffix, driven by the linked field's value
#[derive(Debug, Clone)]
pub struct UnitSync<N> {
    pub decorated: N,
    pub suffix: N,
    pub linked: String,
    pub lookup: LabelLookup,
}

#[derive(Debug, Clone)]
pub struct UnitLabelSynchronizer {
    initial_text: String,
    plural_suffix: String,
}

impl UnitLabelSynchronizer {
    pub fn new(settings: &UnitSettings) -> Self {
        Self {
            initial_text: settings.initial_text.clone(),
            plural_suffix: settings.plural_suffix.clone(),
        }
    }

    /// Binds every decorated input under `scope`, skipping template fields
    pub fn discover<D: Dom>(
        &self,
        dom: &mut D,
        scope: Option<&D::Node>,
        placeholder: &str,
    ) -> (Vec<UnitSync<D::Node>>, Vec<FormworkError>) {
        let mut bindings = Vec::new();
        let mut errors = Vec::new();
        let inputs = dom.query(scope, &Query::tag("input").with_attr(LOOKUP_POINTER_ATTRIBUTE));
        for input in inputs {
            let in_template = [dom.id(&input), dom.attribute(&input, LINKED_ATTRIBUTE)]
                .iter()
                .flatten()
                .any(|v| v.contains(placeholder));
            if in_template {
                continue;
            }
            match self.bind(dom, &input) {
                Ok(binding) => bindings.push(binding),
                Err(e) => {
                    tracing::error!("Unit suffix not bound: {}", e);
                    errors.push(e);
                }
            }
        }
        (bindings, errors)
    }

    /// Injects the suffix element next to `decorated`
    pub fn bind<D: Dom>(&self, dom: &mut D, decorated: &D::Node) -> FormworkResult<UnitSync<D::Node>> {
        let element = dom.id(decorated).unwrap_or_else(|| dom.tag_name(decorated));
        let missing = |attribute: &str| FormworkError::MissingAttribute {
            element: element.clone(),
            attribute: attribute.to_string(),
        };

        let pointer = dom
            .attribute(decorated, LOOKUP_POINTER_ATTRIBUTE)
            .ok_or_else(|| missing(LOOKUP_POINTER_ATTRIBUTE))?;
        let raw = dom.attribute(decorated, &pointer).ok_or_else(|| missing(&pointer))?;
        let lookup = LabelLookup::parse(&pointer, &raw)?;
        let linked = dom
            .attribute(decorated, LINKED_ATTRIBUTE)
            .ok_or_else(|| missing(LINKED_ATTRIBUTE))?;
        if dom.element_by_id(&linked).is_none() {
            return Err(FormworkError::MissingLinkedField { id: linked });
        }
        let parent = dom
            .parent(decorated)
            .ok_or_else(|| FormworkError::MissingElement(element.clone()))?;

        dom.add_class(&parent, "input-group");
        let suffix = dom.create_element("span");
        dom.set_attribute(&suffix, "class", "input-group-text");
        dom.set_text(&suffix, &self.initial_text);
        dom.append_child(&parent, &suffix);

        Ok(UnitSync {
            decorated: decorated.clone(),
            suffix,
            linked,
            lookup,
        })
    }

    /// Label for `value` with the plural suffix appended verbatim
    pub fn suffix_text(&self, lookup: &LabelLookup, value: &str) -> Option<String> {
        lookup
            .label(value)
            .map(|label| format!("{}{}", label, self.plural_suffix))
    }

    /// Recomputes the suffix from the linked field. Unknown values keep the current text.
    pub fn sync<D: Dom>(&self, dom: &mut D, binding: &UnitSync<D::Node>) {
        let Some(linked) = dom.element_by_id(&binding.linked) else {
            return;
        };
        let value = dom.value(&linked);
        match self.suffix_text(&binding.lookup, &value) {
            Some(text) => dom.set_text(&binding.suffix, &text),
            None => tracing::debug!("No unit label for {:?} on '{}'", value, binding.linked),
        }
    }
}
