//! Cascading field binders.
//!
//! A driver field's value decides either the option list of a dependent
//! select ([`ChoiceCascade`]) or the values pre-filled into sibling fields of
//! the same formset row ([`ValueFillCascade`]).

use regex::Regex;

use crate::binding::DriverKey;
use crate::choice::{ChoiceStore, ChoiceTable};
use crate::dom::Dom;
use crate::enhance::{enhance_selects, Enhancer};
use crate::error::{FormworkError, FormworkResult};

/// Enables `field` only while the driver holds one of `enabled_for`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingToggle {
    pub field: String,
    pub enabled_for: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceCascade {
    pub driver: String,
    pub dependent: String,
    /// Driver value to choice table name
    pub routes: Vec<(String, String)>,
    /// Table used for every unrouted driver value
    pub default_table: String,
    pub toggles: Vec<SiblingToggle>,
}

impl ChoiceCascade {
    /// Region drives the county list; only Northern Ireland takes a postcode.
    pub fn region_counties() -> Self {
        Self {
            driver: "id_region".to_string(),
            dependent: "id_county".to_string(),
            routes: vec![("NORTH IRELAND".to_string(), "ni_counties".to_string())],
            default_table: "ie_counties".to_string(),
            toggles: vec![SiblingToggle {
                field: "id_postcode".to_string(),
                enabled_for: vec!["NORTH IRELAND".to_string()],
            }],
        }
    }

    pub fn table_for(&self, value: &str) -> &str {
        self.routes
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, table)| table.as_str())
            .unwrap_or(&self.default_table)
    }

    /// Checks every element and table the cascade refers to
    pub fn validate<D: Dom>(&self, dom: &D, store: &ChoiceStore) -> FormworkResult<()> {
        for id in [&self.driver, &self.dependent] {
            if dom.element_by_id(id).is_none() {
                return Err(FormworkError::MissingElement(id.clone()));
            }
        }
        store.choices(&self.default_table)?;
        for (_, table) in &self.routes {
            store.choices(table)?;
        }
        Ok(())
    }

    /// Repopulates the dependent field from the driver's current value
    pub fn apply<D, E>(&self, dom: &mut D, store: &ChoiceStore, enhancer: &mut E, placeholder: &str) -> FormworkResult<()>
    where
        D: Dom,
        E: Enhancer<D> + ?Sized,
    {
        let driver = dom
            .element_by_id(&self.driver)
            .ok_or_else(|| FormworkError::MissingElement(self.driver.clone()))?;
        let dependent = dom
            .element_by_id(&self.dependent)
            .ok_or_else(|| FormworkError::MissingElement(self.dependent.clone()))?;

        let value = dom.value(&driver);
        let table_name = self.table_for(&value);
        let table = store.choices(table_name)?;
        tracing::debug!("{} = {:?}: '{}' takes choices from '{}'", self.driver, value, self.dependent, table_name);

        reset_choices(dom, &dependent, table);
        enhance_selects(dom, enhancer, Some(&dependent), placeholder);

        for toggle in &self.toggles {
            let Some(field) = dom.element_by_id(&toggle.field) else {
                tracing::debug!("Toggle target '{}' not on page", toggle.field);
                continue;
            };
            if toggle.enabled_for.iter().any(|v| *v == value) {
                dom.set_disabled(&field, false);
            } else {
                dom.set_disabled(&field, true);
                dom.set_value(&field, "");
            }
        }
        Ok(())
    }
}

/// Replaces every option of `select` with the table's entries
pub fn reset_choices<D: Dom>(dom: &mut D, select: &D::Node, table: &ChoiceTable) {
    dom.remove_children(select);
    for (key, label) in table.entries() {
        let option = dom.create_element("option");
        dom.set_attribute(&option, "value", key);
        dom.set_text(&option, label);
        dom.append_child(select, &option);
    }
}

/// Pre-fills sibling fields of a formset row from a lookup keyed by the driver
#[derive(Debug, Clone)]
pub struct ValueFillCascade {
    pub driver: DriverKey,
    /// Formset prefix embedded in field ids (`id_<prefix>-<n>-<field>`)
    pub prefix: String,
    pub fields: Vec<String>,
    pub table: String,
    pattern: Regex,
}

impl ValueFillCascade {
    pub fn new(driver: DriverKey, prefix: &str, fields: &[&str], table: &str) -> FormworkResult<Self> {
        let pattern = Regex::new(&format!("{}-(\\d+)-", regex::escape(prefix))).map_err(|e| {
            FormworkError::InvalidPrefix {
                prefix: prefix.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            driver,
            prefix: prefix.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            table: table.to_string(),
            pattern,
        })
    }

    /// Package type pre-fills the package dimensions of rows inside `container_class`
    pub fn packages(table: &str, container_class: &str) -> FormworkResult<Self> {
        Self::new(
            DriverKey::attribute("data-field-id", "package-type").within(container_class),
            "form",
            &["length", "width", "height", "weight"],
            table,
        )
    }

    /// Row index embedded in a field id
    pub fn row_index(&self, driver_id: &str) -> Option<usize> {
        self.pattern
            .captures(driver_id)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    pub fn sibling_id(&self, index: usize, field: &str) -> String {
        format!("id_{}-{}-{}", self.prefix, index, field)
    }

    /// Writes the looked-up values into the driver's own row.
    ///
    /// An unknown driver value leaves the row untouched. Returns the number
    /// of fields written.
    pub fn apply<D: Dom>(&self, dom: &mut D, store: &ChoiceStore, driver: &D::Node) -> FormworkResult<usize> {
        let driver_id = dom.id(driver).unwrap_or_default();
        let index = self
            .row_index(&driver_id)
            .ok_or_else(|| FormworkError::MissingRowIndex {
                prefix: self.prefix.clone(),
                id: driver_id.clone(),
            })?;

        let value = dom.value(driver);
        let Some(tuple) = store.dimensions(&self.table)?.get(&value) else {
            tracing::debug!("No '{}' entry for {:?}, row {} left as is", self.table, value, index);
            return Ok(0);
        };

        let mut written = 0;
        for field in &self.fields {
            let Some(derived) = tuple.get(field) else {
                continue;
            };
            match dom.element_by_id(&self.sibling_id(index, field)) {
                Some(sibling) => {
                    dom.set_value(&sibling, derived);
                    written += 1;
                }
                None => tracing::debug!("Row {} has no '{}' field", index, field),
            }
        }
        Ok(written)
    }
}
