//! Formset lifecycle: repeatable sub-forms with add/remove controls.
//!
//! Every field of a row carries its index in its identity
//! (`<prefix>-<n>-<field>`). After any add or remove the indices of the live
//! rows are `0..len`, and the hidden template (index placeholder) is never
//! counted as a row.

use regex::Regex;
use std::collections::HashSet;

use crate::config::FormsetSettings;
use crate::dom::{Dom, Query};
use crate::enhance::{enhance_selects, Enhancer};
use crate::error::{FormworkError, FormworkResult};

const CONTAINER_CLASS: &str = "formsets-form";
const ROW_CLASS: &str = "formset-form";
const LIVE_ROW_CLASS: &str = "dynamic-form";
const ADD_CLASS: &str = "formset-add";
const REMOVE_CLASS: &str = "formset-remove";
const RENUMBERED_ATTRIBUTES: [&str; 4] = ["id", "name", "for", "linked-input-id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormsetState {
    AtFloor,
    AboveFloor,
}

/// Control the user clicked, resolved to its group and row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormsetControl {
    Add { group: usize },
    Remove { group: usize, row: usize },
}

#[derive(Debug, Clone)]
pub struct FormsetGroup<N> {
    prefix: String,
    formset_id: String,
    template: N,
    pattern: Regex,
    rows: Vec<N>,
    remove_controls: Vec<N>,
    add_control: N,
    total_forms: Option<N>,
    floor: usize,
}

impl<N> FormsetGroup<N> {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn formset_id(&self) -> &str {
        &self.formset_id
    }

    pub fn rows(&self) -> &[N] {
        &self.rows
    }

    pub fn remove_controls(&self) -> &[N] {
        &self.remove_controls
    }

    pub fn add_control(&self) -> &N {
        &self.add_control
    }

    pub fn floor(&self) -> usize {
        self.floor
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn state(&self) -> FormsetState {
        if self.rows.len() > self.floor {
            FormsetState::AboveFloor
        } else {
            FormsetState::AtFloor
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormsetController<N> {
    settings: FormsetSettings,
    groups: Vec<FormsetGroup<N>>,
}

impl<N: Clone + PartialEq + std::fmt::Debug> FormsetController<N> {
    pub fn new(settings: FormsetSettings) -> Self {
        Self {
            settings,
            groups: Vec::new(),
        }
    }

    pub fn groups(&self) -> &[FormsetGroup<N>] {
        &self.groups
    }

    pub fn group(&self, prefix: &str) -> Option<&FormsetGroup<N>> {
        self.groups.iter().find(|g| g.prefix == prefix)
    }

    pub fn group_index(&self, prefix: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.prefix == prefix)
    }

    /// Binds every formset on the page.
    ///
    /// A group with a configuration error is skipped and its error returned;
    /// the remaining groups still bind.
    pub fn discover<D: Dom<Node = N>>(&mut self, dom: &mut D) -> Vec<FormworkError> {
        let mut errors = Vec::new();
        for container in dom.query(None, &Query::class(CONTAINER_CLASS)) {
            let floor = dom
                .attribute(&container, "data-floor")
                .and_then(|f| f.trim().parse().ok())
                .unwrap_or(self.settings.floor);

            let mut by_prefix: Vec<(String, Vec<N>)> = Vec::new();
            for row in dom.query(Some(&container), &Query::class(ROW_CLASS)) {
                let Some(prefix) = dom.attribute(&row, "data-prefix") else {
                    tracing::warn!("Formset row {:?} has no data-prefix, skipped", row);
                    continue;
                };
                match by_prefix.iter_mut().find(|(p, _)| *p == prefix) {
                    Some((_, rows)) => rows.push(row),
                    None => by_prefix.push((prefix, vec![row])),
                }
            }

            for (prefix, rows) in by_prefix {
                let formset_id = rows
                    .first()
                    .and_then(|r| dom.attribute(r, "data-formset_id"))
                    .unwrap_or_else(|| prefix.clone());
                if let Err(e) = self.bind_group(dom, &prefix, &formset_id, rows, floor) {
                    tracing::error!("Formset '{}' not bound: {}", prefix, e);
                    errors.push(e);
                }
            }
        }
        errors
    }

    /// Binds one formset from its existing rows. Returns the group index.
    pub fn bind_group<D: Dom<Node = N>>(
        &mut self,
        dom: &mut D,
        prefix: &str,
        formset_id: &str,
        rows: Vec<N>,
        floor: usize,
    ) -> FormworkResult<usize> {
        let template_id = format!("{}{}", self.settings.template_id_prefix, formset_id);
        let template = dom
            .element_by_id(&template_id)
            .ok_or_else(|| FormworkError::MissingTemplate {
                formset_id: formset_id.to_string(),
                template_id: template_id.clone(),
            })?;

        let view: &D = &*dom;
        let rows: Vec<N> = rows
            .into_iter()
            .filter(|row| !view.ancestors_inclusive(row).contains(&template))
            .filter(|row| !self.carries_placeholder(view, row))
            .collect();

        let pattern = self.index_pattern(prefix)?;
        let mut seen = HashSet::new();
        for row in &rows {
            if let Some(index) = embedded_index(&*dom, row, &pattern) {
                if !seen.insert(index) {
                    return Err(FormworkError::IndexCollision {
                        prefix: prefix.to_string(),
                        index,
                    });
                }
            }
        }

        let mut remove_controls = Vec::with_capacity(rows.len());
        for row in &rows {
            dom.add_class(row, LIVE_ROW_CLASS);
            remove_controls.push(self.inject_remove_control(dom, row));
        }

        let add_control = dom.create_element("button");
        dom.set_attribute(&add_control, "type", "button");
        dom.set_attribute(&add_control, "class", &format!("{} {}", self.settings.add_class, ADD_CLASS));
        dom.set_text(&add_control, &self.settings.add_text);
        dom.insert_after(rows.last().unwrap_or(&template), &add_control);

        let group = FormsetGroup {
            prefix: prefix.to_string(),
            formset_id: formset_id.to_string(),
            template,
            pattern,
            rows,
            remove_controls,
            add_control,
            total_forms: dom.element_by_id(&format!("id_{}-TOTAL_FORMS", prefix)),
            floor,
        };
        tracing::info!("Bound formset '{}' with {} rows (floor {})", prefix, group.len(), floor);

        self.groups.push(group);
        let index = self.groups.len() - 1;
        self.renumber(dom, index);
        self.sync_total(dom, index);
        self.recompute_visibility(dom, index);
        Ok(index)
    }

    /// Clones the template into a new last row. Returns the new row.
    pub fn add<D, E>(&mut self, dom: &mut D, enhancer: &mut E, group: usize) -> Option<N>
    where
        D: Dom<Node = N>,
        E: Enhancer<D> + ?Sized,
    {
        let placeholder = self.settings.placeholder.clone();
        let (template, pattern, anchor, index, prefix, formset_id) = {
            let g = self.groups.get(group)?;
            (
                g.template.clone(),
                g.pattern.clone(),
                g.rows.last().cloned().unwrap_or_else(|| g.template.clone()),
                g.rows.len(),
                g.prefix.clone(),
                g.formset_id.clone(),
            )
        };

        let row = dom.clone_subtree(&template);
        dom.remove_attribute(&row, "id");
        dom.set_hidden(&row, false);
        dom.add_class(&row, ROW_CLASS);
        dom.add_class(&row, LIVE_ROW_CLASS);
        dom.set_attribute(&row, "data-prefix", &prefix);
        dom.set_attribute(&row, "data-formset_id", &formset_id);
        renumber_subtree(dom, &row, &pattern, &prefix, index);
        let control = self.inject_remove_control(dom, &row);
        dom.insert_after(&anchor, &row);

        enhance_selects(dom, enhancer, Some(&row), &placeholder);

        let g = &mut self.groups[group];
        g.rows.push(row.clone());
        g.remove_controls.push(control);
        tracing::debug!("Formset '{}' added row {}", prefix, index);

        self.sync_total(dom, group);
        self.recompute_visibility(dom, group);
        Some(row)
    }

    /// Detaches row `row` and renumbers the rows after it.
    ///
    /// Rows at or below the floor cannot be removed; returns whether a row
    /// was removed.
    pub fn remove<D: Dom<Node = N>>(&mut self, dom: &mut D, group: usize, row: usize) -> bool {
        let Some(g) = self.groups.get_mut(group) else {
            return false;
        };
        if row >= g.rows.len() || row < g.floor {
            tracing::debug!("Formset '{}' refused to remove row {} (floor {})", g.prefix, row, g.floor);
            return false;
        }

        let detached = g.rows.remove(row);
        g.remove_controls.remove(row);
        dom.remove(&detached);
        tracing::debug!("Formset '{}' removed row {}", g.prefix, row);

        self.renumber(dom, group);
        self.sync_total(dom, group);
        self.recompute_visibility(dom, group);
        true
    }

    /// Shows the remove control of exactly the rows above the floor.
    ///
    /// Pure in the DOM's current structure: calling it again without a
    /// structural change writes the same state.
    pub fn recompute_visibility<D: Dom<Node = N>>(&self, dom: &mut D, group: usize) {
        let Some(g) = self.groups.get(group) else {
            return;
        };
        for (index, control) in g.remove_controls.iter().enumerate() {
            let hidden = index < g.floor;
            if dom.is_hidden(control) != hidden {
                dom.set_hidden(control, hidden);
            }
        }
    }

    /// Resolves a clicked element (or one of its ancestors) to a formset control
    pub fn locate_control<D: Dom<Node = N>>(&self, dom: &D, node: &N) -> Option<FormsetControl> {
        for candidate in dom.ancestors_inclusive(node) {
            for (gi, g) in self.groups.iter().enumerate() {
                if g.add_control == candidate {
                    return Some(FormsetControl::Add { group: gi });
                }
                if let Some(row) = g.remove_controls.iter().position(|c| *c == candidate) {
                    return Some(FormsetControl::Remove { group: gi, row });
                }
            }
        }
        None
    }

    fn renumber<D: Dom<Node = N>>(&self, dom: &mut D, group: usize) {
        let g = &self.groups[group];
        for (index, row) in g.rows.iter().enumerate() {
            renumber_subtree(dom, row, &g.pattern, &g.prefix, index);
        }
    }

    fn sync_total<D: Dom<Node = N>>(&self, dom: &mut D, group: usize) {
        let g = &self.groups[group];
        if let Some(total) = &g.total_forms {
            dom.set_value(total, &g.rows.len().to_string());
        }
    }

    fn inject_remove_control<D: Dom<Node = N>>(&self, dom: &mut D, row: &N) -> N {
        let control = dom.create_element("button");
        dom.set_attribute(&control, "type", "button");
        dom.set_attribute(&control, "class", &format!("{} {}", self.settings.remove_class, REMOVE_CLASS));
        dom.set_text(&control, &self.settings.remove_text);
        dom.append_child(row, &control);
        control
    }

    fn index_pattern(&self, prefix: &str) -> FormworkResult<Regex> {
        let source = format!(
            "{}-(\\d+|{})-",
            regex::escape(prefix),
            regex::escape(&self.settings.placeholder)
        );
        Regex::new(&source).map_err(|e| FormworkError::InvalidPrefix {
            prefix: prefix.to_string(),
            reason: e.to_string(),
        })
    }

    fn carries_placeholder<D: Dom<Node = N>>(&self, dom: &D, row: &N) -> bool {
        let placeholder = self.settings.placeholder.as_str();
        let mut nodes = vec![row.clone()];
        nodes.extend(dom.query(Some(row), &Query::any()));
        nodes.iter().any(|n| {
            RENUMBERED_ATTRIBUTES
                .iter()
                .any(|a| dom.attribute(n, a).is_some_and(|v| v.contains(placeholder)))
        })
    }
}

/// First index embedded in the row or its fields
fn embedded_index<D: Dom>(dom: &D, row: &D::Node, pattern: &Regex) -> Option<usize> {
    let mut nodes = vec![row.clone()];
    nodes.extend(dom.query(Some(row), &Query::any()));
    nodes.iter().find_map(|n| {
        RENUMBERED_ATTRIBUTES.iter().find_map(|a| {
            let value = dom.attribute(n, a)?;
            pattern.captures(&value)?.get(1)?.as_str().parse().ok()
        })
    })
}

/// Rewrites `<prefix>-<n|placeholder>-` to `<prefix>-<index>-` across a subtree
fn renumber_subtree<D: Dom>(dom: &mut D, root: &D::Node, pattern: &Regex, prefix: &str, index: usize) {
    let replacement = format!("{}-{}-", prefix, index);
    let mut nodes = vec![root.clone()];
    nodes.extend(dom.query(Some(root), &Query::any()));
    for node in nodes {
        for attribute in RENUMBERED_ATTRIBUTES {
            let Some(value) = dom.attribute(&node, attribute) else {
                continue;
            };
            let renumbered = pattern.replace_all(&value, regex::NoExpand(&replacement));
            if renumbered.as_ref() != value.as_str() {
                dom.set_attribute(&node, attribute, &renumbered);
            }
        }
    }
}
