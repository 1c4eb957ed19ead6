//! Typed binding descriptors and the registry that dispatches driver changes.

use crate::cascade::{ChoiceCascade, ValueFillCascade};
use crate::dom::Dom;
use crate::schema::SchemaMaterialize;
use crate::units::UnitSync;

/// How a binding recognises its driver field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverKey {
    /// One specific element
    Id(String),
    /// Any element carrying `name="value"`, so every formset row matches.
    /// With `within`, only elements inside an ancestor of that class.
    Attribute {
        name: String,
        value: String,
        within: Option<String>,
    },
}

impl DriverKey {
    pub fn id(id: &str) -> Self {
        Self::Id(id.to_string())
    }

    pub fn attribute(name: &str, value: &str) -> Self {
        Self::Attribute {
            name: name.to_string(),
            value: value.to_string(),
            within: None,
        }
    }

    /// Restricts an attribute driver to elements inside a `class` container
    pub fn within(self, class: &str) -> Self {
        match self {
            Self::Attribute { name, value, .. } => Self::Attribute {
                name,
                value,
                within: Some(class.to_string()),
            },
            id => id,
        }
    }

    pub fn matches<D: Dom>(&self, dom: &D, node: &D::Node) -> bool {
        match self {
            Self::Id(id) => dom.id(node).as_deref() == Some(id.as_str()),
            Self::Attribute { name, value, within } => {
                dom.attribute(node, name).as_deref() == Some(value.as_str())
                    && within.as_ref().map_or(true, |class| {
                        dom.ancestors_inclusive(node).iter().any(|a| dom.has_class(a, class))
                    })
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum BindingDescriptor<N> {
    ChoiceCascade(ChoiceCascade),
    ValueFillCascade(ValueFillCascade),
    SchemaMaterialize(SchemaMaterialize),
    UnitSync(UnitSync<N>),
}

impl<N> BindingDescriptor<N> {
    pub fn driver(&self) -> DriverKey {
        match self {
            Self::ChoiceCascade(c) => DriverKey::id(&c.driver),
            Self::ValueFillCascade(v) => v.driver.clone(),
            Self::SchemaMaterialize(s) => DriverKey::id(&s.driver),
            Self::UnitSync(u) => DriverKey::id(&u.linked),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChoiceCascade(_) => "choice-cascade",
            Self::ValueFillCascade(_) => "value-fill",
            Self::SchemaMaterialize(_) => "schema-materialize",
            Self::UnitSync(_) => "unit-sync",
        }
    }
}

/// Bindings registered once at page initialisation
#[derive(Debug, Clone)]
pub struct BinderRegistry<N> {
    bindings: Vec<BindingDescriptor<N>>,
}

impl<N> Default for BinderRegistry<N> {
    fn default() -> Self {
        Self { bindings: Vec::new() }
    }
}

impl<N> BinderRegistry<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, binding: BindingDescriptor<N>) {
        tracing::debug!("Registered {} binding driven by {:?}", binding.kind(), binding.driver());
        self.bindings.push(binding);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BindingDescriptor<N>> {
        self.bindings.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BindingDescriptor<N>> {
        self.bindings.iter_mut()
    }

    /// Drops bindings whose elements left the page
    pub fn retain(&mut self, keep: impl FnMut(&BindingDescriptor<N>) -> bool) {
        let before = self.bindings.len();
        self.bindings.retain(keep);
        if self.bindings.len() != before {
            tracing::debug!("Dropped {} bindings", before - self.bindings.len());
        }
    }

    /// Bindings driven by `node`, in registration order
    pub fn driven_by<'a, D>(&'a self, dom: &'a D, node: &'a N) -> impl Iterator<Item = &'a BindingDescriptor<N>> + 'a
    where
        D: Dom<Node = N>,
    {
        self.bindings.iter().filter(move |b| b.driver().matches(dom, node))
    }
}
