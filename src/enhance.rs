//! Cosmetic enhancement of native controls.
//!
//! The enhancer itself lives outside the engine (a select widget, a date
//! picker). The engine only decides when to call it and swallows its
//! failures: an unenhanced control still works.

use crate::dom::{Dom, Query};
use crate::error::EnhanceError;

pub trait Enhancer<D: Dom> {
    fn enhance(&mut self, dom: &mut D, node: &D::Node) -> Result<(), EnhanceError>;
}

/// Leaves every control as rendered
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnhancer;

impl<D: Dom> Enhancer<D> for NoopEnhancer {
    fn enhance(&mut self, _dom: &mut D, _node: &D::Node) -> Result<(), EnhanceError> {
        Ok(())
    }
}

/// Enhances every select under `scope` that is not part of a template.
///
/// Returns how many controls were enhanced successfully.
pub fn enhance_selects<D, E>(dom: &mut D, enhancer: &mut E, scope: Option<&D::Node>, placeholder: &str) -> usize
where
    D: Dom,
    E: Enhancer<D> + ?Sized,
{
    let mut targets = Vec::new();
    if let Some(scope) = scope {
        if dom.tag_name(scope) == "select" {
            targets.push(scope.clone());
        }
    }
    targets.extend(dom.query(scope, &Query::tag("select")));

    let mut enhanced = 0;
    for select in targets {
        if dom.id(&select).is_some_and(|id| id.contains(placeholder)) {
            continue;
        }
        match enhancer.enhance(dom, &select) {
            Ok(()) => enhanced += 1,
            Err(e) => tracing::debug!("Ignoring enhancement failure on {:?}: {}", select, e),
        }
    }
    enhanced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDom, NodeId};

    struct FailingOn(&'static str);

    impl Enhancer<MemoryDom> for FailingOn {
        fn enhance(&mut self, dom: &mut MemoryDom, node: &NodeId) -> Result<(), EnhanceError> {
            if dom.id(node).as_deref() == Some(self.0) {
                return Err(EnhanceError("widget threw".to_string()));
            }
            dom.add_class(node, "enhanced");
            Ok(())
        }
    }

    #[test]
    fn test_failures_are_swallowed_and_templates_skipped() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let ok = dom.element(body, "select", &[("id", "id_region")]);
        dom.element(body, "select", &[("id", "id_county")]);
        let template = dom.element(body, "select", &[("id", "id_form-__prefix__-package_type")]);

        let count = enhance_selects(&mut dom, &mut FailingOn("id_county"), None, "__prefix__");

        assert_eq!(count, 1);
        assert!(dom.has_class(&ok, "enhanced"));
        assert!(!dom.has_class(&template, "enhanced"));
    }
}
