//! Arena-backed in-memory document.

use super::{Dom, Query};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Side effect the page asked the browsing context to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowsingEvent {
    Submit {
        action: String,
        method: String,
        fields: Vec<(String, String)>,
    },
    Navigate {
        url: String,
    },
    OpenWindow {
        url: String,
        target: String,
    },
}

/// Property name of one inline style declaration
fn style_property(declaration: &str) -> Option<&str> {
    declaration.split_once(':').map(|(name, _)| name.trim())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeData {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    text: String,
    value: Option<String>,
    hidden: bool,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            parent: None,
            children: Vec::new(),
            text: String::new(),
            value: None,
            hidden: false,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDom {
    nodes: Vec<NodeData>,
    root: NodeId,
    events: Vec<BrowsingEvent>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new("body")],
            root: NodeId(0),
            events: Vec::new(),
        }
    }

    pub fn body(&self) -> NodeId {
        self.root
    }

    /// Creates an element with `attrs` and appends it to `parent`
    pub fn element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = self.create_element(tag);
        for (name, value) in attrs {
            self.set_attribute(&node, name, value);
        }
        self.append_child(&parent, &node);
        node
    }

    /// Appends an `<option>` to a select
    pub fn option(&mut self, select: NodeId, value: &str, label: &str) -> NodeId {
        let option = self.element(select, "option", &[("value", value)]);
        self.set_text(&option, label);
        option
    }

    pub fn events(&self) -> &[BrowsingEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<BrowsingEvent> {
        std::mem::take(&mut self.events)
    }

    /// `(value, label)` of every option of a select
    pub fn options(&self, select: NodeId) -> Vec<(String, String)> {
        self.option_nodes(select)
            .into_iter()
            .map(|o| (self.option_value(o), self.text(&o)))
            .collect()
    }

    /// True when `node` is reachable from the document root
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.data(id).parent;
        }
        false
    }

    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0]
    }

    fn data_mut(&mut self, node: NodeId) -> &mut NodeData {
        &mut self.nodes[node.0]
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.data(scope).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.data(id).children.iter().rev().copied());
        }
        out
    }

    fn option_nodes(&self, select: NodeId) -> Vec<NodeId> {
        self.data(select)
            .children
            .iter()
            .copied()
            .filter(|c| self.data(*c).tag == "option")
            .collect()
    }

    fn option_value(&self, option: NodeId) -> String {
        match self.data(option).attr("value") {
            Some(v) => v.to_string(),
            None => self.text(&option),
        }
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.data(node).parent {
            self.data_mut(parent).children.retain(|c| *c != node);
            self.data_mut(node).parent = None;
        }
    }

    fn copy_subtree(&mut self, node: NodeId) -> NodeId {
        let mut copy = self.data(node).clone();
        copy.parent = None;
        copy.children = Vec::new();
        let id = NodeId(self.nodes.len());
        self.nodes.push(copy);
        for child in self.data(node).children.clone() {
            let child_copy = self.copy_subtree(child);
            self.data_mut(child_copy).parent = Some(id);
            self.data_mut(id).children.push(child_copy);
        }
        id
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.data(*n).attr("id") == Some(id))
    }

    fn query(&self, scope: Option<&NodeId>, query: &Query) -> Vec<NodeId> {
        let scope = scope.copied().unwrap_or(self.root);
        self.descendants(scope)
            .into_iter()
            .filter(|n| {
                let data = self.data(*n);
                query.matches(&data.tag, |name| data.attr(name))
            })
            .collect()
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.data(*node).tag.clone()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.data(*node).attr(name).map(str::to_string)
    }

    fn attributes(&self, node: &NodeId) -> Vec<(String, String)> {
        self.data(*node).attrs.clone()
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        let data = self.data_mut(*node);
        match data.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => data.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        self.data_mut(*node).attrs.retain(|(k, _)| k != name);
    }

    fn value(&self, node: &NodeId) -> String {
        let data = self.data(*node);
        if data.tag != "select" {
            return data
                .value
                .clone()
                .or_else(|| data.attr("value").map(str::to_string))
                .unwrap_or_default();
        }

        let options = self.option_nodes(*node);
        if let Some(chosen) = &data.value {
            if options.iter().any(|o| &self.option_value(*o) == chosen) {
                return chosen.clone();
            }
        }
        options
            .iter()
            .find(|o| self.data(**o).attr("selected").is_some())
            .or_else(|| options.first())
            .map(|o| self.option_value(*o))
            .unwrap_or_default()
    }

    fn set_value(&mut self, node: &NodeId, value: &str) {
        self.data_mut(*node).value = Some(value.to_string());
    }

    fn text(&self, node: &NodeId) -> String {
        let mut text = self.data(*node).text.clone();
        for child in &self.data(*node).children {
            text.push_str(&self.text(child));
        }
        text
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        self.remove_children(node);
        self.data_mut(*node).text = text.to_string();
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::new(tag));
        id
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.detach(*child);
        self.data_mut(*child).parent = Some(*parent);
        self.data_mut(*parent).children.push(*child);
    }

    fn insert_after(&mut self, reference: &NodeId, node: &NodeId) {
        let Some(parent) = self.data(*reference).parent else {
            return;
        };
        self.detach(*node);
        let siblings = &mut self.data_mut(parent).children;
        let at = siblings
            .iter()
            .position(|c| c == reference)
            .map(|p| p + 1)
            .unwrap_or(siblings.len());
        siblings.insert(at, *node);
        self.data_mut(*node).parent = Some(parent);
    }

    fn remove(&mut self, node: &NodeId) {
        self.detach(*node);
    }

    fn remove_children(&mut self, node: &NodeId) {
        for child in std::mem::take(&mut self.data_mut(*node).children) {
            self.data_mut(child).parent = None;
        }
        if self.data(*node).tag == "select" {
            self.data_mut(*node).value = None;
        }
    }

    fn clone_subtree(&mut self, node: &NodeId) -> NodeId {
        self.copy_subtree(*node)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.data(*node).parent
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.data(*node).children.clone()
    }

    fn set_hidden(&mut self, node: &NodeId, hidden: bool) {
        let data = self.data_mut(*node);
        data.hidden = hidden;
        if !hidden {
            // Showing also drops an inline `display` declaration
            let style = data.attr("style").map(|s| {
                s.split(';')
                    .filter(|d| !d.trim().is_empty() && style_property(d) != Some("display"))
                    .map(str::trim)
                    .collect::<Vec<_>>()
                    .join("; ")
            });
            match style {
                Some(s) if s.is_empty() => data.attrs.retain(|(k, _)| k != "style"),
                Some(s) => {
                    if let Some((_, v)) = data.attrs.iter_mut().find(|(k, _)| k == "style") {
                        *v = s;
                    }
                }
                None => {}
            }
        }
    }

    fn is_hidden(&self, node: &NodeId) -> bool {
        let data = self.data(*node);
        data.hidden
            || data.attr("style").is_some_and(|s| {
                s.split(';')
                    .any(|d| style_property(d) == Some("display") && d.split_once(':').is_some_and(|(_, v)| v.trim() == "none"))
            })
    }

    fn submit_form(&mut self, form: &NodeId) {
        let fields = self
            .query(Some(form), &Query::attr("name"))
            .into_iter()
            .filter(|n| {
                matches!(self.data(*n).tag.as_str(), "input" | "select" | "textarea")
                    && !self.is_disabled(n)
            })
            .filter_map(|n| self.attribute(&n, "name").map(|name| (name, self.value(&n))))
            .collect();
        let event = BrowsingEvent::Submit {
            action: self.attribute(form, "action").unwrap_or_default(),
            method: self
                .attribute(form, "method")
                .unwrap_or_else(|| "get".to_string())
                .to_ascii_lowercase(),
            fields,
        };
        self.events.push(event);
    }

    fn navigate(&mut self, url: &str) {
        self.events.push(BrowsingEvent::Navigate {
            url: url.to_string(),
        });
    }

    fn open_window(&mut self, url: &str, target: &str) {
        self.events.push(BrowsingEvent::OpenWindow {
            url: url.to_string(),
            target: target.to_string(),
        });
    }
}
