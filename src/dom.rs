use std::collections::HashMap;

use crate::{Error, Result};

/// Index into the page's node arena. Nodes are never deallocated while the
/// page lives; removal only unlinks a node from the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) value: String,
    pub(crate) checked: bool,
    pub(crate) disabled: bool,
    pub(crate) required: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let value = attrs.get("value").cloned().unwrap_or_default();
        let checked = attrs.contains_key("checked");
        let disabled = attrs.contains_key("disabled");
        let required = attrs.contains_key("required");
        let element = Element {
            tag_name,
            attrs,
            value,
            checked,
            disabled,
            required,
        };
        let id = self.create_node(Some(parent), NodeType::Element(element));
        if let Some(element_id) = self.attr(id, "id") {
            if !element_id.is_empty() {
                self.id_index.insert(element_id, id);
            }
        }
        id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes[node_id.0].parent
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn is_connected(&self, node_id: NodeId) -> bool {
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Pre-order element descendants of `node_id`, excluding the node itself.
    pub(crate) fn element_descendants(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node_id.0]
            .children
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(current) = stack.pop() {
            if self.element(current).is_some() {
                out.push(current);
            }
            for child in self.nodes[current.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document | NodeType::Element(_) => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
            NodeType::Text(text) => text.clone(),
        }
    }

    /// Replaces an element's children with one text node. No-op on
    /// non-elements, which callers never pass.
    pub(crate) fn set_text_content(&mut self, node_id: NodeId, value: &str) {
        if self.element(node_id).is_none() {
            return;
        }
        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
            self.unindex_subtree(child);
        }
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
    }

    pub(crate) fn value(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.value.as_str())
    }

    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::PageRuntime("value target is not an element".into()))?;
        element.value = value.to_string();
        Ok(())
    }

    pub(crate) fn checked(&self, node_id: NodeId) -> bool {
        self.element(node_id).map(|e| e.checked).unwrap_or(false)
    }

    pub(crate) fn set_checked(&mut self, node_id: NodeId, checked: bool) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::PageRuntime("checked target is not an element".into()))?;
        element.checked = checked;
        Ok(())
    }

    pub(crate) fn disabled(&self, node_id: NodeId) -> bool {
        self.element(node_id).map(|e| e.disabled).unwrap_or(false)
    }

    pub(crate) fn set_disabled(&mut self, node_id: NodeId, disabled: bool) {
        if let Some(element) = self.element_mut(node_id) {
            element.disabled = disabled;
        }
    }

    pub(crate) fn required(&self, node_id: NodeId) -> bool {
        self.element(node_id).map(|e| e.required).unwrap_or(false)
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|e| e.attrs.get(name).cloned())
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        let old_id = if lowered == "id" {
            self.attr(node_id, "id")
        } else {
            None
        };
        let connected = self.is_connected(node_id);
        {
            let element = self
                .element_mut(node_id)
                .ok_or_else(|| Error::PageRuntime("attribute target is not an element".into()))?;
            element.attrs.insert(lowered.clone(), value.to_string());
            match lowered.as_str() {
                "value" => element.value = value.to_string(),
                "checked" => element.checked = true,
                "disabled" => element.disabled = true,
                "required" => element.required = true,
                _ => {}
            }
        }
        if lowered == "id" && connected {
            if let Some(old) = old_id {
                self.id_index.remove(&old);
            }
            if !value.is_empty() {
                self.id_index.insert(value.to_string(), node_id);
            }
        }
        Ok(())
    }

    pub(crate) fn remove_attr(&mut self, node_id: NodeId, name: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        let old_id = if lowered == "id" {
            self.attr(node_id, "id")
        } else {
            None
        };
        let connected = self.is_connected(node_id);
        {
            let element = self
                .element_mut(node_id)
                .ok_or_else(|| Error::PageRuntime("attribute target is not an element".into()))?;
            element.attrs.remove(&lowered);
            match lowered.as_str() {
                "checked" => element.checked = false,
                "disabled" => element.disabled = false,
                "required" => element.required = false,
                _ => {}
            }
        }
        if connected {
            if let Some(old) = old_id {
                if self.id_index.get(&old) == Some(&node_id) {
                    self.id_index.remove(&old);
                }
            }
        }
        Ok(())
    }

    pub(crate) fn has_class(&self, node_id: NodeId, class: &str) -> bool {
        self.attr(node_id, "class")
            .map(|list| list.split_ascii_whitespace().any(|item| item == class))
            .unwrap_or(false)
    }

    pub(crate) fn style_get(&self, node_id: NodeId, property: &str) -> Option<String> {
        let element = self.element(node_id)?;
        let decls = parse_style_declarations(element.attrs.get("style").map(String::as_str));
        decls
            .into_iter()
            .find(|(prop, _)| prop == property)
            .map(|(_, value)| value)
    }

    /// Sets one inline-style declaration. An empty value removes the
    /// declaration; removing the last declaration drops the style attribute.
    /// No-op on non-elements.
    pub(crate) fn style_set(&mut self, node_id: NodeId, property: &str, value: &str) {
        let Some(element) = self.element_mut(node_id) else {
            return;
        };
        let mut decls = parse_style_declarations(element.attrs.get("style").map(String::as_str));
        if let Some(pos) = decls.iter().position(|(prop, _)| prop == property) {
            if value.is_empty() {
                decls.remove(pos);
            } else {
                decls[pos].1 = value.to_string();
            }
        } else if !value.is_empty() {
            decls.push((property.to_string(), value.to_string()));
        }

        if decls.is_empty() {
            element.attrs.remove("style");
        } else {
            let rendered = decls
                .iter()
                .map(|(prop, value)| format!("{prop}: {value}"))
                .collect::<Vec<_>>()
                .join("; ");
            element.attrs.insert("style".into(), rendered);
        }
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(Error::PageRuntime("cannot remove document root".into()));
        }
        let Some(parent) = self.parent(node) else {
            return Ok(());
        };
        self.nodes[parent.0].children.retain(|child| *child != node);
        self.nodes[node.0].parent = None;
        self.unindex_subtree(node);
        Ok(())
    }

    fn unindex_subtree(&mut self, node: NodeId) {
        let mut remove = Vec::new();
        if let Some(id) = self.attr(node, "id") {
            remove.push((id, node));
        }
        for descendant in self.element_descendants(node) {
            if let Some(id) = self.attr(descendant, "id") {
                remove.push((id, descendant));
            }
        }
        for (id, owner) in remove {
            if self.id_index.get(&id) == Some(&owner) {
                self.id_index.remove(&id);
            }
        }
    }

    /// Textarea values come from their text children, after parsing.
    pub(crate) fn initialize_form_control_values(&mut self) {
        let nodes: Vec<NodeId> = (0..self.nodes.len()).map(NodeId).collect();
        for node in nodes {
            let is_textarea = self
                .tag_name(node)
                .map(|tag| tag.eq_ignore_ascii_case("textarea"))
                .unwrap_or(false);
            if is_textarea {
                let text = self.text_content(node);
                if let Some(element) = self.element_mut(node) {
                    element.value = text;
                }
            }
        }
    }

    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.dump_node(*child));
                }
                out
            }
            NodeType::Text(text) => text.clone(),
            NodeType::Element(element) => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&element.tag_name);
                let mut attrs: Vec<_> = element.attrs.iter().collect();
                attrs.sort_by(|a, b| a.0.cmp(b.0));
                for (name, value) in attrs {
                    out.push_str(&format!(" {name}=\"{value}\""));
                }
                out.push('>');
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.dump_node(*child));
                }
                out.push_str(&format!("</{}>", element.tag_name));
                out
            }
        }
    }
}

fn parse_style_declarations(style: Option<&str>) -> Vec<(String, String)> {
    let Some(style) = style else {
        return Vec::new();
    };
    let mut decls = Vec::new();
    for part in style.split(';') {
        let Some((prop, value)) = part.split_once(':') else {
            continue;
        };
        let prop = prop.trim();
        let value = value.trim();
        if !prop.is_empty() && !value.is_empty() {
            decls.push((prop.to_string(), value.to_string()));
        }
    }
    decls
}
