use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Retained view state of a single addressable element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewNode {
    pub text: String,
    pub classes: BTreeSet<String>,
    pub props: BTreeMap<String, f32>,
    pub media: Option<String>,
    pub hidden: bool,
}

/// View model the scenes write into and the host renders from. Scenes never
/// touch a real display; this graph is the one-directional output.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RenderGraph {
    nodes: BTreeMap<String, ViewNode>,
    scroll_locked: bool,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every node; called between scenes.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn node(&self, target: &str) -> Option<&ViewNode> {
        self.nodes.get(target)
    }

    pub fn node_mut(&mut self, target: &str) -> &mut ViewNode {
        self.nodes.entry(target.to_string()).or_default()
    }

    pub fn remove(&mut self, target: &str) {
        self.nodes.remove(target);
    }

    pub fn text(&self, target: &str) -> Option<&str> {
        self.nodes.get(target).map(|node| node.text.as_str())
    }

    pub fn set_text(&mut self, target: &str, text: impl Into<String>) {
        self.node_mut(target).text = text.into();
    }

    pub fn set_media(&mut self, target: &str, media: Option<String>) {
        self.node_mut(target).media = media;
    }

    pub fn set_class(&mut self, target: &str, class: &str, on: bool) {
        let classes = &mut self.node_mut(target).classes;
        if on {
            classes.insert(class.to_string());
        } else {
            classes.remove(class);
        }
    }

    pub fn has_class(&self, target: &str, class: &str) -> bool {
        self.nodes
            .get(target)
            .is_some_and(|node| node.classes.contains(class))
    }

    pub fn set_prop(&mut self, target: &str, property: &str, value: f32) {
        self.node_mut(target)
            .props
            .insert(property.to_string(), value);
    }

    pub fn prop(&self, target: &str, property: &str) -> Option<f32> {
        self.nodes
            .get(target)
            .and_then(|node| node.props.get(property).copied())
    }

    pub fn set_hidden(&mut self, target: &str, hidden: bool) {
        self.node_mut(target).hidden = hidden;
    }

    pub fn is_hidden(&self, target: &str) -> bool {
        self.nodes.get(target).is_some_and(|node| node.hidden)
    }

    /// Targets whose name starts with `prefix`, in sorted order.
    pub fn targets_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> {
        self.nodes
            .keys()
            .filter(move |key| key.starts_with(prefix))
            .map(String::as_str)
    }

    pub fn set_scroll_locked(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
