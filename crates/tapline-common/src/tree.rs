//! Flattened, read-only snapshot of an accessibility tree.
//!
//! A [`UiTree`] is built once per query from the nested [`UiNode`] a bridge
//! reports. Nodes live in an arena in depth-first pre-order, so a [`NodeId`]
//! doubles as the traversal position: parents come before their children and
//! siblings keep their on-screen order. Parent links are plain indices and
//! always point to a smaller id, which makes every ancestor walk finite.

use crate::protocol::{NodeFlags, NodeHandle, NodeOperation, UiNode};
use std::collections::HashMap;

/// Position of a node in a snapshot's pre-order traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct NodeEntry {
    pub handle: NodeHandle,
    pub text: Option<String>,
    pub content_description: Option<String>,
    pub resource_id: Option<String>,
    pub class_name: Option<String>,
    pub flags: NodeFlags,
    pub actions: Vec<NodeOperation>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl NodeEntry {
    /// Primary text, falling back to the accessibility label when empty.
    pub fn display_text(&self) -> &str {
        match self.text.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => self.content_description.as_deref().unwrap_or(""),
        }
    }

    pub fn supports(&self, op: NodeOperation) -> bool {
        self.actions.contains(&op)
    }

    /// Short human-readable description used in logs and reports.
    pub fn describe(&self) -> String {
        let mut parts = vec![self.handle.to_string()];
        if let Some(id) = self.resource_id.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("id={id}"));
        }
        if let Some(text) = self.text.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("text=\"{text}\""));
        }
        if let Some(desc) = self.content_description.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("desc=\"{desc}\""));
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default)]
pub struct UiTree {
    nodes: Vec<NodeEntry>,
    id_index: Option<HashMap<String, Vec<NodeId>>>,
}

impl UiTree {
    /// An empty snapshot; every query against it finds nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(root: &UiNode) -> Self {
        let mut tree = Self::default();
        tree.push(root, None);
        tree
    }

    /// Snapshot with a resource-id index, for platforms that support direct
    /// id lookup.
    pub fn indexed(root: &UiNode) -> Self {
        let mut tree = Self::new(root);
        let mut index: HashMap<String, Vec<NodeId>> = HashMap::new();
        for (id, entry) in tree.iter() {
            if let Some(rid) = entry.resource_id.as_deref().filter(|s| !s.is_empty()) {
                index.entry(rid.to_string()).or_default().push(id);
            }
        }
        tree.id_index = Some(index);
        tree
    }

    fn push(&mut self, node: &UiNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            handle: node.handle,
            text: node.text.clone(),
            content_description: node.content_description.clone(),
            resource_id: node.resource_id.clone(),
            class_name: node.class_name.clone(),
            flags: node.flags,
            actions: node.actions.clone(),
            parent,
            children: Vec::with_capacity(node.children.len()),
        });
        for child in &node.children {
            let child_id = self.push(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeEntry> {
        self.nodes.get(id.0)
    }

    /// All nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeEntry)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// The subtree rooted at `id`, in pre-order.
    ///
    /// Pre-order places a subtree in one contiguous run that ends where the
    /// next node with a shallower or equal ancestry begins.
    pub fn subtree(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &NodeEntry)> + '_ {
        let end = self.subtree_end(id);
        self.nodes[id.0.min(end)..end]
            .iter()
            .enumerate()
            .map(move |(i, n)| (NodeId(id.0 + i), n))
    }

    fn subtree_end(&self, id: NodeId) -> usize {
        let mut current = id;
        loop {
            let Some(entry) = self.get(current) else {
                return self.nodes.len().min(id.0);
            };
            match entry.children.last() {
                Some(&last) => current = last,
                None => return current.0 + 1,
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Ancestors of `id`, nearest first, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    pub fn id_index(&self) -> Option<&HashMap<String, Vec<NodeId>>> {
        self.id_index.as_ref()
    }

    pub fn find_handle(&self, handle: NodeHandle) -> Option<NodeId> {
        self.iter().find(|(_, n)| n.handle == handle).map(|(id, _)| id)
    }

    /// The node currently holding input focus, if any.
    pub fn focused_input(&self) -> Option<NodeId> {
        self.iter().find(|(_, n)| n.flags.focused).map(|(id, _)| id)
    }

    pub fn describe(&self, id: NodeId) -> String {
        self.get(id)
            .map(NodeEntry::describe)
            .unwrap_or_else(|| format!("<missing node {}>", id.0))
    }
}
