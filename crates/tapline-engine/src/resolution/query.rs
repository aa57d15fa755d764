//! Searches over a [`UiTree`] snapshot.
//!
//! Every search walks the whole tree in depth-first pre-order and returns the
//! matches in that order. A search that finds nothing returns an empty list;
//! deciding what "nothing" means is left to the caller.

use super::selector::Selector;
use tapline_common::tree::{NodeId, UiTree};

/// Nodes whose displayable text matches `selector.text`.
///
/// Displayable text is the primary text, or the accessibility label when the
/// primary text is empty.
pub fn find_by_text(tree: &UiTree, selector: &Selector) -> Vec<NodeId> {
    let Some(needle) = selector.text() else {
        return Vec::new();
    };
    tree.iter()
        .filter(|(_, node)| {
            let text = node.display_text();
            !text.is_empty() && selector.text_match.matches(text, needle) && selector.accepts(node)
        })
        .map(|(id, _)| id)
        .collect()
}

/// Nodes whose resource id equals `resource_id`.
pub fn find_by_identifier(tree: &UiTree, resource_id: &str) -> Vec<NodeId> {
    if resource_id.trim().is_empty() {
        return Vec::new();
    }
    if let Some(index) = tree.id_index() {
        return index.get(resource_id).cloned().unwrap_or_default();
    }
    tree.iter()
        .filter(|(_, node)| node.resource_id.as_deref() == Some(resource_id))
        .map(|(id, _)| id)
        .collect()
}

/// Nodes whose accessibility label matches `selector.content_description`.
pub fn find_by_accessibility_label(tree: &UiTree, selector: &Selector) -> Vec<NodeId> {
    let Some(needle) = selector.content_description() else {
        return Vec::new();
    };
    tree.iter()
        .filter(|(_, node)| {
            node.content_description
                .as_deref()
                .is_some_and(|label| selector.text_match.matches(label, needle))
                && selector.accepts(node)
        })
        .map(|(id, _)| id)
        .collect()
}

/// First scrollable, visible node in the subtree rooted at `from`.
pub fn find_first_scrollable(tree: &UiTree, from: NodeId) -> Option<NodeId> {
    tree.subtree(from)
        .find(|(_, node)| node.flags.scrollable && node.flags.visible)
        .map(|(id, _)| id)
}
