use tapline_common::tree::{NodeEntry, NodeId, UiTree};

/// What an action needs from the node it finally operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Clickable,
    Scrollable,
    Editable,
}

impl Capability {
    pub fn satisfied_by(self, node: &NodeEntry) -> bool {
        match self {
            Capability::Clickable => node.flags.clickable,
            Capability::Scrollable => node.flags.scrollable,
            Capability::Editable => node.flags.editable,
        }
    }
}

/// Whether a node may be operated on at all.
pub fn is_actionable(node: &NodeEntry) -> bool {
    node.flags.visible && node.flags.enabled
}

/// Pick one node out of a candidate list.
///
/// The first visible and enabled candidate wins. Otherwise the first
/// candidate in traversal order is used, so that a caller still gets a target
/// to describe in its failure.
pub fn select(tree: &UiTree, candidates: &[NodeId]) -> Option<NodeId> {
    candidates
        .iter()
        .copied()
        .find(|&id| tree.get(id).is_some_and(is_actionable))
        .or_else(|| candidates.first().copied())
}

/// Candidates reordered the way [`select`] ranks them.
pub fn ranked(tree: &UiTree, candidates: &[NodeId]) -> Vec<NodeId> {
    let (mut preferred, rest): (Vec<NodeId>, Vec<NodeId>) = candidates
        .iter()
        .copied()
        .partition(|&id| tree.get(id).is_some_and(is_actionable));
    preferred.extend(rest);
    preferred
}

/// Walk from `start` toward the root until a visible node with `capability`
/// turns up.
///
/// The walk starts at `start` itself and visits each ancestor once; parent
/// ids are strictly smaller than child ids, so it always terminates.
pub fn climb(tree: &UiTree, start: NodeId, capability: Capability) -> Option<NodeId> {
    tree.get(start)?;
    std::iter::once(start)
        .chain(tree.ancestors(start))
        .find(|&id| {
            tree.get(id)
                .is_some_and(|n| capability.satisfied_by(n) && n.flags.visible)
        })
}

/// First visible, editable direct child of `id`.
pub fn editable_child(tree: &UiTree, id: NodeId) -> Option<NodeId> {
    tree.get(id)?
        .children
        .iter()
        .copied()
        .find(|&child| {
            tree.get(child)
                .is_some_and(|n| n.flags.editable && n.flags.visible)
        })
}

/// `id` itself when editable, otherwise its editable child when it has one,
/// otherwise `id` unchanged.
pub fn prefer_editable(tree: &UiTree, id: NodeId) -> NodeId {
    match tree.get(id) {
        Some(node) if node.flags.editable => id,
        _ => editable_child(tree, id).unwrap_or(id),
    }
}
