//! Ordered lookup strategies per action kind.
//!
//! A strategy is a pure function from a snapshot and an action's parameters to
//! at most one node. An action kind owns an ordered table of them and the
//! first strategy that yields a node wins; later strategies are not consulted.

use super::policy::{self, Capability};
use super::query;
use super::selector::Selector;
use std::fmt;
use tapline_common::script::{ActionKind, ActionParams, keys};
use tapline_common::tree::{NodeId, UiTree};

pub type StrategyFn = fn(&UiTree, &ActionParams<'_>) -> Option<NodeId>;

#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub find: StrategyFn,
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Strategy").field(&self.name).finish()
    }
}

/// A node together with the strategy that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub node: NodeId,
    pub strategy: &'static str,
}

const fn strategy(name: &'static str, find: StrategyFn) -> Strategy {
    Strategy { name, find }
}

/// Identifier, then label text, then accessibility label. Used by click,
/// text retrieval, waiting and generic operations.
pub const ELEMENT: &[Strategy] = &[
    strategy("resource_id", element_by_resource_id),
    strategy("text", element_by_text),
    strategy("content_description", element_by_content_description),
];

/// Text-entry targets, most specific first.
///
/// 1. Identifier
/// 2. Label text of an editable node
/// 3. Label text of a focusable node, descending into an editable child
/// 4. Label text of any node owning a visible editable child
/// 5. The focused input, when editable and visible
pub const TEXT_ENTRY: &[Strategy] = &[
    strategy("resource_id", element_by_resource_id),
    strategy("editable_text", editable_by_text),
    strategy("focusable_text", focusable_by_text),
    strategy("label_with_editable_child", label_with_editable_child),
    strategy("focused_input", focused_input),
];

/// Scroll containers: explicit target climbed to a scrollable node, else the
/// first scrollable node on screen.
pub const SCROLL: &[Strategy] = &[
    strategy("scroll_resource_id", scrollable_by_resource_id),
    strategy("scroll_text", scrollable_by_text),
    strategy("first_scrollable", first_scrollable),
];

/// The strategy table an action kind resolves its target with. Kinds that
/// target no node get an empty table.
pub fn strategies_for(kind: &ActionKind) -> &'static [Strategy] {
    match kind {
        ActionKind::TypeText => TEXT_ENTRY,
        ActionKind::ScrollView => SCROLL,
        ActionKind::ClickElement
        | ActionKind::GetTextFromElement
        | ActionKind::WaitForElement
        | ActionKind::PerformAccessibilityAction => ELEMENT,
        _ => &[],
    }
}

/// Run `strategies` in order and return the first hit.
pub fn first_match(
    strategies: &[Strategy],
    tree: &UiTree,
    params: &ActionParams<'_>,
) -> Option<Resolved> {
    strategies.iter().find_map(|s| {
        (s.find)(tree, params).map(|node| Resolved {
            node,
            strategy: s.name,
        })
    })
}

fn element_by_resource_id(tree: &UiTree, params: &ActionParams<'_>) -> Option<NodeId> {
    let id = params.get(keys::ELEMENT_RESOURCE_ID)?;
    policy::select(tree, &query::find_by_identifier(tree, id))
}

fn element_by_text(tree: &UiTree, params: &ActionParams<'_>) -> Option<NodeId> {
    let text = params.get(keys::ELEMENT_TEXT_TO_CLICK)?;
    policy::select(tree, &query::find_by_text(tree, &Selector::by_text(text)))
}

fn element_by_content_description(tree: &UiTree, params: &ActionParams<'_>) -> Option<NodeId> {
    let label = params.get(keys::ELEMENT_CONTENT_DESCRIPTION)?;
    let selector = Selector::by_content_description(label);
    policy::select(tree, &query::find_by_accessibility_label(tree, &selector))
}

fn editable_by_text(tree: &UiTree, params: &ActionParams<'_>) -> Option<NodeId> {
    let text = params.get(keys::ELEMENT_TEXT_TO_CLICK)?;
    let selector = Selector::by_text(text).editable(true);
    policy::select(tree, &query::find_by_text(tree, &selector))
}

fn focusable_by_text(tree: &UiTree, params: &ActionParams<'_>) -> Option<NodeId> {
    let text = params.get(keys::ELEMENT_TEXT_TO_CLICK)?;
    let selector = Selector::by_text(text).focusable(true);
    let node = policy::select(tree, &query::find_by_text(tree, &selector))?;
    Some(policy::prefer_editable(tree, node))
}

fn label_with_editable_child(tree: &UiTree, params: &ActionParams<'_>) -> Option<NodeId> {
    let text = params.get(keys::ELEMENT_TEXT_TO_CLICK)?;
    let candidates = query::find_by_text(tree, &Selector::by_text(text));
    policy::ranked(tree, &candidates)
        .into_iter()
        .find_map(|id| policy::editable_child(tree, id))
}

fn focused_input(tree: &UiTree, _params: &ActionParams<'_>) -> Option<NodeId> {
    let id = tree.focused_input()?;
    let node = tree.get(id)?;
    (node.flags.editable && node.flags.visible).then_some(id)
}

fn scrollable_by_resource_id(tree: &UiTree, params: &ActionParams<'_>) -> Option<NodeId> {
    let id = params.get(keys::SCROLL_TARGET_RESOURCE_ID)?;
    let node = policy::select(tree, &query::find_by_identifier(tree, id))?;
    policy::climb(tree, node, Capability::Scrollable)
}

fn scrollable_by_text(tree: &UiTree, params: &ActionParams<'_>) -> Option<NodeId> {
    let text = params.get(keys::SCROLL_TARGET_TEXT)?;
    let node = policy::select(tree, &query::find_by_text(tree, &Selector::by_text(text)))?;
    policy::climb(tree, node, Capability::Scrollable)
}

fn first_scrollable(tree: &UiTree, _params: &ActionParams<'_>) -> Option<NodeId> {
    query::find_first_scrollable(tree, tree.root()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tapline_common::protocol::UiNode;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn text(handle: u64, value: &str) -> UiNode {
        let mut node = UiNode::new(handle);
        node.text = Some(value.to_string());
        node
    }

    #[test]
    fn identifier_beats_text() {
        let mut root = UiNode::new(1);
        let by_text = text(2, "Submit");
        let mut by_id = text(3, "Go");
        by_id.resource_id = Some("btn_submit".into());
        root.children = vec![by_text, by_id];
        let tree = UiTree::new(&root);

        let map = params(&[
            (keys::ELEMENT_RESOURCE_ID, "btn_submit"),
            (keys::ELEMENT_TEXT_TO_CLICK, "Submit"),
        ]);
        let hit = first_match(ELEMENT, &tree, &ActionParams(&map)).unwrap();
        assert_eq!(hit, Resolved { node: NodeId(2), strategy: "resource_id" });

        let map = params(&[(keys::ELEMENT_TEXT_TO_CLICK, "Submit")]);
        let hit = first_match(ELEMENT, &tree, &ActionParams(&map)).unwrap();
        assert_eq!(hit.node, NodeId(1));
    }

    #[test]
    fn text_entry_descends_into_editable_child() {
        let mut root = UiNode::new(1);
        let mut label = text(2, "Username");
        let mut input = UiNode::new(3);
        input.flags.editable = true;
        label.children.push(input);
        root.children.push(label);
        let tree = UiTree::new(&root);

        let map = params(&[(keys::ELEMENT_TEXT_TO_CLICK, "Username")]);
        let hit = first_match(TEXT_ENTRY, &tree, &ActionParams(&map)).unwrap();
        assert_eq!(hit.node, NodeId(2));
        assert_eq!(hit.strategy, "label_with_editable_child");
    }

    #[test]
    fn text_entry_falls_back_to_focused_input() {
        let mut root = UiNode::new(1);
        let mut input = UiNode::new(2);
        input.flags.editable = true;
        input.flags.focused = true;
        root.children.push(input);
        let tree = UiTree::new(&root);

        let empty = HashMap::new();
        let hit = first_match(TEXT_ENTRY, &tree, &ActionParams(&empty)).unwrap();
        assert_eq!(hit, Resolved { node: NodeId(1), strategy: "focused_input" });
    }

    #[test]
    fn scroll_target_climbs_to_container() {
        let mut list = UiNode::new(1);
        list.flags.scrollable = true;
        list.children.push(text(2, "Item 12"));
        let tree = UiTree::new(&list);

        let map = params(&[(keys::SCROLL_TARGET_TEXT, "item 12")]);
        let hit = first_match(SCROLL, &tree, &ActionParams(&map)).unwrap();
        assert_eq!(hit, Resolved { node: NodeId(0), strategy: "scroll_text" });

        let empty = HashMap::new();
        let hit = first_match(SCROLL, &tree, &ActionParams(&empty)).unwrap();
        assert_eq!(hit.strategy, "first_scrollable");
    }

    #[test]
    fn kinds_without_targets_have_no_strategies() {
        assert!(strategies_for(&ActionKind::NavigateHome).is_empty());
        assert_eq!(strategies_for(&ActionKind::TypeText).len(), 5);
        assert!(first_match(ELEMENT, &UiTree::empty(), &ActionParams(&HashMap::new())).is_none());
    }
}
