pub mod policy;
pub mod query;
pub mod selector;
pub mod strategy;

pub use policy::{Capability, climb, editable_child, select};
pub use selector::{Selector, TextMatch};
pub use strategy::{Resolved, Strategy, first_match, strategies_for};

use tapline_common::FailureReason;
use tapline_common::tree::{NodeId, UiTree};

/// Resolve a selector to a single node: identifier, then label text, then
/// accessibility label, each narrowed by the selector's flag filters.
pub fn resolve(tree: &UiTree, selector: &Selector) -> Result<NodeId, FailureReason> {
    if !selector.has_criteria() {
        return Err(FailureReason::NoCriteria);
    }

    if let Some(id) = selector.resource_id() {
        let hits: Vec<NodeId> = query::find_by_identifier(tree, id)
            .into_iter()
            .filter(|&n| tree.get(n).is_some_and(|node| selector.accepts(node)))
            .collect();
        if let Some(node) = select(tree, &hits) {
            return Ok(node);
        }
    }

    if let Some(node) = select(tree, &query::find_by_text(tree, selector)) {
        return Ok(node);
    }

    select(tree, &query::find_by_accessibility_label(tree, selector)).ok_or_else(|| {
        FailureReason::ElementNotFound {
            criteria: selector.to_string(),
        }
    })
}
