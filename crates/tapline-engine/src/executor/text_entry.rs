use super::{ActionExecutor, Done, Failed, Step, pause};
use crate::bridge::Bridge;
use crate::resolution::strategy;
use tapline_common::error::FailureReason;
use tapline_common::protocol::NodeOperation;
use tapline_common::script::{StructuredAction, keys};
use tapline_common::tree::{NodeId, UiTree};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

impl<B: Bridge> ActionExecutor<B> {
    /// TYPE_TEXT: find an input, make sure it is focused, replace its text.
    pub(super) async fn type_text(
        &mut self,
        action: &StructuredAction,
        cancel: &CancellationToken,
    ) -> Step {
        let params = action.params();
        let text = params
            .raw(keys::TEXT_TO_TYPE)
            .ok_or_else(|| FailureReason::missing(keys::TEXT_TO_TYPE))?;

        let tree = self.snapshot().await?;
        let Some(hit) = strategy::first_match(strategy::TEXT_ENTRY, &tree, &params) else {
            warn!("No input field matches");
            return Err(FailureReason::NoEditableTarget.into());
        };
        debug!(strategy = hit.strategy, node = %tree.describe(hit.node), "Resolved text entry target");

        let editable = tree.get(hit.node).is_some_and(|n| n.flags.editable);
        let (tree, id) = if editable {
            (tree, hit.node)
        } else {
            self.focus_by_click(tree, hit.node, cancel).await?
        };
        let Some(handle) = tree.get(id).map(|n| n.handle) else {
            return Err(FailureReason::NoEditableTarget.into());
        };
        let target = tree.describe(id);

        self.ensure_focus(&tree, id, &target).await?;
        pause(self.config.timing.focus_settle(), cancel).await?;

        // The field may have been re-rendered while focus settled.
        let tree = self.snapshot().await?;
        let Some(id) = tree.find_handle(handle) else {
            warn!(node = %target, "Input field disappeared after focusing");
            return Err(Failed::at(
                FailureReason::SetTextFailed {
                    target: target.clone(),
                },
                &target,
            ));
        };

        if self
            .perform_on(&tree, id, NodeOperation::SetText, Some(text))
            .await?
        {
            info!(
                node = %target,
                text = %self.config.security.loggable(keys::TEXT_TO_TYPE, text),
                "Text set"
            );
            Ok(Done::on(target))
        } else {
            Err(Failed::at(
                FailureReason::SetTextFailed {
                    target: target.clone(),
                },
                &target,
            ))
        }
    }

    /// Click a non-editable match and take whatever input gained focus.
    async fn focus_by_click(
        &mut self,
        tree: UiTree,
        id: NodeId,
        cancel: &CancellationToken,
    ) -> Result<(UiTree, NodeId), Failed> {
        let target = tree.describe(id);
        warn!(node = %target, "Target is not editable, clicking it first");
        if !self
            .perform_on(&tree, id, NodeOperation::Click, None)
            .await?
        {
            return Err(Failed::at(
                FailureReason::ClickFailed {
                    target: target.clone(),
                },
                &target,
            ));
        }
        pause(self.config.timing.settle_delay(), cancel).await?;

        let tree = self.snapshot().await?;
        let focused = tree
            .focused_input()
            .filter(|&f| tree.get(f).is_some_and(|n| n.flags.editable && n.flags.visible));
        match focused {
            Some(f) => {
                debug!(node = %tree.describe(f), "Switched to focused input");
                Ok((tree, f))
            }
            None => {
                warn!(node = %target, "Click did not focus an editable field");
                Err(Failed::at(FailureReason::NoEditableTarget, &target))
            }
        }
    }

    /// Focus the node, falling back to a click when focusing is refused.
    async fn ensure_focus(&mut self, tree: &UiTree, id: NodeId, target: &str) -> Result<(), Failed> {
        if tree.get(id).is_some_and(|n| n.flags.focused) {
            return Ok(());
        }
        if self.perform_on(tree, id, NodeOperation::Focus, None).await? {
            return Ok(());
        }
        debug!(node = target, "Focus refused, clicking to focus");
        if self.perform_on(tree, id, NodeOperation::Click, None).await? {
            return Ok(());
        }
        Err(Failed::at(
            FailureReason::FocusFailed {
                target: target.to_string(),
            },
            target,
        ))
    }
}
