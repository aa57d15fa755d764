use super::{ActionExecutor, Done, Failed, Step, pause};
use crate::bridge::Bridge;
use crate::resolution::strategy::{self, Resolved};
use crate::resolution::{Capability, Selector, climb};
use std::time::Duration;
use tapline_common::error::FailureReason;
use tapline_common::protocol::NodeOperation;
use tapline_common::schema;
use tapline_common::script::{ActionParams, StructuredAction, keys};
use tapline_common::tree::UiTree;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Element criteria of an action. Fails with `NoCriteria` when every
/// identification key is blank, before the device is touched.
fn selector(params: &ActionParams<'_>) -> Result<Selector, FailureReason> {
    let selector = Selector::from_keys(
        params.get(keys::ELEMENT_RESOURCE_ID),
        params.get(keys::ELEMENT_TEXT_TO_CLICK),
        params.get(keys::ELEMENT_CONTENT_DESCRIPTION),
    );
    if selector.has_criteria() {
        Ok(selector)
    } else {
        Err(FailureReason::NoCriteria)
    }
}

fn find_element(
    tree: &UiTree,
    params: &ActionParams<'_>,
    selector: &Selector,
) -> Result<Resolved, FailureReason> {
    let hit = strategy::first_match(strategy::ELEMENT, tree, params).ok_or_else(|| {
        FailureReason::ElementNotFound {
            criteria: selector.to_string(),
        }
    })?;
    debug!(strategy = hit.strategy, node = %tree.describe(hit.node), "Resolved element");
    Ok(hit)
}

impl<B: Bridge> ActionExecutor<B> {
    pub(super) async fn click_element(&mut self, action: &StructuredAction) -> Step {
        let params = action.params();
        let selector = selector(&params)?;
        let tree = self.snapshot().await?;
        let hit = find_element(&tree, &params, &selector)?;
        let matched = tree.describe(hit.node);

        let Some(clickable) = climb(&tree, hit.node, Capability::Clickable) else {
            return Err(Failed::at(
                FailureReason::NoClickableTarget {
                    target: matched.clone(),
                },
                &matched,
            ));
        };
        let target = tree.describe(clickable);
        if clickable != hit.node {
            debug!(from = %matched, to = %target, "Climbed to clickable ancestor");
        }

        if self.perform_on(&tree, clickable, NodeOperation::Click, None).await? {
            Ok(Done::on(target))
        } else {
            Err(Failed::at(
                FailureReason::ClickFailed {
                    target: target.clone(),
                },
                &target,
            ))
        }
    }

    pub(super) async fn get_text(&mut self, action: &StructuredAction) -> Step {
        let params = action.params();
        let selector = selector(&params)?;
        let tree = self.snapshot().await?;
        let hit = find_element(&tree, &params, &selector)?;
        let target = tree.describe(hit.node);

        let text = tree
            .get(hit.node)
            .map(|node| node.display_text().to_string())
            .filter(|text| !text.is_empty());
        match text {
            Some(text) => {
                info!(node = %target, "Read element text");
                Ok(Done {
                    target: Some(target),
                    output: Some(text),
                })
            }
            None => Err(Failed::at(
                FailureReason::NoTextAvailable {
                    target: target.clone(),
                },
                &target,
            )),
        }
    }

    /// Poll until the element shows up or `timeout_ms` elapses.
    ///
    /// A missing active window counts as "not there yet". The timeout bounds
    /// only this polling loop.
    pub(super) async fn wait_for_element(
        &mut self,
        action: &StructuredAction,
        cancel: &CancellationToken,
    ) -> Step {
        let params = action.params();
        let selector = selector(&params)?;
        let timeout_ms = schema::positive_millis(action, keys::TIMEOUT_MS)?;
        let timeout = Duration::from_millis(timeout_ms);
        let interval = self.config.timing.poll_interval();
        let deadline = Instant::now() + timeout;
        info!(criteria = %selector, timeout_ms, "Waiting for element");

        loop {
            if let Some(tree) = self.bridge.snapshot().await?
                && let Some(hit) = strategy::first_match(strategy::ELEMENT, &tree, &params)
            {
                let target = tree.describe(hit.node);
                info!(node = %target, "Element appeared");
                return Ok(Done::on(target));
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            pause(interval.min(deadline - now), cancel).await?;
        }

        warn!(criteria = %selector, timeout_ms, "Timed out waiting for element");
        Err(FailureReason::Timeout {
            criteria: selector.to_string(),
            timeout_ms,
        }
        .into())
    }

    /// PERFORM_ACCESSIBILITY_ACTION: a named node operation on a resolved
    /// element. `ACTION_SET_TEXT` takes its value from `text_to_type`.
    pub(super) async fn perform_named(&mut self, action: &StructuredAction) -> Step {
        let params = action.params();
        let name = params
            .get(keys::ACTION_TO_PERFORM)
            .ok_or_else(|| FailureReason::missing(keys::ACTION_TO_PERFORM))?;
        let operation: NodeOperation = name.parse().map_err(|_| FailureReason::UnknownOperation {
            name: name.to_string(),
        })?;
        let text = match operation {
            NodeOperation::SetText => Some(
                params
                    .raw(keys::TEXT_TO_TYPE)
                    .ok_or_else(|| FailureReason::missing(keys::TEXT_TO_TYPE))?,
            ),
            _ => None,
        };
        let selector = selector(&params)?;

        let tree = self.snapshot().await?;
        let hit = find_element(&tree, &params, &selector)?;
        let target = tree.describe(hit.node);

        if !tree.get(hit.node).is_some_and(|n| n.supports(operation)) {
            return Err(Failed::at(
                FailureReason::UnsupportedOperation {
                    target: target.clone(),
                    operation: operation.action_name().to_string(),
                },
                &target,
            ));
        }

        if self.perform_on(&tree, hit.node, operation, text).await? {
            Ok(Done::on(target))
        } else {
            Err(Failed::at(
                FailureReason::ActionFailed {
                    target: target.clone(),
                    operation: operation.action_name().to_string(),
                },
                &target,
            ))
        }
    }
}
