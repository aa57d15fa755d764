//! Execution of single structured actions against a [`Bridge`].
//!
//! The [`ActionExecutor`] owns the bridge it was handed and runs one action at
//! a time: resolve a target on a fresh snapshot, perform the operation, and
//! fold the outcome into an [`ExecutionResult`]. Every suspension point (settle
//! delays, polling, waits) is raced against the script's cancellation token,
//! and the tree is re-snapshotted after each one.

mod element;
mod gesture;
mod launch;
mod text_entry;

pub use gesture::{ScrollDirection, swipe_stroke};

use crate::bridge::Bridge;
use crate::config::TaplineConfig;
use crate::resolution::policy;
use async_trait::async_trait;
use std::time::Duration;
use tapline_common::error::{BridgeError, FailureReason};
use tapline_common::protocol::{GlobalAction, NodeOperation};
use tapline_common::schema;
use tapline_common::script::{ActionKind, StructuredAction, keys};
use tapline_common::tree::{NodeId, UiTree};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Outcome of executing one action.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionResult {
    pub succeeded: bool,
    /// Description of the node the action resolved to, for diagnostics.
    pub matched_target: Option<String>,
    pub failure: Option<FailureReason>,
    /// Value produced by the action (the text read by GET_TEXT_FROM_ELEMENT).
    pub output: Option<String>,
}

impl ExecutionResult {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            ..Self::default()
        }
    }

    pub fn failure(reason: FailureReason) -> Self {
        Self {
            succeeded: false,
            failure: Some(reason),
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.matched_target = Some(target.into());
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// Something the script runner can hand actions to.
#[async_trait]
pub trait ActionHandler: Send {
    /// Whether the automation backend is connected and usable.
    async fn is_backend_available(&self) -> bool;

    async fn execute(
        &mut self,
        action: &StructuredAction,
        cancel: &CancellationToken,
    ) -> ExecutionResult;
}

/// A successful step: what it acted on and what it produced.
#[derive(Debug, Default)]
struct Done {
    target: Option<String>,
    output: Option<String>,
}

impl Done {
    fn on(target: String) -> Self {
        Self {
            target: Some(target),
            output: None,
        }
    }
}

/// A failed step, with the target when one had been resolved.
#[derive(Debug)]
struct Failed {
    reason: FailureReason,
    target: Option<String>,
}

impl Failed {
    fn at(reason: FailureReason, target: &str) -> Self {
        Self {
            reason,
            target: Some(target.to_string()),
        }
    }
}

impl From<FailureReason> for Failed {
    fn from(reason: FailureReason) -> Self {
        Self {
            reason,
            target: None,
        }
    }
}

impl From<BridgeError> for Failed {
    fn from(err: BridgeError) -> Self {
        FailureReason::from(err).into()
    }
}

type Step = Result<Done, Failed>;

/// Suspend for `duration`, or until `cancel` fires.
pub async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), FailureReason> {
    if cancel.is_cancelled() {
        return Err(FailureReason::Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(FailureReason::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

pub struct ActionExecutor<B: Bridge> {
    bridge: B,
    config: TaplineConfig,
}

impl<B: Bridge> ActionExecutor<B> {
    pub fn new(bridge: B, config: TaplineConfig) -> Self {
        Self { bridge, config }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    pub fn config(&self) -> &TaplineConfig {
        &self.config
    }

    pub fn into_bridge(self) -> B {
        self.bridge
    }

    /// Execute one action. Never panics on bad input; every problem becomes a
    /// failed [`ExecutionResult`].
    pub async fn run_action(
        &mut self,
        action: &StructuredAction,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        info!(
            kind = %action.kind,
            params = %self.loggable_params(action),
            "Executing action"
        );

        let step = self.dispatch(action, cancel).await;
        match step {
            Ok(done) => {
                let mut result = ExecutionResult::success();
                result.matched_target = done.target;
                result.output = done.output;
                result
            }
            Err(failed) => {
                warn!(kind = %action.kind, code = failed.reason.code(), "Action failed: {}", failed.reason);
                let mut result = ExecutionResult::failure(failed.reason);
                result.matched_target = failed.target;
                result
            }
        }
    }

    async fn dispatch(&mut self, action: &StructuredAction, cancel: &CancellationToken) -> Step {
        match &action.kind {
            ActionKind::OpenApp => self.open_app(action).await,
            ActionKind::LaunchUrl => self.launch_url(action).await,
            ActionKind::TypeText => self.type_text(action, cancel).await,
            ActionKind::ClickElement => self.click_element(action).await,
            ActionKind::ScrollView => self.scroll_view(action, cancel).await,
            ActionKind::NavigateHome => self.global(GlobalAction::Home).await,
            ActionKind::NavigateBack => self.global(GlobalAction::Back).await,
            ActionKind::PullDownNotificationBar => self.global(GlobalAction::Notifications).await,
            ActionKind::TakeScreenshot => self.global(GlobalAction::TakeScreenshot).await,
            ActionKind::Wait => {
                let millis = schema::positive_millis(action, keys::WAIT_DURATION_MS)?;
                info!(millis, "Waiting");
                pause(Duration::from_millis(millis), cancel).await?;
                Ok(Done::default())
            }
            ActionKind::SendTextMessage => self.send_text_message(action, cancel).await,
            ActionKind::GetTextFromElement => self.get_text(action).await,
            ActionKind::WaitForElement => self.wait_for_element(action, cancel).await,
            ActionKind::PerformAccessibilityAction => self.perform_named(action).await,
            ActionKind::Unknown(kind) => Err(FailureReason::UnknownActionKind { kind: kind.clone() }.into()),
        }
    }

    async fn global(&mut self, action: GlobalAction) -> Step {
        if self.bridge.global_action(action).await? {
            info!(?action, "Global action performed");
            Ok(Done::default())
        } else {
            error!(?action, "Global action refused");
            Err(FailureReason::GlobalActionFailed {
                action: format!("{action:?}"),
            }
            .into())
        }
    }

    /// Fresh snapshot of the active window.
    async fn snapshot(&mut self) -> Result<UiTree, Failed> {
        match self.bridge.snapshot().await? {
            Some(tree) => Ok(tree),
            None => Err(FailureReason::NoActiveWindow.into()),
        }
    }

    /// Perform `operation` on node `id` of `tree`.
    ///
    /// Nodes that are hidden or disabled are refused without calling the
    /// bridge. Returns the platform's success flag.
    async fn perform_on(
        &mut self,
        tree: &UiTree,
        id: NodeId,
        operation: NodeOperation,
        text: Option<&str>,
    ) -> Result<bool, Failed> {
        let Some(node) = tree.get(id) else {
            return Ok(false);
        };
        let target = node.describe();
        if !policy::is_actionable(node) {
            warn!(%operation, node = %target, "Refusing operation on hidden or disabled node");
            return Ok(false);
        }
        let ok = self.bridge.perform(node.handle, operation, text).await?;
        if ok {
            info!(%operation, node = %target, "Operation performed");
        } else {
            error!(%operation, node = %target, "Operation reported failure");
        }
        Ok(ok)
    }

    /// `key=value` pairs of an action, with sensitive values redacted.
    fn loggable_params(&self, action: &StructuredAction) -> String {
        let mut pairs: Vec<(&String, &String)> = action.parameters.iter().collect();
        pairs.sort();
        pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={}", self.config.security.loggable(k, v)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl<B: Bridge> ActionHandler for ActionExecutor<B> {
    async fn is_backend_available(&self) -> bool {
        self.bridge.is_connected().await
    }

    async fn execute(
        &mut self,
        action: &StructuredAction,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        self.run_action(action, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn pause_is_cut_short_by_cancellation() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });
        let started = tokio::time::Instant::now();
        let result = pause(Duration::from_secs(60), &cancel).await;
        assert_eq!(result, Err(FailureReason::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn zero_pause_returns_immediately() {
        let cancel = CancellationToken::new();
        assert_eq!(pause(Duration::ZERO, &cancel).await, Ok(()));
        cancel.cancel();
        assert_eq!(pause(Duration::ZERO, &cancel).await, Err(FailureReason::Cancelled));
    }
}
