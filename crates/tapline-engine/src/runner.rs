//! Sequential, fail-fast execution of whole scripts.

use crate::executor::{ActionHandler, ExecutionResult, pause};
use serde::Serialize;
use std::sync::PoisonError;
use std::time::Duration;
use tapline_common::error::FailureReason;
use tapline_common::schema;
use tapline_common::script::{ActionKind, ActionScript, StructuredAction};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What happened to one attempted action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    /// Zero-based position in the script.
    pub index: usize,
    pub kind: ActionKind,
    pub description: Option<String>,
    pub succeeded: bool,
    pub matched_target: Option<String>,
    pub output: Option<String>,
    pub failure: Option<FailureReason>,
}

/// Why a script stopped early.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptAbort {
    /// Failing action, or `None` when the script never started.
    pub index: Option<usize>,
    pub kind: Option<ActionKind>,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptReport {
    pub total: usize,
    /// Attempted actions in execution order. Ends at the failing action.
    pub outcomes: Vec<ActionOutcome>,
    pub abort: Option<ScriptAbort>,
}

impl ScriptReport {
    fn rejected(total: usize, reason: FailureReason) -> Self {
        Self {
            total,
            outcomes: Vec::new(),
            abort: Some(ScriptAbort {
                index: None,
                kind: None,
                reason,
            }),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.abort.is_none()
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.abort.as_ref().map(|a| &a.reason)
    }

    /// Number of actions that completed successfully.
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }
}

/// Runs scripts one at a time against an [`ActionHandler`].
///
/// A second `run` while one is in flight is rejected with
/// [`FailureReason::Busy`] rather than queued.
///
/// A cancelled token is replaced once the run it stopped has returned, so
/// a cancel stops one script and never the runner.
pub struct ScriptRunner<H: ActionHandler> {
    handler: Mutex<H>,
    inter_action_delay: Duration,
    cancel: std::sync::Mutex<CancellationToken>,
}

impl<H: ActionHandler> ScriptRunner<H> {
    pub fn new(handler: H, inter_action_delay: Duration) -> Self {
        Self {
            handler: Mutex::new(handler),
            inter_action_delay,
            cancel: std::sync::Mutex::new(CancellationToken::new()),
        }
    }

    /// Token that cancels the current run, or the next one when idle.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cancel(&self) {
        self.cancellation_token().cancel();
    }

    fn renew_token_if_cancelled(&self) {
        let mut token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            debug!("Cancellation consumed, issuing a fresh token");
            *token = CancellationToken::new();
        }
    }

    pub fn into_handler(self) -> H {
        self.handler.into_inner()
    }

    pub async fn run(&self, script: &ActionScript) -> ScriptReport {
        let Ok(mut handler) = self.handler.try_lock() else {
            warn!("A script is already running");
            return ScriptReport::rejected(script.len(), FailureReason::Busy);
        };
        let cancel = self.cancellation_token();
        let report = run_locked(&mut *handler, script, self.inter_action_delay, &cancel).await;
        self.renew_token_if_cancelled();
        report
    }
}

async fn run_locked<H: ActionHandler>(
    handler: &mut H,
    script: &ActionScript,
    inter_action_delay: Duration,
    cancel: &CancellationToken,
) -> ScriptReport {
    let total = script.len();
    if script.is_empty() {
        warn!("Script has no actions");
        return ScriptReport::rejected(0, FailureReason::EmptyScript);
    }
    if !handler.is_backend_available().await {
        error!("Accessibility service is not connected; enable it in Settings");
        return ScriptReport::rejected(total, FailureReason::BackendUnavailable);
    }

    info!(total, "Running script");
    let mut outcomes = Vec::with_capacity(total);
    for (index, action) in script.actions.iter().enumerate() {
        if let Err(reason) = pause(inter_action_delay, cancel).await {
            return abort(total, outcomes, index, action, reason);
        }

        info!(
            step = index + 1,
            total,
            kind = %action.kind,
            description = action.description.as_deref().unwrap_or(""),
            "Running action"
        );

        if let Err(reason) = schema::validate(action) {
            warn!(step = index + 1, kind = %action.kind, "Validation failed: {reason}");
            outcomes.push(outcome(index, action, ExecutionResult::failure(reason.clone())));
            return abort(total, outcomes, index, action, reason);
        }

        let result = handler.execute(action, cancel).await;
        let failed = !result.succeeded;
        let reason = result.failure.clone().unwrap_or_else(|| FailureReason::ActionFailed {
            target: result.matched_target.clone().unwrap_or_default(),
            operation: action.kind.to_string(),
        });
        outcomes.push(outcome(index, action, result));
        if failed {
            error!(step = index + 1, kind = %action.kind, code = reason.code(), "Aborting script: {reason}");
            return abort(total, outcomes, index, action, reason);
        }
    }

    info!(total, "Script completed");
    ScriptReport {
        total,
        outcomes,
        abort: None,
    }
}

fn outcome(index: usize, action: &StructuredAction, result: ExecutionResult) -> ActionOutcome {
    ActionOutcome {
        index,
        kind: action.kind.clone(),
        description: action.description.clone(),
        succeeded: result.succeeded,
        matched_target: result.matched_target,
        output: result.output,
        failure: result.failure,
    }
}

fn abort(
    total: usize,
    outcomes: Vec<ActionOutcome>,
    index: usize,
    action: &StructuredAction,
    reason: FailureReason,
) -> ScriptReport {
    ScriptReport {
        total,
        outcomes,
        abort: Some(ScriptAbort {
            index: Some(index),
            kind: Some(action.kind.clone()),
            reason,
        }),
    }
}
