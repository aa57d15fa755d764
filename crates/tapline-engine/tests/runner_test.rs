mod common;

use async_trait::async_trait;
use common::{MockBridge, text_node, with_children};
use std::collections::HashSet;
use std::time::Duration;
use tapline_engine::config::TaplineConfig;
use tapline_engine::error::FailureReason;
use tapline_engine::executor::{ActionExecutor, ActionHandler, ExecutionResult};
use tapline_engine::protocol::{NodeOperation, UiNode};
use tapline_engine::runner::ScriptRunner;
use tapline_engine::script::{ActionKind, ActionScript, StructuredAction, keys};
use tokio_util::sync::CancellationToken;

/// Records every action it is handed and fails the ones at `failing`.
#[derive(Default)]
struct Recorder {
    available: bool,
    failing: HashSet<usize>,
    delay: Duration,
    seen: Vec<ActionKind>,
}

impl Recorder {
    fn available() -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ActionHandler for Recorder {
    async fn is_backend_available(&self) -> bool {
        self.available
    }

    async fn execute(
        &mut self,
        action: &StructuredAction,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let index = self.seen.len();
        self.seen.push(action.kind.clone());
        if let Err(reason) = tapline_engine::executor::pause(self.delay, cancel).await {
            return ExecutionResult::failure(reason);
        }
        if self.failing.contains(&index) {
            ExecutionResult::failure(FailureReason::ElementNotFound {
                criteria: "text=\"Nope\"".into(),
            })
        } else {
            ExecutionResult::success()
        }
    }
}

fn three_step_script() -> ActionScript {
    ActionScript::new(vec![
        StructuredAction::new(ActionKind::NavigateHome).with_description("Go home"),
        StructuredAction::new(ActionKind::ClickElement).with_param(keys::ELEMENT_TEXT_TO_CLICK, "Nope"),
        StructuredAction::new(ActionKind::NavigateBack),
    ])
}

#[tokio::test]
async fn empty_script_never_reaches_handler() {
    let runner = ScriptRunner::new(Recorder::available(), Duration::ZERO);
    let report = runner.run(&ActionScript::default()).await;
    assert_eq!(report.failure(), Some(&FailureReason::EmptyScript));
    assert!(report.outcomes.is_empty());
    assert!(runner.into_handler().seen.is_empty());
}

#[tokio::test]
async fn all_actions_run_in_order() {
    let runner = ScriptRunner::new(Recorder::available(), Duration::ZERO);
    let report = runner.run(&three_step_script()).await;

    assert!(report.succeeded());
    assert_eq!(report.completed(), 3);
    assert_eq!(report.outcomes[0].description.as_deref(), Some("Go home"));
    assert_eq!(
        runner.into_handler().seen,
        vec![ActionKind::NavigateHome, ActionKind::ClickElement, ActionKind::NavigateBack]
    );
}

#[tokio::test]
async fn first_failure_stops_the_script() {
    let mut recorder = Recorder::available();
    recorder.failing.insert(1);
    let runner = ScriptRunner::new(recorder, Duration::ZERO);

    let report = runner.run(&three_step_script()).await;

    assert!(!report.succeeded());
    assert_eq!(report.total, 3);
    assert_eq!(report.outcomes.len(), 2);
    let abort = report.abort.as_ref().unwrap();
    assert_eq!(abort.index, Some(1));
    assert_eq!(abort.kind, Some(ActionKind::ClickElement));
    assert!(matches!(abort.reason, FailureReason::ElementNotFound { .. }));
    assert_eq!(runner.into_handler().seen.len(), 2);
}

#[tokio::test]
async fn unavailable_backend_rejects_script() {
    let runner = ScriptRunner::new(Recorder::default(), Duration::ZERO);
    let report = runner.run(&three_step_script()).await;
    assert_eq!(report.failure(), Some(&FailureReason::BackendUnavailable));
    assert_eq!(report.abort.as_ref().unwrap().index, None);
    assert!(runner.into_handler().seen.is_empty());
}

#[tokio::test]
async fn invalid_action_is_rejected_before_execution() {
    let script = ActionScript::new(vec![
        StructuredAction::new(ActionKind::NavigateHome),
        StructuredAction::new(ActionKind::LaunchUrl),
        StructuredAction::new(ActionKind::NavigateBack),
    ]);
    let runner = ScriptRunner::new(Recorder::available(), Duration::ZERO);

    let report = runner.run(&script).await;

    assert_eq!(report.failure(), Some(&FailureReason::missing(keys::URL)));
    assert_eq!(report.outcomes.len(), 2);
    assert!(!report.outcomes[1].succeeded);
    assert_eq!(runner.into_handler().seen, vec![ActionKind::NavigateHome]);
}

#[tokio::test]
async fn unknown_kind_fails_at_its_position() {
    let script = ActionScript::new(vec![
        StructuredAction::new(ActionKind::NavigateHome),
        StructuredAction::new(ActionKind::from("TOGGLE_WIFI")),
    ]);
    let runner = ScriptRunner::new(Recorder::available(), Duration::ZERO);

    let report = runner.run(&script).await;

    assert_eq!(
        report.failure(),
        Some(&FailureReason::UnknownActionKind {
            kind: "TOGGLE_WIFI".into()
        })
    );
    assert_eq!(report.abort.unwrap().index, Some(1));
}

#[tokio::test(start_paused = true)]
async fn concurrent_run_is_busy() {
    let mut recorder = Recorder::available();
    recorder.delay = Duration::from_millis(50);
    let runner = ScriptRunner::new(recorder, Duration::ZERO);
    let script = three_step_script();

    let (first, second) = tokio::join!(runner.run(&script), runner.run(&script));

    assert!(first.succeeded());
    assert_eq!(second.failure(), Some(&FailureReason::Busy));
    assert_eq!(runner.into_handler().seen.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn inter_action_delay_precedes_every_action() {
    let runner = ScriptRunner::new(Recorder::available(), Duration::from_millis(1500));
    let started = tokio::time::Instant::now();
    let report = runner.run(&three_step_script()).await;
    assert!(report.succeeded());
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(4500), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(4600), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_between_actions() {
    let runner = ScriptRunner::new(Recorder::available(), Duration::from_secs(1));
    let token = runner.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        token.cancel();
    });

    let report = runner.run(&three_step_script()).await;

    assert_eq!(report.failure(), Some(&FailureReason::Cancelled));
    assert_eq!(report.abort.as_ref().unwrap().index, Some(1));
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(runner.into_handler().seen, vec![ActionKind::NavigateHome]);
}

#[tokio::test]
async fn cancelled_run_does_not_poison_the_next_one() {
    let runner = ScriptRunner::new(Recorder::available(), Duration::ZERO);
    let stale = runner.cancellation_token();
    runner.cancel();

    let first = runner.run(&three_step_script()).await;
    assert_eq!(first.failure(), Some(&FailureReason::Cancelled));
    assert_eq!(first.abort.as_ref().unwrap().index, Some(0));

    let second = runner.run(&three_step_script()).await;
    assert!(second.succeeded(), "{second:#?}");
    assert!(stale.is_cancelled());
    assert!(!runner.cancellation_token().is_cancelled());
    assert_eq!(runner.into_handler().seen.len(), 3);
}

#[tokio::test]
async fn runs_a_script_end_to_end_on_a_bridge() {
    let mut input = UiNode::new(3);
    input.resource_id = Some("query".into());
    input.flags.editable = true;
    let mut go = text_node(4, "Go");
    go.flags.clickable = true;
    let root = with_children(UiNode::new(1), vec![text_node(2, "Search"), input, go]);
    let executor = ActionExecutor::new(MockBridge::new(root), TaplineConfig::immediate());
    let runner = ScriptRunner::new(executor, Duration::ZERO);

    let script = ActionScript::new(vec![
        StructuredAction::new(ActionKind::TypeText)
            .with_param(keys::ELEMENT_RESOURCE_ID, "query")
            .with_param(keys::TEXT_TO_TYPE, "weather"),
        StructuredAction::new(ActionKind::ClickElement).with_param(keys::ELEMENT_TEXT_TO_CLICK, "go"),
        StructuredAction::new(ActionKind::GetTextFromElement)
            .with_param(keys::ELEMENT_RESOURCE_ID, "query"),
    ]);
    let report = runner.run(&script).await;

    assert!(report.succeeded(), "{report:?}");
    assert_eq!(report.outcomes[2].output.as_deref(), Some("weather"));
    let bridge = runner.into_handler().into_bridge();
    assert_eq!(
        bridge.operations(),
        vec![
            (3, NodeOperation::Focus),
            (3, NodeOperation::SetText),
            (4, NodeOperation::Click)
        ]
    );
}
