use super::{ActionExecutor, Done, Failed, Step, pause};
use crate::bridge::Bridge;
use crate::config::GestureConfig;
use crate::resolution::strategy;
use std::str::FromStr;
use tapline_common::error::FailureReason;
use tapline_common::protocol::{NodeOperation, Point, ScreenSize, Stroke, SwipeDirection};
use tapline_common::script::{StructuredAction, keys};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Scroll direction as written in a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
    Forward,
    Backward,
}

impl ScrollDirection {
    /// The node scroll operation, for directions that have one.
    pub fn operation(self) -> Option<NodeOperation> {
        match self {
            Self::Up | Self::Backward => Some(NodeOperation::ScrollBackward),
            Self::Down | Self::Forward => Some(NodeOperation::ScrollForward),
            Self::Left | Self::Right => None,
        }
    }

    pub fn swipe(self) -> SwipeDirection {
        match self {
            Self::Up | Self::Backward => SwipeDirection::Up,
            Self::Down | Self::Forward => SwipeDirection::Down,
            Self::Left => SwipeDirection::Left,
            Self::Right => SwipeDirection::Right,
        }
    }
}

impl FromStr for ScrollDirection {
    type Err = FailureReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Ok(Self::Up),
            "DOWN" => Ok(Self::Down),
            "LEFT" => Ok(Self::Left),
            "RIGHT" => Ok(Self::Right),
            "FORWARD" => Ok(Self::Forward),
            "BACKWARD" => Ok(Self::Backward),
            _ => Err(FailureReason::InvalidDirection {
                direction: s.to_string(),
            }),
        }
    }
}

/// A straight swipe centred on the screen.
///
/// The stroke spans `swipe_fraction` of the screen dimension along its axis
/// and moves the finger in `direction`.
pub fn swipe_stroke(screen: ScreenSize, direction: SwipeDirection, gesture: &GestureConfig) -> Stroke {
    let width = screen.width as f32;
    let height = screen.height as f32;
    let mid = Point {
        x: width / 2.0,
        y: height / 2.0,
    };
    let half_v = height * gesture.swipe_fraction / 2.0;
    let half_h = width * gesture.swipe_fraction / 2.0;

    let (from, to) = match direction {
        SwipeDirection::Up => (
            Point { x: mid.x, y: mid.y + half_v },
            Point { x: mid.x, y: mid.y - half_v },
        ),
        SwipeDirection::Down => (
            Point { x: mid.x, y: mid.y - half_v },
            Point { x: mid.x, y: mid.y + half_v },
        ),
        SwipeDirection::Left => (
            Point { x: mid.x + half_h, y: mid.y },
            Point { x: mid.x - half_h, y: mid.y },
        ),
        SwipeDirection::Right => (
            Point { x: mid.x - half_h, y: mid.y },
            Point { x: mid.x + half_h, y: mid.y },
        ),
    };

    Stroke {
        from,
        to,
        start_ms: gesture.stroke_start_ms,
        duration_ms: gesture.stroke_duration_ms,
    }
}

impl<B: Bridge> ActionExecutor<B> {
    pub(super) async fn scroll_view(
        &mut self,
        action: &StructuredAction,
        cancel: &CancellationToken,
    ) -> Step {
        let params = action.params();
        let raw = params
            .get(keys::SCROLL_DIRECTION)
            .ok_or_else(|| FailureReason::missing(keys::SCROLL_DIRECTION))?;
        let direction: ScrollDirection = raw.parse()?;

        let Some(operation) = direction.operation() else {
            debug!(?direction, "No node operation for direction, swiping");
            return self.swipe(direction.swipe(), cancel).await;
        };

        let tree = self.snapshot().await?;
        let Some(hit) = strategy::first_match(strategy::SCROLL, &tree, &params) else {
            warn!(?direction, "No scrollable node on screen, swiping");
            return self.swipe(direction.swipe(), cancel).await;
        };
        let target = tree.describe(hit.node);
        debug!(strategy = hit.strategy, node = %target, "Resolved scroll container");

        let supported = tree.get(hit.node).is_some_and(|n| n.supports(operation));
        if !supported {
            warn!(%operation, node = %target, "Container does not support scroll operation, swiping");
            return self.swipe(direction.swipe(), cancel).await;
        }

        if self.perform_on(&tree, hit.node, operation, None).await? {
            return Ok(Done::on(target));
        }
        warn!(%operation, node = %target, "Scroll operation failed, swiping");
        let mut done = self.swipe(direction.swipe(), cancel).await?;
        done.target = Some(target);
        Ok(done)
    }

    /// Dispatch a synthetic swipe and let the screen settle.
    async fn swipe(&mut self, direction: SwipeDirection, cancel: &CancellationToken) -> Step {
        let screen = self.bridge.screen_size().await?;
        let stroke = swipe_stroke(screen, direction, &self.config.gesture);
        if !self.bridge.dispatch_gesture(&stroke).await? {
            return Err(Failed::from(FailureReason::GestureFailed));
        }
        info!(?direction, "Swipe dispatched");
        pause(self.config.timing.swipe_settle(), cancel).await?;
        Ok(Done::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: ScreenSize = ScreenSize {
        width: 1000,
        height: 2000,
    };

    #[test]
    fn parses_directions_case_insensitively() {
        assert_eq!("up".parse::<ScrollDirection>(), Ok(ScrollDirection::Up));
        assert_eq!(" Backward ".parse::<ScrollDirection>(), Ok(ScrollDirection::Backward));
        assert!(matches!(
            "DIAGONAL".parse::<ScrollDirection>(),
            Err(FailureReason::InvalidDirection { .. })
        ));
    }

    #[test]
    fn directions_map_to_operations() {
        assert_eq!(ScrollDirection::Up.operation(), Some(NodeOperation::ScrollBackward));
        assert_eq!(ScrollDirection::Backward.operation(), Some(NodeOperation::ScrollBackward));
        assert_eq!(ScrollDirection::Down.operation(), Some(NodeOperation::ScrollForward));
        assert_eq!(ScrollDirection::Forward.operation(), Some(NodeOperation::ScrollForward));
        assert_eq!(ScrollDirection::Left.operation(), None);
        assert_eq!(ScrollDirection::Forward.swipe(), SwipeDirection::Down);
    }

    #[test]
    fn vertical_swipe_spans_forty_percent_of_height() {
        let stroke = swipe_stroke(SCREEN, SwipeDirection::Up, &GestureConfig::default());
        assert_eq!(stroke.from, Point { x: 500.0, y: 1400.0 });
        assert_eq!(stroke.to, Point { x: 500.0, y: 600.0 });
        assert_eq!(stroke.start_ms, 50);
        assert_eq!(stroke.duration_ms, 200);
    }

    #[test]
    fn horizontal_swipe_spans_forty_percent_of_width() {
        let stroke = swipe_stroke(SCREEN, SwipeDirection::Right, &GestureConfig::default());
        assert_eq!(stroke.from, Point { x: 300.0, y: 1000.0 });
        assert_eq!(stroke.to, Point { x: 700.0, y: 1000.0 });
    }
}
