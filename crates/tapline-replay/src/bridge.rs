use crate::fixture::{DeviceFixture, Trigger};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use tapline_engine::bridge::{Bridge, BridgeError};
use tapline_engine::protocol::{
    AppInfo, GlobalAction, LaunchEntry, LaunchRequest, NodeHandle, NodeOperation, ScreenSize,
    Stroke, UiNode,
};
use tapline_engine::tree::UiTree;
use tracing::{debug, info};

/// Something the engine asked the device to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    Perform {
        screen: String,
        node: NodeHandle,
        operation: NodeOperation,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        accepted: bool,
    },
    Gesture {
        stroke: Stroke,
    },
    Global {
        action: GlobalAction,
    },
    Start {
        request: LaunchRequest,
    },
    Screen {
        from: String,
        to: String,
    },
}

/// A [`Bridge`] backed by a [`DeviceFixture`].
///
/// Each screen is kept as a mutable copy, so text set or focus moved on a
/// screen is still there when the engine comes back to it.
pub struct ReplayBridge {
    fixture: DeviceFixture,
    screens: BTreeMap<String, UiNode>,
    current: String,
    events: Vec<ReplayEvent>,
}

impl ReplayBridge {
    pub fn new(fixture: DeviceFixture) -> Self {
        Self {
            screens: fixture.screens.clone(),
            current: fixture.start.clone(),
            fixture,
            events: Vec::new(),
        }
    }

    pub fn current_screen(&self) -> &str {
        &self.current
    }

    pub fn events(&self) -> &[ReplayEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ReplayEvent> {
        self.events
    }

    /// The live copy of a node on the current screen.
    pub fn node(&self, handle: NodeHandle) -> Option<&UiNode> {
        self.screens.get(&self.current).and_then(|root| find(root, handle))
    }

    fn fire(&mut self, trigger: Trigger) {
        let Some(next) = self.fixture.next_screen(&trigger) else {
            return;
        };
        if next == self.current {
            return;
        }
        let next = next.to_string();
        info!(from = %self.current, to = %next, "Screen changed");
        self.events.push(ReplayEvent::Screen {
            from: std::mem::replace(&mut self.current, next.clone()),
            to: next,
        });
    }

    /// Apply `operation` to the current screen. Returns whether the node
    /// accepted it.
    fn apply(
        &mut self,
        handle: NodeHandle,
        operation: NodeOperation,
        text: Option<&str>,
    ) -> Result<bool, BridgeError> {
        let root = self
            .screens
            .get_mut(&self.current)
            .ok_or(BridgeError::NoActiveWindow)?;
        let node = find(root, handle).ok_or(BridgeError::StaleNode { handle: handle.0 })?;
        if !accepts(node, operation) {
            return Ok(false);
        }
        let editable = node.flags.editable;

        match operation {
            NodeOperation::Focus => move_focus(root, handle),
            NodeOperation::ClearFocus => {
                if let Some(node) = find_mut(root, handle) {
                    node.flags.focused = false;
                }
            }
            NodeOperation::Click if editable => move_focus(root, handle),
            NodeOperation::SetText => {
                if let Some(node) = find_mut(root, handle) {
                    node.text = text.map(str::to_string);
                }
            }
            _ => {}
        }
        Ok(true)
    }
}

/// Whether a node takes `operation`, from its listed actions or its flags.
fn accepts(node: &UiNode, operation: NodeOperation) -> bool {
    if !node.flags.enabled || !node.flags.visible {
        return false;
    }
    if node.actions.contains(&operation) {
        return true;
    }
    let flags = node.flags;
    match operation {
        NodeOperation::Click => flags.clickable || flags.editable,
        NodeOperation::Focus | NodeOperation::ClearFocus => flags.focusable || flags.editable,
        NodeOperation::SetText => flags.editable,
        NodeOperation::ScrollForward | NodeOperation::ScrollBackward => flags.scrollable,
        _ => false,
    }
}

fn find(node: &UiNode, handle: NodeHandle) -> Option<&UiNode> {
    if node.handle == handle {
        return Some(node);
    }
    node.children.iter().find_map(|c| find(c, handle))
}

fn find_mut(node: &mut UiNode, handle: NodeHandle) -> Option<&mut UiNode> {
    if node.handle == handle {
        return Some(node);
    }
    node.children.iter_mut().find_map(|c| find_mut(c, handle))
}

fn move_focus(root: &mut UiNode, handle: NodeHandle) {
    fn walk(node: &mut UiNode, handle: NodeHandle) {
        node.flags.focused = node.handle == handle;
        for child in &mut node.children {
            walk(child, handle);
        }
    }
    walk(root, handle);
}

#[async_trait]
impl Bridge for ReplayBridge {
    async fn is_connected(&self) -> bool {
        self.fixture.connected
    }

    async fn snapshot(&mut self) -> Result<Option<UiTree>, BridgeError> {
        let Some(root) = self.screens.get(&self.current) else {
            return Ok(None);
        };
        let tree = if self.fixture.index_ids {
            UiTree::indexed(root)
        } else {
            UiTree::new(root)
        };
        debug!(screen = %self.current, nodes = tree.len(), "Snapshot");
        Ok(Some(tree))
    }

    async fn perform(
        &mut self,
        node: NodeHandle,
        operation: NodeOperation,
        text: Option<&str>,
    ) -> Result<bool, BridgeError> {
        if !self.fixture.connected {
            return Err(BridgeError::NotConnected);
        }
        let accepted = self.apply(node, operation, text)?;
        self.events.push(ReplayEvent::Perform {
            screen: self.current.clone(),
            node,
            operation,
            text: text.map(str::to_string),
            accepted,
        });
        if accepted && operation == NodeOperation::Click {
            self.fire(Trigger::Click { node });
        }
        Ok(accepted)
    }

    async fn dispatch_gesture(&mut self, stroke: &Stroke) -> Result<bool, BridgeError> {
        self.events.push(ReplayEvent::Gesture {
            stroke: stroke.clone(),
        });
        Ok(true)
    }

    async fn global_action(&mut self, action: GlobalAction) -> Result<bool, BridgeError> {
        self.events.push(ReplayEvent::Global { action });
        self.fire(Trigger::Global { action });
        Ok(true)
    }

    async fn screen_size(&self) -> Result<ScreenSize, BridgeError> {
        Ok(self.fixture.screen)
    }

    async fn installed_apps(&mut self) -> Result<Vec<AppInfo>, BridgeError> {
        Ok(self
            .fixture
            .apps
            .iter()
            .map(|app| AppInfo {
                label: app.label.clone(),
                package: app.package.clone(),
            })
            .collect())
    }

    async fn launch_entry(&mut self, package: &str) -> Result<Option<LaunchEntry>, BridgeError> {
        Ok(self
            .fixture
            .apps
            .iter()
            .filter(|app| app.package == package)
            .find_map(|app| {
                app.activity.as_ref().map(|activity| LaunchEntry {
                    package: app.package.clone(),
                    activity: activity.clone(),
                })
            }))
    }

    async fn start(&mut self, request: &LaunchRequest) -> Result<(), BridgeError> {
        self.events.push(ReplayEvent::Start {
            request: request.clone(),
        });
        if let LaunchRequest::App(entry) = request {
            self.fire(Trigger::Launch {
                package: entry.package.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> ReplayBridge {
        let mut root = UiNode::new(1);
        let mut field = UiNode::new(2);
        field.flags.editable = true;
        let mut label = UiNode::new(3);
        label.text = Some("Title".into());
        root.children = vec![field, label];
        ReplayBridge::new(DeviceFixture::single(root))
    }

    #[tokio::test]
    async fn set_text_persists_on_screen() {
        let mut bridge = bridge();
        assert!(bridge.perform(NodeHandle(2), NodeOperation::SetText, Some("hi")).await.unwrap());
        assert_eq!(bridge.node(NodeHandle(2)).unwrap().text.as_deref(), Some("hi"));
        let tree = bridge.snapshot().await.unwrap().unwrap();
        let id = tree.find_handle(NodeHandle(2)).unwrap();
        assert_eq!(tree.get(id).unwrap().text.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn operations_follow_node_flags() {
        let mut bridge = bridge();
        assert!(!bridge.perform(NodeHandle(3), NodeOperation::Click, None).await.unwrap());
        assert!(!bridge.perform(NodeHandle(3), NodeOperation::SetText, Some("x")).await.unwrap());
        assert!(bridge.perform(NodeHandle(2), NodeOperation::Click, None).await.unwrap());
        assert!(bridge.node(NodeHandle(2)).unwrap().flags.focused);
        assert_eq!(bridge.events().len(), 3);
    }

    #[tokio::test]
    async fn unknown_handle_is_stale() {
        let mut bridge = bridge();
        assert_eq!(
            bridge.perform(NodeHandle(99), NodeOperation::Click, None).await,
            Err(BridgeError::StaleNode { handle: 99 })
        );
    }
}
