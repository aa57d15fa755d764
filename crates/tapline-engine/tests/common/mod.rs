#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use tapline_engine::bridge::{Bridge, BridgeError};
use tapline_engine::protocol::{
    AppInfo, GlobalAction, LaunchEntry, LaunchRequest, NodeHandle, NodeOperation, ScreenSize,
    Stroke, UiNode,
};
use tapline_engine::tree::UiTree;

/// An in-memory device that records everything the engine asks of it.
pub struct MockBridge {
    pub connected: bool,
    pub root: Option<UiNode>,
    pub screen: ScreenSize,
    pub apps: Vec<AppInfo>,
    pub entries: HashMap<String, LaunchEntry>,
    /// Operations that report failure.
    pub refused: Vec<(NodeHandle, NodeOperation)>,
    /// Clicking the key handle moves input focus to the value handle.
    pub click_focuses: HashMap<NodeHandle, NodeHandle>,
    pub global_result: bool,
    pub gesture_result: bool,

    pub performed: Vec<(NodeHandle, NodeOperation, Option<String>)>,
    pub gestures: Vec<Stroke>,
    pub globals: Vec<GlobalAction>,
    pub started: Vec<LaunchRequest>,
    pub snapshots: usize,
}

impl MockBridge {
    pub fn new(root: UiNode) -> Self {
        Self {
            connected: true,
            root: Some(root),
            screen: ScreenSize {
                width: 1080,
                height: 2400,
            },
            apps: Vec::new(),
            entries: HashMap::new(),
            refused: Vec::new(),
            click_focuses: HashMap::new(),
            global_result: true,
            gesture_result: true,
            performed: Vec::new(),
            gestures: Vec::new(),
            globals: Vec::new(),
            started: Vec::new(),
            snapshots: 0,
        }
    }

    pub fn without_window() -> Self {
        let mut bridge = Self::new(UiNode::new(0));
        bridge.root = None;
        bridge
    }

    pub fn refuse(mut self, handle: u64, op: NodeOperation) -> Self {
        self.refused.push((NodeHandle(handle), op));
        self
    }

    pub fn with_app(mut self, label: &str, package: &str, launchable: bool) -> Self {
        self.apps.push(AppInfo {
            label: label.to_string(),
            package: package.to_string(),
        });
        if launchable {
            self.entries.insert(
                package.to_string(),
                LaunchEntry {
                    package: package.to_string(),
                    activity: format!("{package}.MainActivity"),
                },
            );
        }
        self
    }

    pub fn node(&self, handle: u64) -> Option<&UiNode> {
        fn walk(node: &UiNode, handle: NodeHandle) -> Option<&UiNode> {
            if node.handle == handle {
                return Some(node);
            }
            node.children.iter().find_map(|c| walk(c, handle))
        }
        self.root.as_ref().and_then(|r| walk(r, NodeHandle(handle)))
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut UiNode> {
        fn walk(node: &mut UiNode, handle: NodeHandle) -> Option<&mut UiNode> {
            if node.handle == handle {
                return Some(node);
            }
            node.children.iter_mut().find_map(|c| walk(c, handle))
        }
        self.root.as_mut().and_then(|r| walk(r, handle))
    }

    fn clear_focus(&mut self) {
        fn walk(node: &mut UiNode) {
            node.flags.focused = false;
            node.children.iter_mut().for_each(walk);
        }
        if let Some(root) = self.root.as_mut() {
            walk(root);
        }
    }

    fn focus(&mut self, handle: NodeHandle) {
        self.clear_focus();
        if let Some(node) = self.node_mut(handle) {
            node.flags.focused = true;
        }
    }

    pub fn operations(&self) -> Vec<(u64, NodeOperation)> {
        self.performed.iter().map(|(h, op, _)| (h.0, *op)).collect()
    }
}

#[async_trait]
impl Bridge for MockBridge {
    async fn is_connected(&self) -> bool {
        self.connected
    }

    async fn snapshot(&mut self) -> Result<Option<UiTree>, BridgeError> {
        self.snapshots += 1;
        Ok(self.root.as_ref().map(UiTree::new))
    }

    async fn perform(
        &mut self,
        node: NodeHandle,
        operation: NodeOperation,
        text: Option<&str>,
    ) -> Result<bool, BridgeError> {
        self.performed
            .push((node, operation, text.map(str::to_string)));
        if self.refused.contains(&(node, operation)) {
            return Ok(false);
        }
        match operation {
            NodeOperation::Focus => self.focus(node),
            NodeOperation::Click => {
                if let Some(&target) = self.click_focuses.get(&node) {
                    self.focus(target);
                }
            }
            NodeOperation::SetText => {
                if let Some(n) = self.node_mut(node) {
                    n.text = text.map(str::to_string);
                }
            }
            _ => {}
        }
        Ok(true)
    }

    async fn dispatch_gesture(&mut self, stroke: &Stroke) -> Result<bool, BridgeError> {
        self.gestures.push(stroke.clone());
        Ok(self.gesture_result)
    }

    async fn global_action(&mut self, action: GlobalAction) -> Result<bool, BridgeError> {
        self.globals.push(action);
        Ok(self.global_result)
    }

    async fn screen_size(&self) -> Result<ScreenSize, BridgeError> {
        Ok(self.screen)
    }

    async fn installed_apps(&mut self) -> Result<Vec<AppInfo>, BridgeError> {
        Ok(self.apps.clone())
    }

    async fn launch_entry(&mut self, package: &str) -> Result<Option<LaunchEntry>, BridgeError> {
        Ok(self.entries.get(package).cloned())
    }

    async fn start(&mut self, request: &LaunchRequest) -> Result<(), BridgeError> {
        self.started.push(request.clone());
        Ok(())
    }
}

pub fn text_node(handle: u64, text: &str) -> UiNode {
    let mut node = UiNode::new(handle);
    node.text = Some(text.to_string());
    node
}

pub fn with_children(mut node: UiNode, children: Vec<UiNode>) -> UiNode {
    node.children = children;
    node
}
