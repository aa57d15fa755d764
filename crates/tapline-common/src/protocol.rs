use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque platform handle used by a bridge to address a live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(pub u64);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One accessibility node as reported by the platform, children nested.
///
/// This is the serialized form produced by a bridge or a device fixture. The
/// engine flattens it into a [`crate::tree::UiTree`] before querying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiNode {
    pub handle: NodeHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, flatten)]
    pub flags: NodeFlags,
    #[serde(default)]
    pub actions: Vec<NodeOperation>,
    #[serde(default)]
    pub children: Vec<UiNode>,
}

impl UiNode {
    pub fn new(handle: u64) -> Self {
        Self {
            handle: NodeHandle(handle),
            text: None,
            content_description: None,
            resource_id: None,
            class_name: None,
            flags: NodeFlags::default(),
            actions: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// Capability and state flags of a node.
///
/// `visible` and `enabled` default to `true`; the rest default to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFlags {
    #[serde(default)]
    pub clickable: bool,
    #[serde(default)]
    pub focusable: bool,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub scrollable: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub focused: bool,
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self {
            clickable: false,
            focusable: false,
            editable: false,
            scrollable: false,
            visible: true,
            enabled: true,
            focused: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Node-targeted accessibility operations, numbered like the platform's
/// standard action identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeOperation {
    Focus,
    ClearFocus,
    Select,
    ClearSelection,
    Click,
    LongClick,
    AccessibilityFocus,
    ClearAccessibilityFocus,
    NextAtMovementGranularity,
    PreviousAtMovementGranularity,
    NextHtmlElement,
    PreviousHtmlElement,
    ScrollForward,
    ScrollBackward,
    Copy,
    Paste,
    Cut,
    SetSelection,
    Expand,
    Collapse,
    Dismiss,
    SetText,
}

impl NodeOperation {
    pub const ALL: [NodeOperation; 22] = [
        Self::Focus,
        Self::ClearFocus,
        Self::Select,
        Self::ClearSelection,
        Self::Click,
        Self::LongClick,
        Self::AccessibilityFocus,
        Self::ClearAccessibilityFocus,
        Self::NextAtMovementGranularity,
        Self::PreviousAtMovementGranularity,
        Self::NextHtmlElement,
        Self::PreviousHtmlElement,
        Self::ScrollForward,
        Self::ScrollBackward,
        Self::Copy,
        Self::Paste,
        Self::Cut,
        Self::SetSelection,
        Self::Expand,
        Self::Collapse,
        Self::Dismiss,
        Self::SetText,
    ];

    /// Platform action identifier.
    pub fn id(self) -> u32 {
        match self {
            Self::Focus => 0x1,
            Self::ClearFocus => 0x2,
            Self::Select => 0x4,
            Self::ClearSelection => 0x8,
            Self::Click => 0x10,
            Self::LongClick => 0x20,
            Self::AccessibilityFocus => 0x40,
            Self::ClearAccessibilityFocus => 0x80,
            Self::NextAtMovementGranularity => 0x100,
            Self::PreviousAtMovementGranularity => 0x200,
            Self::NextHtmlElement => 0x400,
            Self::PreviousHtmlElement => 0x800,
            Self::ScrollForward => 0x1000,
            Self::ScrollBackward => 0x2000,
            Self::Copy => 0x4000,
            Self::Paste => 0x8000,
            Self::Cut => 0x10000,
            Self::SetSelection => 0x20000,
            Self::Expand => 0x40000,
            Self::Collapse => 0x80000,
            Self::Dismiss => 0x100000,
            Self::SetText => 0x200000,
        }
    }

    /// Name as it appears in scripts, e.g. `ACTION_EXPAND`.
    pub fn action_name(self) -> &'static str {
        match self {
            Self::Focus => "ACTION_FOCUS",
            Self::ClearFocus => "ACTION_CLEAR_FOCUS",
            Self::Select => "ACTION_SELECT",
            Self::ClearSelection => "ACTION_CLEAR_SELECTION",
            Self::Click => "ACTION_CLICK",
            Self::LongClick => "ACTION_LONG_CLICK",
            Self::AccessibilityFocus => "ACTION_ACCESSIBILITY_FOCUS",
            Self::ClearAccessibilityFocus => "ACTION_CLEAR_ACCESSIBILITY_FOCUS",
            Self::NextAtMovementGranularity => "ACTION_NEXT_AT_MOVEMENT_GRANULARITY",
            Self::PreviousAtMovementGranularity => "ACTION_PREVIOUS_AT_MOVEMENT_GRANULARITY",
            Self::NextHtmlElement => "ACTION_NEXT_HTML_ELEMENT",
            Self::PreviousHtmlElement => "ACTION_PREVIOUS_HTML_ELEMENT",
            Self::ScrollForward => "ACTION_SCROLL_FORWARD",
            Self::ScrollBackward => "ACTION_SCROLL_BACKWARD",
            Self::Copy => "ACTION_COPY",
            Self::Paste => "ACTION_PASTE",
            Self::Cut => "ACTION_CUT",
            Self::SetSelection => "ACTION_SET_SELECTION",
            Self::Expand => "ACTION_EXPAND",
            Self::Collapse => "ACTION_COLLAPSE",
            Self::Dismiss => "ACTION_DISMISS",
            Self::SetText => "ACTION_SET_TEXT",
        }
    }
}

impl fmt::Display for NodeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action_name())
    }
}

/// Error returned when an operation name is not in the table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown accessibility operation '{0}'")]
pub struct UnknownOperationName(pub String);

impl FromStr for NodeOperation {
    type Err = UnknownOperationName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|op| op.action_name() == upper)
            .ok_or_else(|| UnknownOperationName(s.to_string()))
    }
}

/// Device-level actions that target no node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalAction {
    Home,
    Back,
    Notifications,
    TakeScreenshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// A single straight-line touch stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub from: Point,
    pub to: Point,
    pub start_ms: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

/// An installed application as listed by the package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub label: String,
    pub package: String,
}

/// The main launchable entry point of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchEntry {
    pub package: String,
    pub activity: String,
}

/// Something the OS is asked to start as a new task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LaunchRequest {
    App(LaunchEntry),
    ViewUrl { url: String },
    ComposeMessage {
        recipient: Option<String>,
        body: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names_are_case_insensitive() {
        assert_eq!(
            "action_expand".parse::<NodeOperation>(),
            Ok(NodeOperation::Expand)
        );
        assert_eq!(
            " ACTION_SCROLL_BACKWARD ".parse::<NodeOperation>(),
            Ok(NodeOperation::ScrollBackward)
        );
        assert!("ACTION_TELEPORT".parse::<NodeOperation>().is_err());
    }

    #[test]
    fn operation_ids_are_distinct_bits() {
        let mut seen = 0u32;
        for op in NodeOperation::ALL {
            assert_eq!(op.id().count_ones(), 1, "{op} is not a single bit");
            assert_eq!(seen & op.id(), 0, "{op} reuses an id");
            seen |= op.id();
        }
        assert_eq!(NodeOperation::Click.id(), 16);
        assert_eq!(NodeOperation::SetText.id(), 2_097_152);
    }

    #[test]
    fn flags_default_to_visible_and_enabled() {
        let node: UiNode = serde_json::from_str(r#"{"handle": 7, "text": "OK"}"#).unwrap();
        assert!(node.flags.visible);
        assert!(node.flags.enabled);
        assert!(!node.flags.clickable);
        assert!(node.children.is_empty());
    }
}
