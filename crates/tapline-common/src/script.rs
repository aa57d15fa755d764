//! Structured action scripts as produced by the script generator.
//!
//! ```yaml
//! actions:
//!   - action_type: OPEN_APP
//!     description: "Open the Calculator app"
//!     parameters:
//!       app_name: "Calculator"
//!   - action_type: WAIT_FOR_ELEMENT
//!     parameters:
//!       element_text_to_click: "Submit"
//!       timeout_ms: "5000"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Parameter names understood by the executor.
pub mod keys {
    pub const APP_NAME: &str = "app_name";
    pub const PACKAGE_NAME: &str = "package_name";
    pub const URL: &str = "url";
    pub const RECIPIENT_NAME: &str = "recipient_name";
    pub const RECIPIENT_NUMBER: &str = "recipient_number";
    pub const MESSAGE_BODY: &str = "message_body";
    pub const TEXT_TO_TYPE: &str = "text_to_type";
    pub const ELEMENT_TEXT_TO_CLICK: &str = "element_text_to_click";
    pub const ELEMENT_RESOURCE_ID: &str = "element_resource_id";
    pub const ELEMENT_CONTENT_DESCRIPTION: &str = "element_content_description";
    pub const SCROLL_DIRECTION: &str = "scroll_direction";
    pub const SCROLL_TARGET_TEXT: &str = "scroll_target_text";
    pub const SCROLL_TARGET_RESOURCE_ID: &str = "scroll_target_resource_id";
    pub const WAIT_DURATION_MS: &str = "wait_duration_ms";
    pub const TIMEOUT_MS: &str = "timeout_ms";
    pub const ACTION_TO_PERFORM: &str = "action_to_perform";
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    OpenApp,
    LaunchUrl,
    TypeText,
    ClickElement,
    ScrollView,
    NavigateHome,
    NavigateBack,
    PullDownNotificationBar,
    TakeScreenshot,
    Wait,
    SendTextMessage,
    GetTextFromElement,
    WaitForElement,
    PerformAccessibilityAction,
    /// A kind the schema does not know; rejected at validation time.
    Unknown(String),
}

impl ActionKind {
    pub const KNOWN: [ActionKind; 14] = [
        Self::OpenApp,
        Self::LaunchUrl,
        Self::TypeText,
        Self::ClickElement,
        Self::ScrollView,
        Self::NavigateHome,
        Self::NavigateBack,
        Self::PullDownNotificationBar,
        Self::TakeScreenshot,
        Self::Wait,
        Self::SendTextMessage,
        Self::GetTextFromElement,
        Self::WaitForElement,
        Self::PerformAccessibilityAction,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::OpenApp => "OPEN_APP",
            Self::LaunchUrl => "LAUNCH_URL",
            Self::TypeText => "TYPE_TEXT",
            Self::ClickElement => "CLICK_ELEMENT",
            Self::ScrollView => "SCROLL_VIEW",
            Self::NavigateHome => "NAVIGATE_HOME",
            Self::NavigateBack => "NAVIGATE_BACK",
            Self::PullDownNotificationBar => "PULL_DOWN_NOTIFICATION_BAR",
            Self::TakeScreenshot => "TAKE_SCREENSHOT",
            Self::Wait => "WAIT",
            Self::SendTextMessage => "SEND_TEXT_MESSAGE",
            Self::GetTextFromElement => "GET_TEXT_FROM_ELEMENT",
            Self::WaitForElement => "WAIT_FOR_ELEMENT",
            Self::PerformAccessibilityAction => "PERFORM_ACCESSIBILITY_ACTION",
            Self::Unknown(s) => s,
        }
    }
}

impl From<String> for ActionKind {
    fn from(s: String) -> Self {
        let upper = s.trim().to_ascii_uppercase();
        Self::KNOWN
            .into_iter()
            .find(|k| k.as_str() == upper)
            .unwrap_or(Self::Unknown(s))
    }
}

impl From<&str> for ActionKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredAction {
    #[serde(rename = "action_type", alias = "kind")]
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_parameters")]
    pub parameters: HashMap<String, String>,
}

/// A parameter value as written. Generated scripts often leave numbers and
/// booleans unquoted.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(s) => s,
            Scalar::Integer(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Flag(b) => b.to_string(),
        }
    }
}

/// Accepts a missing or `null` parameter map as empty.
fn deserialize_parameters<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let map: Option<HashMap<String, Option<Scalar>>> = Option::deserialize(deserializer)?;
    Ok(map
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, String::from(v))))
        .collect())
}

impl StructuredAction {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            description: None,
            parameters: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn params(&self) -> ActionParams<'_> {
        ActionParams(&self.parameters)
    }
}

/// Read-only view over an action's parameter map.
#[derive(Debug, Clone, Copy)]
pub struct ActionParams<'a>(pub &'a HashMap<String, String>);

impl<'a> ActionParams<'a> {
    /// The raw value, which may be empty.
    pub fn raw(&self, key: &str) -> Option<&'a str> {
        self.0.get(key).map(String::as_str)
    }

    /// The value when present and not blank.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.raw(key).filter(|v| !v.trim().is_empty())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionScript {
    #[serde(default)]
    pub actions: Vec<StructuredAction>,
}

impl ActionScript {
    pub fn new(actions: Vec<StructuredAction>) -> Self {
        Self { actions }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}
