use super::BridgeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing or malformed input, caught before touching the device.
    Validation,
    /// No node matched the criteria.
    Resolution,
    /// A node matched but cannot do what was asked.
    Capability,
    /// The device refused or failed the operation.
    Execution,
    /// The automation backend itself is unusable.
    Environment,
}

/// Why an action (or a whole script) did not succeed.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    // ============================================================
    // Validation
    // ============================================================
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: String },

    #[error("Invalid value for '{name}': {value}")]
    InvalidParameter { name: String, value: String },

    #[error("Unknown action type: {kind}")]
    UnknownActionKind { kind: String },

    #[error("Script contains no actions")]
    EmptyScript,

    #[error("Invalid URL (must start with http:// or https://): {url}")]
    InvalidUrl { url: String },

    #[error("Invalid scroll direction: {direction}")]
    InvalidDirection { direction: String },

    #[error("Unknown accessibility operation: {name}")]
    UnknownOperation { name: String },

    // ============================================================
    // Resolution
    // ============================================================
    #[error("No selection criteria supplied")]
    NoCriteria,

    #[error("No element matched: {criteria}")]
    ElementNotFound { criteria: String },

    #[error("Timed out after {timeout_ms}ms waiting for: {criteria}")]
    Timeout { criteria: String, timeout_ms: u64 },

    // ============================================================
    // Capability
    // ============================================================
    #[error("Neither {target} nor any ancestor is clickable and visible")]
    NoClickableTarget { target: String },

    #[error("No visible, editable field found")]
    NoEditableTarget,

    #[error("{target} does not support {operation}")]
    UnsupportedOperation { target: String, operation: String },

    #[error("{target} has no text or content description")]
    NoTextAvailable { target: String },

    // ============================================================
    // Execution
    // ============================================================
    #[error("Click failed on {target}")]
    ClickFailed { target: String },

    #[error("Could not focus {target}")]
    FocusFailed { target: String },

    #[error("Setting text failed on {target}")]
    SetTextFailed { target: String },

    #[error("{operation} failed on {target}")]
    ActionFailed { target: String, operation: String },

    #[error("Swipe gesture was not dispatched")]
    GestureFailed,

    #[error("Global action {action} failed")]
    GlobalActionFailed { action: String },

    #[error("No installed application named '{name}'")]
    AppNotFound { name: String },

    #[error("Package {package} has no launchable entry point")]
    NoLaunchTarget { package: String },

    #[error("Launch failed: {detail}")]
    LaunchFailed { detail: String },

    // ============================================================
    // Environment
    // ============================================================
    #[error("No active window")]
    NoActiveWindow,

    #[error("Automation backend unavailable; enable the accessibility service in Settings")]
    BackendUnavailable,

    #[error("Bridge error: {message}")]
    Bridge { code: String, message: String },

    #[error("Another script is already running")]
    Busy,

    #[error("Script cancelled")]
    Cancelled,
}

impl FailureReason {
    pub fn missing(name: &str) -> Self {
        Self::MissingParameter {
            name: name.to_string(),
        }
    }

    pub fn invalid(name: &str, value: &str) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        use FailureReason::*;
        match self {
            MissingParameter { .. }
            | InvalidParameter { .. }
            | UnknownActionKind { .. }
            | EmptyScript
            | InvalidUrl { .. }
            | InvalidDirection { .. }
            | UnknownOperation { .. } => ErrorCategory::Validation,
            NoCriteria | ElementNotFound { .. } | Timeout { .. } => ErrorCategory::Resolution,
            NoClickableTarget { .. }
            | NoEditableTarget
            | UnsupportedOperation { .. }
            | NoTextAvailable { .. } => ErrorCategory::Capability,
            ClickFailed { .. }
            | FocusFailed { .. }
            | SetTextFailed { .. }
            | ActionFailed { .. }
            | GestureFailed
            | GlobalActionFailed { .. }
            | AppNotFound { .. }
            | NoLaunchTarget { .. }
            | LaunchFailed { .. } => ErrorCategory::Execution,
            NoActiveWindow | BackendUnavailable | Bridge { .. } | Busy | Cancelled => {
                ErrorCategory::Environment
            }
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        use FailureReason::*;
        match self {
            MissingParameter { .. } => "MISSING_PARAMETER",
            InvalidParameter { .. } => "INVALID_PARAMETER",
            UnknownActionKind { .. } => "UNKNOWN_ACTION_KIND",
            EmptyScript => "EMPTY_SCRIPT",
            InvalidUrl { .. } => "INVALID_URL",
            InvalidDirection { .. } => "INVALID_DIRECTION",
            UnknownOperation { .. } => "UNKNOWN_OPERATION",
            NoCriteria => "NO_CRITERIA",
            ElementNotFound { .. } => "ELEMENT_NOT_FOUND",
            Timeout { .. } => "TIMEOUT",
            NoClickableTarget { .. } => "NO_CLICKABLE_TARGET",
            NoEditableTarget => "NO_EDITABLE_TARGET",
            UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            NoTextAvailable { .. } => "NO_TEXT_AVAILABLE",
            ClickFailed { .. } => "CLICK_FAILED",
            FocusFailed { .. } => "FOCUS_FAILED",
            SetTextFailed { .. } => "SET_TEXT_FAILED",
            ActionFailed { .. } => "ACTION_FAILED",
            GestureFailed => "GESTURE_FAILED",
            GlobalActionFailed { .. } => "GLOBAL_ACTION_FAILED",
            AppNotFound { .. } => "APP_NOT_FOUND",
            NoLaunchTarget { .. } => "NO_LAUNCH_TARGET",
            LaunchFailed { .. } => "LAUNCH_FAILED",
            NoActiveWindow => "NO_ACTIVE_WINDOW",
            BackendUnavailable => "BACKEND_UNAVAILABLE",
            Bridge { .. } => "BRIDGE_ERROR",
            Busy => "BUSY",
            Cancelled => "CANCELLED",
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        use FailureReason::*;
        match self {
            MissingParameter { .. } | InvalidParameter { .. } | UnknownActionKind { .. } => {
                "Fix the action's parameters and rerun the script"
            }
            NoCriteria => "Supply a resource id, text or content description",
            ElementNotFound { .. } | Timeout { .. } => {
                "Check the element is on screen, or wait/scroll before this action"
            }
            NoEditableTarget => "Click the input field first or target it by resource id",
            NoClickableTarget { .. } => "Target the enclosing button or row instead",
            AppNotFound { .. } | NoLaunchTarget { .. } => {
                "Check the app label or use package_name"
            }
            NoActiveWindow => "Unlock the device and bring an app to the foreground",
            BackendUnavailable => "Enable the accessibility service in Settings",
            Busy => "Wait for the running script to finish",
            _ => "Check the action and the current screen",
        }
    }
}

impl From<BridgeError> for FailureReason {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::NotConnected => FailureReason::BackendUnavailable,
            BridgeError::NoActiveWindow => FailureReason::NoActiveWindow,
            other => FailureReason::Bridge {
                code: other.code().to_string(),
                message: other.to_string(),
            },
        }
    }
}
