/// Errors raised by an automation bridge implementation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Accessibility service is not connected")]
    NotConnected,

    #[error("No active window")]
    NoActiveWindow,

    #[error("Node {handle} is stale")]
    StaleNode { handle: u64 },

    #[error("Not supported by this bridge: {0}")]
    NotSupported(String),

    #[error("Timeout: {operation}")]
    Timeout { operation: String },

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io(err.to_string())
    }
}

impl BridgeError {
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::NotConnected => "NOT_CONNECTED",
            BridgeError::NoActiveWindow => "NO_ACTIVE_WINDOW",
            BridgeError::StaleNode { .. } => "STALE_NODE",
            BridgeError::NotSupported(_) => "NOT_SUPPORTED",
            BridgeError::Timeout { .. } => "TIMEOUT",
            BridgeError::Platform(_) => "PLATFORM_ERROR",
            BridgeError::Io(_) => "IO_ERROR",
        }
    }
}
