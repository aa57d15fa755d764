pub mod bridge_error;
pub mod failure;

pub use bridge_error::BridgeError;
pub use failure::{ErrorCategory, FailureReason};
