pub mod error;
pub mod protocol;
pub mod schema;
pub mod script;
pub mod tree;

pub use error::{BridgeError, ErrorCategory, FailureReason};
pub use tree::{NodeId, UiTree};
