pub mod bridge;
pub mod cli;
pub mod config;
pub mod executor;
pub mod formatter;
pub mod resolution;
pub mod runner;

pub use tapline_common::error;
pub use tapline_common::protocol;
pub use tapline_common::schema;
pub use tapline_common::script;
pub use tapline_common::tree;
