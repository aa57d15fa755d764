pub mod loader;
pub mod schema;

pub use loader::{CONFIG_ENV, ConfigError, ConfigLoader};
pub use schema::{GestureConfig, MessagingConfig, SecurityConfig, TaplineConfig, TimingConfig};
