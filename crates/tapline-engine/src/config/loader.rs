use super::schema::TaplineConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming a config file to use instead of the search path.
pub const CONFIG_ENV: &str = "TAPLINE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Files tried in order when no path is given: `$TAPLINE_CONFIG`,
    /// `./tapline.yaml`, `~/.tapline/config.yaml`.
    pub fn search_path() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(env) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            paths.push(PathBuf::from(env));
        }
        paths.push(PathBuf::from("./tapline.yaml"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".tapline").join("config.yaml"));
        }
        paths
    }

    /// First existing file on the search path, or the defaults.
    pub async fn load_default() -> Result<TaplineConfig, ConfigError> {
        for path in Self::search_path() {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Self::load_from(&path).await;
            }
        }
        debug!("No config file found, using defaults");
        Ok(TaplineConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<TaplineConfig, ConfigError> {
        debug!(path = %path.display(), "Loading config");
        let content = tokio::fs::read_to_string(path).await?;
        let config: TaplineConfig = serde_yaml::from_str(&content)?;
        check(&config)?;
        Ok(config)
    }

    /// Explicit path when given, search path otherwise.
    pub async fn load(path: Option<&Path>) -> Result<TaplineConfig, ConfigError> {
        match path {
            Some(p) => Self::load_from(p).await,
            None => Self::load_default().await,
        }
    }
}

/// Reject values the executor cannot work with.
fn check(config: &TaplineConfig) -> Result<(), ConfigError> {
    let fraction = config.gesture.swipe_fraction;
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(ConfigError::Invalid {
            field: "gesture.swipe_fraction",
            reason: format!("{fraction} is not in (0, 1]"),
        });
    }
    if config.timing.poll_interval_ms == 0 {
        return Err(ConfigError::Invalid {
            field: "timing.poll_interval_ms",
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_checks() {
        assert!(check(&TaplineConfig::default()).is_ok());
        assert!(check(&TaplineConfig::immediate()).is_ok());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut config = TaplineConfig::default();
        config.timing.poll_interval_ms = 0;
        assert!(matches!(
            check(&config),
            Err(ConfigError::Invalid {
                field: "timing.poll_interval_ms",
                ..
            })
        ));
    }
}
