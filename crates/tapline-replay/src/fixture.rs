use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tapline_engine::protocol::{GlobalAction, NodeHandle, ScreenSize, UiNode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read fixture {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse fixture: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse fixture: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Fixture refers to unknown screen '{name}'")]
    UnknownScreen { name: String },
}

/// An installed app on the recorded device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureApp {
    pub label: String,
    pub package: String,
    /// Main activity. Apps without one cannot be launched.
    #[serde(default)]
    pub activity: Option<String>,
}

/// Event that moves the device to another screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Trigger {
    Click { node: NodeHandle },
    Launch { package: String },
    Global { action: GlobalAction },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub on: Trigger,
    pub to: String,
}

/// A recorded device: named screens and what moves between them.
///
/// ```yaml
/// start: home
/// apps:
///   - { label: Clock, package: com.android.deskclock, activity: .DeskClock }
/// screens:
///   home:
///     handle: 1
///     children:
///       - { handle: 2, text: Clock, clickable: true }
///   clock:
///     handle: 10
/// transitions:
///   - on: { event: launch, package: com.android.deskclock }
///     to: clock
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceFixture {
    #[serde(default = "default_screen")]
    pub screen: ScreenSize,
    #[serde(default = "default_connected")]
    pub connected: bool,
    /// Serve snapshots with a resource-id index.
    #[serde(default)]
    pub index_ids: bool,
    #[serde(default)]
    pub apps: Vec<FixtureApp>,
    pub start: String,
    pub screens: BTreeMap<String, UiNode>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

fn default_screen() -> ScreenSize {
    ScreenSize {
        width: 1080,
        height: 2400,
    }
}

fn default_connected() -> bool {
    true
}

impl DeviceFixture {
    /// A fixture with a single screen.
    pub fn single(root: UiNode) -> Self {
        let mut screens = BTreeMap::new();
        screens.insert("main".to_string(), root);
        Self {
            screen: default_screen(),
            connected: true,
            index_ids: false,
            apps: Vec::new(),
            start: "main".to_string(),
            screens,
            transitions: Vec::new(),
        }
    }

    /// Parse YAML, or JSON when `path` ends in `.json`.
    pub fn parse(content: &str, path: Option<&Path>) -> Result<Self, ReplayError> {
        let is_json = path
            .and_then(Path::extension)
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let fixture: Self = if is_json {
            serde_json::from_str(content)?
        } else {
            serde_yaml::from_str(content)?
        };
        fixture.check()?;
        Ok(fixture)
    }

    pub async fn load(path: &Path) -> Result<Self, ReplayError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ReplayError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&content, Some(path))
    }

    /// Every screen name used must be defined.
    pub fn check(&self) -> Result<(), ReplayError> {
        let names = std::iter::once(&self.start).chain(self.transitions.iter().map(|t| &t.to));
        for name in names {
            if !self.screens.contains_key(name) {
                return Err(ReplayError::UnknownScreen { name: name.clone() });
            }
        }
        Ok(())
    }

    /// Destination of the first transition fired by `trigger`.
    pub fn next_screen(&self, trigger: &Trigger) -> Option<&str> {
        self.transitions
            .iter()
            .find(|t| &t.on == trigger)
            .map(|t| t.to.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
start: home
apps:
  - { label: Clock, package: com.android.deskclock, activity: .DeskClock }
screens:
  home:
    handle: 1
    children:
      - { handle: 2, text: Clock, clickable: true }
  clock:
    handle: 10
transitions:
  - on: { event: click, node: 2 }
    to: clock
  - on: { event: global, action: back }
    to: home
"#;

    #[test]
    fn parses_yaml_fixture() {
        let fixture = DeviceFixture::parse(FIXTURE, None).unwrap();
        assert_eq!(fixture.start, "home");
        assert_eq!(fixture.screens.len(), 2);
        assert_eq!(fixture.screen.width, 1080);
        assert!(fixture.connected);
        assert_eq!(
            fixture.next_screen(&Trigger::Click { node: NodeHandle(2) }),
            Some("clock")
        );
        assert_eq!(
            fixture.next_screen(&Trigger::Global {
                action: GlobalAction::Back
            }),
            Some("home")
        );
        assert_eq!(fixture.next_screen(&Trigger::Click { node: NodeHandle(1) }), None);
    }

    #[test]
    fn rejects_unknown_screen() {
        let broken = FIXTURE.replace("to: clock", "to: alarm");
        assert!(matches!(
            DeviceFixture::parse(&broken, None),
            Err(ReplayError::UnknownScreen { name }) if name == "alarm"
        ));
    }

    #[test]
    fn json_is_chosen_by_extension() {
        let json = r#"{"start": "main", "screens": {"main": {"handle": 1}}}"#;
        let fixture = DeviceFixture::parse(json, Some(Path::new("device.JSON"))).unwrap();
        assert_eq!(fixture.screens["main"].handle, NodeHandle(1));
    }
}
