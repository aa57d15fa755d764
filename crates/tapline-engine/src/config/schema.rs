use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaplineConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

impl TaplineConfig {
    /// Configuration with every delay set to zero. Useful for dry runs.
    pub fn immediate() -> Self {
        Self {
            timing: TimingConfig {
                inter_action_delay_ms: 0,
                settle_delay_ms: 0,
                focus_settle_ms: 0,
                poll_interval_ms: 10,
                swipe_settle_ms: 0,
            },
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Pause before every action, for animations and transitions.
    #[serde(default = "default_inter_action_delay_ms")]
    pub inter_action_delay_ms: u64,
    /// Pause after clicking a non-editable text-entry target.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Pause between focusing a field and setting its text.
    #[serde(default = "default_focus_settle_ms")]
    pub focus_settle_ms: u64,
    /// Interval between WAIT_FOR_ELEMENT lookups.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Pause after a dispatched swipe.
    #[serde(default = "default_swipe_settle_ms")]
    pub swipe_settle_ms: u64,
}

impl TimingConfig {
    pub fn inter_action_delay(&self) -> Duration {
        Duration::from_millis(self.inter_action_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn focus_settle(&self) -> Duration {
        Duration::from_millis(self.focus_settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        // A zero interval would spin the poll loop.
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn swipe_settle(&self) -> Duration {
        Duration::from_millis(self.swipe_settle_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            inter_action_delay_ms: default_inter_action_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            focus_settle_ms: default_focus_settle_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            swipe_settle_ms: default_swipe_settle_ms(),
        }
    }
}

fn default_inter_action_delay_ms() -> u64 {
    250
}

fn default_settle_delay_ms() -> u64 {
    300
}

fn default_focus_settle_ms() -> u64 {
    150
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_swipe_settle_ms() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Swipe length as a fraction of the screen dimension along the swipe.
    #[serde(default = "default_swipe_fraction")]
    pub swipe_fraction: f32,
    #[serde(default = "default_stroke_start_ms")]
    pub stroke_start_ms: u64,
    #[serde(default = "default_stroke_duration_ms")]
    pub stroke_duration_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            swipe_fraction: default_swipe_fraction(),
            stroke_start_ms: default_stroke_start_ms(),
            stroke_duration_ms: default_stroke_duration_ms(),
        }
    }
}

fn default_swipe_fraction() -> f32 {
    0.4
}

fn default_stroke_start_ms() -> u64 {
    50
}

fn default_stroke_duration_ms() -> u64 {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// After opening the compose screen, try to press the send control.
    #[serde(default)]
    pub auto_send: bool,
    #[serde(default = "default_send_button_label")]
    pub send_button_label: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            auto_send: false,
            send_button_label: default_send_button_label(),
        }
    }
}

fn default_send_button_label() -> String {
    "Send".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_sensitive_params")]
    pub sensitive_params: Vec<String>,
    #[serde(default = "default_redact_in_logs")]
    pub redact_in_logs: bool,
}

impl SecurityConfig {
    /// Parameter value as it may appear in logs.
    pub fn loggable<'a>(&self, key: &str, value: &'a str) -> &'a str {
        if self.redact_in_logs && self.sensitive_params.iter().any(|k| k == key) {
            "[REDACTED]"
        } else {
            value
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            sensitive_params: default_sensitive_params(),
            redact_in_logs: default_redact_in_logs(),
        }
    }
}

fn default_sensitive_params() -> Vec<String> {
    vec![
        "text_to_type".to_string(),
        "message_body".to_string(),
        "recipient_number".to_string(),
    ]
}

fn default_redact_in_logs() -> bool {
    true
}
