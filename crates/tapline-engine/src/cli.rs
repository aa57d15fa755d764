use crate::executor::ActionHandler;
use crate::formatter::format_report;
use crate::runner::{ScriptReport, ScriptRunner};
use std::path::{Path, PathBuf};
use tapline_common::error::FailureReason;
use tapline_common::schema;
use tapline_common::script::ActionScript;
use thiserror::Error;

#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

pub struct RunOptions {
    /// Cancel the running script on Ctrl-C.
    pub handle_ctrl_c: bool,
    pub ctrl_c_message: Option<&'static str>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            handle_ctrl_c: true,
            ctrl_c_message: Some("Interrupted, cancelling script..."),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScriptLoadError {
    #[error("Failed to read script {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse script {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Parse a script from YAML. JSON is accepted too, being a YAML subset.
pub fn parse_script(content: &str) -> Result<ActionScript, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

pub async fn load_script(path: &Path) -> Result<ActionScript, ScriptLoadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ScriptLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_script(&content).map_err(|source| ScriptLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Every schema violation in a script, by zero-based action index.
pub fn validate_script(script: &ActionScript) -> Vec<(usize, FailureReason)> {
    if script.is_empty() {
        return vec![(0, FailureReason::EmptyScript)];
    }
    script
        .actions
        .iter()
        .enumerate()
        .filter_map(|(i, action)| schema::validate(action).err().map(|e| (i, e)))
        .collect()
}

/// Run a script and print its report.
pub async fn run_script<H: ActionHandler>(
    runner: &ScriptRunner<H>,
    script: &ActionScript,
    output: OutputHandlers,
    options: RunOptions,
) -> ScriptReport {
    let watcher = options.handle_ctrl_c.then(|| {
        let token = runner.cancellation_token();
        let message = options.ctrl_c_message;
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                if let Some(message) = message {
                    (output.err)(message);
                }
                token.cancel();
            }
        })
    });

    let report = runner.run(script).await;

    if let Some(handle) = watcher {
        handle.abort();
    }

    let text = format_report(&report);
    if report.succeeded() {
        (output.out)(&text);
    } else {
        (output.err)(&text);
    }
    report
}
