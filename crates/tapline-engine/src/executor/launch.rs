use super::{ActionExecutor, Done, Failed, Step, pause};
use crate::bridge::Bridge;
use crate::resolution::{Selector, resolve};
use tapline_common::error::FailureReason;
use tapline_common::protocol::{LaunchEntry, LaunchRequest, NodeOperation};
use tapline_common::script::{StructuredAction, keys};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Accept only absolute http(s) URLs.
pub(crate) fn validate_url(raw: &str) -> Result<Url, FailureReason> {
    let invalid = || FailureReason::InvalidUrl {
        url: raw.to_string(),
    };
    let trimmed = raw.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(invalid());
    }
    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid());
    }
    Ok(url)
}

impl<B: Bridge> ActionExecutor<B> {
    /// OPEN_APP by visible label, or by package when no label is given.
    pub(super) async fn open_app(&mut self, action: &StructuredAction) -> Step {
        let params = action.params();
        let entry = if let Some(name) = params.get(keys::APP_NAME) {
            self.entry_for_label(name).await?
        } else if let Some(package) = params.get(keys::PACKAGE_NAME) {
            self.bridge
                .launch_entry(package)
                .await?
                .ok_or_else(|| FailureReason::NoLaunchTarget {
                    package: package.to_string(),
                })?
        } else {
            return Err(FailureReason::missing(&format!(
                "{} | {}",
                keys::APP_NAME,
                keys::PACKAGE_NAME
            ))
            .into());
        };

        let package = entry.package.clone();
        self.start(LaunchRequest::App(entry)).await?;
        info!(%package, "Launched app");
        Ok(Done::on(package))
    }

    /// Launch entry of the first installed app whose label equals `name`,
    /// ignoring case, that has one.
    async fn entry_for_label(&mut self, name: &str) -> Result<LaunchEntry, Failed> {
        let wanted = name.trim().to_lowercase();
        let packages: Vec<String> = self
            .bridge
            .installed_apps()
            .await?
            .into_iter()
            .filter(|app| app.label.trim().to_lowercase() == wanted)
            .map(|app| app.package)
            .collect();

        if packages.is_empty() {
            warn!(app = name, "No installed app with that label");
            return Err(FailureReason::AppNotFound {
                name: name.to_string(),
            }
            .into());
        }

        for package in &packages {
            if let Some(entry) = self.bridge.launch_entry(package).await? {
                return Ok(entry);
            }
            debug!(%package, "Package has no launch entry");
        }
        Err(FailureReason::NoLaunchTarget {
            package: packages.join(", "),
        }
        .into())
    }

    pub(super) async fn launch_url(&mut self, action: &StructuredAction) -> Step {
        let raw = action
            .params()
            .get(keys::URL)
            .ok_or_else(|| FailureReason::missing(keys::URL))?;
        let url = validate_url(raw)?;
        self.start(LaunchRequest::ViewUrl {
            url: url.to_string(),
        })
        .await?;
        info!(%url, "Opened URL");
        Ok(Done::on(url.to_string()))
    }

    /// SEND_TEXT_MESSAGE: open the compose screen with the body filled in.
    ///
    /// With `messaging.auto_send` on, also press the send control. Not finding
    /// that control leaves the compose screen open and still counts as
    /// success.
    pub(super) async fn send_text_message(
        &mut self,
        action: &StructuredAction,
        cancel: &CancellationToken,
    ) -> Step {
        let params = action.params();
        let body = params
            .raw(keys::MESSAGE_BODY)
            .ok_or_else(|| FailureReason::missing(keys::MESSAGE_BODY))?;
        let recipient = params.get(keys::RECIPIENT_NUMBER);
        if let (None, Some(name)) = (recipient, params.get(keys::RECIPIENT_NAME)) {
            warn!(
                recipient = %self.config.security.loggable(keys::RECIPIENT_NAME, name),
                "Recipient given by name only; the compose screen opens without a number"
            );
        }

        let request = LaunchRequest::ComposeMessage {
            recipient: recipient.map(str::to_string),
            body: body.to_string(),
        };
        self.start(request).await?;
        info!(
            recipient = %recipient
                .map(|r| self.config.security.loggable(keys::RECIPIENT_NUMBER, r))
                .unwrap_or("<none>"),
            "Opened message compose screen"
        );

        if !self.config.messaging.auto_send {
            return Ok(Done::default());
        }

        pause(self.config.timing.settle_delay(), cancel).await?;
        let label = self.config.messaging.send_button_label.clone();
        let tree = self.snapshot().await?;
        let send = match resolve(&tree, &Selector::by_content_description(label.as_str())) {
            Ok(id) => id,
            Err(_) => {
                warn!(%label, "Send control not found, message left in compose screen");
                return Ok(Done::default());
            }
        };
        let target = tree.describe(send);
        if self
            .perform_on(&tree, send, NodeOperation::Click, None)
            .await?
        {
            info!(node = %target, "Message sent");
        } else {
            warn!(node = %target, "Send control refused the click");
        }
        Ok(Done::on(target))
    }

    async fn start(&mut self, request: LaunchRequest) -> Result<(), Failed> {
        if !self.bridge.can_handle(&request).await? {
            return Err(FailureReason::LaunchFailed {
                detail: format!("no installed app handles {}", request_kind(&request)),
            }
            .into());
        }
        self.bridge.start(&request).await.map_err(|err| {
            FailureReason::LaunchFailed {
                detail: err.to_string(),
            }
            .into()
        })
    }
}

fn request_kind(request: &LaunchRequest) -> &'static str {
    match request {
        LaunchRequest::App(_) => "the app launch",
        LaunchRequest::ViewUrl { .. } => "the URL",
        LaunchRequest::ComposeMessage { .. } => "message compose",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_url("https://www.example.com/path?q=1").is_ok());
        assert!(validate_url("http://example.com").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        for bad in ["ftp://example.com", "example.com", "https://", "javascript:alert(1)", ""] {
            assert_eq!(
                validate_url(bad),
                Err(FailureReason::InvalidUrl { url: bad.to_string() }),
                "{bad}"
            );
        }
    }
}
