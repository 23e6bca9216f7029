// dumpbox/src/notifier/mod.rs
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::NotificationConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Info,
    Error,
}

impl Status {
    pub fn color(&self) -> &'static str {
        match self {
            Status::Success => "#00AA00",
            Status::Info => "#0000AA",
            Status::Error => "#AA0000",
        }
    }
}

#[derive(Debug, Serialize)]
struct AttachmentField<'a> {
    short: bool,
    title: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct MessageAttachment<'a> {
    fallback: String,
    color: &'a str,
    text: &'a str,
    fields: Vec<AttachmentField<'a>>,
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    channel: &'a str,
    username: &'a str,
    icon_url: &'a str,
    icon_emoji: &'a str,
    attachments: Vec<MessageAttachment<'a>>,
}

/// Posts job outcomes to a Mattermost/Slack-style incoming webhook.
/// Failures are logged and never reach the caller.
#[derive(Debug, Clone)]
pub struct Notifier {
    config: NotificationConfig,
    client: Client,
}

impl Notifier {
    pub fn new(config: NotificationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build notification HTTP client")?;
        Ok(Notifier { config, client })
    }

    pub async fn notify(&self, status: Status, job_name: &str, message: &str) {
        if !self.config.enabled {
            return;
        }
        if let Err(e) = self.send(status, job_name, message).await {
            error!(job = job_name, error = %format!("{:#}", e), "unable to send notification");
        }
    }

    async fn send(&self, status: Status, job_name: &str, message: &str) -> Result<()> {
        let body = self.payload(status, job_name, message);
        let response = self
            .client
            .post(&self.config.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to post notification to {}", self.config.url))?;

        let code = response.status();
        if !code.is_success() {
            anyhow::bail!("notification endpoint answered with status {}", code);
        }
        debug!(job = job_name, "notification sent");
        Ok(())
    }

    fn payload<'a>(&'a self, status: Status, job_name: &'a str, message: &'a str) -> WebhookMessage<'a> {
        WebhookMessage {
            channel: &self.config.channel,
            username: &self.config.username,
            icon_url: &self.config.icon_url,
            icon_emoji: &self.config.icon_emoji,
            attachments: vec![MessageAttachment {
                fallback: format!("{}: {}", job_name, message),
                color: status.color(),
                text: message,
                fields: vec![AttachmentField {
                    short: false,
                    title: "Backup",
                    value: job_name,
                }],
            }],
        }
    }
}
