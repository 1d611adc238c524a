//! Discord webhook delivery.
//!
//! Posts a single embed per invocation. Delivery is best-effort: no
//! retries, and a failed post is reported to the caller to be logged.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::DiscordConfig;
use crate::transcript::truncate_chars;

/// Discord embed limits.
const MAX_TITLE_CHARS: usize = 256;
const MAX_DESCRIPTION_CHARS: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    pub timestamp: String,
}

impl Embed {
    /// Build an embed stamped with the current UTC time, clamped to
    /// Discord's field limits.
    pub fn new(title: &str, description: Option<&str>, color: u32) -> Self {
        Self {
            title: truncate_chars(title, MAX_TITLE_CHARS),
            description: description.map(|d| truncate_chars(d, MAX_DESCRIPTION_CHARS)),
            color,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    embeds: [&'a Embed; 1],
}

/// Replace a leading home directory in `cwd` with `~`.
///
/// Matching is per path component, so `/home/al` does not abbreviate
/// `/home/alice`.
pub fn abbreviate_home(cwd: &str, home: Option<&Path>) -> String {
    let Some(home) = home.filter(|h| !h.as_os_str().is_empty()) else {
        return cwd.to_string();
    };
    match Path::new(cwd).strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => cwd.to_string(),
    }
}

pub struct ChatNotifier {
    client: Client,
    webhook_url: String,
}

impl ChatNotifier {
    pub fn new(webhook_url: &str, config: &DiscordConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            webhook_url: webhook_url.to_string(),
        }
    }

    pub async fn send(&self, embed: &Embed) -> Result<(), ChatError> {
        debug!(title = %embed.title, color = embed.color, "posting embed to webhook");

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookPayload { embeds: [embed] })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            return Err(ChatError::Status { status, body });
        }

        Ok(())
    }
}
