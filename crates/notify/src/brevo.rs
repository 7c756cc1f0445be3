//! Primary channel: Brevo transactional email API.
//!
//! Posts the serialized [`OutboundMessage`] to `{base_url}/smtp/email`,
//! authenticated with the `api-key` header.

use postbox_core::config::BrevoConfig;
use postbox_core::OutboundMessage;
use serde_json::Value;

use crate::traits::{FaultKind, MessageChannel, NotifyError};

const CHANNEL: &str = "brevo";

/// Sends structured messages through the Brevo HTTP API.
#[derive(Debug)]
pub struct BrevoChannel {
    api_key: Option<String>,
    base_url: String,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl BrevoChannel {
    /// A blank `api_key` is treated as missing.
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &BrevoConfig) -> Self {
        Self::new(config.api_key.clone(), config.base_url.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/smtp/email", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl MessageChannel for BrevoChannel {
    async fn send_message(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!(channel = CHANNEL, reason = "no API key configured", "channel unavailable");
            return Err(NotifyError::ChannelUnavailable {
                channel: CHANNEL.to_string(),
                reason: "no API key configured".to_string(),
            });
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("api-key", api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(message)
            .send()
            .await
            .map_err(|e| NotifyError::ProviderFault {
                channel: CHANNEL.to_string(),
                kind: FaultKind::Transport,
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = parse_or_default(&response.text().await.unwrap_or_default());

        if status.is_success() {
            let message_id = body.get("messageId").and_then(Value::as_str).unwrap_or("-");
            tracing::info!(
                channel = CHANNEL,
                subject = %message.subject,
                recipients = message.to.len(),
                message_id,
                "message accepted"
            );
            return Ok(());
        }

        let detail = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
        let kind = classify_fault(status.as_u16(), &detail);

        tracing::warn!(
            channel = CHANNEL,
            status = status.as_u16(),
            %kind,
            detail = %detail,
            "provider rejected message"
        );

        Err(NotifyError::ProviderFault {
            channel: CHANNEL.to_string(),
            kind,
            status: Some(status.as_u16()),
            message: detail,
        })
    }

    fn channel_name(&self) -> &str {
        CHANNEL
    }
}

/// Parse a response body as JSON, substituting an empty object when it is
/// not valid JSON. A malformed error body must never become an error itself.
pub(crate) fn parse_or_default(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

/// 4xx answers that mention the sender are configuration faults on our side.
fn classify_fault(status: u16, message: &str) -> FaultKind {
    if (400..500).contains(&status) && message.to_lowercase().contains("sender") {
        FaultKind::SenderValidation
    } else {
        FaultKind::Rejected
    }
}
