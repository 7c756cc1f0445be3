//! Secondary channel: EmailJS REST API.
//!
//! EmailJS renders the mail from a template stored on its side; we only send
//! the service id, template id, public key and a flat variable map.

use postbox_core::config::EmailJsConfig;

use crate::params::TemplateParams;
use crate::traits::{FaultKind, NotifyError, TemplateChannel};

const CHANNEL: &str = "emailjs";

#[derive(serde::Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a TemplateParams,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
}

/// Sends template variables through the EmailJS HTTP API.
#[derive(Debug)]
pub struct EmailJsChannel {
    base_url: String,
    service_id: Option<String>,
    public_key: Option<String>,
    private_key: Option<String>,
    client: reqwest::Client,
}

impl EmailJsChannel {
    pub fn new(
        base_url: impl Into<String>,
        service_id: Option<String>,
        public_key: Option<String>,
        private_key: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            service_id: service_id.filter(|s| !s.trim().is_empty()),
            public_key: public_key.filter(|s| !s.trim().is_empty()),
            private_key: private_key.filter(|s| !s.trim().is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &EmailJsConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.service_id.clone(),
            config.public_key.clone(),
            config.private_key.clone(),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/api/v1.0/email/send", self.base_url.trim_end_matches('/'))
    }

    fn unavailable(reason: &str) -> NotifyError {
        tracing::warn!(channel = CHANNEL, reason, "channel unavailable");
        NotifyError::ChannelUnavailable {
            channel: CHANNEL.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl TemplateChannel for EmailJsChannel {
    async fn send_template(
        &self,
        template_id: &str,
        params: &TemplateParams,
    ) -> Result<(), NotifyError> {
        let service_id = self
            .service_id
            .as_deref()
            .ok_or_else(|| Self::unavailable("no service id configured"))?;
        let public_key = self
            .public_key
            .as_deref()
            .ok_or_else(|| Self::unavailable("no public key configured"))?;
        if template_id.trim().is_empty() {
            return Err(NotifyError::Config("empty EmailJS template id".to_string()));
        }

        let request = SendRequest {
            service_id,
            template_id,
            user_id: public_key,
            template_params: params,
            access_token: self.private_key.as_deref(),
        };

        tracing::debug!(channel = CHANNEL, template_id, vars = params.len(), "sending template");

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::ProviderFault {
                channel: CHANNEL.to_string(),
                kind: FaultKind::Transport,
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(channel = CHANNEL, template_id, "template accepted");
            return Ok(());
        }

        let body_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        tracing::warn!(
            channel = CHANNEL,
            template_id,
            status = status.as_u16(),
            body = %body_text,
            "provider rejected template"
        );

        Err(NotifyError::ProviderFault {
            channel: CHANNEL.to_string(),
            kind: FaultKind::Rejected,
            status: Some(status.as_u16()),
            message: body_text,
        })
    }

    fn channel_name(&self) -> &str {
        CHANNEL
    }
}
