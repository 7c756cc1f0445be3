//! Channel traits and shared error types.

use postbox_core::{CoreError, OutboundMessage};

use crate::params::TemplateParams;

/// Why a provider refused or failed a request.
///
/// Informational only: every kind triggers the same fallback step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// HTTP 4xx whose message blames the sending address or domain.
    SenderValidation,
    /// Any other non-2xx answer.
    Rejected,
    /// The request never got an HTTP answer.
    Transport,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultKind::SenderValidation => write!(f, "sender validation"),
            FaultKind::Rejected => write!(f, "rejected"),
            FaultKind::Transport => write!(f, "transport"),
        }
    }
}

/// Errors that can occur while composing or delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid email address: {0:?}")]
    InvalidAddress(String),

    #[error("{channel} channel unavailable: {reason}")]
    ChannelUnavailable { channel: String, reason: String },

    #[error("{channel} provider fault ({kind}{}): {message}", fmt_status(.status))]
    ProviderFault {
        channel: String,
        kind: FaultKind,
        status: Option<u16>,
        message: String,
    },

    #[error("All delivery channels failed: {}", .attempts.join("; "))]
    AllChannelsFailed { attempts: Vec<String> },

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(", HTTP {s}")).unwrap_or_default()
}

impl NotifyError {
    pub fn is_sender_validation(&self) -> bool {
        matches!(
            self,
            NotifyError::ProviderFault {
                kind: FaultKind::SenderValidation,
                ..
            }
        )
    }
}

impl From<CoreError> for NotifyError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidAddress(addr) => NotifyError::InvalidAddress(addr),
        }
    }
}

impl From<minijinja::Error> for NotifyError {
    fn from(err: minijinja::Error) -> Self {
        NotifyError::Template(err.to_string())
    }
}

/// The three notification types, each with its own failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ContactInquiry,
    OrderConfirmation,
    DocumentBundle,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ContactInquiry => "contact_inquiry",
            NotificationKind::OrderConfirmation => "order_confirmation",
            NotificationKind::DocumentBundle => "document_bundle",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel that accepts a fully rendered, structured message.
#[async_trait::async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send_message(&self, message: &OutboundMessage) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "brevo").
    fn channel_name(&self) -> &str;
}

/// Channel that renders a provider-side template from flat variables.
#[async_trait::async_trait]
pub trait TemplateChannel: Send + Sync {
    async fn send_template(
        &self,
        template_id: &str,
        params: &TemplateParams,
    ) -> Result<(), NotifyError>;

    fn channel_name(&self) -> &str;
}

/// Result of one delivery attempt inside a fallback chain.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DispatchResult {
    pub kind: NotificationKind,
    pub channel: String,
    /// Zero-based position in the chain.
    pub step: usize,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
