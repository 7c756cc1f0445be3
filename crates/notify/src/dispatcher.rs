//! Walks a notification's fallback chain.
//!
//! Attempts run strictly one after another; the next channel is only tried
//! once the previous one has definitively failed, so a message is never
//! delivered twice. What happens when the chain runs dry is decided by the
//! notification type's [`FailurePolicy`].

use std::sync::Arc;

use postbox_core::OutboundMessage;

use crate::params::TemplateParams;
use crate::traits::{
    DispatchResult, MessageChannel, NotificationKind, NotifyError, TemplateChannel,
};

/// One step of a fallback chain, already shaped for its transport.
#[derive(Debug, Clone)]
pub enum DeliveryAttempt {
    /// Structured message via the primary channel.
    Message(OutboundMessage),
    /// Provider-side template via the secondary channel.
    Template {
        template_id: String,
        params: TemplateParams,
    },
}

/// What to do once every step of a chain has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure and report success to the caller.
    FailOpen,
    /// Propagate the last channel's error.
    FailLoud,
    /// Propagate [`NotifyError::AllChannelsFailed`] listing every attempt.
    Escalate,
}

/// Outcome of a chain that did not produce an error for the caller.
#[derive(Debug)]
pub struct DeliveryReport {
    pub kind: NotificationKind,
    /// Channel that accepted the notification, `None` when a fail-open chain ran dry.
    pub delivered_by: Option<String>,
    pub results: Vec<DispatchResult>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> bool {
        self.delivered_by.is_some()
    }
}

/// Side channel for delivery telemetry.
pub trait DeliveryObserver: Send + Sync {
    /// Called after every attempt, successful or not.
    fn record(&self, result: &DispatchResult);

    /// Called once when a notification could not be delivered at all,
    /// whether or not the error reaches the caller.
    fn undelivered(&self, kind: NotificationKind, error: &NotifyError);
}

/// Default observer: structured log lines only.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl DeliveryObserver for TracingObserver {
    fn record(&self, result: &DispatchResult) {
        if result.success {
            tracing::info!(
                kind = %result.kind,
                channel = %result.channel,
                step = result.step,
                duration_ms = result.duration_ms,
                "Notification delivered"
            );
        } else {
            tracing::warn!(
                kind = %result.kind,
                channel = %result.channel,
                step = result.step,
                error = result.error.as_deref().unwrap_or(""),
                duration_ms = result.duration_ms,
                "Notification delivery failed"
            );
        }
    }

    fn undelivered(&self, kind: NotificationKind, error: &NotifyError) {
        tracing::error!(kind = %kind, error = %error, "Notification could not be delivered");
    }
}

/// Runs fallback chains over one primary and one secondary channel.
pub struct Dispatcher {
    primary: Arc<dyn MessageChannel>,
    secondary: Arc<dyn TemplateChannel>,
    observer: Arc<dyn DeliveryObserver>,
}

impl Dispatcher {
    pub fn new(primary: Arc<dyn MessageChannel>, secondary: Arc<dyn TemplateChannel>) -> Self {
        Self {
            primary,
            secondary,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn DeliveryObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn observer(&self) -> &Arc<dyn DeliveryObserver> {
        &self.observer
    }

    /// Try each attempt in order until one succeeds.
    ///
    /// Returns `Ok` when a channel accepted the notification, or when the
    /// chain ran dry under [`FailurePolicy::FailOpen`].
    pub async fn deliver(
        &self,
        kind: NotificationKind,
        plan: Vec<DeliveryAttempt>,
        policy: FailurePolicy,
    ) -> Result<DeliveryReport, NotifyError> {
        let mut results = Vec::with_capacity(plan.len());
        let mut last_error = None;

        for (step, attempt) in plan.iter().enumerate() {
            let start = std::time::Instant::now();
            let (channel, outcome) = match attempt {
                DeliveryAttempt::Message(message) => (
                    self.primary.channel_name().to_string(),
                    self.primary.send_message(message).await,
                ),
                DeliveryAttempt::Template {
                    template_id,
                    params,
                } => (
                    self.secondary.channel_name().to_string(),
                    self.secondary.send_template(template_id, params).await,
                ),
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            let result = DispatchResult {
                kind,
                channel: channel.clone(),
                step,
                success: outcome.is_ok(),
                error: outcome.as_ref().err().map(|e| e.to_string()),
                duration_ms,
            };
            self.observer.record(&result);
            results.push(result);

            match outcome {
                Ok(()) => {
                    return Ok(DeliveryReport {
                        kind,
                        delivered_by: Some(channel),
                        results,
                    });
                }
                Err(e) => {
                    if step + 1 < plan.len() {
                        tracing::debug!(kind = %kind, channel = %channel, "falling back to next channel");
                    }
                    last_error = Some(e);
                }
            }
        }

        let attempts: Vec<String> = results
            .iter()
            .filter_map(|r| r.error.as_ref().map(|e| format!("{}: {}", r.channel, e)))
            .collect();

        let error = match policy {
            FailurePolicy::FailLoud => {
                last_error.unwrap_or(NotifyError::AllChannelsFailed { attempts })
            }
            FailurePolicy::FailOpen | FailurePolicy::Escalate => {
                NotifyError::AllChannelsFailed { attempts }
            }
        };
        self.observer.undelivered(kind, &error);

        if policy == FailurePolicy::FailOpen {
            return Ok(DeliveryReport {
                kind,
                delivered_by: None,
                results,
            });
        }
        Err(error)
    }
}
