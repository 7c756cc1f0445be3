//! Public entry points used by the calling application.
//!
//! Each notification type carries its own chain and failure policy:
//!
//! | Type               | Chain                                   | When all fail        |
//! |--------------------|-----------------------------------------|----------------------|
//! | contact inquiry    | primary, secondary                      | last error returned  |
//! | order confirmation | primary                                 | logged, never raised |
//! | document bundle    | primary, secondary, support summary     | `AllChannelsFailed`  |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use postbox_core::{validate_address, Config, ContactInquiry, DocumentBundle, OrderConfirmation};

use crate::brevo::BrevoChannel;
use crate::builders;
use crate::dispatcher::{DeliveryAttempt, DeliveryObserver, Dispatcher, FailurePolicy};
use crate::emailjs::EmailJsChannel;
use crate::templating::TemplateRenderer;
use crate::traits::{MessageChannel, NotificationKind, NotifyError, TemplateChannel};

/// Composes notifications and hands them to the dispatcher.
///
/// Holds no mutable state; one instance can serve concurrent calls.
pub struct Mailer {
    config: Config,
    renderer: TemplateRenderer,
    dispatcher: Dispatcher,
}

impl Mailer {
    /// Wire the HTTP channels described by `config`.
    pub fn from_config(config: Config) -> Result<Self, NotifyError> {
        let primary = Arc::new(BrevoChannel::from_config(&config.brevo));
        let secondary = Arc::new(EmailJsChannel::from_config(&config.emailjs));
        Self::with_channels(config, primary, secondary)
    }

    pub fn with_channels(
        config: Config,
        primary: Arc<dyn MessageChannel>,
        secondary: Arc<dyn TemplateChannel>,
    ) -> Result<Self, NotifyError> {
        Ok(Self {
            renderer: TemplateRenderer::new()?,
            dispatcher: Dispatcher::new(primary, secondary),
            config,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn DeliveryObserver>) -> Self {
        self.dispatcher = self.dispatcher.with_observer(observer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Notify the support mailbox about a contact-form submission.
    ///
    /// # Errors
    ///
    /// [`NotifyError::InvalidAddress`] before any send, or the last channel's
    /// error once both channels have failed.
    pub async fn submit_contact_inquiry(&self, inquiry: &ContactInquiry) -> Result<(), NotifyError> {
        self.submit_contact_inquiry_at(inquiry, Utc::now()).await
    }

    pub async fn submit_contact_inquiry_at(
        &self,
        inquiry: &ContactInquiry,
        now: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        validate_address(&inquiry.email)?;

        let mail = &self.config.mail;
        let mut plan = vec![DeliveryAttempt::Message(builders::contact_message(
            &self.renderer,
            mail,
            inquiry,
            now,
        )?)];
        if let Some(template_id) = self.config.emailjs.contact_template_id.as_deref() {
            plan.push(DeliveryAttempt::Template {
                template_id: template_id.to_string(),
                params: builders::contact_template_params(mail, inquiry, now)?,
            });
        } else {
            tracing::debug!("no contact template configured, primary channel only");
        }

        self.dispatcher
            .deliver(NotificationKind::ContactInquiry, plan, FailurePolicy::FailLoud)
            .await?;
        Ok(())
    }

    /// Confirm an order to `recipient`.
    ///
    /// Never fails: completing the order must not depend on email. Every
    /// problem, including an invalid recipient, is reported to the observer
    /// and the log instead.
    pub async fn submit_order_confirmation(&self, order: &OrderConfirmation, recipient: &str) {
        self.submit_order_confirmation_at(order, recipient, Utc::now()).await
    }

    pub async fn submit_order_confirmation_at(
        &self,
        order: &OrderConfirmation,
        recipient: &str,
        now: DateTime<Utc>,
    ) {
        let kind = NotificationKind::OrderConfirmation;

        let message = validate_address(recipient)
            .map_err(NotifyError::from)
            .and_then(|()| {
                builders::order_confirmation_message(
                    &self.renderer,
                    &self.config.mail,
                    order,
                    recipient,
                    now,
                )
            });
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                self.dispatcher.observer().undelivered(kind, &e);
                return;
            }
        };

        // Always Ok under FailOpen; the observer has already seen any failure.
        let _ = self
            .dispatcher
            .deliver(kind, vec![DeliveryAttempt::Message(message)], FailurePolicy::FailOpen)
            .await;
    }

    /// Deliver a document bundle to its customer, escalating through every
    /// configured fallback.
    ///
    /// # Errors
    ///
    /// [`NotifyError::InvalidAddress`] before any send, or
    /// [`NotifyError::AllChannelsFailed`] once every step has failed.
    pub async fn submit_document_bundle(&self, bundle: &DocumentBundle) -> Result<(), NotifyError> {
        self.submit_document_bundle_at(bundle, Utc::now()).await
    }

    pub async fn submit_document_bundle_at(
        &self,
        bundle: &DocumentBundle,
        now: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        validate_address(&bundle.customer_email)?;

        let mail = &self.config.mail;
        let emailjs = &self.config.emailjs;
        let mut plan = vec![DeliveryAttempt::Message(builders::document_bundle_message(
            &self.renderer,
            mail,
            bundle,
            now,
        )?)];
        if let Some(template_id) = emailjs.document_template_id.as_deref() {
            plan.push(DeliveryAttempt::Template {
                template_id: template_id.to_string(),
                params: builders::document_template_params(mail, bundle, now)?,
            });
        }
        if let Some(template_id) = emailjs.fallback_template_id.as_deref() {
            plan.push(DeliveryAttempt::Template {
                template_id: template_id.to_string(),
                params: builders::support_fallback_params(mail, bundle, now)?,
            });
        }

        tracing::debug!(
            order_id = %bundle.order_id,
            documents = bundle.documents.len(),
            steps = plan.len(),
            "dispatching document bundle"
        );

        self.dispatcher
            .deliver(NotificationKind::DocumentBundle, plan, FailurePolicy::Escalate)
            .await?;
        Ok(())
    }

    /// Plain-text instructions to show the customer after a delivery.
    pub fn delivery_instructions(&self, bundle: &DocumentBundle) -> String {
        builders::delivery_instructions(bundle, &self.config.mail.support_email)
    }
}
