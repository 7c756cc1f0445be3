//! Message and payload builders for each notification type.
//!
//! Every builder is pure: the same input and the same `now` give the same
//! output. Callers capture `now` once per dispatch and pass it to every
//! builder so all fallback payloads agree on the timestamp.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use minijinja::context;
use postbox_core::config::MailConfig;
use postbox_core::{
    format_size, partition_by_stage, ContactInquiry, DocumentBundle, OrderConfirmation,
    OutboundMessage, Recipient,
};

use crate::params::{TemplateField, TemplateParams};
use crate::templating::{self, TemplateRenderer};
use crate::traits::NotifyError;

pub const CONTACT_TAG: &str = "contact-form";
pub const ORDER_TAG: &str = "order-confirmation";
pub const DOCUMENTS_TAG: &str = "document-delivery";

fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn date(now: DateTime<Utc>) -> String {
    now.format("%d.%m.%Y").to_string()
}

fn year(now: DateTime<Utc>) -> String {
    now.format("%Y").to_string()
}

// ── Contact inquiry ───────────────────────────────────────────

pub fn contact_subject(inquiry: &ContactInquiry) -> String {
    match inquiry.category.as_deref() {
        Some(category) => format!("New inquiry from {} ({})", inquiry.name, category),
        None => format!("New inquiry from {}", inquiry.name),
    }
}

/// HTML-only notice to the support mailbox.
pub fn contact_message(
    renderer: &TemplateRenderer,
    mail: &MailConfig,
    inquiry: &ContactInquiry,
    now: DateTime<Utc>,
) -> Result<OutboundMessage, NotifyError> {
    let html = renderer.render(
        templating::CONTACT_HTML,
        context! {
            inquiry => inquiry,
            timestamp => timestamp(now),
            site_name => &mail.site_name,
        },
    )?;

    Ok(OutboundMessage::new(
        mail.sender(),
        vec![Recipient::named(&mail.support_email, &mail.site_name)],
        contact_subject(inquiry),
        html,
    )
    .with_tags([CONTACT_TAG]))
}

pub fn contact_template_params(
    mail: &MailConfig,
    inquiry: &ContactInquiry,
    now: DateTime<Utc>,
) -> Result<TemplateParams, NotifyError> {
    TemplateParams::new()
        .with(TemplateField::ToEmail, &mail.support_email)
        .with(TemplateField::FromName, &inquiry.name)
        .with(TemplateField::FromEmail, &inquiry.email)
        .with(TemplateField::ReplyTo, &inquiry.email)
        .with(TemplateField::Subject, contact_subject(inquiry))
        .with_opt(TemplateField::Category, inquiry.category.as_deref())
        .with_opt(TemplateField::Budget, inquiry.budget.as_deref())
        .with(TemplateField::Message, &inquiry.message)
        .with(TemplateField::SubmittedAt, timestamp(now))
        .require(&[TemplateField::ToEmail, TemplateField::FromEmail, TemplateField::ReplyTo])
}

// ── Order confirmation ────────────────────────────────────────

pub fn order_subject(order: &OrderConfirmation) -> String {
    format!("Order confirmation #{}: {}", order.order_id, order.project_title)
}

/// HTML + text confirmation to the customer.
pub fn order_confirmation_message(
    renderer: &TemplateRenderer,
    mail: &MailConfig,
    order: &OrderConfirmation,
    recipient: &str,
    now: DateTime<Utc>,
) -> Result<OutboundMessage, NotifyError> {
    let ctx = context! {
        order => context! {
            order_id => &order.order_id,
            project_title => &order.project_title,
            customer_name => &order.customer_name,
            price => order.price,
        },
        currency => &mail.currency,
        support_email => order.support_email.as_deref().unwrap_or(&mail.support_email),
        site_name => &mail.site_name,
        date => date(now),
        year => year(now),
    };
    let html = renderer.render(templating::ORDER_HTML, &ctx)?;
    let text = renderer.render(templating::ORDER_TEXT, &ctx)?;

    Ok(OutboundMessage::new(
        mail.sender(),
        vec![Recipient::named(recipient, &order.customer_name)],
        order_subject(order),
        html,
    )
    .with_text(text)
    .with_tags([ORDER_TAG]))
}

// ── Document bundle ───────────────────────────────────────────

pub fn documents_subject(bundle: &DocumentBundle) -> String {
    format!("Your documents for order #{} are ready", bundle.order_id)
}

/// HTML + text delivery notice, documents grouped by review stage.
pub fn document_bundle_message(
    renderer: &TemplateRenderer,
    mail: &MailConfig,
    bundle: &DocumentBundle,
    now: DateTime<Utc>,
) -> Result<OutboundMessage, NotifyError> {
    let stages = partition_by_stage(&bundle.documents);
    let ctx = context! {
        bundle => context! {
            customer_name => &bundle.customer_name,
            order_id => &bundle.order_id,
            access_expiry => &bundle.access_expiry,
        },
        stages => &stages,
        support_email => &mail.support_email,
        site_name => &mail.site_name,
        date => date(now),
        year => year(now),
    };
    let html = renderer.render(templating::DOCUMENTS_HTML, &ctx)?;
    let text = renderer.render(templating::DOCUMENTS_TEXT, &ctx)?;

    Ok(OutboundMessage::new(
        mail.sender(),
        vec![Recipient::named(&bundle.customer_email, &bundle.customer_name)],
        documents_subject(bundle),
        html,
    )
    .with_text(text)
    .with_tags([DOCUMENTS_TAG]))
}

/// Stage-grouped list for the secondary channel's `document_list` variable.
pub fn document_list_text(bundle: &DocumentBundle) -> String {
    let mut out = String::new();
    for group in partition_by_stage(&bundle.documents) {
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}:", group.label);
        for doc in group.documents {
            let _ = writeln!(out, "- {}: {}", doc.name, doc.url);
        }
    }
    out.trim_end().to_string()
}

pub fn document_template_params(
    mail: &MailConfig,
    bundle: &DocumentBundle,
    now: DateTime<Utc>,
) -> Result<TemplateParams, NotifyError> {
    TemplateParams::new()
        .with(TemplateField::ToName, &bundle.customer_name)
        .with(TemplateField::ToEmail, &bundle.customer_email)
        .with(TemplateField::ReplyTo, &mail.support_email)
        .with(TemplateField::Subject, documents_subject(bundle))
        .with(TemplateField::OrderId, &bundle.order_id)
        .with(TemplateField::DocumentCount, bundle.documents.len().to_string())
        .with(TemplateField::DocumentList, document_list_text(bundle))
        .with_opt(TemplateField::AccessExpiry, bundle.access_expiry.as_deref())
        .with(TemplateField::SubmittedAt, timestamp(now))
        .require(&[TemplateField::ToEmail])
}

/// Plain-text summary of every document, for the support mailbox.
///
/// Lists the whole input, including documents whose stage tag is unknown,
/// each name and URL exactly once.
pub fn support_summary(bundle: &DocumentBundle, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Automatic delivery to {} <{}> failed.",
        bundle.customer_name, bundle.customer_email
    );
    let _ = writeln!(out, "Order: {}", bundle.order_id);
    let _ = writeln!(out, "Generated: {}", timestamp(now));
    if let Some(expiry) = bundle.access_expiry.as_deref() {
        let _ = writeln!(out, "Access expiry: {expiry}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Documents ({}):", bundle.documents.len());

    for (i, doc) in bundle.documents.iter().enumerate() {
        let stage = doc
            .review_stage()
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| format!("unstaged '{}'", doc.stage));
        let size = doc.size.map(|b| format!(", {}", format_size(b))).unwrap_or_default();
        let _ = writeln!(out, "{}. {} [{}, {}{}]", i + 1, doc.name, stage, doc.category, size);
        let _ = writeln!(out, "   {}", doc.url);
    }

    out.trim_end().to_string()
}

/// Last-resort payload: the support summary addressed to the support mailbox.
pub fn support_fallback_params(
    mail: &MailConfig,
    bundle: &DocumentBundle,
    now: DateTime<Utc>,
) -> Result<TemplateParams, NotifyError> {
    TemplateParams::new()
        .with(TemplateField::ToName, &mail.site_name)
        .with(TemplateField::ToEmail, &mail.support_email)
        .with(TemplateField::ReplyTo, &bundle.customer_email)
        .with(
            TemplateField::Subject,
            format!("[Delivery fallback] Documents for order #{}", bundle.order_id),
        )
        .with(TemplateField::OrderId, &bundle.order_id)
        .with(TemplateField::Message, support_summary(bundle, now))
        .with(TemplateField::SubmittedAt, timestamp(now))
        .require(&[TemplateField::ToEmail, TemplateField::Message])
}

/// Caller-facing instructions shown after a delivery was submitted.
pub fn delivery_instructions(bundle: &DocumentBundle, support_email: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Hello {},", bundle.customer_name);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "the documents for order #{} were sent to {}.",
        bundle.order_id, bundle.customer_email
    );

    let groups = partition_by_stage(&bundle.documents);
    let staged: usize = groups.iter().map(|g| g.documents.len()).sum();
    for group in groups.iter().filter(|g| !g.is_empty()) {
        let _ = writeln!(out, "  {}: {} document(s)", group.label, group.documents.len());
    }
    if staged < bundle.documents.len() {
        let _ = writeln!(out, "  Other: {} document(s)", bundle.documents.len() - staged);
    }

    let _ = writeln!(out);
    let _ = write!(out, "Open the links in the email to download each file.");
    if let Some(expiry) = bundle.access_expiry.as_deref() {
        let _ = write!(out, " The links stay valid for {expiry}.");
    }
    let _ = writeln!(out);
    let _ = write!(
        out,
        "If the email has not arrived within 15 minutes, check your spam folder or write to {support_email}."
    );
    out
}
