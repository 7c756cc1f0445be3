//! End-to-end behaviour of `Mailer` per notification type.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use httpmock::prelude::*;
use serde_json::json;

use postbox_core::config::Config;
use postbox_core::{ContactInquiry, DeliverableDocument, DocumentBundle, OrderConfirmation, OutboundMessage};
use postbox_notify::{
    DeliveryObserver, DispatchResult, FaultKind, Mailer, MessageChannel, NotificationKind,
    NotifyError, TemplateChannel, TemplateField, TemplateParams,
};

// ── Doubles ─────────────────────────────────────────────────────────

/// Primary channel double with a scripted outcome.
struct ScriptedPrimary {
    calls: AtomicUsize,
    outcome: fn() -> Result<(), NotifyError>,
    sent: Mutex<Vec<OutboundMessage>>,
}

impl ScriptedPrimary {
    fn new(outcome: fn() -> Result<(), NotifyError>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome,
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl MessageChannel for ScriptedPrimary {
    async fn send_message(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(message.clone());
        (self.outcome)()
    }
    fn channel_name(&self) -> &str {
        "primary"
    }
}

/// Secondary channel double; fails for every template id in `failing`.
struct ScriptedSecondary {
    failing: Vec<&'static str>,
    sent: Mutex<Vec<(String, TemplateParams)>>,
}

impl ScriptedSecondary {
    fn new(failing: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            failing,
            sent: Mutex::new(Vec::new()),
        })
    }

    fn template_ids(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }
}

#[async_trait::async_trait]
impl TemplateChannel for ScriptedSecondary {
    async fn send_template(&self, template_id: &str, params: &TemplateParams) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((template_id.to_string(), params.clone()));
        if self.failing.iter().any(|f| *f == template_id) {
            Err(NotifyError::ProviderFault {
                channel: "secondary".to_string(),
                kind: FaultKind::Rejected,
                status: Some(503),
                message: format!("{template_id} unavailable"),
            })
        } else {
            Ok(())
        }
    }
    fn channel_name(&self) -> &str {
        "secondary"
    }
}

/// Any call fails the test: proves validation happens before I/O.
struct ForbiddenPrimary;

#[async_trait::async_trait]
impl MessageChannel for ForbiddenPrimary {
    async fn send_message(&self, _message: &OutboundMessage) -> Result<(), NotifyError> {
        panic!("primary channel must not be called");
    }
    fn channel_name(&self) -> &str {
        "forbidden"
    }
}

struct ForbiddenSecondary;

#[async_trait::async_trait]
impl TemplateChannel for ForbiddenSecondary {
    async fn send_template(&self, _id: &str, _params: &TemplateParams) -> Result<(), NotifyError> {
        panic!("secondary channel must not be called");
    }
    fn channel_name(&self) -> &str {
        "forbidden"
    }
}

#[derive(Default)]
struct Recorder {
    results: Mutex<Vec<DispatchResult>>,
    undelivered: Mutex<Vec<(NotificationKind, String)>>,
}

impl DeliveryObserver for Recorder {
    fn record(&self, result: &DispatchResult) {
        self.results.lock().unwrap().push(result.clone());
    }
    fn undelivered(&self, kind: NotificationKind, error: &NotifyError) {
        self.undelivered.lock().unwrap().push((kind, error.to_string()));
    }
}

fn ok() -> Result<(), NotifyError> {
    Ok(())
}

fn server_error() -> Result<(), NotifyError> {
    Err(NotifyError::ProviderFault {
        channel: "primary".to_string(),
        kind: FaultKind::Rejected,
        status: Some(500),
        message: "Internal Server Error".to_string(),
    })
}

fn no_credential() -> Result<(), NotifyError> {
    Err(NotifyError::ChannelUnavailable {
        channel: "primary".to_string(),
        reason: "no API key configured".to_string(),
    })
}

// ── Fixtures ────────────────────────────────────────────────────────

fn config() -> Config {
    let mut config = Config::default();
    config.mail.support_email = "help@studio.example".to_string();
    config.emailjs.contact_template_id = Some("tpl_contact".to_string());
    config.emailjs.document_template_id = Some("tpl_docs".to_string());
    config.emailjs.fallback_template_id = Some("tpl_support".to_string());
    config
}

fn inquiry(email: &str) -> ContactInquiry {
    ContactInquiry {
        name: "Ivo".to_string(),
        email: email.to_string(),
        category: Some("Thesis".to_string()),
        budget: Some("500-1000".to_string()),
        message: "Can you help with my methodology chapter?".to_string(),
    }
}

fn order() -> OrderConfirmation {
    OrderConfirmation {
        project_title: "Market study".to_string(),
        customer_name: "Ana".to_string(),
        price: 240.0,
        order_id: "ORD-7".to_string(),
        support_email: None,
    }
}

fn bundle(email: &str) -> DocumentBundle {
    DocumentBundle {
        customer_name: "Ana".to_string(),
        customer_email: email.to_string(),
        order_id: "ORD-7".to_string(),
        documents: vec![
            DeliverableDocument {
                name: "Interview transcripts".to_string(),
                url: "https://cdn.studio.example/t/91".to_string(),
                category: "data".to_string(),
                stage: "stage-2".to_string(),
                size: Some(48_000),
            },
            DeliverableDocument {
                name: "Research proposal".to_string(),
                url: "https://cdn.studio.example/t/17".to_string(),
                category: "text".to_string(),
                stage: "stage-1".to_string(),
                size: None,
            },
        ],
        access_expiry: Some("14 days".to_string()),
    }
}

fn forbidden_mailer() -> Mailer {
    Mailer::with_channels(config(), Arc::new(ForbiddenPrimary), Arc::new(ForbiddenSecondary)).unwrap()
}

const BAD_ADDRESSES: [&str; 3] = ["not-an-email", "a@b", "@b.com"];

// ── Validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_contact_address_fails_before_any_send() {
    let mailer = forbidden_mailer();
    for bad in BAD_ADDRESSES {
        let err = mailer.submit_contact_inquiry(&inquiry(bad)).await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidAddress(ref a) if a == bad), "got: {err}");
    }
}

#[tokio::test]
async fn invalid_bundle_address_fails_before_any_send() {
    let mailer = forbidden_mailer();
    for bad in BAD_ADDRESSES {
        let err = mailer.submit_document_bundle(&bundle(bad)).await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidAddress(_)), "got: {err}");
    }
}

#[tokio::test]
async fn invalid_order_recipient_is_swallowed_but_observed() {
    let recorder = Arc::new(Recorder::default());
    let mailer = forbidden_mailer().with_observer(recorder.clone());
    for bad in BAD_ADDRESSES {
        mailer.submit_order_confirmation(&order(), bad).await;
    }
    let undelivered = recorder.undelivered.lock().unwrap();
    assert_eq!(undelivered.len(), 3);
    assert!(undelivered
        .iter()
        .all(|(kind, msg)| *kind == NotificationKind::OrderConfirmation && msg.contains("Invalid email address")));
    assert!(recorder.results.lock().unwrap().is_empty());
}

// ── Contact inquiry: fail loud ──────────────────────────────────────

#[tokio::test]
async fn contact_primary_success_skips_secondary() {
    let primary = ScriptedPrimary::new(ok);
    let secondary = ScriptedSecondary::new(vec![]);
    let mailer = Mailer::with_channels(config(), primary.clone(), secondary.clone()).unwrap();

    mailer.submit_contact_inquiry(&inquiry("ivo@example.com")).await.unwrap();

    assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    assert!(secondary.template_ids().is_empty());
    let sent = primary.sent.lock().unwrap();
    assert_eq!(sent[0].primary_recipient(), Some("help@studio.example"));
    assert_eq!(sent[0].tags, vec!["contact-form"]);
}

#[tokio::test]
async fn contact_falls_back_to_secondary() {
    let primary = ScriptedPrimary::new(server_error);
    let secondary = ScriptedSecondary::new(vec![]);
    let mailer = Mailer::with_channels(config(), primary, secondary.clone()).unwrap();

    mailer.submit_contact_inquiry(&inquiry("ivo@example.com")).await.unwrap();

    let sent = secondary.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (id, params) = &sent[0];
    assert_eq!(id, "tpl_contact");
    assert_eq!(params.get(TemplateField::FromEmail), Some("ivo@example.com"));
    assert_eq!(params.get(TemplateField::Budget), Some("500-1000"));
}

#[tokio::test]
async fn contact_both_channels_failing_propagates_error() {
    let primary = ScriptedPrimary::new(server_error);
    let secondary = ScriptedSecondary::new(vec!["tpl_contact"]);
    let recorder = Arc::new(Recorder::default());
    let mailer = Mailer::with_channels(config(), primary, secondary)
        .unwrap()
        .with_observer(recorder.clone());

    let err = mailer
        .submit_contact_inquiry(&inquiry("ivo@example.com"))
        .await
        .unwrap_err();

    match err {
        NotifyError::ProviderFault { channel, message, .. } => {
            assert_eq!(channel, "secondary");
            assert_eq!(message, "tpl_contact unavailable");
        }
        other => panic!("expected the secondary's fault, got: {other:?}"),
    }
    assert_eq!(recorder.results.lock().unwrap().len(), 2);
    assert_eq!(recorder.undelivered.lock().unwrap().len(), 1);
}

// ── Order confirmation: fail open ───────────────────────────────────

#[tokio::test]
async fn order_primary_500_returns_normally_and_is_observable() {
    let primary = ScriptedPrimary::new(server_error);
    let secondary = ScriptedSecondary::new(vec![]);
    let recorder = Arc::new(Recorder::default());
    let mailer = Mailer::with_channels(config(), primary.clone(), secondary.clone())
        .unwrap()
        .with_observer(recorder.clone());

    mailer.submit_order_confirmation(&order(), "ana@example.com").await;

    assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    // Single channel: no fallback for order confirmations.
    assert!(secondary.template_ids().is_empty());

    let results = recorder.results.lock().unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert!(results[0].error.as_deref().unwrap().contains("HTTP 500"));

    let undelivered = recorder.undelivered.lock().unwrap();
    assert_eq!(undelivered.len(), 1);
    assert_eq!(undelivered[0].0, NotificationKind::OrderConfirmation);
}

#[tokio::test]
async fn order_message_is_addressed_to_recipient() {
    let primary = ScriptedPrimary::new(ok);
    let mailer = Mailer::with_channels(config(), primary.clone(), ScriptedSecondary::new(vec![])).unwrap();

    mailer.submit_order_confirmation(&order(), "ana@example.com").await;

    let sent = primary.sent.lock().unwrap();
    assert_eq!(sent[0].primary_recipient(), Some("ana@example.com"));
    assert!(sent[0].text_content.as_deref().unwrap().contains("240.00 EUR"));
}

// ── Document bundle: escalate ───────────────────────────────────────

#[tokio::test]
async fn bundle_without_primary_credential_uses_secondary() {
    let primary = ScriptedPrimary::new(no_credential);
    let secondary = ScriptedSecondary::new(vec![]);
    let mailer = Mailer::with_channels(config(), primary, secondary.clone()).unwrap();

    mailer.submit_document_bundle(&bundle("ana@example.com")).await.unwrap();

    assert_eq!(secondary.template_ids(), vec!["tpl_docs"]);
}

#[tokio::test]
async fn bundle_escalates_to_support_summary() {
    let primary = ScriptedPrimary::new(no_credential);
    let secondary = ScriptedSecondary::new(vec!["tpl_docs"]);
    let mailer = Mailer::with_channels(config(), primary, secondary.clone()).unwrap();

    mailer.submit_document_bundle(&bundle("ana@example.com")).await.unwrap();

    assert_eq!(secondary.template_ids(), vec!["tpl_docs", "tpl_support"]);
    let sent = secondary.sent.lock().unwrap();
    let (_, params) = &sent[1];
    assert_eq!(params.get(TemplateField::ToEmail), Some("help@studio.example"));
    let summary = params.get(TemplateField::Message).unwrap();
    for doc in &bundle("ana@example.com").documents {
        assert_eq!(summary.matches(doc.name.as_str()).count(), 1);
        assert_eq!(summary.matches(doc.url.as_str()).count(), 1);
    }
}

#[tokio::test]
async fn bundle_all_channels_failing_is_terminal() {
    let primary = ScriptedPrimary::new(no_credential);
    let secondary = ScriptedSecondary::new(vec!["tpl_docs", "tpl_support"]);
    let mailer = Mailer::with_channels(config(), primary, secondary).unwrap();

    let err = mailer
        .submit_document_bundle(&bundle("ana@example.com"))
        .await
        .unwrap_err();

    match err {
        NotifyError::AllChannelsFailed { attempts } => {
            assert_eq!(attempts.len(), 3);
            assert!(attempts[0].contains("unavailable: no API key configured"));
        }
        other => panic!("expected AllChannelsFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn bundle_without_fallback_template_stops_after_secondary() {
    let mut config = config();
    config.emailjs.fallback_template_id = None;
    let secondary = ScriptedSecondary::new(vec!["tpl_docs"]);
    let mailer = Mailer::with_channels(config, ScriptedPrimary::new(server_error), secondary.clone()).unwrap();

    let err = mailer
        .submit_document_bundle(&bundle("ana@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, NotifyError::AllChannelsFailed { ref attempts } if attempts.len() == 2));
    assert_eq!(secondary.template_ids(), vec!["tpl_docs"]);
}

#[tokio::test]
async fn one_timestamp_per_dispatch() {
    let primary = ScriptedPrimary::new(server_error);
    let secondary = ScriptedSecondary::new(vec!["tpl_docs"]);
    let mailer = Mailer::with_channels(config(), primary, secondary.clone()).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 5, 2, 17, 45, 0).unwrap();

    mailer
        .submit_document_bundle_at(&bundle("ana@example.com"), now)
        .await
        .unwrap();

    let sent = secondary.sent.lock().unwrap();
    for (_, params) in sent.iter() {
        assert_eq!(params.get(TemplateField::SubmittedAt), Some("2026-05-02 17:45 UTC"));
    }
    assert!(sent[1]
        .1
        .get(TemplateField::Message)
        .unwrap()
        .contains("Generated: 2026-05-02 17:45 UTC"));
}

#[tokio::test]
async fn instructions_have_no_side_effects() {
    let mailer = forbidden_mailer();
    let text = mailer.delivery_instructions(&bundle("ana@example.com"));
    assert!(text.contains("order #ORD-7"));
    assert!(text.contains("help@studio.example"));
}

// ── Over HTTP ───────────────────────────────────────────────────────

#[tokio::test]
async fn http_sender_fault_falls_through_to_emailjs() {
    let brevo = MockServer::start_async().await;
    let emailjs = MockServer::start_async().await;

    let brevo_mock = brevo
        .mock_async(|when, then| {
            when.method(POST).path("/smtp/email").header("api-key", "xkeysib-test");
            then.status(400)
                .json_body(json!({"code": "invalid_parameter", "message": "sender not valid"}));
        })
        .await;
    let emailjs_mock = emailjs
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1.0/email/send")
                .body_contains(r#""template_id":"tpl_contact""#)
                .body_contains(r#""reply_to":"ivo@example.com""#);
            then.status(200).body("OK");
        })
        .await;

    let mut config = config();
    config.brevo.api_key = Some("xkeysib-test".to_string());
    config.brevo.base_url = brevo.base_url();
    config.emailjs.base_url = emailjs.base_url();
    config.emailjs.service_id = Some("service_x".to_string());
    config.emailjs.public_key = Some("public_y".to_string());

    let recorder = Arc::new(Recorder::default());
    let mailer = Mailer::from_config(config).unwrap().with_observer(recorder.clone());
    mailer.submit_contact_inquiry(&inquiry("ivo@example.com")).await.unwrap();

    brevo_mock.assert_async().await;
    emailjs_mock.assert_async().await;

    let results = recorder.results.lock().unwrap();
    let channels: Vec<(&str, bool)> = results.iter().map(|r| (r.channel.as_str(), r.success)).collect();
    assert_eq!(channels, vec![("brevo", false), ("emailjs", true)]);
    assert!(results[0].error.as_deref().unwrap().contains("sender validation"));
}

#[tokio::test]
async fn http_unconfigured_channels_exhaust_document_chain() {
    let emailjs = MockServer::start_async().await;
    let emailjs_mock = emailjs
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1.0/email/send");
            then.status(200).body("OK");
        })
        .await;

    // Neither Brevo key nor EmailJS service id: every step fails without I/O.
    let mut config = config();
    config.emailjs.base_url = emailjs.base_url();

    let mailer = Mailer::from_config(config).unwrap();
    let err = mailer
        .submit_document_bundle(&bundle("ana@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, NotifyError::AllChannelsFailed { ref attempts } if attempts.len() == 3));
    assert_eq!(emailjs_mock.hits_async().await, 0);
}
