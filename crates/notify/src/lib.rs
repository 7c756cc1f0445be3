//! Transactional email dispatch with per-type fallback chains.
//!
//! This crate provides:
//! - `MessageChannel` / `TemplateChannel` traits for the two transports
//! - Brevo (primary) and EmailJS (secondary) channel implementations
//! - Minijinja rendering of the bundled HTML and text templates
//! - A dispatcher that walks a fallback chain under a failure policy
//! - `Mailer`, the entry point for contact, order and document notifications

pub mod brevo;
pub mod builders;
pub mod dispatcher;
pub mod emailjs;
pub mod params;
pub mod service;
pub mod templating;
pub mod traits;

pub use dispatcher::{DeliveryObserver, Dispatcher, FailurePolicy, TracingObserver};
pub use params::{TemplateField, TemplateParams};
pub use service::Mailer;
pub use traits::{
    DispatchResult, FaultKind, MessageChannel, NotificationKind, NotifyError, TemplateChannel,
};
