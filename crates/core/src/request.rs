//! Inbound records handed over by the calling application.
//!
//! Each record is consumed by exactly one dispatch call and never stored.
//! Field names accept camelCase JSON so web-form payloads deserialize as-is.

use serde::{Deserialize, Serialize};

use crate::document::DeliverableDocument;

/// A message submitted through the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactInquiry {
    pub name: String,
    /// Sender's address; the only validated field.
    pub email: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    pub message: String,
}

/// A completed order, confirmed to the customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub project_title: String,
    pub customer_name: String,
    pub price: f64,
    pub order_id: String,
    /// Overrides the configured support mailbox in the rendered mail.
    #[serde(default)]
    pub support_email: Option<String>,
}

/// Deliverables for one order, sent to the customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBundle {
    pub customer_name: String,
    pub customer_email: String,
    pub order_id: String,
    #[serde(default)]
    pub documents: Vec<DeliverableDocument>,
    /// Free-form label such as "30 days" or a date.
    #[serde(default)]
    pub access_expiry: Option<String>,
}
