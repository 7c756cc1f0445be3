use serde::{Deserialize, Serialize};

/// Sending identity shown in the From header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Recipient {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn named(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

/// A fully rendered email, shaped like the primary provider's request body.
///
/// Built once per send and not mutated afterwards; the `with_*` methods
/// consume and return the value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub sender: Sender,
    pub to: Vec<Recipient>,
    pub subject: String,
    pub html_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl OutboundMessage {
    pub fn new(
        sender: Sender,
        to: Vec<Recipient>,
        subject: impl Into<String>,
        html_content: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            to,
            subject: subject.into(),
            html_content: html_content.into(),
            text_content: None,
            tags: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// First recipient address, used in log lines.
    pub fn primary_recipient(&self) -> Option<&str> {
        self.to.first().map(|r| r.email.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sender() -> Sender {
        Sender {
            name: "Shop".to_string(),
            email: "no-reply@shop.example".to_string(),
        }
    }

    #[test]
    fn serializes_to_provider_shape() {
        let msg = OutboundMessage::new(
            sender(),
            vec![Recipient::named("ana@example.com", "Ana"), Recipient::new("ops@example.com")],
            "Hello",
            "<p>Hi</p>",
        )
        .with_text("Hi")
        .with_tags(["order-confirmation"]);

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "sender": {"name": "Shop", "email": "no-reply@shop.example"},
                "to": [{"email": "ana@example.com", "name": "Ana"}, {"email": "ops@example.com"}],
                "subject": "Hello",
                "htmlContent": "<p>Hi</p>",
                "textContent": "Hi",
                "tags": ["order-confirmation"],
            })
        );
    }

    #[test]
    fn optional_parts_are_omitted() {
        let msg = OutboundMessage::new(sender(), vec![Recipient::new("a@b.co")], "S", "<p/>");
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("textContent").is_none());
        assert!(value.get("tags").is_none());
        assert_eq!(msg.primary_recipient(), Some("a@b.co"));
    }
}
