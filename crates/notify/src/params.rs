//! Flat variable maps for provider-side templates.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::traits::NotifyError;

/// The closed set of variables a provider-side template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateField {
    ToName,
    ToEmail,
    FromName,
    FromEmail,
    ReplyTo,
    Subject,
    Message,
    Category,
    Budget,
    OrderId,
    DocumentCount,
    DocumentList,
    AccessExpiry,
    SubmittedAt,
}

impl TemplateField {
    /// Variable name as referenced in the provider's template editor.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateField::ToName => "to_name",
            TemplateField::ToEmail => "to_email",
            TemplateField::FromName => "from_name",
            TemplateField::FromEmail => "from_email",
            TemplateField::ReplyTo => "reply_to",
            TemplateField::Subject => "subject",
            TemplateField::Message => "message",
            TemplateField::Category => "category",
            TemplateField::Budget => "budget",
            TemplateField::OrderId => "order_id",
            TemplateField::DocumentCount => "document_count",
            TemplateField::DocumentList => "document_list",
            TemplateField::AccessExpiry => "access_expiry",
            TemplateField::SubmittedAt => "submitted_at",
        }
    }
}

/// Ordered field → value map sent as `template_params`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateParams {
    values: IndexMap<TemplateField, String>,
}

impl TemplateParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value while keeping its position.
    pub fn with(mut self, field: TemplateField, value: impl Into<String>) -> Self {
        self.values.insert(field, value.into());
        self
    }

    /// Set a field only when a value is present.
    pub fn with_opt(self, field: TemplateField, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.with(field, v),
            None => self,
        }
    }

    pub fn get(&self, field: TemplateField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TemplateField, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Check that every field in `required` is present and not blank.
    pub fn require(self, required: &[TemplateField]) -> Result<Self, NotifyError> {
        let missing: Vec<&str> = required
            .iter()
            .filter(|f| self.get(**f).map_or(true, |v| v.trim().is_empty()))
            .map(|f| f.as_str())
            .collect();

        if missing.is_empty() {
            Ok(self)
        } else {
            Err(NotifyError::Template(format!(
                "missing template variables: {}",
                missing.join(", ")
            )))
        }
    }
}

impl Serialize for TemplateParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in &self.values {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}
