//! Minijinja rendering for the bundled mail templates.
//!
//! Templates ship inside the binary and are registered once per renderer.
//! Names ending in `.html` are HTML auto-escaped; `.txt` templates are not.

use minijinja::Environment;
use serde::Serialize;

use crate::traits::NotifyError;

pub const CONTACT_HTML: &str = "contact.html";
pub const ORDER_HTML: &str = "order_confirmation.html";
pub const ORDER_TEXT: &str = "order_confirmation.txt";
pub const DOCUMENTS_HTML: &str = "document_delivery.html";
pub const DOCUMENTS_TEXT: &str = "document_delivery.txt";

const BUNDLED: [(&str, &str); 5] = [
    (CONTACT_HTML, include_str!("../templates/contact.html")),
    (ORDER_HTML, include_str!("../templates/order_confirmation.html")),
    (ORDER_TEXT, include_str!("../templates/order_confirmation.txt")),
    (DOCUMENTS_HTML, include_str!("../templates/document_delivery.html")),
    (DOCUMENTS_TEXT, include_str!("../templates/document_delivery.txt")),
];

/// Renders the bundled notification templates.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Build the environment and parse every bundled template.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if a bundled template has a syntax error.
    pub fn new() -> Result<Self, NotifyError> {
        let mut env = Environment::new();
        env.add_filter("filesize", filesize_filter);
        env.add_filter("money", money_filter);

        for (name, source) in BUNDLED {
            env.add_template(name, source)?;
        }

        Ok(Self { env })
    }

    /// Render a bundled template by name.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, NotifyError> {
        let template = self.env.get_template(name)?;
        Ok(template.render(ctx)?)
    }
}

/// Custom filter: human-readable byte size.
fn filesize_filter(bytes: u64) -> String {
    postbox_core::format_size(bytes)
}

/// Custom filter: amount with two decimals.
fn money_filter(value: f64) -> String {
    format!("{value:.2}")
}
