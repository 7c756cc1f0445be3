use std::env;

use serde::{Deserialize, Serialize};

use crate::message::Sender;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub brevo: BrevoConfig,
    pub emailjs: EmailJsConfig,
    pub mail: MailConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `POSTBOX_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("POSTBOX_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            brevo: BrevoConfig::from_env_profiled(p),
            emailjs: EmailJsConfig::from_env_profiled(p),
            mail: MailConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  brevo:    url={}, configured={}", self.brevo.base_url, self.brevo.is_configured());
        tracing::info!(
            "  emailjs:  url={}, service={}, configured={}",
            self.emailjs.base_url,
            self.emailjs.service_id.as_deref().unwrap_or("(none)"),
            self.emailjs.is_configured()
        );
        tracing::info!("  mail:     sender={}, support={}", self.mail.sender_email, self.mail.support_email);
    }

    /// Return a redacted view safe for printing (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "brevo": {
                "base_url": self.brevo.base_url,
                "configured": self.brevo.is_configured(),
            },
            "emailjs": {
                "base_url": self.emailjs.base_url,
                "service_id": self.emailjs.service_id,
                "contact_template_id": self.emailjs.contact_template_id,
                "document_template_id": self.emailjs.document_template_id,
                "fallback_template_id": self.emailjs.fallback_template_id,
                "configured": self.emailjs.is_configured(),
            },
            "mail": {
                "sender_name": self.mail.sender_name,
                "sender_email": self.mail.sender_email,
                "support_email": self.mail.support_email,
                "site_name": self.mail.site_name,
                "currency": self.mail.currency,
            },
        })
    }
}

// ── Brevo (primary channel) ───────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrevoConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl BrevoConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            api_key: profiled_env_opt(p, "BREVO_API_KEY"),
            base_url: profiled_env_or(p, "BREVO_BASE_URL", "https://api.brevo.com/v3"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

// ── EmailJS (secondary channel) ───────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailJsConfig {
    pub base_url: String,
    pub service_id: Option<String>,
    pub public_key: Option<String>,
    pub private_key: Option<String>,
    pub contact_template_id: Option<String>,
    pub document_template_id: Option<String>,
    /// Template used for the plain-text support summary of last resort.
    pub fallback_template_id: Option<String>,
}

impl EmailJsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            base_url: profiled_env_or(p, "EMAILJS_BASE_URL", "https://api.emailjs.com"),
            service_id: profiled_env_opt(p, "EMAILJS_SERVICE_ID"),
            public_key: profiled_env_opt(p, "EMAILJS_PUBLIC_KEY"),
            private_key: profiled_env_opt(p, "EMAILJS_PRIVATE_KEY"),
            contact_template_id: profiled_env_opt(p, "EMAILJS_CONTACT_TEMPLATE_ID"),
            document_template_id: profiled_env_opt(p, "EMAILJS_DOCUMENT_TEMPLATE_ID"),
            fallback_template_id: profiled_env_opt(p, "EMAILJS_FALLBACK_TEMPLATE_ID"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.service_id.is_some() && self.public_key.is_some()
    }
}

// ── Mail identity ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub sender_name: String,
    pub sender_email: String,
    pub support_email: String,
    pub site_name: String,
    pub currency: String,
}

impl MailConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            sender_name: profiled_env_or(p, "MAIL_SENDER_NAME", "Postbox"),
            sender_email: profiled_env_or(p, "MAIL_SENDER_EMAIL", "no-reply@example.com"),
            support_email: profiled_env_or(p, "MAIL_SUPPORT_EMAIL", "support@example.com"),
            site_name: profiled_env_or(p, "MAIL_SITE_NAME", "Postbox"),
            currency: profiled_env_or(p, "MAIL_CURRENCY", "EUR"),
        }
    }

    pub fn sender(&self) -> Sender {
        Sender {
            name: self.sender_name.clone(),
            email: self.sender_email.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: String::new(),
            brevo: BrevoConfig {
                api_key: None,
                base_url: "https://api.brevo.com/v3".to_string(),
            },
            emailjs: EmailJsConfig {
                base_url: "https://api.emailjs.com".to_string(),
                service_id: None,
                public_key: None,
                private_key: None,
                contact_template_id: None,
                document_template_id: None,
                fallback_template_id: None,
            },
            mail: MailConfig {
                sender_name: "Postbox".to_string(),
                sender_email: "no-reply@example.com".to_string(),
                support_email: "support@example.com".to_string(),
                site_name: "Postbox".to_string(),
                currency: "EUR".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiled_key_takes_precedence() {
        std::env::set_var("PBTEST_MAIL_SUPPORT_EMAIL", "desk@profile.example");
        let config = Config::for_profile("pbtest");
        assert_eq!(config.profile, "PBTEST");
        assert_eq!(config.mail.support_email, "desk@profile.example");
        std::env::remove_var("PBTEST_MAIL_SUPPORT_EMAIL");
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        std::env::set_var("PBBLANK_BREVO_API_KEY", "   ");
        let config = Config::for_profile("PBBLANK");
        // Falls through to the unprefixed key, which may or may not be set in the
        // developer's shell; the blank profiled value must never win.
        assert_ne!(config.brevo.api_key.as_deref(), Some("   "));
        std::env::remove_var("PBBLANK_BREVO_API_KEY");
    }

    #[test]
    fn redacted_summary_hides_secrets() {
        let mut config = Config::default();
        config.brevo.api_key = Some("xkeysib-secret".to_string());
        config.emailjs.private_key = Some("private-secret".to_string());
        let text = config.redacted_summary().to_string();
        assert!(!text.contains("xkeysib-secret"));
        assert!(!text.contains("private-secret"));
        assert!(text.contains("\"configured\":true"));
    }

    #[test]
    fn default_profile_label() {
        assert_eq!(Config::default().profile_label(), "default");
    }
}
