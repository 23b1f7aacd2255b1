//! Notification template rendering.
//!
//! Templates carry `{{ key }}` placeholders that are substituted from the
//! notification payload. Placeholders with no matching payload key are left
//! verbatim so a missing variable is visible in the delivered text rather
//! than silently blanked. No HTML escaping is performed: payloads are
//! produced internally by the scheduler, not by end users.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::types::Payload;

/// Regex pattern matching `{{ key }}` placeholders.
pub const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Renderable content of a `NotificationTemplate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateContent {
    pub subject: String,
    pub email_html: String,
    pub inapp_text: String,
    pub whatsapp_body: Option<String>,
}

impl TemplateContent {
    /// Source text for WhatsApp: `whatsapp_body`, else `inapp_text`, else `subject`.
    pub fn whatsapp_source(&self) -> &str {
        if let Some(body) = self.whatsapp_body.as_deref().filter(|b| !b.is_empty()) {
            return body;
        }
        if !self.inapp_text.is_empty() {
            return &self.inapp_text;
        }
        &self.subject
    }
}

/// Channel-specific rendered content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedContent {
    pub subject: String,
    pub email_html: String,
    pub inapp_text: String,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render every field of `template` against `payload`.
pub fn render(template: &TemplateContent, payload: &Payload) -> RenderedContent {
    RenderedContent {
        subject: render_str(&template.subject, payload),
        email_html: render_str(&template.email_html, payload),
        inapp_text: render_str(&template.inapp_text, payload),
    }
}

/// Substitute `{{ key }}` placeholders in `text` from `payload`.
pub fn render_str(text: &str, payload: &Payload) -> String {
    PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures<'_>| match payload.get(&caps[1]) {
            Some(value) => value_to_text(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Extract the distinct placeholder names used in `text`, sorted.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = PLACEHOLDER_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect();
    names.sort();
    names.dedup();
    names
}

fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn substitutes_known_keys() {
        let p = payload(json!({ "name": "Ana" }));
        assert_eq!(render_str("Hi {{name}}", &p), "Hi Ana");
        assert_eq!(render_str("Hi {{ name }}!", &p), "Hi Ana!");
    }

    #[test]
    fn missing_keys_are_left_verbatim() {
        let p = payload(json!({}));
        assert_eq!(render_str("Hi {{name}}", &p), "Hi {{name}}");
    }

    #[test]
    fn non_string_values_render_as_literals() {
        let p = payload(json!({ "count": 3, "late": true, "none": null }));
        assert_eq!(
            render_str("{{count}} late={{late}} [{{none}}]", &p),
            "3 late=true []"
        );
    }

    #[test]
    fn html_is_not_escaped() {
        let p = payload(json!({ "job": "<b>Dock 4</b>" }));
        assert_eq!(render_str("<p>{{job}}</p>", &p), "<p><b>Dock 4</b></p>");
    }

    #[test]
    fn render_covers_every_field() {
        let template = TemplateContent {
            subject: "Hi {{name}}".into(),
            email_html: "<p>Hello {{name}}</p>".into(),
            inapp_text: "Hey {{name}}".into(),
            whatsapp_body: None,
        };
        let out = render(&template, &payload(json!({ "name": "Ana" })));
        assert_eq!(out.subject, "Hi Ana");
        assert_eq!(out.email_html, "<p>Hello Ana</p>");
        assert_eq!(out.inapp_text, "Hey Ana");
    }

    #[test]
    fn whatsapp_source_falls_back_to_inapp_then_subject() {
        let mut template = TemplateContent {
            subject: "subject".into(),
            email_html: String::new(),
            inapp_text: "inapp".into(),
            whatsapp_body: Some("wa".into()),
        };
        assert_eq!(template.whatsapp_source(), "wa");
        template.whatsapp_body = None;
        assert_eq!(template.whatsapp_source(), "inapp");
        template.inapp_text.clear();
        assert_eq!(template.whatsapp_source(), "subject");
    }

    #[test]
    fn placeholders_are_deduplicated_and_sorted() {
        assert_eq!(
            placeholders("{{b}} {{a}} {{ b }}"),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
