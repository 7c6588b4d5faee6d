//! Template rendering for confirmation and failure emails: pre-bound
//! renderers built once at startup from configured template strings.

use std::collections::HashMap;

use serde::Serialize;
use tera::{Context, Tera};

use crate::errors::ConfigError;

const CONFIRM_SUBJECT: &str = "confirm_subject";
const CONFIRM_BODY: &str = "confirm_body";
const FAILURE_SUBJECT: &str = "failure_subject";
const FAILURE_BODY: &str = "failure_body";

/// The four template strings the config layer supplies: confirmation and
/// failure notices, each with a subject and a body.
#[derive(Debug, Clone)]
pub struct EmailTemplateSource {
    pub confirm_subject: String,
    pub confirm_body: String,
    pub failure_subject: String,
    pub failure_body: String,
}

impl Default for EmailTemplateSource {
    fn default() -> Self {
        Self {
            confirm_subject: "Confirm your model evaluation request".into(),
            confirm_body: "Click to confirm: /client_confirm/{{ code }} (expires in {{ expire_seconds }}s)".into(),
            failure_subject: "Your model evaluation request failed".into(),
            failure_body: "Task {{ task_id }} failed after {{ failure_count }} attempts.".into(),
        }
    }
}

/// Context fields available to the confirmation email templates.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmContext {
    pub code: String,
    pub task_id: u64,
    pub email_address: String,
    pub expire_seconds: u64,
}

/// Context fields available to the failure email templates.
#[derive(Debug, Clone, Serialize)]
pub struct FailureContext {
    pub task_id: u64,
    pub email_address: String,
    pub failure_count: u32,
}

/// Compiled, ready-to-render email templates.
#[derive(Debug)]
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn compile(source: &EmailTemplateSource) -> Result<Self, ConfigError> {
        let mut tera = Tera::default();
        let templates = [
            (CONFIRM_SUBJECT, source.confirm_subject.as_str()),
            (CONFIRM_BODY, source.confirm_body.as_str()),
            (FAILURE_SUBJECT, source.failure_subject.as_str()),
            (FAILURE_BODY, source.failure_body.as_str()),
        ];
        tera.add_raw_templates(templates).map_err(|source| ConfigError::Template {
            name: "email templates".into(),
            source: Box::new(source),
        })?;
        Ok(Self { tera })
    }

    pub fn render_confirm(&self, ctx: &ConfirmContext) -> (String, String) {
        self.render_pair(CONFIRM_SUBJECT, CONFIRM_BODY, ctx)
    }

    pub fn render_failure(&self, ctx: &FailureContext) -> (String, String) {
        self.render_pair(FAILURE_SUBJECT, FAILURE_BODY, ctx)
    }

    fn render_pair(&self, subject_name: &str, body_name: &str, ctx: &impl Serialize) -> (String, String) {
        let context = Context::from_serialize(ctx).unwrap_or_default();
        let subject = self.tera.render(subject_name, &context).unwrap_or_default();
        let body = self.tera.render(body_name, &context).unwrap_or_default();
        (subject, body)
    }

    /// Render with an arbitrary field map, used by tests that don't want to
    /// construct a full context struct.
    #[cfg(test)]
    pub fn render_raw(&self, template_name: &str, fields: HashMap<&str, String>) -> String {
        let mut context = Context::new();
        for (k, v) in fields {
            context.insert(k, &v);
        }
        self.tera.render(template_name, &context).unwrap_or_default()
    }
}
