//! Default model registry: an external collaborator, stubbed in-tree so the
//! crate is runnable end to end without a real parameter-model service.
//!
//! The broker only ever talks to this through [`ModelRegistry::decode`],
//! which returns an opaque [`TaskPayload`]; nothing in `taskqueue-core`
//! depends on the concrete types in this module.

mod parameter;

use std::sync::Arc;

use serde::Serialize;

pub use parameter::{ParameterSpec, ParameterValue};

use crate::errors::RegistryError;
use crate::mail::Email;
use crate::task::TaskPayload;
use crate::templates::{FailureContext, TemplateRenderer};

/// The parameters a single (name, version) model accepts.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    pub name: String,
    pub version: u32,
    pub parameters: Vec<ParameterSpec>,
}

impl ModelDefinition {
    pub fn new(name: impl Into<String>, version: u32, parameters: Vec<ParameterSpec>) -> Self {
        Self { name: name.into(), version, parameters }
    }
}

/// Decodes a submitted JSON task payload into an opaque [`TaskPayload`].
///
/// This is the trait an external model registry would implement; the broker
/// calls it exactly once per submission.
pub trait ModelRegistry: Send + Sync {
    fn decode(&self, raw: &serde_json::Value) -> Result<Arc<dyn TaskPayload>, RegistryError>;
}

/// A registry backed by an in-process list of model definitions, validating
/// and decoding each submitted parameter against its spec.
#[derive(Debug)]
pub struct DefaultRegistry {
    definitions: Vec<ModelDefinition>,
    renderer: Arc<TemplateRenderer>,
}

impl DefaultRegistry {
    pub fn new(definitions: Vec<ModelDefinition>, renderer: Arc<TemplateRenderer>) -> Self {
        Self { definitions, renderer }
    }

    fn find(&self, name: &str, version: u32) -> Option<&ModelDefinition> {
        self.definitions.iter().find(|d| d.name == name && d.version == version)
    }
}

impl ModelRegistry for DefaultRegistry {
    fn decode(&self, raw: &serde_json::Value) -> Result<Arc<dyn TaskPayload>, RegistryError> {
        let obj = raw.as_object().ok_or(RegistryError::NotAnObject)?;

        let model_name = obj
            .get("modelName")
            .and_then(|v| v.as_str())
            .ok_or_else(|| RegistryError::MissingParameter { name: "modelName".into() })?
            .to_string();
        let model_version = obj
            .get("modelVersion")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| RegistryError::MissingParameter { name: "modelVersion".into() })?
            as u32;
        let email_address = obj
            .get("emailAddress")
            .and_then(|v| v.as_str())
            .ok_or_else(|| RegistryError::MissingParameter { name: "emailAddress".into() })?
            .to_string();

        let definition = self
            .find(&model_name, model_version)
            .ok_or_else(|| RegistryError::UnknownModel { name: model_name.clone(), version: model_version })?;

        let submitted_params = obj.get("params").and_then(|v| v.as_array()).cloned().unwrap_or_default();

        let mut params = Vec::with_capacity(definition.parameters.len());
        for spec in &definition.parameters {
            let raw_value = submitted_params
                .iter()
                .find(|p| p.get("name").and_then(|n| n.as_str()) == Some(spec.name()))
                .and_then(|p| p.get("value"))
                .ok_or_else(|| RegistryError::MissingParameter { name: spec.name().to_string() })?;
            params.push(ParameterValue::decode(spec, raw_value)?);
        }

        Ok(Arc::new(GenericTaskPayload {
            model_name,
            model_version,
            email_address,
            params,
            renderer: Arc::clone(&self.renderer),
        }))
    }
}

/// The default, registry-supplied task payload: a model name/version,
/// submitter email, and its validated parameter list.
#[derive(Debug, Serialize)]
pub struct GenericTaskPayload {
    pub model_name: String,
    pub model_version: u32,
    pub email_address: String,
    pub params: Vec<ParameterValue>,
    #[serde(skip)]
    renderer: Arc<TemplateRenderer>,
}

impl TaskPayload for GenericTaskPayload {
    fn email_address(&self) -> &str {
        &self.email_address
    }

    fn encode(&self) -> serde_json::Value {
        serde_json::json!({
            "modelName": self.model_name,
            "modelVersion": self.model_version,
            "emailAddress": self.email_address,
            "params": self.params,
        })
    }

    fn failure_email(&self, task_id: u64, failure_count: u32) -> Email {
        let (subject, body) = self.renderer.render_failure(&FailureContext {
            task_id,
            email_address: self.email_address.clone(),
            failure_count,
        });
        Email::new(self.email_address.clone(), subject, body)
    }
}
