//! A minimal parameter hierarchy covering the string/float/integer/range
//! cases a model definition can declare, expressed as plain, serde-friendly
//! Rust types rather than a mutable class hierarchy.

use serde::{Deserialize, Serialize};

use crate::errors::RegistryError;

/// The declared shape of one parameter a model definition accepts.
#[derive(Debug, Clone)]
pub enum ParameterSpec {
    String {
        name: &'static str,
    },
    Float {
        name: &'static str,
        range: Option<(f64, f64)>,
    },
    Integer {
        name: &'static str,
        range: Option<(i64, i64)>,
    },
    Range {
        name: &'static str,
    },
}

impl ParameterSpec {
    pub fn name(&self) -> &'static str {
        match self {
            ParameterSpec::String { name }
            | ParameterSpec::Float { name, .. }
            | ParameterSpec::Integer { name, .. }
            | ParameterSpec::Range { name } => name,
        }
    }
}

/// A decoded, validated parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParameterValue {
    String { name: String, value: String },
    Float { name: String, value: f64 },
    Integer { name: String, value: i64 },
    Range { name: String, start: f64, end: f64 },
}

impl ParameterValue {
    pub fn name(&self) -> &str {
        match self {
            ParameterValue::String { name, .. }
            | ParameterValue::Float { name, .. }
            | ParameterValue::Integer { name, .. }
            | ParameterValue::Range { name, .. } => name,
        }
    }

    /// Decode and validate a raw JSON value against the parameter spec that
    /// governs it.
    pub fn decode(spec: &ParameterSpec, raw: &serde_json::Value) -> Result<Self, RegistryError> {
        match spec {
            ParameterSpec::String { name } => {
                let value = raw.as_str().ok_or_else(|| RegistryError::InvalidValue {
                    name: (*name).to_string(),
                    reason: "expected a string".into(),
                })?;
                Ok(ParameterValue::String {
                    name: (*name).to_string(),
                    value: value.to_string(),
                })
            }
            ParameterSpec::Float { name, range } => {
                let value = raw.as_f64().ok_or_else(|| RegistryError::InvalidValue {
                    name: (*name).to_string(),
                    reason: "expected a number".into(),
                })?;
                if let Some((lo, hi)) = range {
                    if value < *lo || value > *hi {
                        return Err(RegistryError::InvalidValue {
                            name: (*name).to_string(),
                            reason: format!("{value} out of range [{lo}, {hi}]"),
                        });
                    }
                }
                Ok(ParameterValue::Float {
                    name: (*name).to_string(),
                    value,
                })
            }
            ParameterSpec::Integer { name, range } => {
                let value = raw.as_i64().ok_or_else(|| RegistryError::InvalidValue {
                    name: (*name).to_string(),
                    reason: "expected an integer".into(),
                })?;
                if let Some((lo, hi)) = range {
                    if value < *lo || value > *hi {
                        return Err(RegistryError::InvalidValue {
                            name: (*name).to_string(),
                            reason: format!("{value} out of range [{lo}, {hi}]"),
                        });
                    }
                }
                Ok(ParameterValue::Integer {
                    name: (*name).to_string(),
                    value,
                })
            }
            ParameterSpec::Range { name } => {
                let (start, end) = parse_range(raw).ok_or_else(|| RegistryError::InvalidValue {
                    name: (*name).to_string(),
                    reason: "expected a \"start-end\" string or [start, end] array".into(),
                })?;
                Ok(ParameterValue::Range {
                    name: (*name).to_string(),
                    start,
                    end,
                })
            }
        }
    }
}

fn parse_range(raw: &serde_json::Value) -> Option<(f64, f64)> {
    if let Some(s) = raw.as_str() {
        let mut parts = s.split('-').map(|p| p.trim().parse::<f64>());
        let start = parts.next()?.ok()?;
        let end = parts.next()?.ok()?;
        return Some((start, end));
    }
    if let Some(arr) = raw.as_array() {
        if arr.len() == 2 {
            let start = arr[0].as_f64()?;
            let end = arr[1].as_f64()?;
            return Some((start, end));
        }
    }
    None
}
