//! Broker configuration: a TOML file layered with `BROKER_*` environment
//! overrides via the `config` crate.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::templates::EmailTemplateSource;

/// Raw, deserialized configuration. Durations are expressed in seconds on
/// disk and converted to [`Duration`] by [`BrokerConfig`]'s accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub confirm_timeout_secs: u64,
    pub keep_alive_interval_secs: u64,
    pub keep_alive_timeout_secs: u64,
    pub max_job_failures: u32,
    pub previously_confirmed_capacity: u64,
    pub confirm_email_subject: String,
    pub confirm_email_template: String,
    pub failure_email_subject: String,
    pub failure_email_template: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        let templates = EmailTemplateSource::default();
        Self {
            host: "0.0.0.0".into(),
            port: 9000,
            confirm_timeout_secs: 24 * 3600,
            keep_alive_interval_secs: 30,
            keep_alive_timeout_secs: 90,
            max_job_failures: 3,
            previously_confirmed_capacity: 10_000,
            confirm_email_subject: templates.confirm_subject,
            confirm_email_template: templates.confirm_body,
            failure_email_subject: templates.failure_subject,
            failure_email_template: templates.failure_body,
        }
    }
}

impl BrokerConfig {
    /// Load configuration from `path` (TOML), falling back to built-in
    /// defaults for any field it doesn't set, then layering `BROKER_*`
    /// environment variable overrides on top (e.g. `BROKER_PORT=9100`).
    ///
    /// A missing file at `path` is not an error: the defaults apply as-is,
    /// matching the original daemon's `config.cfg`-with-defaults behaviour.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = config::Config::builder().add_source(config::Config::try_from(&defaults).map_err(
            |source| ConfigError::Read { path: path.display().to_string(), source: Box::new(source) },
        )?);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(config::Environment::with_prefix("BROKER").separator("__"));

        let built = builder.build().map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source: Box::new(source),
        })?;

        built.try_deserialize().map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source: Box::new(source),
        })
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive_interval_secs)
    }

    pub fn keep_alive_timeout(&self) -> Duration {
        Duration::from_secs(self.keep_alive_timeout_secs)
    }

    pub fn email_template_source(&self) -> EmailTemplateSource {
        EmailTemplateSource {
            confirm_subject: self.confirm_email_subject.clone(),
            confirm_body: self.confirm_email_template.clone(),
            failure_subject: self.failure_email_subject.clone(),
            failure_body: self.failure_email_template.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_file_absent() {
        let cfg = BrokerConfig::load(Path::new("/nonexistent/config.cfg")).unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.max_job_failures, 3);
    }

    #[test]
    fn durations_convert_from_seconds() {
        let cfg = BrokerConfig { keep_alive_timeout_secs: 42, ..BrokerConfig::default() };
        assert_eq!(cfg.keep_alive_timeout(), Duration::from_secs(42));
    }
}
