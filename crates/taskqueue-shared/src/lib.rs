//! # taskqueue-shared
//!
//! Cross-cutting types shared between the broker core and its HTTP surface:
//! configuration, error types, logging bootstrap, the task/mail capability
//! interfaces, and a default model registry used to make the crate runnable
//! without an external parameter-model service.

pub mod config;
pub mod errors;
pub mod logging;
pub mod mail;
pub mod registry;
pub mod task;
pub mod templates;

pub use config::BrokerConfig;
pub use errors::{ConfigError, RegistryError};
pub use mail::{Email, MailGateway};
pub use task::{Task, TaskPayload};
