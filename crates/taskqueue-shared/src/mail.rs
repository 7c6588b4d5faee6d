//! Outbound mail facade.
//!
//! `send` never blocks the caller and never reports delivery success back to
//! it — the broker hands a message off and moves on.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{info, warn};

/// A single outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Non-blocking fire-and-forget mail dispatch.
pub trait MailGateway: fmt::Debug + Send + Sync {
    /// Queue `email` for asynchronous send. Must not block.
    fn send(&self, email: Email);
}

/// Default gateway: logs every send on its own dispatch task via an
/// unbounded channel, standing in for a real SMTP relay.
#[derive(Debug, Clone)]
pub struct LoggingMailGateway {
    sender: mpsc::UnboundedSender<Email>,
}

impl LoggingMailGateway {
    /// Spawn the dispatch task and return a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Email>();
        tokio::spawn(async move {
            while let Some(email) = receiver.recv().await {
                info!(to = %email.to, subject = %email.subject, "dispatching email");
            }
        });
        Self { sender }
    }
}

impl MailGateway for LoggingMailGateway {
    fn send(&self, email: Email) {
        if self.sender.send(email).is_err() {
            warn!("mail dispatch task has shut down; dropping email");
        }
    }
}
