//! Broker-level error types.

use thiserror::Error;

/// An unknown task id was given to a worker endpoint.
///
/// Surfaced by the HTTP surface as `{"error":{"type":"bad_id"}}` with HTTP
/// 200; this is a deliberate asymmetry with the confirmation endpoint's 404.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no such task id {0}")]
pub struct BadId(pub u64);

/// Outcome of a confirmation-code redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// First successful redemption of this code.
    Confirmed,
    /// The code was already redeemed previously; idempotent response.
    AlreadyConfirmed,
    /// The code was never issued (or has since expired and was swept).
    NotFound,
}
