//! Classification of step and provider failures.

use serde::{Deserialize, Serialize};

/// Classified cause of a failed provider call or step.
///
/// The router and orchestrator never inspect payloads; every retry, fallback
/// and abort decision is made from this classification alone.
///
/// # Examples
///
/// ```
/// use timepoint_error::ErrorClass;
///
/// assert!(ErrorClass::RateLimited.is_retryable());
/// assert!(ErrorClass::Timeout.is_retryable());
/// assert!(!ErrorClass::QuotaExhausted.is_retryable());
/// assert_eq!(ErrorClass::AuthFailed.to_string(), "auth_failed");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Bad input shape; never retried.
    #[display("validation")]
    Validation,
    /// Transient throttling reported by the provider.
    #[display("rate_limited")]
    RateLimited,
    /// Daily or allotment limit reached.
    #[display("quota_exhausted")]
    QuotaExhausted,
    /// Credentials rejected.
    #[display("auth_failed")]
    AuthFailed,
    /// Generic recoverable provider failure.
    #[display("transient")]
    Transient,
    /// Per-attempt deadline elapsed.
    #[display("timeout")]
    Timeout,
    /// Unrecoverable failure.
    #[display("fatal")]
    Fatal,
}

impl ErrorClass {
    /// Whether the same provider may be tried again after this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorClass::RateLimited | ErrorClass::Transient | ErrorClass::Timeout
        )
    }
}
