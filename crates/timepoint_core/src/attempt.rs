//! Records of provider attempts and their aggregate outcome.

use crate::{CapabilityClass, ProviderResponse};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use timepoint_error::{ErrorClass, ProviderError};

/// One call to one backing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ProviderAttempt {
    /// Provider that was called
    provider_id: String,
    /// Classified failure, `None` on success
    error: Option<ErrorClass>,
    /// Wall time of the attempt
    latency: Duration,
    /// 0 for the first call to this provider, n for the n-th retry
    retry: u32,
    /// Delay slept before this attempt
    backoff: Duration,
}

impl ProviderAttempt {
    /// Record an attempt.
    pub fn new(
        provider_id: impl Into<String>,
        error: Option<ErrorClass>,
        latency: Duration,
        retry: u32,
        backoff: Duration,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            error,
            latency,
            retry,
            backoff,
        }
    }

    /// Whether the attempt succeeded.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// How a routed call resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum Resolution {
    /// A provider answered
    Success {
        /// Winning provider
        provider_id: String,
        /// Its response
        response: ProviderResponse,
    },
    /// The infallible last tier failed internally; treated as "no image"
    NoImage {
        /// The infallible provider
        provider_id: String,
    },
    /// Every provider in the chain was consumed
    Exhausted {
        /// Class of the final failed attempt
        last_error: Option<ErrorClass>,
        /// Message of the final failed attempt
        message: String,
    },
    /// A failure that stops the chain immediately
    Fatal {
        /// Provider that reported it
        provider_id: String,
        /// Classified cause
        class: ErrorClass,
        /// Provider message
        message: String,
    },
}

/// Aggregate of every attempt made for one logical step invocation.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use std::time::Duration;
/// use timepoint_core::{CallOutcome, CapabilityClass, ErrorClass, ProviderAttempt, ProviderResponse, Resolution};
///
/// let outcome = CallOutcome::new(
///     CapabilityClass::Text,
///     vec![
///         ProviderAttempt::new("primary", Some(ErrorClass::QuotaExhausted), Duration::ZERO, 0, Duration::ZERO),
///         ProviderAttempt::new("backup", None, Duration::ZERO, 0, Duration::ZERO),
///     ],
///     Resolution::Success {
///         provider_id: "backup".to_string(),
///         response: ProviderResponse::new(json!("ok")),
///     },
/// );
///
/// assert!(outcome.is_success());
/// assert_eq!(outcome.winning_provider(), Some("backup"));
/// assert_eq!(outcome.retries_on("primary"), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct CallOutcome {
    /// Capability class of the chain that was walked
    capability: CapabilityClass,
    /// Attempts in the order they were made
    attempts: Vec<ProviderAttempt>,
    /// Final resolution
    resolution: Resolution,
}

impl CallOutcome {
    /// Assemble an outcome.
    pub fn new(
        capability: CapabilityClass,
        attempts: Vec<ProviderAttempt>,
        resolution: Resolution,
    ) -> Self {
        Self {
            capability,
            attempts,
            resolution,
        }
    }

    /// Whether the call produced a usable result (including "no image").
    pub fn is_success(&self) -> bool {
        matches!(
            self.resolution,
            Resolution::Success { .. } | Resolution::NoImage { .. }
        )
    }

    /// Provider that resolved the call.
    pub fn winning_provider(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Success { provider_id, .. } | Resolution::NoImage { provider_id } => {
                Some(provider_id)
            }
            _ => None,
        }
    }

    /// Attempts made against `provider_id`.
    pub fn attempts_for<'a>(
        &'a self,
        provider_id: &'a str,
    ) -> impl Iterator<Item = &'a ProviderAttempt> + 'a {
        self.attempts
            .iter()
            .filter(move |attempt| attempt.provider_id == provider_id)
    }

    /// Number of retries (attempts beyond the first) spent on `provider_id`.
    pub fn retries_on(&self, provider_id: &str) -> u32 {
        self.attempts_for(provider_id)
            .filter(|attempt| attempt.retry > 0)
            .count() as u32
    }

    /// Total retries across every provider.
    pub fn total_retries(&self) -> u32 {
        self.attempts
            .iter()
            .filter(|attempt| attempt.retry > 0)
            .count() as u32
    }

    /// Convert into the response or the classified error the caller should see.
    ///
    /// `NoImage` converts to an empty response.
    #[track_caller]
    pub fn into_result(self) -> Result<ProviderResponse, ProviderError> {
        match self.resolution {
            Resolution::Success { response, .. } => Ok(response),
            Resolution::NoImage { .. } => Ok(ProviderResponse::empty()),
            Resolution::Exhausted {
                last_error,
                message,
            } => Err(ProviderError::new(
                last_error.unwrap_or(ErrorClass::Transient),
                format!("all providers exhausted: {}", message),
            )),
            Resolution::Fatal {
                provider_id,
                class,
                message,
            } => Err(ProviderError::new(
                class,
                format!("{} failed: {}", provider_id, message),
            )),
        }
    }
}
