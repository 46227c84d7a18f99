//! Provider descriptors.

use serde::{Deserialize, Serialize};
use timepoint_core::AuthRequirement;

/// Default retry bound for retryable failures.
pub(crate) const DEFAULT_MAX_RETRIES: u32 = 3;

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// One tier of a fallback chain.
///
/// # Examples
///
/// ```
/// use timepoint_core::AuthRequirement;
/// use timepoint_router::ProviderDescriptor;
///
/// let descriptor = ProviderDescriptor::builder()
///     .provider_id("pollinations")
///     .auth(AuthRequirement::None)
///     .max_retries(0u32)
///     .infallible(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(descriptor.provider_id(), "pollinations");
/// assert!(*descriptor.infallible());
/// assert_eq!(*descriptor.rpm(), None);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct ProviderDescriptor {
    /// Id matching a registered provider
    provider_id: String,

    /// Credentials the provider needs
    #[serde(default)]
    #[builder(default)]
    auth: AuthRequirement,

    /// Retries allowed on retryable failures before falling back
    #[serde(default = "default_max_retries")]
    #[builder(default = "DEFAULT_MAX_RETRIES")]
    max_retries: u32,

    /// Requests per minute throttle applied before each attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    rpm: Option<u32>,

    /// Maximum concurrent attempts against this provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    max_concurrent: Option<u32>,

    /// Failures of this tier resolve as "no image" instead of propagating
    #[serde(default)]
    #[builder(default)]
    infallible: bool,
}

impl ProviderDescriptor {
    /// Creates a new descriptor builder.
    pub fn builder() -> ProviderDescriptorBuilder {
        ProviderDescriptorBuilder::default()
    }
}
