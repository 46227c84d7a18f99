//! Capability classes and provider authentication requirements.

use serde::{Deserialize, Serialize};

/// The kind of generation a provider chain serves.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use timepoint_core::CapabilityClass;
///
/// assert_eq!(CapabilityClass::from_str("image").unwrap(), CapabilityClass::Image);
/// assert_eq!(CapabilityClass::Text.to_string(), "text");
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
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CapabilityClass {
    /// Text generation
    Text,
    /// Image generation
    Image,
}

/// Credentials a provider needs before it can be called.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuthRequirement {
    /// Open endpoint
    None,
    /// API key or bearer token
    #[default]
    ApiKey,
    /// OAuth token exchange
    #[serde(rename = "oauth")]
    #[strum(serialize = "oauth")]
    OAuth,
}

impl AuthRequirement {
    /// Whether any credential is needed.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, AuthRequirement::None)
    }
}
