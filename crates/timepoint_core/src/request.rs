//! Provider request and response types.

use crate::CapabilityClass;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One logical call routed to a provider chain.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use timepoint_core::{CapabilityClass, ProviderRequest};
///
/// let request = ProviderRequest::new(CapabilityClass::Image, "image", json!({"prompt": "harbor at dawn"}));
/// assert_eq!(*request.capability(), CapabilityClass::Image);
/// assert_eq!(request.step(), "image");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ProviderRequest {
    /// Capability class selecting the fallback chain
    capability: CapabilityClass,
    /// Step that issued the request
    step: String,
    /// Opaque request payload
    payload: JsonValue,
}

impl ProviderRequest {
    /// Create a new request.
    pub fn new(capability: CapabilityClass, step: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            capability,
            step: step.into(),
            payload,
        }
    }
}

/// Payload returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Opaque response payload
    pub payload: JsonValue,
}

impl ProviderResponse {
    /// Create a response wrapping `payload`.
    pub fn new(payload: JsonValue) -> Self {
        Self { payload }
    }

    /// A response carrying no content (`null`).
    pub fn empty() -> Self {
        Self {
            payload: JsonValue::Null,
        }
    }

    /// Whether the payload is `null`.
    pub fn is_empty(&self) -> bool {
        self.payload.is_null()
    }
}
