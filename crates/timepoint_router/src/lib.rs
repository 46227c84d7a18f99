//! Provider routing, retry and fallback.
//!
//! The [`ProviderRouter`] hides every backing model provider of a capability
//! class behind a single `call`. Behaviour is driven entirely by the
//! classification of each failure:
//!
//! - `quota_exhausted`: no retry, advance to the next tier
//! - `rate_limited`, `transient`, `timeout`: retry the same tier with
//!   exponential backoff, then advance
//! - `auth_failed`: no retry; only unauthenticated tiers may still be tried
//! - `validation`, `fatal`: stop
//!
//! Each tier has its own retry budget, fallback order is fixed, and an
//! infallible last tier turns its own failures into "no image".
//!
//! ```rust,ignore
//! use timepoint_router::{ProviderRouter, RouterConfig};
//!
//! let config = RouterConfig::load()?;
//! let router = ProviderRouter::from_config(&config, &providers)?;
//! let outcome = router.call(&request).await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod descriptor;
mod limiter;
mod policy;
mod router;

pub use config::{ChainsConfig, RetrySettings, RouterConfig};
pub use descriptor::{ProviderDescriptor, ProviderDescriptorBuilder};
pub use limiter::{ProviderThrottle, ThrottleGuard};
pub use policy::{ActionTable, BackoffPolicy, RetryAction, RoutingPolicy};
pub use router::{ProviderRouter, ProviderRouterBuilder};
