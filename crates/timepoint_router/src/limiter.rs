//! Per-provider throttling using governor and Tokio Semaphore.
//!
//! A provider that declares `rpm` is paced with governor's GCRA limiter before
//! every attempt; one that declares `max_concurrent` holds a semaphore permit
//! for the duration of each attempt. Providers declaring neither are not
//! throttled at all.

use crate::ProviderDescriptor;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Throttle applied before each attempt against one provider.
///
/// # Example
///
/// ```rust,ignore
/// let throttle = ProviderThrottle::from_descriptor(&descriptor);
/// let guard = throttle.acquire().await;
/// let response = provider.invoke(&request).await;
/// drop(guard); // Releases concurrent slot
/// ```
#[derive(Clone, Default)]
pub struct ProviderThrottle {
    // RPM limiter (requests per minute)
    rpm_limiter: Option<Arc<DirectRateLimiter>>,

    // Concurrent request semaphore
    concurrency: Option<Arc<Semaphore>>,
}

impl ProviderThrottle {
    /// Build the throttle a descriptor asks for.
    pub fn from_descriptor(descriptor: &ProviderDescriptor) -> Self {
        let rpm_limiter = (*descriptor.rpm())
            .and_then(NonZeroU32::new)
            .map(|n| Arc::new(GovernorRateLimiter::direct(Quota::per_minute(n))));

        let concurrency = (*descriptor.max_concurrent())
            .filter(|n| *n > 0)
            .map(|n| Arc::new(Semaphore::new(n as usize)));

        Self {
            rpm_limiter,
            concurrency,
        }
    }

    /// Wait until the provider may be called.
    ///
    /// Returns a guard that releases the concurrent slot when dropped.
    pub async fn acquire(&self) -> ThrottleGuard {
        if let Some(limiter) = &self.rpm_limiter {
            limiter.until_ready().await;
        }

        // Acquire concurrent request slot last to avoid holding it while paced
        let permit = match &self.concurrency {
            Some(semaphore) => semaphore.clone().acquire_owned().await.ok(),
            None => None,
        };

        ThrottleGuard { _permit: permit }
    }
}

impl std::fmt::Debug for ProviderThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderThrottle")
            .field("rpm_limited", &self.rpm_limiter.is_some())
            .field("concurrency", &self.concurrency.as_ref().map(|s| s.available_permits()))
            .finish()
    }
}

/// RAII guard for a provider throttle.
///
/// Releases the concurrent slot when dropped, even if the attempt fails.
#[derive(Debug)]
pub struct ThrottleGuard {
    _permit: Option<OwnedSemaphorePermit>,
}
