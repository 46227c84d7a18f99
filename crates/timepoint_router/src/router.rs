//! The provider router.

use crate::{ProviderDescriptor, ProviderThrottle, RetryAction, RouterConfig, RoutingPolicy};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use timepoint_core::{
    CallOutcome, CapabilityClass, ErrorClass, ProviderAttempt, ProviderRequest, ProviderResponse,
    Resolution,
};
use timepoint_error::{ProviderError, RouterError, RouterErrorKind};
use timepoint_interface::Provider;
use tracing::{debug, info, instrument, warn};

/// One provider in a chain with its descriptor and throttle.
struct Tier {
    descriptor: ProviderDescriptor,
    provider: Arc<dyn Provider>,
    throttle: ProviderThrottle,
}

/// How one tier's retry budget ended.
enum TierResult {
    Success(ProviderResponse),
    NoImage,
    Failed(ProviderError),
}

/// Routes calls through fixed, per-capability fallback chains.
///
/// The router is stateless across calls apart from provider throttles, so a
/// single instance can be shared by every step of every run.
pub struct ProviderRouter {
    chains: HashMap<CapabilityClass, Vec<Tier>>,
    policy: RoutingPolicy,
}

impl std::fmt::Debug for ProviderRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chains: HashMap<_, Vec<&str>> = self
            .chains
            .iter()
            .map(|(class, tiers)| {
                (
                    class,
                    tiers
                        .iter()
                        .map(|tier| tier.descriptor.provider_id().as_str())
                        .collect(),
                )
            })
            .collect();
        f.debug_struct("ProviderRouter")
            .field("chains", &chains)
            .field("policy", &self.policy)
            .finish()
    }
}

impl ProviderRouter {
    /// Start building a router with the given policy.
    pub fn builder(policy: RoutingPolicy) -> ProviderRouterBuilder {
        ProviderRouterBuilder {
            policy,
            chains: Vec::new(),
        }
    }

    /// Wire configured chains to registered provider implementations.
    ///
    /// # Errors
    ///
    /// Returns an error if a descriptor names an unregistered provider, the
    /// retry settings are unusable, or a chain violates tier rules.
    #[instrument(skip_all)]
    pub fn from_config(
        config: &RouterConfig,
        providers: &HashMap<String, Arc<dyn Provider>>,
    ) -> Result<Self, RouterError> {
        let mut builder = Self::builder(config.retry.to_policy()?);
        for capability in [CapabilityClass::Text, CapabilityClass::Image] {
            for descriptor in config.chain(capability) {
                let provider = providers.get(descriptor.provider_id()).ok_or_else(|| {
                    RouterError::new(RouterErrorKind::UnknownProvider(
                        descriptor.provider_id().clone(),
                    ))
                })?;
                builder = builder.tier(capability, descriptor.clone(), Arc::clone(provider));
            }
        }
        builder.build()
    }

    /// The active policy.
    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    /// Provider ids of a chain in fallback order.
    pub fn chain_ids(&self, capability: CapabilityClass) -> Vec<&str> {
        self.chains
            .get(&capability)
            .map(|tiers| {
                tiers
                    .iter()
                    .map(|tier| tier.descriptor.provider_id().as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Route one logical call through the chain for its capability class.
    ///
    /// Never returns early with a bare error: every attempt is recorded in the
    /// returned [`CallOutcome`], whose resolution says how the call ended.
    #[instrument(skip(self, request), fields(capability = %request.capability(), step = %request.step()))]
    pub async fn call(&self, request: &ProviderRequest) -> CallOutcome {
        let capability = *request.capability();
        let mut attempts = Vec::new();

        let Some(chain) = self.chains.get(&capability).filter(|tiers| !tiers.is_empty()) else {
            warn!("No providers configured for capability");
            return CallOutcome::new(
                capability,
                attempts,
                Resolution::Fatal {
                    provider_id: "router".to_string(),
                    class: ErrorClass::Fatal,
                    message: format!("no providers configured for '{}'", capability),
                },
            );
        };

        let mut unauthenticated_only = false;
        let mut last_error: Option<ProviderError> = None;

        for (index, tier) in chain.iter().enumerate() {
            let provider_id = tier.descriptor.provider_id().clone();

            if unauthenticated_only && tier.descriptor.auth().requires_auth() {
                debug!(provider = %provider_id, "Skipping authenticated tier after auth failure");
                continue;
            }

            match self.walk_tier(tier, request, &mut attempts).await {
                TierResult::Success(response) => {
                    info!(provider = %provider_id, attempts = attempts.len(), "Call resolved");
                    return CallOutcome::new(
                        capability,
                        attempts,
                        Resolution::Success {
                            provider_id,
                            response,
                        },
                    );
                }
                TierResult::NoImage => {
                    warn!(provider = %provider_id, "Infallible tier failed, resolving without content");
                    return CallOutcome::new(capability, attempts, Resolution::NoImage { provider_id });
                }
                TierResult::Failed(err) => {
                    match self.policy.actions().action_for(err.class) {
                        RetryAction::Abort => {
                            warn!(provider = %provider_id, class = %err.class, "Aborting chain");
                            return fatal(capability, attempts, provider_id, err);
                        }
                        RetryAction::FallbackToUnauthenticated => {
                            let open_tier_remains = chain[index + 1..]
                                .iter()
                                .any(|next| !next.descriptor.auth().requires_auth());
                            if !open_tier_remains {
                                warn!(provider = %provider_id, "Authentication failed with no open tier left");
                                return fatal(capability, attempts, provider_id, err);
                            }
                            info!(provider = %provider_id, "Authentication failed, falling back to open tiers");
                            unauthenticated_only = true;
                        }
                        RetryAction::Fallback | RetryAction::RetryThenFallback => {
                            info!(provider = %provider_id, class = %err.class, "Falling back to next tier");
                        }
                    }
                    last_error = Some(err);
                }
            }
        }

        warn!(attempts = attempts.len(), "All providers exhausted");
        let (last_class, message) = match last_error {
            Some(err) => (Some(err.class), err.message),
            None => (None, "no eligible provider".to_string()),
        };
        CallOutcome::new(
            capability,
            attempts,
            Resolution::Exhausted {
                last_error: last_class,
                message,
            },
        )
    }

    /// Spend one tier's retry budget.
    async fn walk_tier(
        &self,
        tier: &Tier,
        request: &ProviderRequest,
        attempts: &mut Vec<ProviderAttempt>,
    ) -> TierResult {
        let provider_id = tier.descriptor.provider_id();
        let max_retries = *tier.descriptor.max_retries();
        let timeout = *self.policy.attempt_timeout();
        let mut retry = 0u32;

        loop {
            let backoff = self.policy.backoff().delay_for(retry);
            if !backoff.is_zero() {
                debug!(provider = %provider_id, retry, backoff_ms = backoff.as_millis() as u64, "Backing off");
                tokio::time::sleep(backoff).await;
            }

            let started = Instant::now();
            let result = {
                let _guard = tier.throttle.acquire().await;
                match tokio::time::timeout(timeout, tier.provider.invoke(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::new(
                        ErrorClass::Timeout,
                        format!("attempt exceeded {}", format_duration(timeout)),
                    )),
                }
            };
            let latency = started.elapsed();

            match result {
                Ok(response) => {
                    attempts.push(ProviderAttempt::new(
                        provider_id.as_str(),
                        None,
                        latency,
                        retry,
                        backoff,
                    ));
                    return TierResult::Success(response);
                }
                Err(err) => {
                    attempts.push(ProviderAttempt::new(
                        provider_id.as_str(),
                        Some(err.class),
                        latency,
                        retry,
                        backoff,
                    ));

                    let action = self.policy.actions().action_for(err.class);
                    if action == RetryAction::RetryThenFallback && retry < max_retries {
                        warn!(provider = %provider_id, class = %err.class, retry, "Retryable failure, will retry");
                        retry += 1;
                        continue;
                    }

                    if *tier.descriptor.infallible() {
                        return TierResult::NoImage;
                    }

                    return TierResult::Failed(err);
                }
            }
        }
    }
}

fn fatal(
    capability: CapabilityClass,
    attempts: Vec<ProviderAttempt>,
    provider_id: String,
    err: ProviderError,
) -> CallOutcome {
    CallOutcome::new(
        capability,
        attempts,
        Resolution::Fatal {
            provider_id,
            class: err.class,
            message: err.message,
        },
    )
}

fn format_duration(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}

/// Builder that validates chains before producing a [`ProviderRouter`].
pub struct ProviderRouterBuilder {
    policy: RoutingPolicy,
    chains: Vec<(CapabilityClass, ProviderDescriptor, Arc<dyn Provider>)>,
}

impl ProviderRouterBuilder {
    /// Append a tier to the chain for `capability`.
    pub fn tier(
        mut self,
        capability: CapabilityClass,
        descriptor: ProviderDescriptor,
        provider: Arc<dyn Provider>,
    ) -> Self {
        self.chains.push((capability, descriptor, provider));
        self
    }

    /// Validate the chains and build the router.
    ///
    /// # Errors
    ///
    /// Returns an error if no tier was added, a provider appears twice in one
    /// chain, or an infallible tier is not the unauthenticated last tier.
    pub fn build(self) -> Result<ProviderRouter, RouterError> {
        if self.chains.is_empty() {
            return Err(RouterError::new(RouterErrorKind::NoProviders(
                "any".to_string(),
            )));
        }

        let mut chains: HashMap<CapabilityClass, Vec<Tier>> = HashMap::new();
        for (capability, descriptor, provider) in self.chains {
            let throttle = ProviderThrottle::from_descriptor(&descriptor);
            chains.entry(capability).or_default().push(Tier {
                descriptor,
                provider,
                throttle,
            });
        }

        for (capability, tiers) in &chains {
            validate_chain(*capability, tiers)?;
        }

        Ok(ProviderRouter {
            chains,
            policy: self.policy,
        })
    }
}

fn validate_chain(capability: CapabilityClass, tiers: &[Tier]) -> Result<(), RouterError> {
    let mut seen = HashSet::new();
    let last = tiers.len().saturating_sub(1);

    for (index, tier) in tiers.iter().enumerate() {
        let id = tier.descriptor.provider_id();
        if !seen.insert(id.as_str()) {
            return Err(RouterError::new(RouterErrorKind::DuplicateProvider {
                provider: id.clone(),
                capability: capability.to_string(),
            }));
        }
        if *tier.descriptor.infallible() {
            if index != last {
                return Err(RouterError::new(RouterErrorKind::InfallibleNotLast(
                    id.clone(),
                )));
            }
            if tier.descriptor.auth().requires_auth() {
                return Err(RouterError::new(RouterErrorKind::InfallibleRequiresAuth(
                    id.clone(),
                )));
            }
        }
    }
    Ok(())
}
