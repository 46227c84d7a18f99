//! TOML configuration for provider chains and retry settings.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from timepoint.toml)
//! - User overrides (./timepoint.toml or ~/.config/timepoint/timepoint.toml)
//! - Automatic merging with user values taking precedence

use crate::{ActionTable, BackoffPolicy, ProviderDescriptor, RoutingPolicy};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use timepoint_core::CapabilityClass;
use timepoint_error::{ConfigError, RouterError, TimepointError, TimepointResult};
use tracing::{debug, instrument};

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_attempt_timeout_ms() -> u64 {
    60_000
}

fn default_jitter() -> bool {
    true
}

/// Retry and timeout settings from the `[retry]` section.
///
/// ```toml
/// [retry]
/// base_delay_ms = 500
/// max_delay_ms = 30000
/// attempt_timeout_ms = 60000
/// jitter = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Backoff base; retry n waits 2^n x base
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for a single backoff
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Deadline for one provider attempt
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    /// Whether to add jitter to backoff delays
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            jitter: default_jitter(),
        }
    }
}

impl RetrySettings {
    /// Build a routing policy with the default action table.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt timeout is zero.
    pub fn to_policy(&self) -> Result<RoutingPolicy, RouterError> {
        RoutingPolicy::new(
            ActionTable::default(),
            BackoffPolicy::new(
                Duration::from_millis(self.base_delay_ms),
                Duration::from_millis(self.max_delay_ms),
                self.jitter,
            ),
            Duration::from_millis(self.attempt_timeout_ms),
        )
    }
}

/// Fallback chains from the `[[chains.text]]` and `[[chains.image]]` arrays.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChainsConfig {
    /// Text generation tiers, tried in order
    #[serde(default)]
    pub text: Vec<ProviderDescriptor>,

    /// Image generation tiers, tried in order
    #[serde(default)]
    pub image: Vec<ProviderDescriptor>,
}

/// Top-level router configuration.
///
/// Loads from TOML files with a precedence system:
/// 1. Bundled defaults (include_str! from timepoint.toml)
/// 2. User override (~/.config/timepoint/timepoint.toml, then ./timepoint.toml)
///
/// # Example
///
/// ```no_run
/// use timepoint_core::CapabilityClass;
/// use timepoint_router::RouterConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RouterConfig::load()?;
/// for tier in config.chain(CapabilityClass::Image) {
///     println!("{} (retries: {})", tier.provider_id(), tier.max_retries());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Retry and timeout settings
    #[serde(default)]
    pub retry: RetrySettings,

    /// Fallback chains per capability class
    #[serde(default)]
    pub chains: ChainsConfig,
}

impl RouterConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> TimepointResult<Self> {
        debug!("Loading router configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                TimepointError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                TimepointError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid configuration.
    pub fn from_toml_str(content: &str) -> TimepointResult<Self> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .map_err(|e| {
                TimepointError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                TimepointError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override earlier):
    /// 1. Bundled defaults (timepoint.toml shipped with the crate)
    /// 2. User config in home directory (~/.config/timepoint/timepoint.toml)
    /// 3. User config in current directory (./timepoint.toml)
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if any present source fails to parse.
    #[instrument]
    pub fn load() -> TimepointResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../timepoint.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/timepoint/timepoint.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("timepoint").required(false));

        builder
            .build()
            .map_err(|e| {
                TimepointError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                TimepointError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Fallback chain for a capability class.
    pub fn chain(&self, capability: CapabilityClass) -> &[ProviderDescriptor] {
        match capability {
            CapabilityClass::Text => &self.chains.text,
            CapabilityClass::Image => &self.chains.image,
        }
    }
}
