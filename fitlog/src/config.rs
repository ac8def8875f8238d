//! Runtime configuration loaded from the process environment.
//!
//! Every loader takes a lookup function so tests can feed values without
//! touching the real environment; `from_env` wires it to `std::env::var`.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use wger_client::{AuthConfig, DEFAULT_BASE_URL};

use crate::api::server::ApiServerConfig;
use crate::logging::LogSettings;

/// Default freshness window for cached exercise names (24 hours).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default interval between expired-entry sweeps.
pub const DEFAULT_CACHE_SWEEP: Duration = Duration::from_secs(10 * 60);

/// Shortest accepted sweep interval; smaller values are raised to this.
pub const MIN_CACHE_SWEEP: Duration = Duration::from_secs(1);

/// Read a variable, treating blank values as unset.
pub(crate) fn lookup_trimmed<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a variable, keeping `default` when it is unset or malformed.
pub(crate) fn lookup_parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup_trimmed(lookup, key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring malformed configuration value");
            default
        }),
        None => default,
    }
}

fn lookup_secs<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    Duration::from_secs(lookup_parsed(lookup, key, default.as_secs()))
}

/// Upstream (wger) connection settings.
#[derive(Debug, Clone)]
pub struct WgerSettings {
    pub base_url: String,
    pub max_refresh_attempts: u32,
    pub refresh_cooldown: Duration,
    /// Zero means no transport timeout.
    pub request_timeout: Duration,
}

impl Default for WgerSettings {
    fn default() -> Self {
        let auth = AuthConfig::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_refresh_attempts: auth.max_refresh_attempts,
            refresh_cooldown: auth.refresh_cooldown,
            request_timeout: Duration::ZERO,
        }
    }
}

impl WgerSettings {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            base_url: lookup_trimmed(lookup, "WGER_BASE_URL").unwrap_or(defaults.base_url),
            max_refresh_attempts: lookup_parsed(
                lookup,
                "WGER_MAX_REFRESH_ATTEMPTS",
                defaults.max_refresh_attempts,
            ),
            refresh_cooldown: lookup_secs(
                lookup,
                "WGER_REFRESH_COOLDOWN_SECS",
                defaults.refresh_cooldown,
            ),
            request_timeout: lookup_secs(
                lookup,
                "WGER_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout,
            ),
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::default()
            .with_max_refresh_attempts(self.max_refresh_attempts)
            .with_refresh_cooldown(self.refresh_cooldown)
    }
}

/// Exercise-name cache settings.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            sweep_interval: DEFAULT_CACHE_SWEEP,
        }
    }
}

impl CacheSettings {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut sweep_interval =
            lookup_secs(lookup, "EXERCISE_CACHE_SWEEP_SECS", defaults.sweep_interval);
        if sweep_interval < MIN_CACHE_SWEEP {
            warn!(
                requested_secs = sweep_interval.as_secs(),
                min_secs = MIN_CACHE_SWEEP.as_secs(),
                "Cache sweep interval too short, raising to minimum"
            );
            sweep_interval = MIN_CACHE_SWEEP;
        }

        Self {
            ttl: lookup_secs(lookup, "EXERCISE_CACHE_TTL_SECS", defaults.ttl),
            sweep_interval,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ApiServerConfig,
    pub wger: WgerSettings,
    pub cache: CacheSettings,
    pub logging: LogSettings,
    /// Keys accepted for administrative endpoints. Empty disables the check.
    pub admin_api_keys: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin_api_keys = lookup_trimmed(lookup, "ADMIN_API_KEYS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            server: ApiServerConfig::from_lookup(lookup),
            wger: WgerSettings::from_lookup(lookup),
            cache: CacheSettings::from_lookup(lookup),
            logging: LogSettings::from_lookup(lookup),
            admin_api_keys,
        }
    }
}
