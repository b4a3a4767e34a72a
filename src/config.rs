//! Service configuration shared by every component that talks to the analysis service.
//!
//! A [`ServiceConfig`] is resolved once at process start and handed to the
//! transport, pipeline, prober, and legacy client. Nothing reads configuration
//! from ambient global state after that point.
//!
//! Resolution layers [`ConfigOverrides`] on top of the built-in profile
//! defaults. Callers stack layers with [`ConfigOverrides::or`], highest
//! priority first (CLI flags, then environment, then the config file).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use url::Url;

/// Path of the single-shot upload-and-analyze endpoint.
pub const ANALYSIS_PATH: &str = "paper_vis";

/// Path of the legacy generic upload endpoint.
pub const LEGACY_UPLOAD_PATH: &str = "upload";

/// Path of the legacy analyze-by-folder endpoint.
pub const LEGACY_ANALYZE_PATH: &str = "analyze";

/// Direct service URL used outside development.
pub const PRODUCTION_BASE_URL: &str = "http://10.3.35.21:8004";

/// Origin of the development server that proxies `/api` to the service.
pub const DEFAULT_DEV_PROXY_ORIGIN: &str = "http://localhost:8080";

/// Path prefix the development proxy strips before forwarding.
pub const DEV_PROXY_PREFIX: &str = "api";

/// Default HTTP connect timeout (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default whole-request timeout (5 minutes, analysis is slow).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Default health probe timeout (10 seconds).
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Default synthetic progress tick (1 second).
pub const DEFAULT_PROGRESS_TICK_MS: u64 = 1000;

/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "PAPER_VIS_BASE_URL";

/// Environment variable selecting the profile.
pub const ENV_PROFILE: &str = "PAPER_VIS_PROFILE";

/// Environment variable overriding the development proxy origin.
pub const ENV_DEV_ORIGIN: &str = "PAPER_VIS_DEV_ORIGIN";

/// Errors raised while resolving configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The base URL did not parse, or is not an absolute http(s) URL.
    #[error("invalid base URL '{value}': {reason}")]
    InvalidBaseUrl {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The profile name is not one of the known profiles.
    #[error("unknown profile '{value}' (expected 'development' or 'production')")]
    UnknownProfile {
        /// The rejected value.
        value: String,
    },

    /// A numeric setting is outside its accepted range.
    #[error("invalid value for `{key}`: {value}. Expected range: {expected}")]
    OutOfRange {
        /// Setting name.
        key: &'static str,
        /// The rejected value.
        value: u64,
        /// Human-readable accepted range.
        expected: &'static str,
    },
}

/// Deployment profile, deciding how the base URL is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Requests go through the same-origin development proxy (`<origin>/api`).
    Development,
    /// Requests go straight to the service.
    #[default]
    Production,
}

impl Profile {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::UnknownProfile {
                value: s.to_string(),
            }),
        }
    }
}

/// One layer of optional settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Deployment profile.
    pub profile: Option<Profile>,
    /// Explicit base URL; wins over a profile from the same or a lower layer.
    pub base_url: Option<String>,
    /// Origin of the development proxy.
    pub dev_proxy_origin: Option<String>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Health probe timeout in seconds.
    pub probe_timeout_secs: Option<u64>,
    /// Synthetic progress tick in milliseconds.
    pub progress_tick_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Reads the environment layer through `lookup`.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProfile`] if the profile variable is set
    /// to an unknown name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let profile = non_empty(ENV_PROFILE)
            .map(|value| value.parse::<Profile>())
            .transpose()?;

        Ok(Self {
            profile,
            base_url: non_empty(ENV_BASE_URL),
            dev_proxy_origin: non_empty(ENV_DEV_ORIGIN),
            ..Self::default()
        })
    }

    /// Reads the environment layer from the process environment.
    ///
    /// # Errors
    ///
    /// See [`from_lookup`](Self::from_lookup).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Fills every unset field of `self` from `lower`.
    ///
    /// A profile set on this layer also discards the `base_url` of `lower`.
    #[must_use]
    pub fn or(self, lower: Self) -> Self {
        let base_url = if self.profile.is_some() {
            self.base_url
        } else {
            self.base_url.or(lower.base_url)
        };
        Self {
            profile: self.profile.or(lower.profile),
            base_url,
            dev_proxy_origin: self.dev_proxy_origin.or(lower.dev_proxy_origin),
            connect_timeout_secs: self.connect_timeout_secs.or(lower.connect_timeout_secs),
            request_timeout_secs: self.request_timeout_secs.or(lower.request_timeout_secs),
            probe_timeout_secs: self.probe_timeout_secs.or(lower.probe_timeout_secs),
            progress_tick_ms: self.progress_tick_ms.or(lower.progress_tick_ms),
        }
    }
}

/// Read-only configuration for the analysis service client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    profile: Profile,
    base_url: Url,
    analysis_endpoint: Url,
    legacy_upload_endpoint: Url,
    legacy_analyze_endpoint: Url,
    connect_timeout: Duration,
    request_timeout: Duration,
    probe_timeout: Duration,
    progress_tick: Duration,
}

impl ServiceConfig {
    /// Resolves a configuration from a (possibly layered) set of overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the base URL is invalid or a numeric setting
    /// is outside its range.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let profile = overrides.profile.unwrap_or_default();

        let base = match (&overrides.base_url, profile) {
            (Some(explicit), _) => explicit.clone(),
            (None, Profile::Production) => PRODUCTION_BASE_URL.to_string(),
            (None, Profile::Development) => {
                let origin = overrides
                    .dev_proxy_origin
                    .as_deref()
                    .unwrap_or(DEFAULT_DEV_PROXY_ORIGIN);
                format!("{}/{DEV_PROXY_PREFIX}", origin.trim_end_matches('/'))
            }
        };
        let base_url = normalize_base_url(&base)?;

        let connect_timeout_secs = checked_secs(
            "connect_timeout_secs",
            overrides
                .connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )?;
        let request_timeout_secs = checked_secs(
            "request_timeout_secs",
            overrides
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )?;
        let probe_timeout_secs = checked_secs(
            "probe_timeout_secs",
            overrides
                .probe_timeout_secs
                .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS),
        )?;
        let progress_tick_ms = overrides.progress_tick_ms.unwrap_or(DEFAULT_PROGRESS_TICK_MS);
        if !(50..=60_000).contains(&progress_tick_ms) {
            return Err(ConfigError::OutOfRange {
                key: "progress_tick_ms",
                value: progress_tick_ms,
                expected: "50..=60000",
            });
        }

        let config = Self {
            profile,
            analysis_endpoint: join_endpoint(&base_url, ANALYSIS_PATH)?,
            legacy_upload_endpoint: join_endpoint(&base_url, LEGACY_UPLOAD_PATH)?,
            legacy_analyze_endpoint: join_endpoint(&base_url, LEGACY_ANALYZE_PATH)?,
            base_url,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            probe_timeout: Duration::from_secs(probe_timeout_secs),
            progress_tick: Duration::from_millis(progress_tick_ms),
        };
        debug!(
            profile = %config.profile,
            base_url = %config.base_url,
            "service configuration resolved"
        );
        Ok(config)
    }

    /// Defaults for `profile` with no other overrides.
    ///
    /// # Errors
    ///
    /// Only fails if the built-in defaults are invalid.
    pub fn for_profile(profile: Profile) -> Result<Self, ConfigError> {
        Self::resolve(&ConfigOverrides {
            profile: Some(profile),
            ..ConfigOverrides::default()
        })
    }

    /// Configuration pointing directly at `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if `base_url` is not an absolute http(s) URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Self::resolve(&ConfigOverrides {
            base_url: Some(base_url.to_string()),
            ..ConfigOverrides::default()
        })
    }

    /// Resolves from the process environment on top of the defaults.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(&ConfigOverrides::from_env()?)
    }

    /// Active profile.
    #[must_use]
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Normalized base URL (always ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `<base>/paper_vis`.
    #[must_use]
    pub fn analysis_endpoint(&self) -> &Url {
        &self.analysis_endpoint
    }

    /// `<base>/upload`.
    #[must_use]
    pub fn legacy_upload_endpoint(&self) -> &Url {
        &self.legacy_upload_endpoint
    }

    /// `<base>/analyze`.
    #[must_use]
    pub fn legacy_analyze_endpoint(&self) -> &Url {
        &self.legacy_analyze_endpoint
    }

    /// HTTP connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Whole-request timeout for uploads.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Timeout for the health probe.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Tick interval of the synthetic progress narrator.
    #[must_use]
    pub fn progress_tick(&self) -> Duration {
        self.progress_tick
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("URL must be absolute with a host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("URL must not carry a query or fragment"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn join_endpoint(base: &Url, path: &str) -> Result<Url, ConfigError> {
    base.join(path).map_err(|e| ConfigError::InvalidBaseUrl {
        value: base.to_string(),
        reason: e.to_string(),
    })
}

fn checked_secs(key: &'static str, value: u64) -> Result<u64, ConfigError> {
    if (1..=3600).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            key,
            value,
            expected: "1..=3600",
        })
    }
}
