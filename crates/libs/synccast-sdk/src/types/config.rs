use crate::error::SyncCastError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://synccast.socialroots-test.net";

const DEFAULT_MAX_NETWORK_RETRIES: u32 = 3;
const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_BACKOFF_FACTOR: f64 = 0.3;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScopeConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

/// Runtime settings shared by the dispatcher and the event services.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncCastConfig {
    pub api_base: String,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub api_version: Option<String>,
    pub max_network_retries: u32,
    pub timeout_ms: u64,
    pub backoff_factor: f64,
    pub scopes: Vec<ScopeConfig>,
}

impl Default for SyncCastConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            app_id: None,
            app_secret: None,
            api_version: None,
            max_network_retries: DEFAULT_MAX_NETWORK_RETRIES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            scopes: Vec::new(),
        }
    }
}

impl SyncCastConfig {
    pub fn from_toml(input: &str) -> Result<Self, SyncCastError> {
        toml::from_str(input).map_err(|err| {
            SyncCastError::config(format!("failed to parse config: {}", err.message()))
                .with_source(err)
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SyncCastError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| {
            SyncCastError::config(format!("failed to read config file: {err}"))
                .with_detail("path", path.display().to_string())
                .with_source(err)
        })?;
        Self::from_toml(&contents).map_err(|err| err.with_detail("path", path.display().to_string()))
    }

    /// `$SYNCCAST_CONFIG_ROOT/config.toml`, falling back to the platform config dir.
    pub fn default_path() -> Result<PathBuf, SyncCastError> {
        if let Ok(root) = std::env::var("SYNCCAST_CONFIG_ROOT") {
            if !root.trim().is_empty() {
                return Ok(PathBuf::from(root).join("config.toml"));
            }
        }
        let base = dirs::config_dir()
            .ok_or_else(|| SyncCastError::config("failed to resolve config directory"))?;
        Ok(base.join("synccast").join("config.toml"))
    }

    /// Overlays `SYNCCAST_API_BASE`, `SYNCCAST_APP_ID` and `SYNCCAST_APP_SECRET`.
    pub fn apply_env(&mut self) -> &mut Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_overrides<F>(&mut self, lookup: F) -> &mut Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(api_base) = present("SYNCCAST_API_BASE") {
            self.api_base = api_base;
        }
        if let Some(app_id) = present("SYNCCAST_APP_ID") {
            self.app_id = Some(app_id);
        }
        if let Some(app_secret) = present("SYNCCAST_APP_SECRET") {
            self.app_secret = Some(app_secret);
        }
        self
    }

    pub fn with_credentials(
        mut self,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        self.app_id = Some(app_id.into());
        self.app_secret = Some(app_secret.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        let app_id = self.app_id.as_deref().filter(|value| !value.is_empty())?;
        let app_secret = self.app_secret.as_deref().filter(|value| !value.is_empty())?;
        Some((app_id, app_secret))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), SyncCastError> {
        let api_base = self.api_base.trim();
        if api_base.is_empty() {
            return Err(SyncCastError::config("api_base must not be empty")
                .with_detail("field", "api_base"));
        }
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(SyncCastError::config("api_base must be an http(s) url")
                .with_detail("field", "api_base")
                .with_detail("provided", api_base));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            return Err(SyncCastError::config("backoff_factor must be a non-negative number")
                .with_detail("field", "backoff_factor")
                .with_detail("provided", self.backoff_factor.to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(SyncCastError::config("timeout_ms must be greater than zero")
                .with_detail("field", "timeout_ms"));
        }
        let has_id = self.app_id.as_deref().is_some_and(|value| !value.is_empty());
        let has_secret = self.app_secret.as_deref().is_some_and(|value| !value.is_empty());
        if has_id != has_secret {
            return Err(SyncCastError::config("app_id and app_secret must be configured together")
                .with_detail("field", if has_id { "app_secret" } else { "app_id" }));
        }
        crate::scope::InMemoryScopeRegistry::from_config(&self.scopes)
            .map_err(|err| err.rewrap(crate::error::ErrorKind::Config, "invalid scope registry"))?;
        Ok(())
    }
}
