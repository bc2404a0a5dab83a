//! Scopes and their channels, plus the lookup seam the topic builder resolves names through.

use crate::error::SyncCastError;
use crate::types::ScopeConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: None }
    }
}

/// A communication domain such as `chat` or `system`, owning its channels.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scope {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: None, channels: Vec::new() }
    }

    pub fn with_channels<I, S>(name: impl Into<String>, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            description: None,
            channels: channels.into_iter().map(Channel::new).collect(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|channel| channel.name.clone()).collect()
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.iter().any(|channel| channel.name == name)
    }
}

impl From<&ScopeConfig> for Scope {
    fn from(config: &ScopeConfig) -> Self {
        Self {
            name: config.name.clone(),
            description: config.description.clone(),
            channels: config
                .channels
                .iter()
                .map(|channel| Channel {
                    name: channel.name.clone(),
                    description: channel.description.clone(),
                })
                .collect(),
        }
    }
}

/// Failure inside a scope provider's own storage.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("scope lookup failed: {message}")]
pub struct ScopeLookupError {
    pub message: String,
}

impl ScopeLookupError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Resolves scope names for the data layer that owns them.
pub trait ScopeProvider: Send + Sync {
    fn find_by_name(&self, name: &str) -> Result<Option<Scope>, ScopeLookupError>;
}

/// Either an already loaded scope or a name to look up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeRef {
    Resolved(Scope),
    Named(String),
}

impl ScopeRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Resolved(scope) => scope.name.as_str(),
            Self::Named(name) => name.as_str(),
        }
    }

    pub fn resolve(self, provider: Option<&dyn ScopeProvider>) -> Result<Scope, SyncCastError> {
        let name = match self {
            Self::Resolved(scope) => return Ok(scope),
            Self::Named(name) => name,
        };
        let Some(provider) = provider else {
            return Err(SyncCastError::topic(format!(
                "scope '{name}' cannot be resolved: no scope provider registered"
            ))
            .with_detail("scope", name));
        };
        match provider.find_by_name(&name) {
            Ok(Some(scope)) => Ok(scope),
            Ok(None) => Err(SyncCastError::topic(format!("scope '{name}' not found"))
                .with_detail("scope", name)),
            Err(err) => Err(SyncCastError::topic(format!(
                "scope '{name}' not found or failed to load"
            ))
            .with_detail("scope", name)
            .with_detail("error", err.message.clone())
            .with_source(err)),
        }
    }
}

impl From<Scope> for ScopeRef {
    fn from(scope: Scope) -> Self {
        Self::Resolved(scope)
    }
}

impl From<&Scope> for ScopeRef {
    fn from(scope: &Scope) -> Self {
        Self::Resolved(scope.clone())
    }
}

impl From<&str> for ScopeRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

impl From<String> for ScopeRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// Process-local registry keyed by scope name.
#[derive(Debug, Default)]
pub struct InMemoryScopeRegistry {
    scopes: RwLock<BTreeMap<String, Scope>>,
}

impl InMemoryScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(scopes: &[ScopeConfig]) -> Result<Self, SyncCastError> {
        let registry = Self::new();
        for scope in scopes {
            registry.register(Scope::from(scope))?;
        }
        Ok(registry)
    }

    pub fn register(&self, scope: Scope) -> Result<(), SyncCastError> {
        if scope.name.trim().is_empty() {
            return Err(SyncCastError::validation("scope name must not be empty")
                .with_detail("field", "name"));
        }
        let mut seen = Vec::with_capacity(scope.channels.len());
        for channel in &scope.channels {
            if channel.name.trim().is_empty() {
                return Err(SyncCastError::validation("channel name must not be empty")
                    .with_detail("scope", scope.name.clone()));
            }
            if seen.contains(&channel.name.as_str()) {
                return Err(SyncCastError::validation(format!(
                    "channel '{}' defined twice in scope '{}'",
                    channel.name, scope.name
                ))
                .with_detail("scope", scope.name.clone())
                .with_detail("channel", channel.name.clone()));
            }
            seen.push(channel.name.as_str());
        }

        let mut scopes = self.scopes.write().expect("scope registry rwlock poisoned");
        if scopes.contains_key(&scope.name) {
            return Err(SyncCastError::validation(format!(
                "scope '{}' is already registered",
                scope.name
            ))
            .with_detail("scope", scope.name.clone()));
        }
        scopes.insert(scope.name.clone(), scope);
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.scopes.read().expect("scope registry rwlock poisoned").keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.scopes.read().expect("scope registry rwlock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScopeProvider for InMemoryScopeRegistry {
    fn find_by_name(&self, name: &str) -> Result<Option<Scope>, ScopeLookupError> {
        let scopes = self
            .scopes
            .read()
            .map_err(|_| ScopeLookupError::new("scope registry lock poisoned"))?;
        Ok(scopes.get(name).cloned())
    }
}
