//! Canonical topic strings.
//!
//! Every topic has the shape
//! `app_id/scope/channel[/extra...][/user/{id|+}][/#]`. The `user` pair is
//! rendered once a user id or the single-level wildcard has been selected,
//! and the multi-level wildcard `#` is always the final segment.

use crate::error::SyncCastError;
use crate::scope::{Scope, ScopeProvider, ScopeRef};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const DEFAULT_APP_ID: &str = "default-app";
pub const SEPARATOR: &str = "/";
pub const SINGLE_LEVEL_WILDCARD: &str = "+";
pub const MULTI_LEVEL_WILDCARD: &str = "#";
pub const USER_SEGMENT: &str = "user";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UserSelector {
    Concrete,
    Wildcard,
}

/// Fluent builder for topic strings bound to one app id and one scope.
///
/// Cloning gives a fully independent builder.
#[derive(Clone, Debug)]
pub struct TopicBuilder {
    app_id: String,
    scope: Scope,
    channel: Option<String>,
    extras: Vec<String>,
    user_id: Option<String>,
    wildcard: bool,
    full_wildcard: bool,
    selector: Option<UserSelector>,
    require_user: bool,
}

/// Diagnostic view of a builder; `topic` is `None` while the builder is incomplete.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicSnapshot {
    pub app_id: String,
    pub scope: String,
    pub channel: Option<String>,
    pub extras: Vec<String>,
    pub user_id: Option<String>,
    pub wildcard: bool,
    pub full_wildcard: bool,
    pub topic: Option<String>,
}

impl TopicBuilder {
    /// Resolves `scope` (through `provider` when it is a name) and binds the builder to it.
    pub fn new(
        app_id: impl Into<String>,
        scope: impl Into<ScopeRef>,
        provider: Option<&dyn ScopeProvider>,
    ) -> Result<Self, SyncCastError> {
        let scope = ScopeRef::resolve(scope.into(), provider)?;
        Ok(Self::from_scope(app_id, scope))
    }

    pub fn from_scope(app_id: impl Into<String>, scope: Scope) -> Self {
        let app_id = app_id.into();
        let app_id = if app_id.is_empty() { DEFAULT_APP_ID.to_owned() } else { app_id };
        Self {
            app_id,
            scope,
            channel: None,
            extras: Vec::new(),
            user_id: None,
            wildcard: false,
            full_wildcard: false,
            selector: None,
            require_user: false,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Makes `build` refuse topics without a user segment.
    pub fn require_user(&mut self, required: bool) -> &mut Self {
        self.require_user = required;
        self
    }

    pub fn channel(&mut self, name: &str) -> Result<&mut Self, SyncCastError> {
        if !self.scope.has_channel(name) {
            let valid_channels = self.scope.channel_names();
            return Err(SyncCastError::topic(format!(
                "channel '{name}' not defined for scope '{}'",
                self.scope.name
            ))
            .with_detail("scope", self.scope.name.clone())
            .with_detail("channel", name)
            .with_detail("valid_channels", valid_channels));
        }
        self.channel = Some(name.to_owned());
        Ok(self)
    }

    pub fn extra<I, T>(&mut self, parts: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        self.extras.extend(parts.into_iter().map(|part| part.to_string()));
        self
    }

    pub fn for_user(&mut self, user_id: impl Display) -> &mut Self {
        self.user_id = Some(user_id.to_string());
        self.selector = Some(UserSelector::Concrete);
        self
    }

    pub fn wildcard(&mut self) -> &mut Self {
        self.wildcard = true;
        self.selector = Some(UserSelector::Wildcard);
        self
    }

    pub fn full_wildcard(&mut self) -> &mut Self {
        self.full_wildcard = true;
        self
    }

    /// Clears everything except the app id and scope.
    pub fn reset(&mut self) -> &mut Self {
        self.channel = None;
        self.extras.clear();
        self.user_id = None;
        self.wildcard = false;
        self.full_wildcard = false;
        self.selector = None;
        self
    }

    fn user_segment(&self) -> Option<&str> {
        match self.selector? {
            UserSelector::Wildcard => Some(SINGLE_LEVEL_WILDCARD),
            UserSelector::Concrete => self.user_id.as_deref(),
        }
    }

    pub fn build(&self) -> Result<String, SyncCastError> {
        let Some(channel) = self.channel.as_deref() else {
            return Err(SyncCastError::topic("channel must be set before building topic")
                .with_detail("scope", self.scope.name.clone())
                .with_detail("app_id", self.app_id.clone()));
        };
        let user_segment = self.user_segment();
        if self.require_user && user_segment.is_none() {
            return Err(SyncCastError::topic(
                "user id or wildcard must be set before building topic",
            )
            .with_detail("scope", self.scope.name.clone())
            .with_detail("app_id", self.app_id.clone())
            .with_detail("channel", channel));
        }

        let mut parts: Vec<&str> = Vec::with_capacity(self.extras.len() + 6);
        parts.push(&self.app_id);
        parts.push(&self.scope.name);
        parts.push(channel);
        parts.extend(self.extras.iter().map(String::as_str));
        if let Some(user) = user_segment {
            parts.push(USER_SEGMENT);
            parts.push(user);
        }
        if self.full_wildcard {
            parts.push(MULTI_LEVEL_WILDCARD);
        }

        let topic = parts.join(SEPARATOR);
        log::debug!("topic: built {topic}");
        Ok(topic)
    }

    pub fn snapshot(&self) -> TopicSnapshot {
        TopicSnapshot {
            app_id: self.app_id.clone(),
            scope: self.scope.name.clone(),
            channel: self.channel.clone(),
            extras: self.extras.clone(),
            user_id: self.user_id.clone(),
            wildcard: self.wildcard,
            full_wildcard: self.full_wildcard,
            topic: self.build().ok(),
        }
    }
}

#[cfg(test)]
mod tests;
