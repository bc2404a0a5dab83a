//! Client SDK for the SyncCast real-time event API.
//!
//! Topics are built from an app id, a scope and one of its channels; payloads
//! are flat JSON envelopes; the dispatcher posts them over HTTP with retry.

pub mod client;
pub mod dispatcher;
pub mod endpoints;
pub mod error;
pub mod payload;
pub mod scope;
pub mod service;
pub mod topic;
pub mod types;

pub use client::SyncCast;
pub use dispatcher::{
    DispatchResponse, Dispatcher, DispatcherConfig, HeaderMap, Method, QueryParams,
};
pub use error::{ErrorKind, ErrorReport, SyncCastError};
pub use payload::{EventEnvelope, PayloadBuilder};
pub use scope::{Channel, InMemoryScopeRegistry, Scope, ScopeLookupError, ScopeProvider, ScopeRef};
pub use service::{
    EventFamily, EventPublisher, EventRequest, MessageService, NotificationService,
    PresenceService, StreamService, TypingService,
};
pub use topic::{TopicBuilder, TopicSnapshot};
pub use types::{EventType, Priority, QosLevel, SyncCastConfig};
