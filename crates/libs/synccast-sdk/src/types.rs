mod config;
mod enums;

pub use config::{ChannelConfig, ScopeConfig, SyncCastConfig, DEFAULT_API_BASE};
pub use enums::{EventType, Priority, QosLevel};
