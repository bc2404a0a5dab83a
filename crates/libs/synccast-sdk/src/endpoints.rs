//! Fixed request paths of the broker-fronting API, relative to the base url.

pub mod push {
    pub const SYSTEM: &str = "/push/system";
    pub const TYPING: &str = "/push/typing";
    pub const MESSAGE: &str = "/push/message";
    pub const REACTION: &str = "/push/reaction";
    pub const PRESENCE: &str = "/push/presence";
    pub const BROADCAST: &str = "/push/broadcast";
    pub const NOTIFICATION: &str = "/push/notification";
}

pub mod data {
    pub const CREATE: &str = "/data/create";
    pub const UPDATE: &str = "/data/update";
    pub const DELETE: &str = "/data/delete";
    pub const SYNC: &str = "/data/sync";
    pub const METADATA: &str = "/data/meta";
}

pub mod control {
    pub const HEARTBEAT: &str = "/control/heartbeat";
    pub const ERROR: &str = "/control/error";
    pub const STATUS: &str = "/control/status";
    pub const PING: &str = "/control/ping";
}
