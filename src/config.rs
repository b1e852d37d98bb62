use std::{net, time};

use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    pub http: Http,
    pub chat: Chat,
    #[serde(default)]
    pub desk: Desk,
}

#[derive(Deserialize)]
pub struct Http {
    pub server: Server,
    pub cors: Cors,
}

#[derive(Deserialize)]
pub struct Server {
    pub addr: net::SocketAddr,
}

#[derive(Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
}

/// Remote support backend the chat relay forwards to.
#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub backend_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
    /// User turn from which replies carry the helpdesk escalation notice.
    #[serde(default = "default_escalation_turns")]
    pub escalation_turns: usize,
    /// Idle time after which a relay session is forgotten.
    #[serde(default = "default_session_ttl", with = "humantime_serde")]
    pub session_ttl: time::Duration,
}

fn default_escalation_turns() -> usize {
    4
}

fn default_session_ttl() -> time::Duration {
    time::Duration::from_secs(30 * 60)
}

#[derive(Default, Deserialize)]
pub struct Desk {
    /// Start with the sample tickets instead of an empty desk.
    #[serde(default)]
    pub demo_data: bool,
}
