//! Relay between help desk users and the remote support backend.

use std::{
    collections::HashMap,
    fmt,
    time::{Duration, Instant},
};

use uuid::Uuid;

use crate::{api, config};

/// Header carrying the relay session a chat message belongs to.
pub const SESSION_HEADER: &str = "x-chat-session";

/// Appended to replies once a conversation has gone on long enough.
pub const ESCALATION_NOTICE: &str = "\n\n**ESCALATION:** If unresolved, \
                                     please contact ITFM Helpdesk at **2252**.";

/// Shown in place of a reply when the backend could not be reached.
pub const UNREACHABLE_REPLY: &str =
    "System Error: Unable to reach ITFM servers.";

/// HTTP client of the support backend.
#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    backend_url: String,
}

impl Client {
    pub fn new(config: &config::Chat) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            backend_url: config.backend_url.trim_end_matches('/').to_owned(),
        })
    }

    pub async fn ask(&self, message: &str) -> Result<String, reqwest::Error> {
        let api::chat::Reply { reply } = self
            .http
            .post(format!("{}/chat", self.backend_url))
            .json(&api::chat::Message {
                message: message.to_owned(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(reply)
    }

    pub async fn send_feedback(
        &self,
        feedback: &api::chat::Feedback,
    ) -> Result<(), reqwest::Error> {
        self.http
            .post(format!("{}/feedback", self.backend_url))
            .json(feedback)
            .send()
            .await?
            .error_for_status()
            .map(drop)
    }
}

/// User message waiting for the backend's reply.
#[derive(Debug)]
pub struct Turn {
    number: usize,
    query: String,
    escalate: bool,
}

impl Turn {
    /// Position of this message in its session, starting at 1.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Turns the backend's answer into the reply shown to the user.
    pub fn finish<E: fmt::Display>(self, answer: Result<String, E>) -> String {
        match answer {
            Ok(mut reply) => {
                if self.escalate {
                    reply.push_str(ESCALATION_NOTICE);
                }
                reply
            }
            Err(e) => {
                tracing::warn!(
                    turn = self.number,
                    error = %e,
                    "support backend unreachable"
                );
                UNREACHABLE_REPLY.to_owned()
            }
        }
    }
}

#[derive(Debug)]
struct Session {
    turns: usize,
    last_seen: Instant,
}

/// Turn counters of the open relay sessions.
///
/// A session is forgotten once it has been idle for longer than the
/// configured TTL. A message carrying a forgotten id starts it over.
#[derive(Debug)]
pub struct Sessions {
    sessions: HashMap<Uuid, Session>,
    escalation_turns: usize,
    idle_ttl: Duration,
}

impl Sessions {
    pub fn new(escalation_turns: usize, idle_ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            escalation_turns,
            idle_ttl,
        }
    }

    pub fn from_config(config: &config::Chat) -> Self {
        Self::new(config.escalation_turns, config.session_ttl)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Counts a user message in session `id`, opening the session if needed.
    /// Blank messages are ignored and open nothing.
    pub fn begin_turn(
        &mut self,
        id: Uuid,
        text: &str,
        now: Instant,
    ) -> Option<Turn> {
        self.evict_idle(now);

        let query = text.trim();
        if query.is_empty() {
            return None;
        }

        let session = self.sessions.entry(id).or_insert(Session {
            turns: 0,
            last_seen: now,
        });
        session.turns += 1;
        session.last_seen = now;

        Some(Turn {
            number: session.turns,
            query: query.to_owned(),
            escalate: session.turns >= self.escalation_turns,
        })
    }

    /// Drops the sessions idle for longer than the TTL and returns how many
    /// were dropped.
    pub fn evict_idle(&mut self, now: Instant) -> usize {
        let ttl = self.idle_ttl;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| now.saturating_duration_since(s.last_seen) <= ttl);
        let evicted = before - self.sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "idle chat sessions dropped");
        }
        evicted
    }
}
