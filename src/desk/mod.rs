//! In-memory help desk: tickets, their notifications, and the views derived
//! from them.

macro_rules! sequential_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            serde::Deserialize,
            serde::Serialize,
        )]
        #[serde(into = "String", try_from = "String")]
        pub struct $name(u64);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn number(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}-{:03}", Self::PREFIX, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::desk::ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.strip_prefix(Self::PREFIX)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .and_then(|digits| digits.parse().ok())
                    .map(Self)
                    .ok_or_else(|| $crate::desk::ParseIdError(s.to_owned()))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::desk::ParseIdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

mod demo;
pub mod notification;
mod query;
pub mod ticket;
pub mod user;

use derive_more::Display;

pub use self::{
    notification::Notification, query::Workload, ticket::Ticket, user::User,
};

/// Owner of both the ticket and the notification lists.
///
/// Every operation takes `&mut self` and runs to completion, so callers that
/// share a `Desk` between tasks wrap it in a single lock.
#[derive(Debug, Default)]
pub struct Desk {
    tickets: ticket::Store,
    notifications: notification::Store,
}

impl Desk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tickets(&self) -> &ticket::Store {
        &self.tickets
    }

    pub fn notifications(&self) -> &notification::Store {
        &self.notifications
    }

    /// Compare-and-swap guard: fails unless the ticket is still at
    /// `expected` version.
    pub fn check_version(
        &self,
        id: ticket::Id,
        expected: u64,
    ) -> Result<(), Error> {
        let ticket = self.tickets.get(id).ok_or(Error::TicketNotFound(id))?;
        if ticket.version != expected {
            return Err(Error::VersionConflict {
                ticket: id,
                expected,
                actual: ticket.version,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Error {
    #[display("ticket {_0} not found")]
    TicketNotFound(ticket::Id),

    #[display("Cannot resolve ticket without at least one action log entry")]
    NoActionLogs(ticket::Id),

    #[display("ticket {_0} is already resolved")]
    AlreadyResolved(ticket::Id),

    #[display(
        "ticket {ticket} was modified concurrently: \
         expected version {expected}, found {actual}"
    )]
    VersionConflict {
        ticket: ticket::Id,
        expected: u64,
        actual: u64,
    },
}

impl Error {
    /// Whether the operation was refused by a lifecycle precondition rather
    /// than by a missing ticket or a stale version.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::NoActionLogs(_) | Self::AlreadyResolved(_))
    }
}

impl std::error::Error for Error {}

#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display("invalid identifier: {_0:?}")]
pub struct ParseIdError(String);

impl std::error::Error for ParseIdError {}

/// First `max` characters of `text`.
fn prefix(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
