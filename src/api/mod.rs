//! Shapes exchanged over HTTP.

pub mod chat;
pub mod notification;
pub mod ticket;
pub mod user;

use serde::{Deserialize, Serialize};

pub use self::{notification::Notification, ticket::Ticket, user::User};

/// Body of every refused request.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Failure {
    pub success: bool,
    pub error: String,
}

impl Failure {
    pub fn new(error: impl ToString) -> Self {
        Self {
            success: false,
            error: error.to_string(),
        }
    }
}
