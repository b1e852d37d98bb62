use std::collections::BTreeMap;

use itertools::Itertools as _;
use serde::{Deserialize, Serialize};

use super::{
    ticket::{Status, Ticket},
    user, Desk,
};

/// Open tickets currently held by one engineer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Workload {
    pub name: String,
    pub count: usize,
}

// Every view is a full scan of the ticket list.
impl Desk {
    /// Tickets raised by `user`.
    pub fn tickets_by_user(&self, user: &user::Id) -> Vec<&Ticket> {
        self.filter_tickets(|t| &t.raised_by == user)
    }

    /// Unresolved tickets assigned to `engineer`.
    pub fn tickets_by_engineer(&self, engineer: &user::Id) -> Vec<&Ticket> {
        self.filter_tickets(|t| {
            t.assigned_to.as_ref() == Some(engineer)
                && t.status != Status::Resolved
        })
    }

    pub fn unassigned_tickets(&self) -> Vec<&Ticket> {
        self.filter_tickets(|t| t.status == Status::Raised)
    }

    pub fn active_tickets(&self) -> Vec<&Ticket> {
        self.filter_tickets(|t| {
            matches!(t.status, Status::Assigned | Status::InProgress)
        })
    }

    pub fn reassign_requests(&self) -> Vec<&Ticket> {
        self.filter_tickets(|t| t.reassign_request.is_some())
    }

    /// Number of unresolved tickets per engineer. The name shown is the one
    /// recorded on the engineer's earliest open ticket.
    pub fn engineer_workload(&self) -> BTreeMap<user::Id, Workload> {
        self.tickets
            .iter()
            .filter(|t| t.status != Status::Resolved)
            .filter_map(|t| Some((t.assigned_to.clone()?, t)))
            .into_group_map()
            .into_iter()
            .map(|(engineer, tickets)| {
                let name = tickets
                    .first()
                    .and_then(|t| t.assigned_to_name.clone())
                    .unwrap_or_default();
                let workload = Workload {
                    name,
                    count: tickets.len(),
                };
                (engineer, workload)
            })
            .collect()
    }

    fn filter_tickets(&self, pred: impl Fn(&Ticket) -> bool) -> Vec<&Ticket> {
        self.tickets.iter().filter(|t| pred(*t)).collect()
    }
}
