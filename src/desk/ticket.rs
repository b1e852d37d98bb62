use enum_utils::TryFromRepr;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;

use super::{
    notification::{Audience, Draft, Kind},
    prefix,
    user::{self, Role, User},
    Desk, Error,
};

/// Number of characters of free-form text quoted in notifications.
const QUOTE_LEN: usize = 50;

sequential_id!(
    /// `TKT-NNN`, one above the highest number in use.
    Id,
    "TKT"
);

sequential_id!(
    /// `LOG-NNN`, unique across every ticket of a desk.
    LogId,
    "LOG"
);

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Id,
    pub asset_id: String,
    pub call_type: String,
    pub problem_description: String,
    pub location: String,
    pub raised_by: user::Id,
    pub raised_by_name: String,
    pub status: Status,
    pub severity: Option<Severity>,
    pub assigned_to: Option<user::Id>,
    pub assigned_to_name: Option<String>,
    pub action_logs: Vec<ActionLog>,
    pub reassign_request: Option<ReassignRequest>,
    pub timestamps: Timestamps,

    /// Bumped by every mutation of this ticket.
    #[serde(default)]
    pub version: u64,
}

impl Ticket {
    fn touch(&mut self) {
        self.version += 1;
    }
}

/// Descriptive fields supplied by whoever raises a ticket.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub asset_id: String,
    pub call_type: String,
    pub problem_description: String,
    pub location: String,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    /// Reported, waiting for an admin to pick an engineer.
    Raised,

    /// An engineer owns the ticket but has not logged any work yet.
    Assigned,

    /// At least one action was logged or the engineer started explicitly.
    InProgress,

    /// Closed by the engineer. Requires at least one action log entry.
    Resolved,
}

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, TryFromRepr)]
#[repr(u8)]
pub enum Severity {
    Critical = 1,
    High = 2,
    Medium = 3,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let repr = u8::deserialize(deserializer)?;
        match Self::try_from(repr) {
            Ok(severity) => Ok(severity),
            // Anything below high priority is treated as medium.
            Err(_) if repr > Self::Medium as u8 => Ok(Self::Medium),
            Err(_) => Err(de::Error::custom("invalid severity")),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLog {
    pub id: LogId,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub engineer_id: user::Id,
    pub engineer_name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignRequest {
    pub requested_by: user::Id,
    pub requested_by_name: String,
    pub reason: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Instants of each lifecycle transition. Each one is stamped once and never
/// cleared.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    #[serde(with = "time::serde::rfc3339")]
    pub raised: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub assigned: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub in_progress: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub resolved: Option<OffsetDateTime>,
}

impl Timestamps {
    fn raised_at(at: OffsetDateTime) -> Self {
        Self {
            raised: at,
            assigned: None,
            in_progress: None,
            resolved: None,
        }
    }
}

/// Ordered list of tickets, in creation order.
#[derive(Debug, Default)]
pub struct Store {
    tickets: Vec<Ticket>,
    last_log_id: u64,
}

/// Outcome of handing a ticket over to another engineer.
struct Handover<'a> {
    ticket: &'a Ticket,
    previous: Option<user::Id>,
    previous_name: String,
}

impl Store {
    pub fn get(&self, id: Id) -> Option<&Ticket> {
        self.tickets.iter().find(|ticket| ticket.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.iter()
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Id the next created ticket will get.
    pub fn next_id(&self) -> Id {
        let max = self.tickets.iter().map(|t| t.id.number()).max();
        Id::from(max.unwrap_or(0) + 1)
    }

    fn get_mut(&mut self, id: Id) -> Result<&mut Ticket, Error> {
        self.tickets
            .iter_mut()
            .find(|ticket| ticket.id == id)
            .ok_or(Error::TicketNotFound(id))
    }

    fn next_log_id(&mut self) -> LogId {
        self.last_log_id += 1;
        LogId::from(self.last_log_id)
    }

    /// Adds an already built ticket, keeping the log counter ahead of its
    /// entries.
    pub(super) fn insert(&mut self, ticket: Ticket) {
        let max_log = ticket.action_logs.iter().map(|log| log.id.number());
        self.last_log_id = max_log.fold(self.last_log_id, u64::max);
        self.tickets.push(ticket);
    }

    fn create(
        &mut self,
        data: NewTicket,
        creator: &User,
        now: OffsetDateTime,
    ) -> &Ticket {
        let ticket = Ticket {
            id: self.next_id(),
            asset_id: data.asset_id,
            call_type: data.call_type,
            problem_description: data.problem_description,
            location: data.location,
            raised_by: creator.id.clone(),
            raised_by_name: creator.name.clone(),
            status: Status::Raised,
            severity: None,
            assigned_to: None,
            assigned_to_name: None,
            action_logs: Vec::new(),
            reassign_request: None,
            timestamps: Timestamps::raised_at(now),
            version: 0,
        };
        self.tickets.push(ticket);
        &self.tickets[self.tickets.len() - 1]
    }

    fn assign(
        &mut self,
        id: Id,
        engineer_id: &user::Id,
        engineer_name: &str,
        severity: Severity,
        now: OffsetDateTime,
    ) -> Result<&Ticket, Error> {
        let ticket = self.get_mut(id)?;
        if ticket.status == Status::Resolved {
            return Err(Error::AlreadyResolved(id));
        }

        ticket.assigned_to = Some(engineer_id.clone());
        ticket.assigned_to_name = Some(engineer_name.to_owned());
        ticket.severity = Some(severity);
        ticket.reassign_request = None;
        // Re-assigning work already under way must not move it backwards.
        if ticket.status == Status::Raised {
            ticket.status = Status::Assigned;
        }
        ticket.timestamps.assigned.get_or_insert(now);
        ticket.touch();
        Ok(ticket)
    }

    fn start_progress(
        &mut self,
        id: Id,
        now: OffsetDateTime,
    ) -> Result<&Ticket, Error> {
        let ticket = self.get_mut(id)?;
        if ticket.status == Status::Assigned {
            ticket.status = Status::InProgress;
            ticket.timestamps.in_progress.get_or_insert(now);
            ticket.touch();
        } else {
            tracing::debug!(
                ticket = %id,
                status = ?ticket.status,
                "progress not started: ticket is not assigned"
            );
        }
        Ok(ticket)
    }

    fn add_action_log(
        &mut self,
        id: Id,
        description: &str,
        engineer: &User,
        now: OffsetDateTime,
    ) -> Result<&Ticket, Error> {
        // Look the ticket up first so a missing ticket does not burn a log id.
        self.get_mut(id)?;
        let log_id = self.next_log_id();
        let ticket = self.get_mut(id)?;

        ticket.action_logs.push(ActionLog {
            id: log_id,
            description: description.to_owned(),
            timestamp: now,
            engineer_id: engineer.id.clone(),
            engineer_name: engineer.name.clone(),
        });
        // Logging work on an assigned ticket implicitly starts it.
        if ticket.status == Status::Assigned {
            ticket.status = Status::InProgress;
            ticket.timestamps.in_progress.get_or_insert(now);
        }
        ticket.touch();
        Ok(ticket)
    }

    /// Returns the ticket and whether this call is the one that resolved it.
    fn resolve(
        &mut self,
        id: Id,
        now: OffsetDateTime,
    ) -> Result<(&Ticket, bool), Error> {
        let ticket = self.get_mut(id)?;
        if ticket.action_logs.is_empty() {
            return Err(Error::NoActionLogs(id));
        }
        if ticket.status == Status::Resolved {
            return Ok((&*ticket, false));
        }

        ticket.status = Status::Resolved;
        ticket.timestamps.resolved.get_or_insert(now);
        ticket.touch();
        Ok((&*ticket, true))
    }

    fn request_reassign(
        &mut self,
        id: Id,
        reason: &str,
        engineer: &User,
        now: OffsetDateTime,
    ) -> Result<&Ticket, Error> {
        let ticket = self.get_mut(id)?;
        ticket.reassign_request = Some(ReassignRequest {
            requested_by: engineer.id.clone(),
            requested_by_name: engineer.name.clone(),
            reason: reason.to_owned(),
            timestamp: now,
        });
        ticket.touch();
        Ok(ticket)
    }

    fn reassign(
        &mut self,
        id: Id,
        engineer_id: &user::Id,
        engineer_name: &str,
        now: OffsetDateTime,
    ) -> Result<Handover<'_>, Error> {
        if self.get_mut(id)?.status == Status::Resolved {
            return Err(Error::AlreadyResolved(id));
        }
        let log_id = self.next_log_id();
        let ticket = self.get_mut(id)?;

        let previous = ticket.assigned_to.replace(engineer_id.clone());
        let previous_name = ticket
            .assigned_to_name
            .replace(engineer_name.to_owned())
            .unwrap_or_else(|| "unassigned".to_owned());
        ticket.reassign_request = None;
        ticket.action_logs.push(ActionLog {
            id: log_id,
            description: format!(
                "Ticket reassigned from {previous_name} to {engineer_name}",
            ),
            timestamp: now,
            engineer_id: user::Id::system(),
            engineer_name: "System".to_owned(),
        });
        ticket.touch();

        Ok(Handover {
            ticket,
            previous,
            previous_name,
        })
    }
}

impl Desk {
    /// Raises a new ticket and tells the admins about it.
    pub fn create_ticket(
        &mut self,
        data: NewTicket,
        creator: &User,
    ) -> &Ticket {
        let now = OffsetDateTime::now_utc();
        let ticket = self.tickets.create(data, creator, now);

        self.notifications.add(
            Draft {
                kind: Kind::NewTicket,
                title: "New Ticket Raised".to_owned(),
                message: format!(
                    "{}: {}... - {}",
                    ticket.id,
                    prefix(&ticket.problem_description, QUOTE_LEN),
                    creator.name,
                ),
                ticket_id: ticket.id,
                audience: Audience::Role(Role::Admin),
            },
            now,
        );

        tracing::info!(
            ticket = %ticket.id,
            raised_by = %creator.id,
            "ticket raised"
        );
        ticket
    }

    /// Hands the ticket to an engineer. Critical tickets additionally alert
    /// the admins.
    pub fn assign_ticket(
        &mut self,
        id: Id,
        engineer_id: &user::Id,
        engineer_name: &str,
        severity: Severity,
    ) -> Result<&Ticket, Error> {
        let now = OffsetDateTime::now_utc();
        let ticket =
            self.tickets
                .assign(id, engineer_id, engineer_name, severity, now)?;

        self.notifications.add(
            Draft {
                kind: Kind::Assigned,
                title: "Ticket Assigned to You".to_owned(),
                message: format!(
                    "{id} has been assigned to you with {} severity",
                    severity.label(),
                ),
                ticket_id: id,
                audience: Audience::User(engineer_id.clone()),
            },
            now,
        );
        if severity == Severity::Critical {
            self.notifications.add(
                Draft {
                    kind: Kind::SeverityHigh,
                    title: "Critical Ticket Assigned".to_owned(),
                    message: format!(
                        "{id} assigned to {engineer_name} with Critical \
                         severity",
                    ),
                    ticket_id: id,
                    audience: Audience::Role(Role::Admin),
                },
                now,
            );
        }

        tracing::info!(
            ticket = %id,
            engineer = %engineer_id,
            severity = severity.label(),
            "ticket assigned"
        );
        Ok(ticket)
    }

    /// Moves an assigned ticket to in progress. Any other status is left as
    /// it is.
    pub fn start_progress(&mut self, id: Id) -> Result<&Ticket, Error> {
        self.tickets.start_progress(id, OffsetDateTime::now_utc())
    }

    pub fn add_action_log(
        &mut self,
        id: Id,
        description: &str,
        engineer: &User,
    ) -> Result<&Ticket, Error> {
        let ticket = self.tickets.add_action_log(
            id,
            description,
            engineer,
            OffsetDateTime::now_utc(),
        )?;
        tracing::info!(ticket = %id, engineer = %engineer.id, "action logged");
        Ok(ticket)
    }

    /// Closes the ticket. Refused while no action has been logged.
    pub fn resolve_ticket(&mut self, id: Id) -> Result<&Ticket, Error> {
        let now = OffsetDateTime::now_utc();
        let (ticket, newly_resolved) = self.tickets.resolve(id, now)?;

        if newly_resolved {
            self.notifications.add(
                Draft {
                    kind: Kind::Resolved,
                    title: "Ticket Resolved".to_owned(),
                    message: format!(
                        "{id} has been resolved by {}",
                        ticket.assigned_to_name.as_deref().unwrap_or("support"),
                    ),
                    ticket_id: id,
                    audience: Audience::User(ticket.raised_by.clone()),
                },
                now,
            );
            tracing::info!(ticket = %id, "ticket resolved");
        }
        Ok(ticket)
    }

    /// Records an engineer's wish to hand the ticket over. A newer request
    /// replaces a pending one.
    pub fn request_reassign(
        &mut self,
        id: Id,
        reason: &str,
        engineer: &User,
    ) -> Result<&Ticket, Error> {
        let now = OffsetDateTime::now_utc();
        let ticket = self.tickets.request_reassign(id, reason, engineer, now)?;

        self.notifications.add(
            Draft {
                kind: Kind::ReassignRequest,
                title: "Reassignment Requested".to_owned(),
                message: format!(
                    "{} requests reassignment of {id}: {}...",
                    engineer.name,
                    prefix(reason, QUOTE_LEN),
                ),
                ticket_id: id,
                audience: Audience::Role(Role::Admin),
            },
            now,
        );

        tracing::info!(
            ticket = %id,
            engineer = %engineer.id,
            "reassignment requested"
        );
        Ok(ticket)
    }

    /// Transfers the ticket to another engineer, notifying both the new and
    /// the previous owner.
    pub fn handle_reassign(
        &mut self,
        id: Id,
        engineer_id: &user::Id,
        engineer_name: &str,
    ) -> Result<&Ticket, Error> {
        let now = OffsetDateTime::now_utc();
        let Handover {
            ticket,
            previous,
            previous_name,
        } = self.tickets.reassign(id, engineer_id, engineer_name, now)?;

        self.notifications.add(
            Draft {
                kind: Kind::Assigned,
                title: "Ticket Reassigned to You".to_owned(),
                message: format!(
                    "{id} has been reassigned to you from {previous_name}",
                ),
                ticket_id: id,
                audience: Audience::User(engineer_id.clone()),
            },
            now,
        );
        if let Some(previous) = previous {
            self.notifications.add(
                Draft {
                    kind: Kind::Reassigned,
                    title: "Ticket Reassigned".to_owned(),
                    message: format!(
                        "{id} has been reassigned to {engineer_name} as per \
                         your request",
                    ),
                    ticket_id: id,
                    audience: Audience::User(previous),
                },
                now,
            );
        }

        tracing::info!(
            ticket = %id,
            engineer = %engineer_id,
            "ticket reassigned"
        );
        Ok(ticket)
    }
}
