use serde::Deserialize;

pub use crate::desk::{
    ticket::{
        ActionLog, Id, LogId, NewTicket, ReassignRequest, Severity, Status,
        Ticket, Timestamps,
    },
    Workload,
};

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditParams {
    /// Refuse the edit unless the ticket is still at this version.
    pub expected_version: Option<u64>,
}
