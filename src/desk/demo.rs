use time::macros::datetime;

use super::{
    notification::{self, Kind, Notification},
    ticket::{self, ActionLog, LogId, Severity, Status, Ticket, Timestamps},
    user::{self, Role},
    Desk,
};

impl Desk {
    /// Desk preloaded with a raised, an assigned and an in-progress ticket,
    /// plus the notifications they produced.
    pub fn with_demo_data() -> Self {
        let mut desk = Self::new();

        desk.tickets.insert(Ticket {
            id: ticket::Id::from(1),
            asset_id: "ASSET-PC-101".to_owned(),
            call_type: "Hardware Issue".to_owned(),
            problem_description:
                "Monitor not displaying properly, flickering screen".to_owned(),
            location: "Building A, Floor 2, Room 201".to_owned(),
            raised_by: "EMP004".into(),
            raised_by_name: "Mike Smith".to_owned(),
            status: Status::Raised,
            severity: None,
            assigned_to: None,
            assigned_to_name: None,
            action_logs: Vec::new(),
            reassign_request: None,
            timestamps: Timestamps {
                raised: datetime!(2026-02-01 09:30 UTC),
                assigned: None,
                in_progress: None,
                resolved: None,
            },
            version: 0,
        });
        desk.tickets.insert(Ticket {
            id: ticket::Id::from(2),
            asset_id: "ASSET-PR-045".to_owned(),
            call_type: "Network Issue".to_owned(),
            problem_description: "Unable to connect to network printer"
                .to_owned(),
            location: "Building B, Floor 1, Room 105".to_owned(),
            raised_by: "EMP005".into(),
            raised_by_name: "Sarah Johnson".to_owned(),
            status: Status::Assigned,
            severity: Some(Severity::High),
            assigned_to: Some("EMP002".into()),
            assigned_to_name: Some("John Engineer".to_owned()),
            action_logs: Vec::new(),
            reassign_request: None,
            timestamps: Timestamps {
                raised: datetime!(2026-02-01 10:15 UTC),
                assigned: Some(datetime!(2026-02-01 11:00 UTC)),
                in_progress: None,
                resolved: None,
            },
            version: 0,
        });
        desk.tickets.insert(Ticket {
            id: ticket::Id::from(3),
            asset_id: "ASSET-SRV-002".to_owned(),
            call_type: "Software Issue".to_owned(),
            problem_description: "Email client crashing on startup".to_owned(),
            location: "Building A, Floor 3, Room 302".to_owned(),
            raised_by: "EMP004".into(),
            raised_by_name: "Mike Smith".to_owned(),
            status: Status::InProgress,
            severity: Some(Severity::Critical),
            assigned_to: Some("EMP003".into()),
            assigned_to_name: Some("Jane Engineer".to_owned()),
            action_logs: vec![ActionLog {
                id: LogId::from(1),
                description: "Initiated remote diagnostic session".to_owned(),
                timestamp: datetime!(2026-02-01 14:30 UTC),
                engineer_id: "EMP003".into(),
                engineer_name: "Jane Engineer".to_owned(),
            }],
            reassign_request: None,
            timestamps: Timestamps {
                raised: datetime!(2026-02-01 08:00 UTC),
                assigned: Some(datetime!(2026-02-01 08:45 UTC)),
                in_progress: Some(datetime!(2026-02-01 14:30 UTC)),
                resolved: None,
            },
            version: 0,
        });

        // Stored newest first, like every other notification.
        desk.notifications.insert(Notification {
            id: notification::Id::from(3),
            kind: Kind::SeverityHigh,
            title: "Critical Ticket".to_owned(),
            message: "TKT-003: Email client issue marked as Critical severity"
                .to_owned(),
            ticket_id: ticket::Id::from(3),
            for_role: Some(Role::Admin),
            for_user_id: None,
            timestamp: datetime!(2026-02-01 08:45 UTC),
            read: true,
        });
        desk.notifications.insert(Notification {
            id: notification::Id::from(2),
            kind: Kind::Assigned,
            title: "Ticket Assigned to You".to_owned(),
            message: "TKT-002: Network printer issue has been assigned to you"
                .to_owned(),
            ticket_id: ticket::Id::from(2),
            for_role: None,
            for_user_id: Some(user::Id::from("EMP002")),
            timestamp: datetime!(2026-02-01 11:00 UTC),
            read: false,
        });
        desk.notifications.insert(Notification {
            id: notification::Id::from(1),
            kind: Kind::NewTicket,
            title: "New Ticket Raised".to_owned(),
            message: "TKT-001: Monitor not displaying properly - Mike Smith"
                .to_owned(),
            ticket_id: ticket::Id::from(1),
            for_role: Some(Role::Admin),
            for_user_id: None,
            timestamp: datetime!(2026-02-01 09:30 UTC),
            read: false,
        });

        desk
    }
}
