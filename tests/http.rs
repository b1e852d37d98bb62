pub mod common;

use itfm_helpdesk::{api, Desk};
use reqwest::StatusCode;
use serde_json::json;

fn admin(url: &str) -> common::Client {
    common::Client::new(url).act_as("EMP001", "Alice Admin", "admin")
}

async fn desk_with_clients(
) -> (common::Client, common::Client, common::Client) {
    let url = common::spawn_desk(Desk::new()).await;
    let mike = common::Client::new(&url).act_as("EMP004", "Mike Smith", "user");
    let john = common::Client::new(&url).act_as("EMP002", "John", "engineer");
    (mike, john, admin(&url))
}

#[tokio::test]
async fn raises_ticket() {
    let (mike, _, admin) = desk_with_clients().await;

    let ticket = mike.add_ticket("Monitor flickering").await.unwrap();
    assert_eq!(ticket.id.to_string(), "TKT-001");
    assert_eq!(ticket.status, api::ticket::Status::Raised);
    assert_eq!(ticket.raised_by, api::user::Id::from("EMP004"));
    assert_eq!(ticket.raised_by_name, "Mike Smith");

    let fetched = admin
        .get::<api::Ticket>(&format!("/ticket/{}", ticket.id))
        .await
        .unwrap();
    assert_eq!(fetched, ticket);

    let notifications = admin.notifications().await.unwrap();
    match notifications.as_slice() {
        [n] => {
            assert_eq!(n.kind, api::notification::Kind::NewTicket);
            assert_eq!(
                n.message,
                "TKT-001: Monitor flickering... - Mike Smith",
            );
        }
        found => panic!("expected one notification, found {found:?}"),
    }
}

#[tokio::test]
async fn requires_identity() {
    let url = common::spawn_desk(Desk::new()).await;

    let (status, failure) = common::Client::new(&url)
        .get::<Vec<api::Ticket>>("/ticket")
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!failure.success);

    let (status, _) = common::Client::new(&url)
        .act_as("EMP004", "Mike Smith", "superuser")
        .get::<Vec<api::Ticket>>("/ticket")
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn walks_ticket_through_lifecycle() {
    let (mike, john, admin) = desk_with_clients().await;
    let id = mike.add_ticket("Laptop will not boot").await.unwrap().id;

    let ticket = admin.assign(id, "EMP002", "John", 2).await.unwrap();
    assert_eq!(ticket.status, api::ticket::Status::Assigned);
    assert_eq!(ticket.severity, Some(api::ticket::Severity::High));
    assert!(ticket.timestamps.assigned.is_some());

    let ticket = john
        .edit_ticket(id, json!({ "op": "startProgress" }), None)
        .await
        .unwrap();
    assert_eq!(ticket.status, api::ticket::Status::InProgress);

    let ticket = john
        .edit_ticket(
            id,
            json!({
                "op": "addActionLog",
                "data": { "description": "Reseated memory" },
            }),
            None,
        )
        .await
        .unwrap();
    assert_eq!(ticket.action_logs.len(), 1);
    assert_eq!(ticket.action_logs[0].engineer_name, "John");

    let ticket = john
        .edit_ticket(id, json!({ "op": "resolve" }), None)
        .await
        .unwrap();
    assert_eq!(ticket.status, api::ticket::Status::Resolved);
    assert!(ticket.timestamps.resolved.is_some());

    let notifications = mike.notifications().await.unwrap();
    assert_eq!(notifications[0].kind, api::notification::Kind::Resolved);
}

#[tokio::test]
async fn refuses_to_resolve_without_action_log() {
    let (mike, john, admin) = desk_with_clients().await;
    let id = mike.add_ticket("Mouse is dead").await.unwrap().id;
    admin.assign(id, "EMP002", "John", 3).await.unwrap();

    let (status, failure) = john
        .edit_ticket(id, json!({ "op": "resolve" }), None)
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        failure,
        api::Failure {
            success: false,
            error: "Cannot resolve ticket without at least one action log \
                    entry"
                .to_owned(),
        },
    );

    let ticket = john
        .get::<api::Ticket>(&format!("/ticket/{id}"))
        .await
        .unwrap();
    assert_eq!(ticket.status, api::ticket::Status::Assigned);
    assert_eq!(ticket.timestamps.resolved, None);
}

#[tokio::test]
async fn reports_missing_ticket() {
    let (_, john, admin) = desk_with_clients().await;
    let missing = api::ticket::Id::from(7);

    let (status, failure) = admin
        .get::<api::Ticket>("/ticket/TKT-007")
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(failure.error, "ticket TKT-007 not found");

    let (status, _) = john
        .edit_ticket(missing, json!({ "op": "startProgress" }), None)
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejects_stale_version() {
    let (mike, john, admin) = desk_with_clients().await;
    let ticket = mike.add_ticket("Scanner offline").await.unwrap();
    assert_eq!(ticket.version, 0);

    let assigned = admin.assign(ticket.id, "EMP002", "John", 2).await.unwrap();
    assert_eq!(assigned.version, 1);

    let (status, failure) = john
        .edit_ticket(ticket.id, json!({ "op": "startProgress" }), Some(0))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(!failure.success);

    let ticket = john
        .edit_ticket(ticket.id, json!({ "op": "startProgress" }), Some(1))
        .await
        .unwrap();
    assert_eq!(ticket.status, api::ticket::Status::InProgress);
    assert_eq!(ticket.version, 2);
}

#[tokio::test]
async fn handles_reassignment_request() {
    let (mike, john, admin) = desk_with_clients().await;
    let id = mike.add_ticket("VPN drops").await.unwrap().id;
    admin.assign(id, "EMP002", "John", 2).await.unwrap();

    john.edit_ticket(
        id,
        json!({
            "op": "requestReassign",
            "data": { "reason": "No VPN access" },
        }),
        None,
    )
    .await
    .unwrap();
    let requests = admin
        .get::<Vec<api::Ticket>>("/queue/reassign-requests")
        .await
        .unwrap();
    assert_eq!(requests.len(), 1);

    let ticket = admin
        .edit_ticket(
            id,
            json!({
                "op": "reassign",
                "data": { "engineerId": "EMP003", "engineerName": "Jane" },
            }),
            None,
        )
        .await
        .unwrap();
    assert_eq!(ticket.assigned_to, Some(api::user::Id::from("EMP003")));
    assert_eq!(ticket.reassign_request, None);

    let to_john = john.notifications().await.unwrap();
    assert_eq!(to_john[0].kind, api::notification::Kind::Reassigned);

    let john_queue = john
        .get::<Vec<api::Ticket>>("/engineer/EMP002/tickets")
        .await
        .unwrap();
    assert!(john_queue.is_empty());
}

#[tokio::test]
async fn serves_queues_and_workload() {
    let url = common::spawn_desk(Desk::with_demo_data()).await;
    let admin = admin(&url);

    let unassigned = admin
        .get::<Vec<api::Ticket>>("/queue/unassigned")
        .await
        .unwrap();
    assert_eq!(unassigned.len(), 1);
    let active = admin
        .get::<Vec<api::Ticket>>("/queue/active")
        .await
        .unwrap();
    assert_eq!(active.len(), 2);
    let mikes = admin
        .get::<Vec<api::Ticket>>("/user/EMP004/tickets")
        .await
        .unwrap();
    assert_eq!(mikes.len(), 2);

    let workload = admin
        .get::<serde_json::Value>("/workload")
        .await
        .unwrap();
    assert_eq!(
        workload,
        json!({
            "EMP002": { "name": "John Engineer", "count": 1 },
            "EMP003": { "name": "Jane Engineer", "count": 1 },
        }),
    );
}

#[tokio::test]
async fn manages_notifications() {
    let url = common::spawn_desk(Desk::with_demo_data()).await;
    let admin = admin(&url);
    let john = common::Client::new(&url).act_as(
        "EMP002",
        "John Engineer",
        "engineer",
    );

    let count = john
        .get::<api::notification::UnreadCount>("/notifications/unread-count")
        .await
        .unwrap();
    assert_eq!(count.count, 1);

    let notifications = john.notifications().await.unwrap();
    assert_eq!(
        john.mark_read(notifications[0].id).await,
        StatusCode::NO_CONTENT,
    );
    let count = john
        .get::<api::notification::UnreadCount>("/notifications/unread-count")
        .await
        .unwrap();
    assert_eq!(count.count, 0);

    assert_eq!(admin.notifications().await.unwrap().len(), 2);
    // Any user clearing also removes the admin notifications.
    let cleared = john.clear_notifications().await.unwrap();
    assert_eq!(cleared.removed, 3);
    assert!(admin.notifications().await.unwrap().is_empty());
}
