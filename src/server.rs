use std::{collections::BTreeMap, sync::Arc, time::Instant};

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use derive_more::From;
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::{api, chat, desk, Desk};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";

pub type SharedAppState = Arc<AppState>;

pub struct AppState {
    desk: Mutex<Desk>,

    chat: chat::Client,

    chat_sessions: Mutex<chat::Sessions>,
}

impl AppState {
    pub fn new(
        desk: Desk,
        chat: chat::Client,
        chat_sessions: chat::Sessions,
    ) -> Self {
        Self {
            desk: Mutex::new(desk),
            chat,
            chat_sessions: Mutex::new(chat_sessions),
        }
    }
}

pub fn router(state: SharedAppState) -> Router {
    Router::new()
        .route("/ticket", get(list_tickets).post(add_ticket))
        .route("/ticket/:id", get(get_ticket).patch(edit_ticket))
        .route("/queue/unassigned", get(unassigned_tickets))
        .route("/queue/active", get(active_tickets))
        .route("/queue/reassign-requests", get(reassign_requests))
        .route("/workload", get(engineer_workload))
        .route("/user/:id/tickets", get(tickets_by_user))
        .route("/engineer/:id/tickets", get(tickets_by_engineer))
        .route(
            "/notifications",
            get(list_notifications).delete(clear_notifications),
        )
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/:id/read", post(mark_notification_read))
        .route("/chat", post(chat))
        .route("/feedback", post(feedback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn clone_all(tickets: Vec<&api::Ticket>) -> Json<Vec<api::Ticket>> {
    Json(tickets.into_iter().cloned().collect())
}

async fn list_tickets(
    State(state): State<SharedAppState>,
    _: api::User,
) -> Json<Vec<api::Ticket>> {
    let desk = state.desk.lock().await;
    Json(desk.tickets().iter().cloned().collect())
}

async fn add_ticket(
    State(state): State<SharedAppState>,
    my: api::User,
    Json(input): Json<api::ticket::NewTicket>,
) -> Json<api::Ticket> {
    let mut desk = state.desk.lock().await;
    Json(desk.create_ticket(input, &my).clone())
}

async fn get_ticket(
    State(state): State<SharedAppState>,
    _: api::User,
    Path(id): Path<api::ticket::Id>,
) -> Result<Json<api::Ticket>, GetTicketError> {
    use GetTicketError as E;

    let desk = state.desk.lock().await;
    let ticket = desk.tickets().get(id).ok_or(E::TicketNotFound(id))?;
    Ok(Json(ticket.clone()))
}

#[derive(Debug)]
pub enum GetTicketError {
    TicketNotFound(api::ticket::Id),
}

impl IntoResponse for GetTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::TicketNotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(api::Failure::new(desk::Error::TicketNotFound(id))),
            ),
        }
        .into_response()
    }
}

#[derive(Deserialize)]
#[serde(content = "data", rename_all = "camelCase", tag = "op")]
enum EditTicketInput {
    #[serde(rename_all = "camelCase")]
    Assign {
        engineer_id: api::user::Id,
        engineer_name: String,
        severity: api::ticket::Severity,
    },
    StartProgress,
    AddActionLog {
        description: String,
    },
    Resolve,
    RequestReassign {
        reason: String,
    },
    #[serde(rename_all = "camelCase")]
    Reassign {
        engineer_id: api::user::Id,
        engineer_name: String,
    },
}

async fn edit_ticket(
    State(state): State<SharedAppState>,
    my: api::User,
    Path(id): Path<api::ticket::Id>,
    Query(params): Query<api::ticket::EditParams>,
    Json(op): Json<EditTicketInput>,
) -> Result<Json<api::Ticket>, EditTicketError> {
    use EditTicketInput as Op;

    let mut desk = state.desk.lock().await;
    // Checked under the same lock as the edit itself.
    if let Some(expected) = params.expected_version {
        desk.check_version(id, expected)?;
    }

    let ticket = match op {
        Op::Assign {
            engineer_id,
            engineer_name,
            severity,
        } => desk.assign_ticket(id, &engineer_id, &engineer_name, severity)?,
        Op::StartProgress => desk.start_progress(id)?,
        Op::AddActionLog { description } => {
            desk.add_action_log(id, &description, &my)?
        }
        Op::Resolve => desk.resolve_ticket(id)?,
        Op::RequestReassign { reason } => {
            desk.request_reassign(id, &reason, &my)?
        }
        Op::Reassign {
            engineer_id,
            engineer_name,
        } => desk.handle_reassign(id, &engineer_id, &engineer_name)?,
    };

    Ok(Json(ticket.clone()))
}

#[derive(Debug, From)]
pub enum EditTicketError {
    #[from]
    Desk(desk::Error),
}

impl IntoResponse for EditTicketError {
    fn into_response(self) -> Response {
        let Self::Desk(e) = self;
        let status = match &e {
            desk::Error::TicketNotFound(_) => StatusCode::NOT_FOUND,
            desk::Error::VersionConflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        if e.is_validation() {
            tracing::info!(error = %e, "ticket edit refused");
        }
        (status, Json(api::Failure::new(e))).into_response()
    }
}

async fn unassigned_tickets(
    State(state): State<SharedAppState>,
    _: api::User,
) -> Json<Vec<api::Ticket>> {
    let desk = state.desk.lock().await;
    clone_all(desk.unassigned_tickets())
}

async fn active_tickets(
    State(state): State<SharedAppState>,
    _: api::User,
) -> Json<Vec<api::Ticket>> {
    let desk = state.desk.lock().await;
    clone_all(desk.active_tickets())
}

async fn reassign_requests(
    State(state): State<SharedAppState>,
    _: api::User,
) -> Json<Vec<api::Ticket>> {
    let desk = state.desk.lock().await;
    clone_all(desk.reassign_requests())
}

async fn engineer_workload(
    State(state): State<SharedAppState>,
    _: api::User,
) -> Json<BTreeMap<api::user::Id, api::ticket::Workload>> {
    let desk = state.desk.lock().await;
    Json(desk.engineer_workload())
}

async fn tickets_by_user(
    State(state): State<SharedAppState>,
    _: api::User,
    Path(id): Path<api::user::Id>,
) -> Json<Vec<api::Ticket>> {
    let desk = state.desk.lock().await;
    clone_all(desk.tickets_by_user(&id))
}

async fn tickets_by_engineer(
    State(state): State<SharedAppState>,
    _: api::User,
    Path(id): Path<api::user::Id>,
) -> Json<Vec<api::Ticket>> {
    let desk = state.desk.lock().await;
    clone_all(desk.tickets_by_engineer(&id))
}

async fn list_notifications(
    State(state): State<SharedAppState>,
    my: api::User,
) -> Json<Vec<api::Notification>> {
    let desk = state.desk.lock().await;
    Json(
        desk.notifications_for(&my.id, my.role)
            .into_iter()
            .cloned()
            .collect(),
    )
}

async fn unread_count(
    State(state): State<SharedAppState>,
    my: api::User,
) -> Json<api::notification::UnreadCount> {
    let count = state.desk.lock().await.unread_count(&my.id, my.role);
    Json(api::notification::UnreadCount { count })
}

async fn mark_notification_read(
    State(state): State<SharedAppState>,
    _: api::User,
    Path(id): Path<api::notification::Id>,
) -> StatusCode {
    state.desk.lock().await.mark_notification_read(id);
    StatusCode::NO_CONTENT
}

async fn clear_notifications(
    State(state): State<SharedAppState>,
    my: api::User,
) -> Json<api::notification::Cleared> {
    let removed = state.desk.lock().await.clear_notifications(&my.id);
    Json(api::notification::Cleared { removed })
}

async fn chat(
    State(state): State<SharedAppState>,
    headers: HeaderMap,
    Json(api::chat::Message { message }): Json<api::chat::Message>,
) -> Result<impl IntoResponse, ChatError> {
    let session_id = headers
        .get(chat::SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Uuid>().ok())
        .unwrap_or_else(Uuid::new_v4);

    let turn = state
        .chat_sessions
        .lock()
        .await
        .begin_turn(session_id, &message, Instant::now())
        .ok_or(ChatError::EmptyMessage)?;

    // The sessions lock is not held while the backend answers.
    let answer = state.chat.ask(turn.query()).await;
    let reply = turn.finish(answer);

    let header = HeaderName::from_static(chat::SESSION_HEADER);
    Ok((
        [(header, session_id.to_string())],
        Json(api::chat::Reply { reply }),
    ))
}

#[derive(Debug)]
pub enum ChatError {
    EmptyMessage,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        match self {
            Self::EmptyMessage => (
                StatusCode::BAD_REQUEST,
                Json(api::Failure::new("message is empty")),
            ),
        }
        .into_response()
    }
}

async fn feedback(
    State(state): State<SharedAppState>,
    Json(feedback): Json<api::chat::Feedback>,
) -> StatusCode {
    // Users are never bothered with a lost rating.
    if let Err(e) = state.chat.send_feedback(&feedback).await {
        tracing::warn!(error = %e, "feedback submission failed");
    }
    StatusCode::NO_CONTENT
}

/// Identity claimed by the caller. Roles are taken at face value.
#[async_trait]
impl FromRequestParts<SharedAppState> for api::User {
    type Rejection = IdentityError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        _: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        use IdentityError as E;

        let header = |name: &'static str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .ok_or(E::MissingHeader(name))
        };

        let id = header(USER_ID_HEADER)?;
        let name = header(USER_NAME_HEADER)?;
        let role = header(USER_ROLE_HEADER)?
            .parse::<api::user::Role>()
            .map_err(|_| E::UnknownRole)?;

        Ok(api::User::new(id, name, role))
    }
}

#[derive(Debug)]
pub enum IdentityError {
    MissingHeader(&'static str),
    UnknownRole,
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let error = match self {
            Self::MissingHeader(name) => format!("missing {name} header"),
            Self::UnknownRole => "unknown role".to_owned(),
        };
        (StatusCode::UNAUTHORIZED, Json(api::Failure::new(error)))
            .into_response()
    }
}
