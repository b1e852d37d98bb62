use std::{sync::Arc, time::Duration};

use itfm_helpdesk::{api, chat, config, server, Desk};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn serve(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind a listener");
    let addr = listener.local_addr().expect("no local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server failed");
    });
    format!("http://{addr}")
}

/// URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("failed to bind a listener");
    let addr = listener.local_addr().expect("no local address");
    drop(listener);
    format!("http://{addr}")
}

pub fn chat_config(backend_url: &str) -> config::Chat {
    config::Chat {
        backend_url: backend_url.to_owned(),
        timeout: Duration::from_secs(5),
        escalation_turns: 4,
        session_ttl: Duration::from_secs(60),
    }
}

pub async fn spawn_desk(desk: Desk) -> String {
    spawn_desk_with_backend(desk, &unreachable_url()).await
}

pub async fn spawn_desk_with_backend(desk: Desk, backend_url: &str) -> String {
    let config = chat_config(backend_url);
    let chat = chat::Client::new(&config).expect("failed to build a client");
    let sessions = chat::Sessions::from_config(&config);
    let state = server::AppState::new(desk, chat, sessions);
    serve(server::router(Arc::new(state))).await
}

pub fn new_ticket(problem_description: &str) -> api::ticket::NewTicket {
    api::ticket::NewTicket {
        asset_id: "ASSET-PC-200".to_owned(),
        call_type: "Hardware Issue".to_owned(),
        problem_description: problem_description.to_owned(),
        location: "Building C, Floor 1, Room 110".to_owned(),
    }
}

pub struct Client {
    inner: reqwest::Client,
    base_url: String,
    identity: Option<(String, String, String)>,
}

impl Client {
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.to_owned(),
            identity: None,
        }
    }

    pub fn act_as(mut self, id: &str, name: &str, role: &str) -> Self {
        self.identity = Some((id.to_owned(), name.to_owned(), role.to_owned()));
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .inner
            .request(method, format!("{}{path}", self.base_url));
        if let Some((id, name, role)) = &self.identity {
            req = req
                .header(server::USER_ID_HEADER, id)
                .header(server::USER_NAME_HEADER, name)
                .header(server::USER_ROLE_HEADER, role);
        }
        req
    }

    async fn send<T: DeserializeOwned>(
        req: RequestBuilder,
    ) -> Result<T, (StatusCode, api::Failure)> {
        let res = req.send().await.expect("failed to send a request");
        let status = res.status();
        if !status.is_success() {
            let failure = res
                .json::<api::Failure>()
                .await
                .expect("failed to get a failure body");
            return Err((status, failure));
        }
        Ok(res.json::<T>().await.expect("failed to get a response"))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, (StatusCode, api::Failure)> {
        Self::send(self.request(Method::GET, path)).await
    }

    pub async fn add_ticket(
        &self,
        problem_description: &str,
    ) -> Result<api::Ticket, (StatusCode, api::Failure)> {
        Self::send(
            self.request(Method::POST, "/ticket")
                .json(&new_ticket(problem_description)),
        )
        .await
    }

    pub async fn edit_ticket(
        &self,
        id: api::ticket::Id,
        op: Value,
        expected_version: Option<u64>,
    ) -> Result<api::Ticket, (StatusCode, api::Failure)> {
        let path = match expected_version {
            Some(v) => format!("/ticket/{id}?expectedVersion={v}"),
            None => format!("/ticket/{id}"),
        };
        Self::send(self.request(Method::PATCH, &path).json(&op)).await
    }

    pub async fn assign(
        &self,
        id: api::ticket::Id,
        engineer_id: &str,
        engineer_name: &str,
        severity: u8,
    ) -> Result<api::Ticket, (StatusCode, api::Failure)> {
        let op = json!({
            "op": "assign",
            "data": {
                "engineerId": engineer_id,
                "engineerName": engineer_name,
                "severity": severity,
            },
        });
        self.edit_ticket(id, op, None).await
    }

    pub async fn notifications(
        &self,
    ) -> Result<Vec<api::Notification>, (StatusCode, api::Failure)> {
        self.get("/notifications").await
    }

    pub async fn mark_read(&self, id: api::notification::Id) -> StatusCode {
        self.request(Method::POST, &format!("/notifications/{id}/read"))
            .send()
            .await
            .expect("failed to send a request")
            .status()
    }

    pub async fn clear_notifications(
        &self,
    ) -> Result<api::notification::Cleared, (StatusCode, api::Failure)> {
        Self::send(self.request(Method::DELETE, "/notifications")).await
    }
}
