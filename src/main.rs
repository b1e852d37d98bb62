use std::{error::Error, sync::Arc};

use axum::http::{
    header::{CONTENT_TYPE, HeaderName},
    HeaderValue, Method,
};
use tokio::{fs, net};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use itfm_helpdesk::{chat, server, Config, Desk};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fs::read_to_string("config.toml").await?;
    let config = toml::from_str::<Config>(&config)?;

    let desk = if config.desk.demo_data {
        Desk::with_demo_data()
    } else {
        Desk::new()
    };
    let chat_client = chat::Client::new(&config.chat)?;

    let origins = config
        .http
        .cors
        .allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(server::USER_ID_HEADER),
            HeaderName::from_static(server::USER_NAME_HEADER),
            HeaderName::from_static(server::USER_ROLE_HEADER),
            HeaderName::from_static(chat::SESSION_HEADER),
        ])
        .expose_headers([HeaderName::from_static(chat::SESSION_HEADER)]);

    let chat_sessions = chat::Sessions::from_config(&config.chat);
    let state = server::AppState::new(desk, chat_client, chat_sessions);
    let app = server::router(Arc::new(state)).layer(cors);

    let listener = net::TcpListener::bind(config.http.server.addr).await?;
    tracing::info!(
        addr = %config.http.server.addr,
        backend = %config.chat.backend_url,
        "help desk listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
