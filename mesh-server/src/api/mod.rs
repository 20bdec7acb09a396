//! API module
//!
//! HTTP and WebSocket surface of the simulator for the front-end dashboard.

mod moderation;
mod nodes;

use crate::run_log;
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use log::{info, warn};
use mesh_core::config::{MeshConfig, SimulationSettings};
use mesh_core::logs::{LogResponse, LogSource};
use mesh_core::model::Notification;
use mesh_core::session::{Credentials, Session};
use mesh_core::Simulation;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// App State to share with routes
#[derive(Clone)]
pub struct AppState {
    simulation: Arc<Mutex<Simulation>>,
    session: Arc<Mutex<Session>>,
    log_source: Arc<dyn LogSource>,
    config: Arc<MeshConfig>,
}

impl AppState {
    pub fn new(simulation: Simulation, log_source: Arc<dyn LogSource>, config: MeshConfig) -> Self {
        Self {
            simulation: Arc::new(Mutex::new(simulation)),
            session: Arc::new(Mutex::new(Session::default())),
            log_source,
            config: Arc::new(config),
        }
    }

    /// Every request runs to completion under this lock; never hold it across
    /// an `.await`.
    fn sim(&self) -> MutexGuard<'_, Simulation> {
        // A panicked handler leaves the simulation usable
        self.simulation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(ws_handler))
        .route("/nodes", get(nodes::list_nodes).post(nodes::add_node))
        .route("/nodes/:id/name", put(nodes::rename_node))
        .route("/nodes/:id/fault", post(nodes::inject_fault))
        .route(
            "/nodes/:id/comments",
            get(moderation::list_comments).post(moderation::add_comment),
        )
        .route("/fault", post(nodes::inject_fault_selected))
        .route("/reset", post(nodes::reset))
        .route("/select/:id", post(nodes::select_node))
        .route("/select", axum::routing::delete(nodes::clear_selection))
        .route("/selection", get(nodes::get_selection))
        .route("/comments/:id/approve", post(moderation::approve_comment))
        .route("/comments/:id/reject", post(moderation::reject_comment))
        .route("/notifications", get(get_notifications))
        .route("/topology", get(get_topology))
        .route("/summary", get(get_summary))
        .route("/simulation/toggle", post(toggle_simulation))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/session", get(get_session))
        .route("/session/login", post(login))
        .route("/session/logout", post(logout))
        // Log collaborator: /run-log{N}
        .route("/:endpoint", get(run_log_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_api_server(
    simulation: Simulation,
    log_source: Arc<dyn LogSource>,
    config: MeshConfig,
) -> Result<()> {
    let port = config.server_port;
    let app = router(AppState::new(simulation, log_source, config));

    let addr = format!("0.0.0.0:{}", port);
    info!("API Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("API server failed")?;
    Ok(())
}

pub(crate) fn error(msg: impl Into<String>) -> Json<Value> {
    Json(json!({"status": "ERROR", "msg": msg.into()}))
}

async fn health_check() -> &'static str {
    "OK"
}

// WebSocket Handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    // Subscribed before the upgrade answer, so nothing published after it is missed
    let rx = state.sim().notifications().subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, rx))
}

/// Streams every new notification as a JSON text frame until the client leaves.
async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<Notification>) {
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    let Ok(text) = serde_json::to_string(&notification) else {
                        continue;
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("WS: Subscriber lagged, skipped {} notifications", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

async fn get_notifications(State(state): State<AppState>) -> impl IntoResponse {
    let sim = state.sim();
    Json(json!({"status": "OK", "notifications": sim.notifications().notifications()}))
}

async fn get_topology(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({"status": "OK", "topology": state.sim().topology()}))
}

async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({"status": "OK", "summary": state.sim().summary()}))
}

async fn toggle_simulation(State(state): State<AppState>) -> impl IntoResponse {
    let running = state.sim().toggle_running();
    Json(json!({"status": "OK", "running": running}))
}

async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    let sim = state.sim();
    Json(json!({"status": "OK", "settings": sim.settings(), "running": sim.is_running()}))
}

async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<SimulationSettings>,
) -> impl IntoResponse {
    state.sim().update_settings(settings);
    Json(json!({"status": "OK", "msg": "Settings updated"}))
}

// Session Handlers
async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session();
    Json(json!({
        "status": "OK",
        "isAuthenticated": session.is_authenticated(),
        "user": session.user(),
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> impl IntoResponse {
    let mut session = state.session();
    match session.login(&credentials) {
        Ok(next) => {
            *session = next;
            Json(json!({"status": "OK", "user": session.user()}))
        }
        Err(e) => error(e.to_string()),
    }
}

async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let mut session = state.session();
    *session = session.logout();
    Json(json!({"status": "OK", "msg": "Logged out"}))
}

/// `GET /run-log{N}`: 200 `{"output"}` or 500 `{"error"}`.
async fn run_log_handler(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
) -> impl IntoResponse {
    let Some(n) = run_log::parse_endpoint(&endpoint) else {
        return (StatusCode::NOT_FOUND, Json(LogResponse::error("Not found")));
    };
    let command = state.config.log_command_for(n);

    match run_log::run(&command).await {
        Ok(output) => (StatusCode::OK, Json(LogResponse::output(output))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(LogResponse::error(e.to_string())),
        ),
    }
}
