use super::{error, AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use log::info;
use mesh_core::model::NodeId;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

pub async fn list_nodes(State(state): State<AppState>) -> impl IntoResponse {
    let sim = state.sim();
    Json(json!({"status": "OK", "nodes": sim.nodes()}))
}

pub async fn add_node(State(state): State<AppState>) -> impl IntoResponse {
    let mut sim = state.sim();
    match sim.add_node() {
        Some(id) => Json(json!({"status": "OK", "node": sim.store().get(&id)})),
        None => error("Node id already in use, add dropped"),
    }
}

pub async fn rename_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RenameRequest>,
) -> impl IntoResponse {
    let id = NodeId::new(id);
    let mut sim = state.sim();
    if sim.rename_node(&id, &payload.name) {
        Json(json!({"status": "OK", "node": sim.store().get(&id)}))
    } else {
        error(format!("Node {} not renamed", id))
    }
}

pub async fn inject_fault(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    fault(&state, Some(NodeId::new(id)))
}

/// Faults whatever node is currently selected.
pub async fn inject_fault_selected(State(state): State<AppState>) -> impl IntoResponse {
    fault(&state, None)
}

fn fault(state: &AppState, target: Option<NodeId>) -> Json<serde_json::Value> {
    let mut sim = state.sim();
    match sim.inject_fault(target.as_ref()) {
        Ok(true) => Json(json!({"status": "OK", "msg": "Fault injected"})),
        Ok(false) => error("Node not found"),
        Err(e) => error(e.to_string()),
    }
}

pub async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    state.sim().reset();
    Json(json!({"status": "OK", "msg": "Simulation reset"}))
}

/// Selects a node and fetches its log before answering.
///
/// The simulation is unlocked while the fetch is in flight; a selection made
/// meanwhile wins and this fetch's result is discarded.
pub async fn select_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = NodeId::new(id);
    let ticket = { state.sim().select(&id) };
    let Some(ticket) = ticket else {
        return error(format!("Node {} not found", id));
    };

    let result = state.log_source.fetch(ticket.node_id()).await;

    let mut sim = state.sim();
    let current = sim.complete_log_fetch(&ticket, result);
    if !current {
        info!("API: Discarded stale log for node {}", id);
    }
    Json(json!({
        "status": "OK",
        "node": sim.selected_node(),
        "logOutput": sim.log_output(),
        "current": current,
    }))
}

pub async fn clear_selection(State(state): State<AppState>) -> impl IntoResponse {
    state.sim().clear_selection();
    Json(json!({"status": "OK", "msg": "Selection cleared"}))
}

pub async fn get_selection(State(state): State<AppState>) -> impl IntoResponse {
    let sim = state.sim();
    Json(json!({
        "status": "OK",
        "selectedId": sim.selected_id(),
        "node": sim.selected_node(),
        "logOutput": sim.log_output(),
    }))
}
