use super::{error, AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use mesh_core::model::{CommentId, NodeId, SuggestedAction};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[serde(default)]
    pub user_name: String,
    pub content: String,
    #[serde(default)]
    pub action: Option<SuggestedAction>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = NodeId::new(id);
    let sim = state.sim();
    let thread: Vec<_> = match sim.store().get(&id) {
        Some(node) => sim.comments().comments_for(node).collect(),
        None => Vec::new(),
    };
    Json(json!({"status": "OK", "comments": thread}))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> impl IntoResponse {
    let id = NodeId::new(id);
    let mut sim = state.sim();
    match sim.add_comment(&id, &payload.user_name, &payload.content, payload.action) {
        Some(comment_id) => Json(json!({
            "status": "OK",
            "comment": sim.comments().get(&comment_id),
        })),
        None => error("Comment ignored: blank content or unknown node"),
    }
}

pub async fn approve_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = CommentId::new(id);
    let mut sim = state.sim();
    if sim.approve_comment(&id) {
        Json(json!({"status": "OK", "comment": sim.comments().get(&id)}))
    } else {
        error(format!("Comment {} is not pending", id))
    }
}

pub async fn reject_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = CommentId::new(id);
    let mut sim = state.sim();
    if sim.reject_comment(&id) {
        Json(json!({"status": "OK", "comment": sim.comments().get(&id)}))
    } else {
        error(format!("Comment {} is not pending", id))
    }
}
