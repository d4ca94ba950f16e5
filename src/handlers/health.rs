use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::db::queries;
use crate::state::AppState;

// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let venues = match state.db() {
        Ok(db) => queries::count_venues(&db).map_err(|e| format!("{e:#}")),
        Err(e) => Err(e.to_string()),
    };

    match venues {
        Ok(count) => Json(serde_json::json!({
            "status": "ok",
            "database": "connected",
            "venues": count,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "database": "unavailable",
                })),
            )
                .into_response()
        }
    }
}
