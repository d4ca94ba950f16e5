use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::db::queries::{self, CatalogStats};
use crate::errors::AppError;
use crate::state::AppState;

// GET /api/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<CatalogStats>, AppError> {
    let stats = {
        let db = state.db()?;
        queries::get_catalog_stats(&db)?
    };
    Ok(Json(stats))
}
