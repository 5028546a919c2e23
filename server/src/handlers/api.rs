use axum::extract::State;
use axum::Json;

use crate::services::api::{self, EventSummary};
use crate::state::AppState;
use crate::utils::error::AppError;

/// `GET /api/events`: every published event as a bare JSON array.
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventSummary>>, AppError> {
    let summaries = api::published_summaries(state.store.as_ref()).await?;
    Ok(Json(summaries))
}
