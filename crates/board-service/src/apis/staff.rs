use axum::{extract::State, response::Json};
use board_config::StaffConfig;

use crate::server::AppState;

/// Handles GET /api/staff.
pub async fn staff(State(state): State<AppState>) -> Json<StaffConfig> {
	Json(state.board.staff().clone())
}
