//! Station view endpoints.

use axum::{
	extract::{Query, State},
	response::Json,
};
use board_core::views::{DispatchView, KitchenView};
use board_core::Partition;
use serde::Deserialize;

use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct KitchenQuery {
	#[serde(default)]
	pub partition: Partition,
}

/// Handles GET /api/views/kitchen.
pub async fn kitchen(
	State(state): State<AppState>,
	Query(query): Query<KitchenQuery>,
) -> Json<KitchenView> {
	Json(state.board.kitchen_view(query.partition))
}

/// Handles GET /api/views/dispatch.
pub async fn dispatch(State(state): State<AppState>) -> Json<DispatchView> {
	Json(state.board.dispatch_view())
}
