//! Order endpoints: intake, lifecycle events and item edits.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use board_types::{OrderState, TransitionEvent};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::APIError;
use crate::server::AppState;

/// Body of `POST /api/orders`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
	#[serde(default)]
	pub customer: String,
	#[serde(default)]
	pub item_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResponse {
	pub key: String,
}

/// Body of `PUT /api/orders/{key}/item`.
#[derive(Debug, Deserialize)]
pub struct EditItemRequest {
	#[serde(default)]
	pub item_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionResponse {
	pub key: String,
	pub state: OrderState,
}

/// Handles POST /api/orders.
pub async fn create_order(
	State(state): State<AppState>,
	Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), APIError> {
	let key = state
		.board
		.submit_order(&request.customer, &request.item_text)
		.await?;
	info!(order_key = %key, "Order submitted over API");
	Ok((StatusCode::CREATED, Json(CreateOrderResponse { key })))
}

/// Handles POST /api/orders/{key}/events.
pub async fn apply_event(
	Path(key): Path<String>,
	State(state): State<AppState>,
	Json(event): Json<TransitionEvent>,
) -> Result<Json<TransitionResponse>, APIError> {
	let new_state = state.board.apply(&key, event).await?;
	Ok(Json(TransitionResponse {
		key,
		state: new_state,
	}))
}

/// Handles PUT /api/orders/{key}/item.
pub async fn edit_item(
	Path(key): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<EditItemRequest>,
) -> Result<StatusCode, APIError> {
	state.board.edit_item(&key, &request.item_text).await?;
	Ok(StatusCode::NO_CONTENT)
}
