//! HTTP server for the order board API.

use axum::{
	routing::{get, post, put},
	Router,
};
use board_config::ApiConfig;
use board_core::OrderBoard;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::apis::{orders, staff, views};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub board: Arc<OrderBoard>,
}

/// Builds the router with every endpoint nested under `/api`.
pub fn router(board: Arc<OrderBoard>) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", post(orders::create_order))
				.route("/orders/{key}/events", post(orders::apply_event))
				.route("/orders/{key}/item", put(orders::edit_item))
				.route("/views/kitchen", get(views::kitchen))
				.route("/views/dispatch", get(views::dispatch))
				.route("/staff", get(staff::staff)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(AppState { board })
}

/// Serves the API until the listener fails.
pub async fn start_server(
	api_config: ApiConfig,
	board: Arc<OrderBoard>,
) -> Result<(), Box<dyn std::error::Error>> {
	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Order board API server starting on {}", bind_address);

	axum::serve(listener, router(board)).await?;

	Ok(())
}
