//! HTTP API handlers and their error mapping.

pub mod orders;
pub mod staff;
pub mod views;

use axum::{
	http::StatusCode,
	response::{IntoResponse, Json, Response},
};
use board_core::{BoardError, LifecycleError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
}

/// API error with its HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Missing or empty input (400)
	BadRequest { error_type: String, message: String },
	/// Unknown order key (404)
	NotFound { error_type: String, message: String },
	/// Action not allowed in the order's current state (409)
	Conflict { error_type: String, message: String },
	/// The store could not be reached or failed to write (503)
	ServiceUnavailable { error_type: String, message: String },
}

impl APIError {
	pub fn status_code(&self) -> StatusCode {
		match self {
			APIError::BadRequest { .. } => StatusCode::BAD_REQUEST,
			APIError::NotFound { .. } => StatusCode::NOT_FOUND,
			APIError::Conflict { .. } => StatusCode::CONFLICT,
			APIError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
		}
	}

	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = match self {
			APIError::BadRequest { error_type, message }
			| APIError::NotFound { error_type, message }
			| APIError::Conflict { error_type, message }
			| APIError::ServiceUnavailable { error_type, message } => (error_type, message),
		};
		ErrorResponse {
			error: error_type.clone(),
			message: message.clone(),
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let body = self.to_error_response();
		write!(f, "{} ({}): {}", self.status_code(), body.error, body.message)
	}
}

impl std::error::Error for APIError {}

impl From<BoardError> for APIError {
	fn from(e: BoardError) -> Self {
		let message = e.to_string();
		match e {
			BoardError::Lifecycle(LifecycleError::EmptyField(_)) => APIError::BadRequest {
				error_type: "EMPTY_FIELD".into(),
				message,
			},
			BoardError::Lifecycle(LifecycleError::OrderNotFound(_)) => APIError::NotFound {
				error_type: "ORDER_NOT_FOUND".into(),
				message,
			},
			BoardError::Lifecycle(LifecycleError::InvalidTransition { .. }) => APIError::Conflict {
				error_type: "INVALID_TRANSITION".into(),
				message,
			},
			BoardError::Lifecycle(LifecycleError::NotEditable { .. }) => APIError::Conflict {
				error_type: "NOT_EDITABLE".into(),
				message,
			},
			BoardError::Store(_) | BoardError::Stopped(_) => APIError::ServiceUnavailable {
				error_type: "STORE_UNAVAILABLE".into(),
				message,
			},
		}
	}
}

impl IntoResponse for APIError {
	fn into_response(self) -> Response {
		(self.status_code(), Json(self.to_error_response())).into_response()
	}
}
