use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use orq_domain::RuntimeContext;
use orq_graph::{Error as GraphError, TurnOutcome};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/threads/query", post(query))
		.route("/v1/threads/resume", post(resume))
		.with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
	pub thread_id: String,
	pub user_id: String,
	pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
	pub thread_id: String,
	pub approved: bool,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
	pub status: &'static str,
	pub response: String,
}

impl From<TurnOutcome> for TurnResponse {
	fn from(outcome: TurnOutcome) -> Self {
		match outcome {
			TurnOutcome::Completed(response) => Self { status: "completed", response },
			TurnOutcome::Suspended(prompt) => {
				Self { status: "awaiting_approval", response: prompt }
			},
		}
	}
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn query(
	State(state): State<AppState>,
	Json(payload): Json<QueryRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
	let ctx = RuntimeContext { user_id: payload.user_id };
	let outcome = state.orchestrator.invoke(&payload.thread_id, &ctx, &payload.query).await?;
	Ok(Json(outcome.into()))
}

async fn resume(
	State(state): State<AppState>,
	Json(payload): Json<ResumeRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
	let outcome = state.orchestrator.resume(&payload.thread_id, payload.approved).await?;
	Ok(Json(outcome.into()))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}

impl From<GraphError> for ApiError {
	fn from(err: GraphError) -> Self {
		let (status, error_code) = match &err {
			GraphError::NoPendingApproval { .. } => (StatusCode::CONFLICT, "not_suspended"),
			GraphError::Checkpoint { .. } => {
				(StatusCode::INTERNAL_SERVER_ERROR, "storage_failed")
			},
			_ => (StatusCode::BAD_GATEWAY, "upstream_failed"),
		};

		Self { status, error_code, message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code.to_string(), message: self.message };
		(self.status, Json(body)).into_response()
	}
}
