//! Dashboard API route handlers.
//!
//! All endpoints return JSON. The engine session is shared via
//! `Arc<EngineSession>`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::engine::EngineSession;
use crate::types::{ApprovalRejected, BidSample, CampaignSnapshot, CandidateView};

pub type AppState = Arc<EngineSession>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An approval rejection rendered as an HTTP error.
#[derive(Debug)]
pub struct ApiError(pub ApprovalRejected);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            ApprovalRejected::UnknownCandidate(_) => StatusCode::NOT_FOUND,
            ApprovalRejected::AlreadyApproved(_) | ApprovalRejected::BudgetInsufficient { .. } => {
                StatusCode::CONFLICT
            }
            ApprovalRejected::SessionClosed => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<ApprovalRejected> for ApiError {
    fn from(err: ApprovalRejected) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.0.to_string() };
        (self.status(), Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/status
pub async fn get_status(State(session): State<AppState>) -> Json<CampaignSnapshot> {
    Json(session.snapshot())
}

/// GET /api/bids
pub async fn get_bids(State(session): State<AppState>) -> Json<Vec<BidSample>> {
    Json(session.snapshot().bid_samples)
}

/// GET /api/agents
pub async fn get_agents(State(session): State<AppState>) -> Json<Vec<CandidateView>> {
    Json(session.snapshot().candidates)
}

/// POST /api/agents/:id/approve
pub async fn approve_agent(
    State(session): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CampaignSnapshot>, ApiError> {
    Ok(Json(session.approve(&id)?))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
