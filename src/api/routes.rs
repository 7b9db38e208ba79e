use crate::api::{
    ActionReply, ApiError, GuardActionRequest, SendRequestQuery, SendRequestReply, SessionStatus,
};
use crate::core::utils::shorten;
use crate::core::{Action, ActionOutcome, GuardService, SessionState};
use crate::guard::GuardError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

/// POST /api/guard - run one wallet action
pub async fn guard_action(
    State(service): State<GuardService>,
    payload: Result<Json<GuardActionRequest>, JsonRejection>,
) -> Result<Json<ActionReply>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!("Rejected action body: {}", rejection.body_text());
        ApiError::BadRequest("Invalid action specified.".to_string())
    })?;
    let action = req.action;

    let outcome = service
        .perform(action, req.guard_code.as_deref())
        .await
        .map_err(|e| match (action, e) {
            (Action::Connect, e @ GuardError::ConnectFailure(_)) => {
                tracing::error!("{}", e);
                ApiError::InternalError("Failed to connect to Altura Guard".to_string())
            }
            (_, e) => ApiError::from(e),
        })?;

    let reply = match outcome {
        ActionOutcome::Connected(session) => ActionReply::connected(&session),
        ActionOutcome::Notice(notice) => ActionReply::notice(notice),
    };
    Ok(Json(reply))
}

/// GET /api/sendRequest?guardCode=... - pair and hand the token to the caller
pub async fn send_request(
    State(service): State<GuardService>,
    Query(query): Query<SendRequestQuery>,
) -> (StatusCode, Json<SendRequestReply>) {
    match service.request_pairing(query.guard_code.as_deref()).await {
        Ok(session) => (
            StatusCode::OK,
            Json(SendRequestReply {
                success: true,
                message: None,
                data: Some(session),
            }),
        ),
        Err(e) => {
            tracing::warn!("Pairing request failed: {}", e);
            let message = match e {
                GuardError::Status { body, .. } => body,
                other => other.to_string(),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SendRequestReply {
                    success: false,
                    message: Some(message),
                    data: None,
                }),
            )
        }
    }
}

/// GET /api/session - current session state
pub async fn session_status(State(service): State<GuardService>) -> Json<SessionStatus> {
    let state = service.sessions().state();
    let label = match &state {
        SessionState::Disconnected => "disconnected",
        SessionState::Connecting => "connecting",
        SessionState::Connected(_) => "connected",
        SessionState::Revoking => "revoking",
    };

    Json(SessionStatus {
        connected: state.is_connected(),
        state: label.to_string(),
        address: state.address().map(str::to_string),
        short_address: state.address().map(shorten),
        timestamp: Utc::now(),
    })
}
